//! Variable name shortening

use std::collections::{BTreeMap, HashMap, HashSet};
use std::convert::Infallible;

use once_cell::sync::Lazy;
use yolol_vm_parser::ast::{is_global, Expr, Stmt};
use yolol_vm_parser::{NodeMut, Phase, Visit, Visitor};

/// Words that can never be used as generated variable names
static RESERVED_NAMES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "if", "then", "else", "end", "goto", "and", "or", "not", "abs", "sqrt", "sin", "cos",
        "tan", "asin", "acos", "atan", "while", "do", "break", "continue", "define", "macro",
        "insert", "include", "wait",
    ]
    .into_iter()
    .collect()
});

/// Whether `name` is a keyword of either language
pub fn is_reserved_name(name: &str) -> bool {
    RESERVED_NAMES.contains(name.to_ascii_lowercase().as_str())
}

/// Renames every local variable to the shortest free name (`a`, `b`, ...,
/// `z`, `aa`, ...) in order of first appearance. Global variables keep
/// their names, they are shared with other chips.
#[derive(Debug, Default)]
pub struct VariableNameOptimizer {
    names: HashMap<String, String>,
    next: usize,
}

impl VariableNameOptimizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The short name for `original`, allocating one on first use
    pub fn rename(&mut self, original: &str) -> String {
        if is_global(original) {
            return original.to_string();
        }
        if let Some(name) = self.names.get(original) {
            return name.clone();
        }
        let name = loop {
            let candidate = short_name(self.next);
            self.next += 1;
            if !is_reserved_name(&candidate) {
                break candidate;
            }
        };
        self.names.insert(original.to_string(), name.clone());
        name
    }

    /// Original name to new name
    pub fn translations(&self) -> BTreeMap<String, String> {
        self.names
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn into_translations(self) -> BTreeMap<String, String> {
        self.names.into_iter().collect()
    }
}

impl Visitor for VariableNameOptimizer {
    type Error = Infallible;

    fn visit(&mut self, node: NodeMut<'_>, phase: Phase) -> Result<Visit, Infallible> {
        match (node, phase) {
            (NodeMut::Expr(Expr::Deref(d)), _) | (NodeMut::Stmt(Stmt::Deref(d)), _) => {
                d.variable = self.rename(&d.variable);
            }
            (NodeMut::Stmt(Stmt::Assignment(a)), Phase::Pre) => {
                a.variable = self.rename(&a.variable);
            }
            _ => {}
        }
        Ok(Visit::Continue)
    }
}

/// `0 -> a`, `25 -> z`, `26 -> aa`, ...
fn short_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'a' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizers::apply;
    use yolol_vm_parser::{parse_yolol, Printer};

    #[test]
    fn test_short_names() {
        assert_eq!(short_name(0), "a");
        assert_eq!(short_name(25), "z");
        assert_eq!(short_name(26), "aa");
        assert_eq!(short_name(27), "ab");
        assert_eq!(short_name(26 * 27), "aaa");
    }

    #[test]
    fn test_renames_locals_in_order_of_appearance() {
        let mut program = parse_yolol("total = count + 1\n:out = total count++").unwrap();
        let mut optimizer = VariableNameOptimizer::new();
        apply(&mut program, &mut optimizer);
        assert_eq!(
            Printer::new().print(&program).unwrap(),
            "a=b+1\n:out=a b++\n"
        );
        let translations = optimizer.into_translations();
        assert_eq!(translations["total"], "a");
        assert_eq!(translations["count"], "b");
        assert!(!translations.contains_key(":out"));
    }

    #[test]
    fn test_keywords_are_skipped() {
        let mut optimizer = VariableNameOptimizer::new();
        let names: Vec<String> = (0..26 * 27).map(|i| optimizer.rename(&format!("v{}", i))).collect();
        assert!(!names.iter().any(|n| is_reserved_name(n)));
        assert!(names.contains(&"ie".to_string()));
        assert!(!names.contains(&"if".to_string()));
        assert!(!names.contains(&"or".to_string()));
    }
}
