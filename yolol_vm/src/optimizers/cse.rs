//! Common subexpression elimination

use std::collections::HashMap;
use std::convert::Infallible;

use yolol_vm_parser::ast::{Expr, Stmt};
use yolol_vm_parser::{NodeMut, Phase, Printer, Visit, Visitor};

/// Stores an expression that occurs several times inside one statement in
/// a temporary variable, when that makes the line shorter.
///
/// Only the expression evaluated by the statement itself is considered:
/// the value of an assignment, the target of a goto, the condition of an
/// if. Statements that increment or decrement a variable are left alone,
/// since moving a read across the increment would change its value.
#[derive(Debug, Default)]
pub struct CommonSubexpressionOptimizer {
    temporaries: usize,
}

impl CommonSubexpressionOptimizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_temporary(&mut self) -> String {
        let name = format!("_cse{}", self.temporaries);
        self.temporaries += 1;
        name
    }
}

impl Visitor for CommonSubexpressionOptimizer {
    type Error = Infallible;

    fn visit(&mut self, node: NodeMut<'_>, phase: Phase) -> Result<Visit, Infallible> {
        if phase != Phase::Pre {
            return Ok(Visit::Continue);
        }
        let NodeMut::Stmt(stmt) = node else {
            return Ok(Visit::Continue);
        };
        let expr = match stmt {
            Stmt::Assignment(a) => &mut a.value,
            Stmt::Goto(g) => &mut g.line,
            Stmt::If(s) => &mut s.condition,
            _ => return Ok(Visit::Continue),
        };
        if has_side_effects(expr) {
            return Ok(Visit::Continue);
        }
        let Some(candidate) = best_candidate(expr, self.temporaries) else {
            return Ok(Visit::Continue);
        };
        let name = self.next_temporary();
        let span = candidate.span().clone();
        replace_occurrences(expr, &print(&candidate), &name);
        let temporary = Stmt::assign(name, candidate);
        let mut stmt = stmt.clone();
        *stmt.span_mut() = span.merge(stmt.span());
        // Both statements are revisited so further candidates are found.
        Ok(Visit::replace([temporary, stmt]))
    }
}

fn print(expr: &Expr) -> String {
    Printer::new().print_expr(expr)
}

fn has_side_effects(expr: &Expr) -> bool {
    match expr {
        Expr::Deref(d) => d.op.is_some(),
        Expr::Unary(u) => has_side_effects(&u.operand),
        Expr::Binary(b) => has_side_effects(&b.lhs) || has_side_effects(&b.rhs),
        Expr::FuncCall(_) => true,
        Expr::StringConst(_) | Expr::NumberConst(_) => false,
    }
}

/// The repeated expression whose extraction saves the most characters
fn best_candidate(expr: &Expr, temporaries: usize) -> Option<Expr> {
    let mut counts: HashMap<String, (usize, Expr)> = HashMap::new();
    collect(expr, &mut counts);
    let name_len = format!("_cse{}", temporaries).len();
    counts
        .into_iter()
        .filter(|(_, (count, _))| *count > 1)
        .filter_map(|(text, (count, candidate))| {
            // `name=expr ` is added, every occurrence shrinks to `name`
            let cost = name_len + 1 + text.len() + 1 + count * name_len;
            let saving = count * text.len();
            (saving > cost).then_some((saving - cost, text, candidate))
        })
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.cmp(&a.1)))
        .map(|(_, _, candidate)| candidate)
}

fn collect(expr: &Expr, counts: &mut HashMap<String, (usize, Expr)>) {
    match expr {
        Expr::Unary(u) => collect(&u.operand, counts),
        Expr::Binary(b) => {
            collect(&b.lhs, counts);
            collect(&b.rhs, counts);
        }
        _ => return,
    }
    counts
        .entry(print(expr))
        .or_insert_with(|| (0, expr.clone()))
        .0 += 1;
}

fn replace_occurrences(expr: &mut Expr, text: &str, name: &str) {
    if !expr.is_leaf() && print(expr) == text {
        *expr = Expr::var(name, expr.span().clone());
        return;
    }
    match expr {
        Expr::Unary(u) => replace_occurrences(&mut u.operand, text, name),
        Expr::Binary(b) => {
            replace_occurrences(&mut b.lhs, text, name);
            replace_occurrences(&mut b.rhs, text, name);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizers::apply;
    use yolol_vm_parser::parse_yolol;

    fn eliminate(source: &str) -> String {
        let mut program = parse_yolol(source).unwrap();
        apply(&mut program, &mut CommonSubexpressionOptimizer::new());
        Printer::new().print(&program).unwrap()
    }

    #[test]
    fn test_extracts_repeated_expression() {
        assert_eq!(
            eliminate("a = (:left + :right) * (:left + :right) / (:left + :right)"),
            "_cse0=:left+:right a=_cse0*_cse0/_cse0\n"
        );
    }

    #[test]
    fn test_short_repeats_are_kept() {
        assert_eq!(eliminate("a = (b+c) * (b+c)"), "a=(b+c)*(b+c)\n");
    }

    #[test]
    fn test_side_effects_block_extraction() {
        let source = "a = (:left + :right) * (:left + :right) + x++\n";
        assert_eq!(eliminate(source), "a=(:left+:right)*(:left+:right)+x++\n");
    }
}
