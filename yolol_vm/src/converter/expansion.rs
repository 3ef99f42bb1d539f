//! Definition substitution and macro insertion

use std::collections::{HashMap, HashSet};
use std::convert::Infallible;

use tracing::debug;
use yolol_vm_parser::ast::nolol::{Definition, Element, MacroDefinition, MacroInsertion};
use yolol_vm_parser::ast::{is_global, Dereference, Expr, FuncCall, Stmt};
use yolol_vm_parser::{accept_slot, walk, NodeMut, Phase, Span, Visit, Visitor};

use super::{Context, Expanded, Included, MAX_NESTING};
use crate::error::{ConvertError, ConvertErrors};
use crate::optimizers::apply;

/// Substitute definitions and insert macros.
///
/// Definitions apply to everything after them. Macros can be inserted
/// anywhere in the file that defines them.
pub(crate) fn expand(
    _ctx: &mut Context<'_>,
    Included(mut program): Included,
) -> Result<Expanded, ConvertErrors> {
    let mut collector = MacroCollector::default();
    apply(&mut program, &mut collector);

    let mut expander = Expander {
        macros: collector.macros,
        ..Expander::default()
    };
    walk(&mut program, &mut expander)?;
    expander.errors.into_result()?;
    debug!(
        definitions = expander.definitions.len(),
        macros = expander.macros.len(),
        insertions = expander.insertions,
        "code expanded"
    );
    Ok(Expanded(program))
}

/// Removes macro definitions from the tree. A later definition with the
/// same name wins.
#[derive(Default)]
struct MacroCollector {
    macros: HashMap<String, MacroDefinition>,
}

impl Visitor for MacroCollector {
    type Error = Infallible;

    fn visit(&mut self, node: NodeMut<'_>, phase: Phase) -> Result<Visit, Infallible> {
        match (node, phase) {
            (NodeMut::Element(Element::Macro(m)), Phase::Pre) => {
                self.macros.insert(m.name.to_ascii_lowercase(), m.clone());
                Ok(Visit::remove())
            }
            _ => Ok(Visit::Continue),
        }
    }
}

#[derive(Default)]
struct Expander {
    macros: HashMap<String, MacroDefinition>,
    definitions: HashMap<String, Definition>,
    /// Macros currently being inserted, innermost last
    stack: Vec<String>,
    insertions: usize,
    errors: ConvertErrors,
}

impl Expander {
    /// Definition without placeholders that `name` refers to
    fn constant(&self, name: &str) -> Option<&Definition> {
        if is_global(name) {
            return None;
        }
        self.definitions
            .get(&name.to_ascii_lowercase())
            .filter(|d| d.placeholders.is_empty())
    }

    fn substitute(&mut self, deref: &mut Dereference) -> Visit {
        if deref.op.is_some() {
            self.redirect(&mut deref.variable, &deref.span);
            return Visit::Continue;
        }
        match self.constant(&deref.variable) {
            Some(definition) => {
                let mut value = definition.value.clone();
                *value.span_mut() = deref.span.clone();
                Visit::with(value)
            }
            None => Visit::Continue,
        }
    }

    /// Writes to a definition go to the variable it stands for
    fn redirect(&mut self, variable: &mut String, span: &Span) {
        let target = match self.constant(variable) {
            None => return,
            Some(definition) => match &definition.value {
                Expr::Deref(target) if target.op.is_none() => Some(target.variable.clone()),
                _ => None,
            },
        };
        match target {
            Some(target) => *variable = target,
            None => self.errors.push(ConvertError::DefinitionAssignment {
                name: variable.clone(),
                span: span.clone(),
            }),
        }
    }

    /// `name(args)` where `name` is a definition with placeholders
    fn call(&mut self, call: &FuncCall) -> Visit {
        let Some(definition) = self.definitions.get(&call.name.to_ascii_lowercase()) else {
            return Visit::Continue;
        };
        if definition.placeholders.len() != call.args.len() {
            let error = ConvertError::FunctionArgumentCount {
                name: call.name.clone(),
                expected: definition.placeholders.len(),
                found: call.args.len(),
                span: call.span.clone(),
            };
            self.errors.push(error);
            return Visit::Continue;
        }
        let mut substitution = Substitution {
            arguments: definition
                .placeholders
                .iter()
                .cloned()
                .zip(call.args.iter().cloned())
                .collect(),
            mangle: None,
            errors: ConvertErrors::new(),
        };
        let mut value = definition.value.clone();
        if let Err(never) = accept_slot(&mut value, &mut substitution) {
            match never {}
        }
        *value.span_mut() = call.span.clone();
        let errors = substitution.errors;
        self.errors.extend(errors);
        Visit::with(value)
    }

    fn insert(&mut self, insertion: &MacroInsertion) -> Result<Visit, ConvertError> {
        let key = insertion.name.to_ascii_lowercase();
        let Some(definition) = self.macros.get(&key).cloned() else {
            self.errors.push(ConvertError::UnknownMacro {
                name: insertion.name.clone(),
                span: insertion.span.clone(),
            });
            return Ok(Visit::remove());
        };
        if definition.arguments.len() != insertion.arguments.len() {
            self.errors.push(ConvertError::MacroArgumentCount {
                name: insertion.name.clone(),
                expected: definition.arguments.len(),
                found: insertion.arguments.len(),
                span: insertion.span.clone(),
            });
            return Ok(Visit::remove());
        }
        if self.stack.contains(&key) || self.stack.len() >= MAX_NESTING {
            return Err(ConvertError::MacroLoop {
                name: insertion.name.clone(),
                span: insertion.span.clone(),
            });
        }

        self.insertions += 1;
        let mut labels = HashSet::new();
        collect_labels(&definition.block.elements, &mut labels);
        let mut block = definition.block;
        let errors = {
            let mut substitution = Substitution {
                arguments: definition
                    .arguments
                    .into_iter()
                    .zip(insertion.arguments.iter().cloned())
                    .collect(),
                mangle: Some(Mangle {
                    prefix: format!("_macro_{}_{}_", key, self.insertions),
                    externals: definition.externals.into_iter().collect(),
                    labels,
                    definitions: &self.definitions,
                }),
                errors: ConvertErrors::new(),
            };
            apply(&mut block, &mut substitution);
            substitution.errors
        };
        self.errors.extend(errors);

        // The inserted code may define and insert macros of its own
        self.stack.push(key);
        let expanded = walk(&mut block, self);
        self.stack.pop();
        expanded?;
        debug!(name = %insertion.name, elements = block.elements.len(), "macro inserted");
        Ok(Visit::replace_skip(block.elements))
    }
}

impl Visitor for Expander {
    type Error = ConvertError;

    fn visit(&mut self, node: NodeMut<'_>, phase: Phase) -> Result<Visit, ConvertError> {
        match (node, phase) {
            (NodeMut::Element(Element::Macro(m)), Phase::Pre) => {
                self.macros.insert(m.name.to_ascii_lowercase(), m.clone());
                Ok(Visit::remove())
            }
            // Post, so the value has earlier definitions substituted already
            (NodeMut::Element(Element::Define(d)), Phase::Post) => {
                self.definitions.insert(d.name.to_ascii_lowercase(), d.clone());
                Ok(Visit::remove())
            }
            (NodeMut::Element(Element::Insert(insertion)), Phase::Post) => self.insert(insertion),
            (NodeMut::Expr(Expr::Deref(d)), Phase::Single) => Ok(self.substitute(d)),
            (NodeMut::Expr(Expr::FuncCall(call)), Phase::Post) => Ok(self.call(call)),
            (NodeMut::Stmt(Stmt::Deref(d)), Phase::Single) => {
                self.redirect(&mut d.variable, &d.span);
                Ok(Visit::Continue)
            }
            (NodeMut::Stmt(Stmt::Assignment(a)), Phase::Pre) => {
                self.redirect(&mut a.variable, &a.span);
                Ok(Visit::Continue)
            }
            _ => Ok(Visit::Continue),
        }
    }
}

/// Labels declared anywhere in `elements`, lowercased
fn collect_labels(elements: &[Element], labels: &mut HashSet<String>) {
    for element in elements {
        match element {
            Element::Line(line) => {
                if let Some(label) = &line.label {
                    labels.insert(label.to_ascii_lowercase());
                }
            }
            Element::If(mif) => {
                for block in &mif.blocks {
                    collect_labels(&block.elements, labels);
                }
                if let Some(block) = &mif.else_block {
                    collect_labels(&block.elements, labels);
                }
            }
            Element::While(w) => collect_labels(&w.block.elements, labels),
            _ => {}
        }
    }
}

/// Renaming applied to the body of one macro insertion
struct Mangle<'a> {
    prefix: String,
    externals: HashSet<String>,
    /// Labels declared by the macro body, lowercased
    labels: HashSet<String>,
    definitions: &'a HashMap<String, Definition>,
}

/// Replaces placeholder variables with argument expressions and, for macro
/// bodies, gives every other local variable and label a unique prefix
struct Substitution<'a> {
    arguments: HashMap<String, Expr>,
    mangle: Option<Mangle<'a>>,
    errors: ConvertErrors,
}

impl Substitution<'_> {
    fn rename(&self, variable: &mut String) {
        let Some(mangle) = &self.mangle else {
            return;
        };
        if is_global(variable)
            || mangle.externals.contains(variable.as_str())
            || mangle.definitions.contains_key(&variable.to_ascii_lowercase())
        {
            return;
        }
        *variable = format!("{}{}", mangle.prefix, variable);
    }

    fn rename_label(&self, label: &mut String) {
        if let Some(mangle) = &self.mangle {
            if mangle.labels.contains(&label.to_ascii_lowercase()) {
                *label = format!("{}{}", mangle.prefix, label);
            }
        }
    }

    /// A variable that is written to: an argument must be a plain variable
    fn target(&mut self, variable: &mut String, span: &Span) {
        match self.arguments.get(variable.as_str()) {
            Some(Expr::Deref(d)) if d.op.is_none() => *variable = d.variable.clone(),
            Some(_) => self.errors.push(ConvertError::DefinitionAssignment {
                name: variable.clone(),
                span: span.clone(),
            }),
            None => self.rename(variable),
        }
    }
}

impl Visitor for Substitution<'_> {
    type Error = Infallible;

    fn visit(&mut self, node: NodeMut<'_>, phase: Phase) -> Result<Visit, Infallible> {
        match (node, phase) {
            (NodeMut::Expr(Expr::Deref(d)), Phase::Single) if d.op.is_none() => {
                if let Some(argument) = self.arguments.get(&d.variable) {
                    return Ok(Visit::with(argument.clone()));
                }
                self.rename(&mut d.variable);
            }
            (NodeMut::Expr(Expr::Deref(d)), Phase::Single)
            | (NodeMut::Stmt(Stmt::Deref(d)), Phase::Single) => {
                self.target(&mut d.variable, &d.span)
            }
            (NodeMut::Stmt(Stmt::Assignment(a)), Phase::Pre) => {
                self.target(&mut a.variable, &a.span)
            }
            (NodeMut::Stmt(Stmt::GotoLabel(g)), Phase::Single) => self.rename_label(&mut g.label),
            (NodeMut::Element(Element::Line(line)), Phase::Pre) => {
                if let Some(label) = &mut line.label {
                    self.rename_label(label);
                }
            }
            _ => {}
        }
        Ok(Visit::Continue)
    }
}
