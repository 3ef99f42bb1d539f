//! From statement lines to numbered physical lines

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};
use yolol_vm_parser::ast::nolol::StatementLine;
use yolol_vm_parser::ast::{yolol, Stmt};
use yolol_vm_parser::{Printer, Span};

use super::{Context, Lowered, Numbered};
use crate::error::{ConvertError, ConvertErrors};
use crate::optimizers::{apply, StaticExpressionOptimizer};

/// A statement line after empty lines are folded into their successor
#[derive(Debug, Clone)]
struct LogicalLine {
    /// Lowercased
    labels: Vec<String>,
    statements: Vec<Stmt>,
    has_bol: bool,
    has_eol: bool,
    span: Span,
}

pub(crate) fn number(
    ctx: &mut Context<'_>,
    Lowered(mut lines): Lowered,
) -> Result<Numbered, ConvertErrors> {
    // Execution starts over once the program is done
    let span = lines.last().map(|l| l.span.clone()).unwrap_or_default();
    lines.push(StatementLine::new(vec![Stmt::goto_line(1, span.clone())], span));
    check_labels(&lines)?;

    let mut logical = collapse(lines);
    retarget_gotos(&mut logical);
    remove_unused_labels(&mut logical);
    remove_duplicate_gotos(&mut logical);
    let logical_count = logical.len();
    let physical = merge(ctx.line_budget(), logical)?;
    let mut program = resolve_labels(physical)?;
    if ctx.options.fold_constants {
        apply(&mut program, &mut StaticExpressionOptimizer::new());
    }
    debug!(
        logical = logical_count,
        physical = program.lines.len(),
        "lines numbered"
    );
    Ok(Numbered(program))
}

/// Every label declared once, every `goto label` declared
fn check_labels(lines: &[StatementLine]) -> Result<(), ConvertErrors> {
    let mut errors = ConvertErrors::new();
    let mut declared: HashMap<String, &Span> = HashMap::new();
    for line in lines {
        let Some(label) = &line.label else {
            continue;
        };
        match declared.entry(label.to_ascii_lowercase()) {
            Entry::Occupied(first) => errors.push(ConvertError::DuplicateLabel {
                label: label.clone(),
                first: (*first.get()).clone(),
                second: line.span.clone(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(&line.span);
            }
        }
    }
    let mut references = Vec::new();
    for line in lines {
        label_references(&line.statements, &mut references);
    }
    for (label, span) in references {
        if !declared.contains_key(&label.to_ascii_lowercase()) {
            errors.push(ConvertError::UnknownLabel { label, span });
        }
    }
    errors.into_result()
}

/// Lines without statements disappear; their labels and `$` markers move to
/// the next line
fn collapse(lines: Vec<StatementLine>) -> Vec<LogicalLine> {
    let mut logical = Vec::new();
    let mut labels = Vec::new();
    let mut has_bol = false;
    for line in lines {
        if let Some(label) = &line.label {
            labels.push(label.to_ascii_lowercase());
        }
        has_bol |= line.has_bol;
        if line.statements.is_empty() {
            has_bol |= line.has_eol;
            continue;
        }
        logical.push(LogicalLine {
            labels: std::mem::take(&mut labels),
            statements: line.statements,
            has_bol: std::mem::take(&mut has_bol),
            has_eol: line.has_eol,
            span: line.span,
        });
    }
    logical
}

/// A `goto label` whose target line is nothing but a goto jumps to that
/// goto's target instead. Targets are taken from the lines as they were
/// before this pass, so each goto moves at most one hop.
fn retarget_gotos(lines: &mut [LogicalLine]) {
    let mut targets: HashMap<String, Stmt> = HashMap::new();
    for line in lines.iter() {
        if let [jump] = line.statements.as_slice() {
            if jump.is_goto() {
                for label in &line.labels {
                    targets.insert(label.clone(), jump.clone());
                }
            }
        }
    }
    for line in lines.iter_mut() {
        label_gotos_mut(&mut line.statements, &mut |stmt: &mut Stmt| {
            let Stmt::GotoLabel(goto) = &*stmt else {
                return;
            };
            let Some(target) = targets.get(&goto.label.to_ascii_lowercase()) else {
                return;
            };
            trace!(from = %goto.label, "goto retargeted");
            let mut target = target.clone();
            *target.span_mut() = goto.span.clone();
            *stmt = target;
        });
    }
}

fn remove_unused_labels(lines: &mut [LogicalLine]) {
    let mut references = Vec::new();
    for line in lines.iter() {
        label_references(&line.statements, &mut references);
    }
    let used: HashSet<String> = references
        .into_iter()
        .map(|(label, _)| label.to_ascii_lowercase())
        .collect();
    for line in lines.iter_mut() {
        line.labels.retain(|label| used.contains(label));
    }
}

/// A goto right after another goto never runs. Labels end the run, since
/// the line can be reached from elsewhere.
fn remove_duplicate_gotos(lines: &mut Vec<LogicalLine>) {
    let mut after_goto = false;
    for line in lines.iter_mut() {
        if !line.labels.is_empty() {
            after_goto = false;
        }
        line.statements.retain(|stmt| {
            if after_goto && stmt.is_goto() {
                return false;
            }
            after_goto = stmt.is_goto();
            true
        });
    }
    lines.retain(|line| !line.statements.is_empty());
}

/// Greedily append logical lines to the current physical line while the
/// result fits the budget
fn merge(budget: usize, lines: Vec<LogicalLine>) -> Result<Vec<LogicalLine>, ConvertErrors> {
    let printer = Printer::measuring();
    let mut physical: Vec<LogicalLine> = Vec::new();
    for line in lines {
        if let Some(current) = physical.last_mut() {
            if !current.has_eol && !line.has_bol && line.labels.is_empty() {
                let mut candidate = current.statements.clone();
                candidate.extend(line.statements.iter().cloned());
                if printer.print_statements(&candidate)?.len() <= budget {
                    current.statements = candidate;
                    current.has_eol = line.has_eol;
                    current.span = current.span.merge(&line.span);
                    continue;
                }
            }
        }
        physical.push(line);
    }
    Ok(physical)
}

/// Replace every `goto label` with the number of the line it names
fn resolve_labels(lines: Vec<LogicalLine>) -> Result<yolol::Program, ConvertErrors> {
    let mut numbers = HashMap::new();
    for (index, line) in lines.iter().enumerate() {
        for label in &line.labels {
            numbers.insert(label.clone(), index + 1);
        }
    }
    let mut errors = ConvertErrors::new();
    let mut program = yolol::Program::default();
    for mut line in lines {
        label_gotos_mut(&mut line.statements, &mut |stmt: &mut Stmt| {
            let Stmt::GotoLabel(goto) = &*stmt else {
                return;
            };
            match numbers.get(&goto.label.to_ascii_lowercase()) {
                Some(&number) => *stmt = Stmt::goto_line(number, goto.span.clone()),
                None => errors.push(ConvertError::UnknownLabel {
                    label: goto.label.clone(),
                    span: goto.span.clone(),
                }),
            }
        });
        program.lines.push(yolol::Line::new(line.statements, line.span));
    }
    errors.into_result()?;
    Ok(program)
}

/// Label name and position of every `goto label`, nested ones included
fn label_references(statements: &[Stmt], out: &mut Vec<(String, Span)>) {
    for stmt in statements {
        match stmt {
            Stmt::GotoLabel(goto) => out.push((goto.label.clone(), goto.span.clone())),
            Stmt::If(s) => {
                label_references(&s.then_block, out);
                if let Some(block) = &s.else_block {
                    label_references(block, out);
                }
            }
            _ => {}
        }
    }
}

fn label_gotos_mut(statements: &mut [Stmt], f: &mut dyn FnMut(&mut Stmt)) {
    for stmt in statements {
        match stmt {
            Stmt::If(s) => {
                label_gotos_mut(&mut s.then_block, f);
                if let Some(block) = &mut s.else_block {
                    label_gotos_mut(block, f);
                }
            }
            Stmt::GotoLabel(_) => f(stmt),
            _ => {}
        }
    }
}
