//! Lowering of the constructs YOLOL does not have
//!
//! Builtin function calls become unary operators and `time()` reads the
//! line counter. Multi-line `if`, `while` and `wait` become flat
//! statements: an inline `if` when the whole construct fits on one line,
//! labels and gotos otherwise. `break` and `continue` become gotos to the
//! labels of the innermost loop.

use std::convert::Infallible;

use tracing::debug;
use yolol_vm_parser::ast::nolol::{Block, Element, MultilineIf, StatementLine, WaitDirective, WhileLoop};
use yolol_vm_parser::ast::{Expr, FuncCall, IfStmt, Stmt, UnaryOp};
use yolol_vm_parser::{NodeMut, Phase, Printer, Span, Visit, Visitor};

use super::{Context, Expanded, Lowered, TIME_VARIABLE};
use crate::error::{ConvertError, ConvertErrors};
use crate::optimizers::{
    apply, constant_value, ExpressionInversionOptimizer, StaticExpressionOptimizer,
    VariableNameOptimizer,
};

pub(crate) fn lower(
    ctx: &mut Context<'_>,
    Expanded(mut program): Expanded,
) -> Result<Lowered, ConvertErrors> {
    let mut functions = FunctionLowering::default();
    apply(&mut program, &mut functions);
    functions.errors.into_result()?;
    ctx.uses_time = functions.uses_time;

    // Before the structure is lowered, so that the inline forms are
    // measured with their final expressions and names
    if ctx.options.fold_constants {
        apply(&mut program, &mut StaticExpressionOptimizer::new());
    }
    apply(&mut program, &mut ExpressionInversionOptimizer);
    if ctx.options.shorten_variable_names {
        let mut names = VariableNameOptimizer::new();
        apply(&mut program, &mut names);
        ctx.translations = names.into_translations();
    }

    let mut structure = StructureLowering {
        ctx: &mut *ctx,
        loops: Vec::new(),
        errors: ConvertErrors::new(),
    };
    apply(&mut program, &mut structure);
    structure.errors.into_result()?;

    // Generated conditions are `not c`
    if ctx.options.fold_constants {
        apply(&mut program, &mut StaticExpressionOptimizer::new());
    }
    apply(&mut program, &mut ExpressionInversionOptimizer);

    let lines: Vec<StatementLine> = program
        .elements
        .into_iter()
        .filter_map(|element| match element {
            Element::Line(line) => Some(line),
            _ => None,
        })
        .collect();
    debug!(lines = lines.len(), uses_time = ctx.uses_time, "constructs lowered");
    Ok(Lowered(lines))
}

/// Builtin calls and `time()`
#[derive(Default)]
struct FunctionLowering {
    uses_time: bool,
    errors: ConvertErrors,
}

impl FunctionLowering {
    fn argument_count(&mut self, call: &FuncCall, expected: usize) -> bool {
        if call.args.len() == expected {
            return true;
        }
        self.errors.push(ConvertError::FunctionArgumentCount {
            name: call.name.clone(),
            expected,
            found: call.args.len(),
            span: call.span.clone(),
        });
        false
    }

    fn lower(&mut self, call: &mut FuncCall) -> Option<Expr> {
        if call.name.eq_ignore_ascii_case("time") {
            if !self.argument_count(call, 0) {
                return None;
            }
            self.uses_time = true;
            return Some(Expr::var(TIME_VARIABLE, call.span.clone()));
        }
        let Some(op) = UnaryOp::from_function_name(&call.name) else {
            self.errors.push(ConvertError::UnknownFunction {
                name: call.name.clone(),
                span: call.span.clone(),
            });
            return None;
        };
        if !self.argument_count(call, 1) {
            return None;
        }
        let operand = call.args.pop()?;
        let mut lowered = Expr::unary(op, operand);
        *lowered.span_mut() = call.span.clone();
        Some(lowered)
    }
}

impl Visitor for FunctionLowering {
    type Error = Infallible;

    fn visit(&mut self, node: NodeMut<'_>, phase: Phase) -> Result<Visit, Infallible> {
        if let (NodeMut::Expr(Expr::FuncCall(call)), Phase::Post) = (node, phase) {
            if let Some(lowered) = self.lower(call) {
                return Ok(Visit::with(lowered));
            }
        }
        Ok(Visit::Continue)
    }
}

struct LoopLabels {
    start: String,
    end: String,
}

/// Runs after the children of a construct are lowered, so the blocks of the
/// construct only hold statement lines by then
struct StructureLowering<'c, 'a> {
    ctx: &'c mut Context<'a>,
    /// Innermost loop last
    loops: Vec<LoopLabels>,
    errors: ConvertErrors,
}

impl StructureLowering<'_, '_> {
    fn fits(&self, statements: &[Stmt]) -> bool {
        Printer::measuring()
            .print_statements(statements)
            .map(|line| line.len() <= self.ctx.line_budget())
            .unwrap_or(false)
    }

    fn lower_if(&mut self, mif: &mut MultilineIf) -> Vec<StatementLine> {
        let span = mif.span.clone();
        let blocks: Vec<Vec<StatementLine>> = mif.blocks.iter_mut().map(take_lines).collect();
        let else_lines = mif.else_block.as_mut().map(take_lines);

        if let Some(stmt) = self.inline_if(&mif.conditions, &blocks, else_lines.as_deref(), &span) {
            return vec![StatementLine::new(vec![stmt], span)];
        }

        let id = self.ctx.next_id();
        let end = format!("_if{}_end", id);
        let branches = mif.conditions.len();
        let mut lines = Vec::new();
        for (i, (condition, block)) in mif.conditions.iter().zip(blocks).enumerate() {
            let next = if i + 1 < branches || else_lines.is_some() {
                format!("_if{}_else{}", id, i + 1)
            } else {
                end.clone()
            };
            let check = skip_unless(condition, &next);
            lines.push(match i {
                0 => StatementLine::new(vec![check], span.clone()),
                _ => StatementLine::labeled(format!("_if{}_else{}", id, i), vec![check], span.clone()),
            });
            lines.extend(block);
            if next != end {
                lines.push(StatementLine::new(vec![Stmt::goto_label(&end, span.clone())], span.clone()));
            }
        }
        if let Some(block) = else_lines {
            lines.push(StatementLine::labeled(
                format!("_if{}_else{}", id, branches),
                Vec::new(),
                span.clone(),
            ));
            lines.extend(block);
        }
        lines.push(StatementLine::labeled(end, Vec::new(), span));
        lines
    }

    /// `if c1 then B1 else if c2 then B2 else B3 end end`, if it fits
    fn inline_if(
        &self,
        conditions: &[Expr],
        blocks: &[Vec<StatementLine>],
        else_lines: Option<&[StatementLine]>,
        span: &Span,
    ) -> Option<Stmt> {
        let mut else_block = match else_lines {
            Some(lines) => Some(plain_statements(lines)?),
            None => None,
        };
        for (condition, block) in conditions.iter().zip(blocks).rev() {
            let stmt = Stmt::If(IfStmt {
                condition: condition.clone(),
                then_block: plain_statements(block)?,
                else_block,
                span: span.clone(),
            });
            else_block = Some(vec![stmt]);
        }
        let stmt = else_block?.pop()?;
        self.fits(std::slice::from_ref(&stmt)).then_some(stmt)
    }

    fn lower_while(&mut self, w: &mut WhileLoop, labels: LoopLabels) -> Vec<StatementLine> {
        let span = w.span.clone();
        let body = take_lines(&mut w.block);
        let LoopLabels { start, end } = labels;
        let jump_back = StatementLine::new(vec![Stmt::goto_label(&start, span.clone())], span.clone());
        let end_line = StatementLine::labeled(&end, Vec::new(), span.clone());

        let forever = constant_value(&w.condition)
            .and_then(|value| value.truthy().ok())
            .unwrap_or(false);
        if forever {
            let mut lines = vec![StatementLine::labeled(&start, Vec::new(), span.clone())];
            lines.extend(body);
            lines.push(jump_back);
            lines.push(end_line);
            return lines;
        }

        if let Some(mut statements) = plain_statements(&body) {
            statements.push(Stmt::goto_label(&start, span.clone()));
            let stmt = Stmt::If(IfStmt {
                condition: w.condition.clone(),
                then_block: statements,
                else_block: None,
                span: span.clone(),
            });
            if self.fits(std::slice::from_ref(&stmt)) {
                return vec![StatementLine::labeled(&start, vec![stmt], span), end_line];
            }
        }

        let mut lines = vec![StatementLine::labeled(
            &start,
            vec![skip_unless(&w.condition, &end)],
            span,
        )];
        lines.extend(body);
        lines.push(jump_back);
        lines.push(end_line);
        lines
    }

    fn lower_wait(&mut self, wait: &WaitDirective) -> StatementLine {
        let label = format!("_wait{}", self.ctx.next_id());
        let stmt = Stmt::If(IfStmt {
            condition: wait.condition.clone(),
            then_block: vec![Stmt::goto_label(&label, wait.span.clone())],
            else_block: None,
            span: wait.span.clone(),
        });
        StatementLine::labeled(label, vec![stmt], wait.span.clone())
    }

    fn loop_jump(&mut self, stmt: &Stmt) -> Visit {
        let (target, error) = match stmt {
            Stmt::Break(b) => (
                self.loops.last().map(|l| l.end.clone()),
                ConvertError::BreakOutsideLoop { span: b.span.clone() },
            ),
            Stmt::Continue(c) => (
                self.loops.last().map(|l| l.start.clone()),
                ConvertError::ContinueOutsideLoop { span: c.span.clone() },
            ),
            _ => return Visit::Continue,
        };
        match target {
            Some(label) => Visit::with(Stmt::goto_label(label, stmt.span().clone())),
            None => {
                self.errors.push(error);
                Visit::remove()
            }
        }
    }
}

impl Visitor for StructureLowering<'_, '_> {
    type Error = Infallible;

    fn visit(&mut self, node: NodeMut<'_>, phase: Phase) -> Result<Visit, Infallible> {
        let lines = match (node, phase) {
            (NodeMut::Element(Element::While(_)), Phase::Pre) => {
                let id = self.ctx.next_id();
                self.loops.push(LoopLabels {
                    start: format!("_while{}", id),
                    end: format!("_while{}_end", id),
                });
                return Ok(Visit::Continue);
            }
            (NodeMut::Element(Element::While(w)), Phase::Post) => {
                let Some(labels) = self.loops.pop() else {
                    return Ok(Visit::Continue);
                };
                self.lower_while(w, labels)
            }
            (NodeMut::Element(Element::If(mif)), Phase::Post) => self.lower_if(mif),
            (NodeMut::Element(Element::Wait(wait)), Phase::Post) => vec![self.lower_wait(wait)],
            (NodeMut::Stmt(stmt), Phase::Single) => return Ok(self.loop_jump(stmt)),
            _ => return Ok(Visit::Continue),
        };
        Ok(Visit::replace_skip(lines.into_iter().map(Element::Line)))
    }
}

/// `if not condition then goto label end`
fn skip_unless(condition: &Expr, label: &str) -> Stmt {
    let span = condition.span().clone();
    Stmt::If(IfStmt {
        condition: Expr::unary(UnaryOp::Not, condition.clone()),
        then_block: vec![Stmt::goto_label(label, span.clone())],
        else_block: None,
        span,
    })
}

/// The statement lines of an already lowered block
fn take_lines(block: &mut Block) -> Vec<StatementLine> {
    std::mem::take(&mut block.elements)
        .into_iter()
        .filter_map(|element| match element {
            Element::Line(line) => Some(line),
            _ => None,
        })
        .collect()
}

/// All statements of `lines`, if none of them has to start or end a line
fn plain_statements(lines: &[StatementLine]) -> Option<Vec<Stmt>> {
    let mut statements = Vec::new();
    for line in lines {
        if line.label.is_some() || line.has_bol || line.has_eol {
            return None;
        }
        statements.extend(line.statements.iter().cloned());
    }
    Some(statements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConvertOptions;
    use crate::include::MemoryFileSystem;
    use yolol_vm_parser::parse_nolol;

    fn lower_with(options: ConvertOptions, source: &str) -> Result<Vec<String>, ConvertErrors> {
        let fs = MemoryFileSystem::new();
        let mut ctx = Context::new(&options, &fs);
        let Lowered(lines) = lower(&mut ctx, Expanded(parse_nolol(source).unwrap()))?;
        Ok(lines
            .iter()
            .map(|line| {
                let statements = Printer::measuring().print_statements(&line.statements).unwrap();
                match &line.label {
                    Some(label) => format!("{}> {}", label, statements).trim_end().to_string(),
                    None => statements,
                }
            })
            .collect())
    }

    fn lower_source(source: &str) -> Vec<String> {
        lower_with(ConvertOptions::default().with_shorten_variable_names(false), source).unwrap()
    }

    #[test]
    fn test_builtin_calls_become_operators() {
        assert_eq!(lower_source("a = abs(b) + sqrt(c)"), vec!["a=abs b+sqrt c"]);
    }

    #[test]
    fn test_function_errors() {
        let options = ConvertOptions::default();
        let errors = lower_with(options, "a = frobnicate(1)\nc = time(3)").unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors.errors()[0], ConvertError::UnknownFunction { .. }));
        assert!(matches!(
            errors.errors()[1],
            ConvertError::FunctionArgumentCount { expected: 0, found: 3, .. }
        ));
    }

    #[test]
    fn test_time_reads_the_line_counter() {
        assert_eq!(lower_source("a = time()"), vec!["a=_nolol_time"]);
    }

    #[test]
    fn test_small_if_is_inlined() {
        let source = "if a > 1 then\nb = 1\nelse if a < 0 then\nb = 2\nelse\nb = 3\nend";
        assert_eq!(
            lower_source(source),
            vec!["if a>1 then b=1 else if a<0 then b=2 else b=3 end end"]
        );
    }

    #[test]
    fn test_large_if_becomes_goto_chain() {
        let long = "x = \"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\"";
        let source = format!("if a then\n{}\nelse if b then\ny = 2\nelse\ny = 3\nend", long);
        let lines = lower_source(&source);
        assert_eq!(
            lines,
            vec![
                "if not a then goto 99 end".to_string(),
                long.replace(' ', ""),
                "goto 99".to_string(),
                "_if1_else1> if not b then goto 99 end".to_string(),
                "y=2".to_string(),
                "goto 99".to_string(),
                "_if1_else2>".to_string(),
                "y=3".to_string(),
                "_if1_end>".to_string(),
            ]
        );
    }

    #[test]
    fn test_small_while_is_inlined() {
        assert_eq!(
            lower_source("while i < 10 do\ni++\nend"),
            vec!["_while1> if i<10 then i++ goto 99 end", "_while1_end>"]
        );
    }

    #[test]
    fn test_infinite_loop_has_no_condition_check() {
        assert_eq!(
            lower_source("while 1 do\ni++\nif i > 5 then break end\nend"),
            vec!["_while1>", "i++", "if i>5 then goto 99 end", "goto 99", "_while1_end>"]
        );
    }

    #[test]
    fn test_large_while_uses_labels() {
        let source = "while i < 10 do\nstart> i++\ncontinue\nend";
        assert_eq!(
            lower_source(source),
            vec![
                "_while1> if i>=10 then goto 99 end",
                "start> i++",
                "goto 99",
                "goto 99",
                "_while1_end>",
            ]
        );
    }

    #[test]
    fn test_wait() {
        assert_eq!(
            lower_source("wait :busy == 1"),
            vec!["_wait1> if :busy==1 then goto 99 end"]
        );
    }

    #[test]
    fn test_break_outside_loop() {
        let errors = lower_with(ConvertOptions::default(), "a = 1; break\ncontinue").unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors.errors()[0], ConvertError::BreakOutsideLoop { .. }));
        assert!(matches!(errors.errors()[1], ConvertError::ContinueOutsideLoop { .. }));
    }

    #[test]
    fn test_variables_are_shortened() {
        let options = ConvertOptions::default();
        let lines = lower_with(options, "counter = 1\nwhile counter < 10 do\ncounter++\nend").unwrap();
        assert_eq!(lines, vec!["a=1", "_while1> if a<10 then a++ goto 99 end", "_while1_end>"]);
    }
}
