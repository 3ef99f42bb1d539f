//! Constant folding

use std::convert::Infallible;

use yolol_vm_parser::ast::{Expr, Stmt};
use yolol_vm_parser::{NodeMut, Phase, Span, Visit, Visitor};

use crate::number::Number;
use crate::value::Value;

/// Evaluates operators whose operands are all constants, and resolves
/// inline `if` statements whose condition is a constant number. An `if`
/// with no statements in either branch is dropped unless its condition
/// increments or decrements a variable.
///
/// Operations that would fail at runtime (division by zero, string
/// operators that do not exist) are left alone so the error still happens
/// when the program runs.
#[derive(Debug, Default)]
pub struct StaticExpressionOptimizer {
    folded: usize,
}

impl StaticExpressionOptimizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes replaced so far
    pub fn folded(&self) -> usize {
        self.folded
    }
}

impl Visitor for StaticExpressionOptimizer {
    type Error = Infallible;

    fn visit(&mut self, node: NodeMut<'_>, phase: Phase) -> Result<Visit, Infallible> {
        if phase != Phase::Post {
            return Ok(Visit::Continue);
        }
        match node {
            NodeMut::Expr(expr) => match fold_expr(expr) {
                Some(folded) => {
                    self.folded += 1;
                    Ok(Visit::with(folded))
                }
                None => Ok(Visit::Continue),
            },
            NodeMut::Stmt(Stmt::If(stmt)) => {
                let Some(condition) = constant_value(&stmt.condition) else {
                    let empty = stmt.then_block.is_empty()
                        && stmt.else_block.as_deref().unwrap_or_default().is_empty();
                    if empty && !writes_variables(&stmt.condition) {
                        self.folded += 1;
                        return Ok(Visit::replace_skip(Vec::<Stmt>::new()));
                    }
                    return Ok(Visit::Continue);
                };
                let Ok(truthy) = condition.truthy() else {
                    return Ok(Visit::Continue);
                };
                self.folded += 1;
                let branch = if truthy {
                    std::mem::take(&mut stmt.then_block)
                } else {
                    stmt.else_block.take().unwrap_or_default()
                };
                Ok(Visit::replace_skip(branch))
            }
            _ => Ok(Visit::Continue),
        }
    }
}

/// Whether evaluating `expr` increments or decrements a variable
fn writes_variables(expr: &Expr) -> bool {
    match expr {
        Expr::Deref(deref) => deref.op.is_some(),
        Expr::Unary(u) => writes_variables(&u.operand),
        Expr::Binary(b) => writes_variables(&b.lhs) || writes_variables(&b.rhs),
        Expr::FuncCall(_) => true,
        Expr::NumberConst(_) | Expr::StringConst(_) => false,
    }
}

/// The value of a constant expression node
pub(crate) fn constant_value(expr: &Expr) -> Option<Value> {
    match expr {
        Expr::NumberConst(n) => n.value.parse::<Number>().ok().map(Value::Number),
        Expr::StringConst(s) => Some(Value::String(s.value.clone())),
        _ => None,
    }
}

/// Constant node holding `value`
pub(crate) fn constant_expr(value: Value, span: Span) -> Expr {
    match value {
        Value::Number(n) => Expr::number(n.to_string(), span),
        Value::String(s) => Expr::string(s, span),
    }
}

fn fold_expr(expr: &Expr) -> Option<Expr> {
    let value = match expr {
        Expr::Unary(u) => Value::unary(u.op, &constant_value(&u.operand)?).ok()?,
        Expr::Binary(b) => {
            let lhs = constant_value(&b.lhs)?;
            let rhs = constant_value(&b.rhs)?;
            Value::binary(b.op, &lhs, &rhs).ok()?
        }
        _ => return None,
    };
    Some(constant_expr(value, expr.span().clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizers::apply;
    use yolol_vm_parser::{parse_yolol, Printer};

    fn fold(source: &str) -> String {
        let mut program = parse_yolol(source).unwrap();
        apply(&mut program, &mut StaticExpressionOptimizer::new());
        Printer::new().print(&program).unwrap()
    }

    #[test]
    fn test_folds_nested_constants() {
        assert_eq!(fold("a = (1 + 2) * 3 - x"), "a=9-x\n");
        assert_eq!(fold("a = -(2 * 3)"), "a=-6\n");
        assert_eq!(fold("a = \"ab\" + 1 + 2"), "a=\"ab12\"\n");
        assert_eq!(fold("a = 10 / 4"), "a=2.5\n");
        assert_eq!(fold("a = not 0 and 1"), "a=1\n");
    }

    #[test]
    fn test_runtime_failures_are_not_folded() {
        assert_eq!(fold("a = 1 / 0"), "a=1/0\n");
        assert_eq!(fold("a = -\"x\""), "a=-\"x\"\n");
    }

    #[test]
    fn test_constant_if_picks_a_branch() {
        assert_eq!(fold("if 1 then a=1 else a=2 end b=1"), "a=1 b=1\n");
        assert_eq!(fold("if 0 == 1 then a=1 else a=2 end"), "a=2\n");
        assert_eq!(fold("if 0 then a=1 end b=2"), "b=2\n");
        assert_eq!(fold("if \"s\" then a=1 end"), "if \"s\" then a=1 end\n");
    }

    #[test]
    fn test_empty_if_is_dropped() {
        assert_eq!(fold("a=1 if x then end :done=1"), "a=1 :done=1\n");
        assert_eq!(fold("if x > 2 and y then else end b=1"), "b=1\n");
        assert_eq!(fold("if x++ then end"), "if x++ then end\n");
    }

    #[test]
    fn test_folding_is_idempotent() {
        let mut program = parse_yolol("a = 2 ^ 3 + b * (4 - 4)\nif 3 > 2 then goto 1 end").unwrap();
        apply(&mut program, &mut StaticExpressionOptimizer::new());
        let once = program.clone();
        let mut second = StaticExpressionOptimizer::new();
        apply(&mut program, &mut second);
        assert_eq!(program, once);
        assert_eq!(second.folded(), 0);
    }
}
