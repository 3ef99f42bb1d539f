//! Removes `not` by inverting the expression it applies to

use std::convert::Infallible;

use yolol_vm_parser::ast::{BinaryOp, Expr, UnaryOp};
use yolol_vm_parser::{NodeMut, Phase, Visit, Visitor};

/// Rewrites `not` expressions into shorter equivalents:
///
/// - `not a == b` becomes `a != b` (and likewise for every comparison)
/// - `not not c` becomes `c` when `c` already yields 0 or 1
/// - `not (a < b and c > d)` becomes `a >= b or c <= d` (De Morgan), but
///   only when both sides can be inverted without a `not`
#[derive(Debug, Default, Clone, Copy)]
pub struct ExpressionInversionOptimizer;

impl Visitor for ExpressionInversionOptimizer {
    type Error = Infallible;

    fn visit(&mut self, node: NodeMut<'_>, phase: Phase) -> Result<Visit, Infallible> {
        if phase != Phase::Post {
            return Ok(Visit::Continue);
        }
        if let NodeMut::Expr(Expr::Unary(u)) = node {
            if u.op == UnaryOp::Not {
                if let Some(inverted) = invert(&u.operand) {
                    return Ok(Visit::with(inverted));
                }
            }
        }
        Ok(Visit::Continue)
    }
}

/// Logical negation of `expr` without a leading `not`, if there is one
fn invert(expr: &Expr) -> Option<Expr> {
    match expr {
        Expr::Binary(b) => {
            if let Some(op) = b.op.inverted_comparison() {
                let mut inverted = b.clone();
                inverted.op = op;
                return Some(Expr::Binary(inverted));
            }
            let op = match b.op {
                BinaryOp::And => BinaryOp::Or,
                BinaryOp::Or => BinaryOp::And,
                _ => return None,
            };
            let lhs = invert(&b.lhs)?;
            let rhs = invert(&b.rhs)?;
            let mut inverted = Expr::binary(op, lhs, rhs);
            *inverted.span_mut() = b.span.clone();
            Some(inverted)
        }
        Expr::Unary(u) if u.op == UnaryOp::Not && is_boolean(&u.operand) => {
            Some((*u.operand).clone())
        }
        _ => None,
    }
}

/// Expressions whose value is always 0 or 1
fn is_boolean(expr: &Expr) -> bool {
    match expr {
        Expr::Binary(b) => {
            b.op.is_comparison() || matches!(b.op, BinaryOp::And | BinaryOp::Or)
        }
        Expr::Unary(u) => u.op == UnaryOp::Not,
        _ => false,
    }
}
