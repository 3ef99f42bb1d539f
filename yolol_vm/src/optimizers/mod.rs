//! Tree-rewriting optimizers
//!
//! Each optimizer is a [`Visitor`] and works on any tree the visitor engine
//! can walk, so the converter runs them on NOLOL elements as well as on
//! finished YOLOL programs.

mod comments;
mod cse;
mod inversion;
mod static_expr;
mod var_names;

use std::collections::BTreeMap;
use std::convert::Infallible;

use yolol_vm_parser::ast::yolol::Program;
use yolol_vm_parser::{walk, Accept, Visitor};

pub(crate) use static_expr::constant_value;

pub use comments::CommentRemover;
pub use cse::CommonSubexpressionOptimizer;
pub use inversion::ExpressionInversionOptimizer;
pub use static_expr::StaticExpressionOptimizer;
pub use var_names::{is_reserved_name, VariableNameOptimizer};

/// Run an optimizer that cannot fail
pub fn apply<N: Accept, V: Visitor<Error = Infallible>>(root: &mut N, optimizer: &mut V) {
    if let Err(never) = walk(root, optimizer) {
        match never {}
    }
}

/// Optimize a finished YOLOL program in place.
///
/// Returns the variable renaming table (original name to new name).
pub fn optimize_program(program: &mut Program) -> BTreeMap<String, String> {
    apply(program, &mut CommentRemover);
    apply(program, &mut StaticExpressionOptimizer::new());
    apply(program, &mut ExpressionInversionOptimizer);
    apply(program, &mut CommonSubexpressionOptimizer::new());
    let mut names = VariableNameOptimizer::new();
    apply(program, &mut names);
    names.into_translations()
}
