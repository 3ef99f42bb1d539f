//! Abstract syntax trees for YOLOL and NOLOL
//!
//! Expressions and statements are shared. The two languages differ only in
//! their top-level structure: YOLOL programs are flat lists of lines, NOLOL
//! programs are (recursively nested) lists of elements.

mod expr;
pub mod nolol;
mod stmt;
pub mod yolol;

pub use expr::{
    is_global, BinaryOp, BinaryOperation, DerefOp, Dereference, Expr, FuncCall, NumberConst,
    StringConst, UnaryOp, UnaryOperation,
};
pub use stmt::{AssignOp, Assignment, GotoLabel, GotoStmt, IfStmt, LoopControl, Stmt};
