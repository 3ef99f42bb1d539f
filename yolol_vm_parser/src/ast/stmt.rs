//! Statement nodes shared by YOLOL and NOLOL

use serde::{Deserialize, Serialize};

use super::expr::{BinaryOp, Dereference, Expr};
use crate::span::Span;
use crate::token::Token;

/// A statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Assignment(Assignment),
    If(IfStmt),
    /// `goto <expr>`
    Goto(GotoStmt),
    /// `goto label`, NOLOL only
    GotoLabel(GotoLabel),
    /// Bare `x++` / `--x` used as a statement
    Deref(Dereference),
    /// NOLOL only
    Break(LoopControl),
    /// NOLOL only
    Continue(LoopControl),
}

/// Assignment operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl AssignOp {
    pub fn symbol(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Mod => "%=",
            AssignOp::Pow => "^=",
        }
    }

    /// The binary operator a compound assignment applies
    pub fn binary_op(self) -> Option<BinaryOp> {
        Some(match self {
            AssignOp::Assign => return None,
            AssignOp::Add => BinaryOp::Add,
            AssignOp::Sub => BinaryOp::Sub,
            AssignOp::Mul => BinaryOp::Mul,
            AssignOp::Div => BinaryOp::Div,
            AssignOp::Mod => BinaryOp::Mod,
            AssignOp::Pow => BinaryOp::Pow,
        })
    }

    pub(crate) fn from_token(token: Token) -> Option<AssignOp> {
        Some(match token {
            Token::Eq => AssignOp::Assign,
            Token::PlusEq => AssignOp::Add,
            Token::MinusEq => AssignOp::Sub,
            Token::StarEq => AssignOp::Mul,
            Token::SlashEq => AssignOp::Div,
            Token::PercentEq => AssignOp::Mod,
            Token::CaretEq => AssignOp::Pow,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub variable: String,
    pub op: AssignOp,
    pub value: Expr,
    pub span: Span,
}

/// Inline `if c then ... [else ...] end`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_block: Vec<Stmt>,
    pub else_block: Option<Vec<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GotoStmt {
    pub line: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GotoLabel {
    pub label: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopControl {
    pub span: Span,
}

impl Stmt {
    pub fn assign(variable: impl Into<String>, value: Expr) -> Stmt {
        let span = value.span().clone();
        Stmt::Assignment(Assignment {
            variable: variable.into(),
            op: AssignOp::Assign,
            value,
            span,
        })
    }

    pub fn goto_label(label: impl Into<String>, span: Span) -> Stmt {
        Stmt::GotoLabel(GotoLabel {
            label: label.into(),
            span,
        })
    }

    pub fn goto_line(line: usize, span: Span) -> Stmt {
        Stmt::Goto(GotoStmt {
            line: Expr::number(line.to_string(), span.clone()),
            span,
        })
    }

    pub fn span(&self) -> &Span {
        match self {
            Stmt::Assignment(s) => &s.span,
            Stmt::If(s) => &s.span,
            Stmt::Goto(s) => &s.span,
            Stmt::GotoLabel(s) => &s.span,
            Stmt::Deref(s) => &s.span,
            Stmt::Break(s) | Stmt::Continue(s) => &s.span,
        }
    }

    pub fn span_mut(&mut self) -> &mut Span {
        match self {
            Stmt::Assignment(s) => &mut s.span,
            Stmt::If(s) => &mut s.span,
            Stmt::Goto(s) => &mut s.span,
            Stmt::GotoLabel(s) => &mut s.span,
            Stmt::Deref(s) => &mut s.span,
            Stmt::Break(s) | Stmt::Continue(s) => &mut s.span,
        }
    }

    /// Unconditional jumps end the execution of a line
    pub fn is_goto(&self) -> bool {
        matches!(self, Stmt::Goto(_) | Stmt::GotoLabel(_))
    }

    /// Whether the statement has a form in the flat language
    pub fn is_yolol(&self) -> bool {
        match self {
            Stmt::GotoLabel(_) | Stmt::Break(_) | Stmt::Continue(_) => false,
            Stmt::If(s) => s
                .then_block
                .iter()
                .chain(s.else_block.iter().flatten())
                .all(Stmt::is_yolol),
            _ => true,
        }
    }
}
