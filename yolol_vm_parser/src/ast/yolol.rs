//! Flat-language (YOLOL) program structure

use serde::{Deserialize, Serialize};

use super::stmt::Stmt;
use crate::span::Span;

/// A YOLOL program: an ordered list of physical lines
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub lines: Vec<Line>,
}

/// One physical line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub statements: Vec<Stmt>,
    /// Comment text after `//`, without the slashes
    pub comment: Option<String>,
    pub span: Span,
}

impl Line {
    pub fn new(statements: Vec<Stmt>, span: Span) -> Self {
        Self {
            statements,
            comment: None,
            span,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty() && self.comment.is_none()
    }
}

impl Program {
    pub fn new(lines: Vec<Line>) -> Self {
        Self { lines }
    }

    pub fn span(&self) -> Span {
        match (self.lines.first(), self.lines.last()) {
            (Some(first), Some(last)) => first.span.merge(&last.span),
            _ => Span::empty(),
        }
    }
}
