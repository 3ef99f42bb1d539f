//! Higher-level language (NOLOL) program structure
//!
//! A NOLOL program is a list of elements. Block constructs (multi-line if,
//! while, macro bodies) nest further elements, so the tree is recursive.

use serde::{Deserialize, Serialize};

use super::expr::Expr;
use super::stmt::Stmt;
use crate::span::Span;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Element {
    Line(StatementLine),
    If(MultilineIf),
    While(WhileLoop),
    Wait(WaitDirective),
    Include(IncludeDirective),
    Define(Definition),
    Macro(MacroDefinition),
    Insert(MacroInsertion),
}

/// `[$] [label>] stmt; stmt [$] [// comment]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementLine {
    pub label: Option<String>,
    /// Must start a new physical line
    pub has_bol: bool,
    /// Nothing may be merged after this line
    pub has_eol: bool,
    pub statements: Vec<Stmt>,
    pub comment: Option<String>,
    pub span: Span,
}

impl StatementLine {
    pub fn new(statements: Vec<Stmt>, span: Span) -> Self {
        Self {
            label: None,
            has_bol: false,
            has_eol: false,
            statements,
            comment: None,
            span,
        }
    }

    pub fn labeled(label: impl Into<String>, statements: Vec<Stmt>, span: Span) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::new(statements, span)
        }
    }

    pub fn with_eol(mut self) -> Self {
        self.has_eol = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub elements: Vec<Element>,
    pub span: Span,
}

/// `if c then ... else if c then ... else ... end`, spanning several lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultilineIf {
    /// One condition per `if` / `else if` branch
    pub conditions: Vec<Expr>,
    /// Parallel to `conditions`
    pub blocks: Vec<Block>,
    pub else_block: Option<Block>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhileLoop {
    pub condition: Expr,
    pub block: Block,
    pub span: Span,
}

/// `wait cond`: spin on the current line while the condition holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitDirective {
    pub condition: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncludeDirective {
    pub file: String,
    pub span: Span,
}

/// `define name = expr` or `define name(a, b) = expr`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    pub name: String,
    pub placeholders: Vec<String>,
    pub value: Expr,
    pub span: Span,
}

/// `macro name(args) <externals>` ... `end`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroDefinition {
    pub name: String,
    pub arguments: Vec<String>,
    pub externals: Vec<String>,
    pub block: Block,
    pub span: Span,
}

/// `insert name(args)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroInsertion {
    pub name: String,
    pub arguments: Vec<Expr>,
    pub span: Span,
}

impl Element {
    pub fn span(&self) -> &Span {
        match self {
            Element::Line(e) => &e.span,
            Element::If(e) => &e.span,
            Element::While(e) => &e.span,
            Element::Wait(e) => &e.span,
            Element::Include(e) => &e.span,
            Element::Define(e) => &e.span,
            Element::Macro(e) => &e.span,
            Element::Insert(e) => &e.span,
        }
    }

    pub fn span_mut(&mut self) -> &mut Span {
        match self {
            Element::Line(e) => &mut e.span,
            Element::If(e) => &mut e.span,
            Element::While(e) => &mut e.span,
            Element::Wait(e) => &mut e.span,
            Element::Include(e) => &mut e.span,
            Element::Define(e) => &mut e.span,
            Element::Macro(e) => &mut e.span,
            Element::Insert(e) => &mut e.span,
        }
    }
}

impl Program {
    pub fn new(elements: Vec<Element>) -> Self {
        Self { elements }
    }
}
