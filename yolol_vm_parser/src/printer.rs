//! Compact YOLOL printer
//!
//! Statements are separated by a single space. Inside a statement, tokens
//! are only separated where they would otherwise lex as one token, and
//! parentheses only appear where precedence requires them. The output
//! re-parses to the same tree.

use thiserror::Error;

use crate::ast::yolol::{Line, Program};
use crate::ast::{Expr, Stmt};
use crate::span::Span;

/// Error returned when a node has no YOLOL form
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PrintError {
    #[error("{construct} cannot be printed as YOLOL at {span}")]
    Unsupported {
        construct: &'static str,
        span: Span,
    },
}

impl PrintError {
    pub fn span(&self) -> &Span {
        match self {
            PrintError::Unsupported { span, .. } => span,
        }
    }
}

/// Goto target printed for unresolved labels when measuring line lengths
const MEASURE_PLACEHOLDER: &str = "99";

/// YOLOL printer
#[derive(Debug, Clone, Copy, Default)]
pub struct Printer {
    measuring: bool,
}

impl Printer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A printer that accepts `goto label` and prints it with a two-digit
    /// placeholder, for computing the length a line will have once labels
    /// are resolved
    pub fn measuring() -> Self {
        Self { measuring: true }
    }

    /// Print a program, one line per physical line
    pub fn print(&self, program: &Program) -> Result<String, PrintError> {
        let mut out = String::new();
        for line in &program.lines {
            out.push_str(&self.print_line(line)?);
            out.push('\n');
        }
        Ok(out)
    }

    pub fn print_line(&self, line: &Line) -> Result<String, PrintError> {
        let mut writer = Writer::default();
        self.write_statements(&mut writer, &line.statements)?;
        if let Some(comment) = &line.comment {
            writer.separate();
            writer.raw("//");
            writer.raw(comment);
        }
        Ok(writer.out)
    }

    pub fn print_statements(&self, statements: &[Stmt]) -> Result<String, PrintError> {
        let mut writer = Writer::default();
        self.write_statements(&mut writer, statements)?;
        Ok(writer.out)
    }

    pub fn print_expr(&self, expr: &Expr) -> String {
        let mut writer = Writer::default();
        write_expr(&mut writer, expr);
        writer.out
    }

    fn write_statements(&self, w: &mut Writer, statements: &[Stmt]) -> Result<(), PrintError> {
        for stmt in statements {
            w.separate();
            self.write_statement(w, stmt)?;
        }
        Ok(())
    }

    fn write_statement(&self, w: &mut Writer, stmt: &Stmt) -> Result<(), PrintError> {
        match stmt {
            Stmt::Assignment(a) => {
                w.token(&a.variable);
                w.token(a.op.symbol());
                write_expr(w, &a.value);
            }
            Stmt::If(s) => {
                w.token("if");
                write_expr(w, &s.condition);
                w.token("then");
                self.write_statements(w, &s.then_block)?;
                if let Some(else_block) = &s.else_block {
                    w.separate();
                    w.token("else");
                    self.write_statements(w, else_block)?;
                }
                w.separate();
                w.token("end");
            }
            Stmt::Goto(g) => {
                w.token("goto");
                write_expr(w, &g.line);
            }
            Stmt::GotoLabel(_) if self.measuring => {
                w.token("goto");
                w.token(MEASURE_PLACEHOLDER);
            }
            Stmt::GotoLabel(g) => {
                return Err(PrintError::Unsupported {
                    construct: "goto label",
                    span: g.span.clone(),
                })
            }
            Stmt::Deref(d) => w.token(&deref_text(d)),
            Stmt::Break(c) => {
                return Err(PrintError::Unsupported {
                    construct: "break",
                    span: c.span.clone(),
                })
            }
            Stmt::Continue(c) => {
                return Err(PrintError::Unsupported {
                    construct: "continue",
                    span: c.span.clone(),
                })
            }
        }
        Ok(())
    }
}

fn deref_text(d: &crate::ast::Dereference) -> String {
    match d.op {
        None => d.variable.clone(),
        Some(op) if op.is_prefix() => format!("{}{}", op.symbol(), d.variable),
        Some(op) => format!("{}{}", d.variable, op.symbol()),
    }
}

fn write_expr(w: &mut Writer, expr: &Expr) {
    match expr {
        Expr::StringConst(s) => w.token(&format!("\"{}\"", s.value)),
        Expr::NumberConst(n) => w.token(&n.value),
        Expr::Deref(d) => w.token(&deref_text(d)),
        Expr::Unary(u) => {
            let parens = u.operand.precedence() < u.op.operand_precedence();
            if u.op.is_postfix() {
                write_operand(w, &u.operand, parens);
                w.token(u.op.symbol());
            } else {
                w.token(u.op.symbol());
                write_operand(w, &u.operand, parens);
            }
        }
        Expr::Binary(b) => {
            let precedence = b.op.precedence();
            write_operand(w, &b.lhs, b.lhs.precedence() < precedence);
            w.token(b.op.symbol());
            write_operand(w, &b.rhs, b.rhs.precedence() <= precedence);
        }
        Expr::FuncCall(call) => {
            w.token(&call.name);
            w.token("(");
            for (i, arg) in call.args.iter().enumerate() {
                if i > 0 {
                    w.token(",");
                }
                write_expr(w, arg);
            }
            w.token(")");
        }
    }
}

fn write_operand(w: &mut Writer, expr: &Expr, parens: bool) {
    if parens {
        w.token("(");
        write_expr(w, expr);
        w.token(")");
    } else {
        write_expr(w, expr);
    }
}

/// Output buffer that inserts a space only where two tokens would merge
#[derive(Debug, Default)]
struct Writer {
    out: String,
}

impl Writer {
    fn token(&mut self, text: &str) {
        if let (Some(prev), Some(next)) = (self.out.chars().last(), text.chars().next()) {
            if needs_space(prev, next) {
                self.out.push(' ');
            }
        }
        self.out.push_str(text);
    }

    fn raw(&mut self, text: &str) {
        self.out.push_str(text);
    }

    /// Statement separator
    fn separate(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with(' ') {
            self.out.push(' ');
        }
    }
}

fn needs_space(prev: char, next: char) -> bool {
    let word = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == ':' || c == '.';
    (word(prev) && word(next))
        || (matches!(prev, '+' | '-') && matches!(next, '+' | '-'))
        || (prev == '!' && next == '=')
}
