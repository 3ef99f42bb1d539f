use thiserror::Error;
use yolol_vm_parser::Span;

use crate::value::ValueError;

/// An error raised while the VM executes a line
#[derive(Error, Debug, Clone, PartialEq)]
#[error("runtime error in line {line} at {span}: {message}")]
pub struct RuntimeError {
    pub message: String,
    pub span: Span,
    /// 1-based program line that was executing
    pub line: usize,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>, span: Span, line: usize) -> Self {
        Self {
            message: message.into(),
            span,
            line,
        }
    }

    pub fn from_value_error(error: ValueError, span: &Span, line: usize) -> Self {
        Self::new(error.to_string(), span.clone(), line)
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}
