//! Errors reported by the NOLOL to YOLOL converter

use thiserror::Error;
use yolol_vm_parser::{ParseErrors, PrintError, Span};

/// A single conversion failure, tagged with the source position it refers to
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    #[error("failed to parse {file}: {errors}")]
    Parse { file: String, errors: ParseErrors },

    #[error("included file '{file}' not found at {span}")]
    FileNotFound { file: String, span: Span },

    #[error("could not read included file '{file}' at {span}: {message}")]
    IncludeFailed {
        file: String,
        message: String,
        span: Span,
    },

    #[error("include loop detected at {span}")]
    IncludeLoop { span: Span },

    #[error("duplicate label '{label}' at {second}, first declared at {first}")]
    DuplicateLabel {
        label: String,
        first: Span,
        second: Span,
    },

    #[error("unknown label '{label}' at {span}")]
    UnknownLabel { label: String, span: Span },

    #[error("unknown macro '{name}' at {span}")]
    UnknownMacro { name: String, span: Span },

    #[error("macro insertion loop detected while inserting '{name}' at {span}")]
    MacroLoop { name: String, span: Span },

    #[error("macro '{name}' takes {expected} arguments but {found} were given at {span}")]
    MacroArgumentCount {
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("cannot assign to definition '{name}' at {span}")]
    DefinitionAssignment { name: String, span: Span },

    #[error("unknown function '{name}' at {span}")]
    UnknownFunction { name: String, span: Span },

    #[error("function '{name}' takes {expected} arguments but {found} were given at {span}")]
    FunctionArgumentCount {
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("break outside of a loop at {span}")]
    BreakOutsideLoop { span: Span },

    #[error("continue outside of a loop at {span}")]
    ContinueOutsideLoop { span: Span },

    #[error("line {line} is {length} characters long, the limit is {max} (at {span})")]
    LineTooLong {
        line: usize,
        length: usize,
        max: usize,
        span: Span,
    },

    #[error("program has {lines} lines, the limit is {max}")]
    ProgramTooLong { lines: usize, max: usize, span: Span },

    #[error(transparent)]
    Print(#[from] PrintError),
}

impl ConvertError {
    /// Position of the offending source
    pub fn span(&self) -> Span {
        match self {
            ConvertError::Parse { errors, .. } => errors
                .first()
                .map(|e| e.span().clone())
                .unwrap_or_default(),
            ConvertError::FileNotFound { span, .. }
            | ConvertError::IncludeFailed { span, .. }
            | ConvertError::IncludeLoop { span }
            | ConvertError::UnknownLabel { span, .. }
            | ConvertError::UnknownMacro { span, .. }
            | ConvertError::MacroLoop { span, .. }
            | ConvertError::MacroArgumentCount { span, .. }
            | ConvertError::DefinitionAssignment { span, .. }
            | ConvertError::UnknownFunction { span, .. }
            | ConvertError::FunctionArgumentCount { span, .. }
            | ConvertError::BreakOutsideLoop { span }
            | ConvertError::ContinueOutsideLoop { span }
            | ConvertError::LineTooLong { span, .. }
            | ConvertError::ProgramTooLong { span, .. } => span.clone(),
            ConvertError::DuplicateLabel { second, .. } => second.clone(),
            ConvertError::Print(e) => e.span().clone(),
        }
    }
}

/// Every error found by the pass that failed, in source order
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConvertErrors {
    errors: Vec<ConvertError>,
}

impl ConvertErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn push(&mut self, error: ConvertError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[ConvertError] {
        &self.errors
    }

    pub fn first(&self) -> Option<&ConvertError> {
        self.errors.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConvertError> {
        self.errors.iter()
    }

    /// `Ok(())` when nothing was collected
    pub fn into_result(self) -> Result<(), ConvertErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<ConvertError> for ConvertErrors {
    fn from(error: ConvertError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl From<PrintError> for ConvertErrors {
    fn from(error: PrintError) -> Self {
        ConvertError::from(error).into()
    }
}

impl std::fmt::Display for ConvertErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", e)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConvertErrors {}

impl Extend<ConvertError> for ConvertErrors {
    fn extend<I: IntoIterator<Item = ConvertError>>(&mut self, iter: I) {
        self.errors.extend(iter);
    }
}

impl IntoIterator for ConvertErrors {
    type Item = ConvertError;
    type IntoIter = std::vec::IntoIter<ConvertError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ConvertErrors {
    type Item = &'a ConvertError;
    type IntoIter = std::slice::Iter<'a, ConvertError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
