//! Parse errors

use crate::span::Span;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("unexpected token '{found}' at {span}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: String,
        span: Span,
    },

    #[error("unexpected end of input at {span}, expected {expected}")]
    UnexpectedEof { expected: String, span: Span },

    /// A string literal that runs to the end of its line
    #[error("unterminated string literal starting at {span}")]
    UnterminatedString { span: Span },

    /// A number whose integer part does not fit the fixed-point range
    #[error("invalid number literal '{literal}' at {span}")]
    InvalidNumber { literal: String, span: Span },

    #[error("unrecognized token at {span}")]
    LexerError { span: Span },
}

impl ParseError {
    pub fn span(&self) -> &Span {
        match self {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::UnexpectedEof { span, .. }
            | ParseError::UnterminatedString { span }
            | ParseError::InvalidNumber { span, .. }
            | ParseError::LexerError { span } => span,
        }
    }

    pub fn unexpected_token(
        found: impl Into<String>,
        expected: impl Into<String>,
        span: Span,
    ) -> Self {
        ParseError::UnexpectedToken {
            found: found.into(),
            expected: expected.into(),
            span,
        }
    }

    pub fn unexpected_eof(expected: impl Into<String>, span: Span) -> Self {
        ParseError::UnexpectedEof {
            expected: expected.into(),
            span,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Every error of one parse, in source order. Parsing skips to the next
/// line after an error, so a file can report several.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParseErrors {
    errors: Vec<ParseError>,
}

impl ParseErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.errors.iter()
    }

    pub fn first(&self) -> Option<&ParseError> {
        self.errors.first()
    }
}

/// One error per line
impl std::fmt::Display for ParseErrors {
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

impl std::error::Error for ParseErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_token_message() {
        let err = ParseError::unexpected_token("then", "expression", Span::new(3, 7, 1, 1, 4, 8));
        assert_eq!(
            err.to_string(),
            "unexpected token 'then' at 1:4, expected expression"
        );
    }

    #[test]
    fn test_errors_display_one_per_line() {
        let mut errors = ParseErrors::new();
        assert!(errors.is_empty());
        errors.push(ParseError::unexpected_token("a", "b", Span::new(0, 1, 1, 1, 1, 2)));
        errors.push(ParseError::unexpected_eof("end", Span::new(10, 10, 2, 2, 5, 5)));

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.first().map(|e| e.span().start_line), Some(1));
        assert_eq!(errors.to_string().lines().count(), 2);
    }
}
