//! Recursive descent parsers for YOLOL and NOLOL
//!
//! Both languages share the token stream handling, the expression grammar
//! and the statement grammar. The dialect decides whether NOLOL keywords are
//! keywords or plain identifiers and whether function calls are allowed.

mod expressions;
mod nolol;
mod statements;
mod yolol;

use std::sync::Arc;

use crate::error::{ParseError, ParseErrors, ParseResult};
use crate::lexer::{Lexer, SpannedToken};
use crate::span::{SourceMap, Span};
use crate::token::Token;

/// Which language is being parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Yolol,
    Nolol,
}

/// YOLOL / NOLOL parser
pub struct Parser<'a> {
    /// Source code
    pub(crate) source: &'a str,
    /// Lexer
    pub(crate) lexer: Lexer<'a>,
    /// Source map for line/column calculation
    pub(crate) source_map: SourceMap,
    /// Current token (peeked)
    pub(crate) current: Option<SpannedToken<'a>>,
    /// Span of the last consumed token
    pub(crate) previous: Span,
    /// Collected errors (for error recovery)
    pub(crate) errors: ParseErrors,
    pub(crate) dialect: Dialect,
}

impl std::fmt::Debug for Parser<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("dialect", &self.dialect)
            .field("current", &self.current)
            .field("errors", &self.errors.len())
            .finish()
    }
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given source code
    pub fn new(source: &'a str, dialect: Dialect) -> Self {
        Self::with_file(source, dialect, None)
    }

    /// Create a parser whose spans are tagged with a file name
    pub fn with_file(source: &'a str, dialect: Dialect, file: Option<Arc<str>>) -> Self {
        let mut parser = Self {
            source,
            lexer: Lexer::with_file(source, file.clone()),
            source_map: SourceMap::with_file(source, file),
            current: None,
            previous: Span::empty(),
            errors: ParseErrors::new(),
            dialect,
        };
        // Prime the parser with first token
        parser.advance();
        parser
    }

    // ==================== Token Management ====================

    /// NOLOL keywords are ordinary names in YOLOL
    fn classify(dialect: Dialect, token: Token) -> Token {
        if dialect == Dialect::Yolol && token.is_nolol_keyword() {
            Token::Identifier
        } else {
            token
        }
    }

    /// Advance to the next token
    pub(crate) fn advance(&mut self) -> Option<SpannedToken<'a>> {
        let prev = self.current.take();
        if let Some(prev) = &prev {
            self.previous = prev.span.clone();
        }
        loop {
            match self.lexer.next_token() {
                Some(Ok(mut token)) => {
                    token.token = Self::classify(self.dialect, token.token);
                    self.current = Some(token);
                    break;
                }
                Some(Err(e)) => {
                    self.errors.push(e);
                    continue;
                }
                None => {
                    self.current = None;
                    break;
                }
            }
        }
        prev
    }

    /// Check if current token matches
    pub(crate) fn check(&self, expected: Token) -> bool {
        self.current
            .as_ref()
            .map(|t| t.token == expected)
            .unwrap_or(false)
    }

    /// Check if current token is any of the given tokens
    pub(crate) fn check_any(&self, expected: &[Token]) -> bool {
        self.current
            .as_ref()
            .map(|t| expected.contains(&t.token))
            .unwrap_or(false)
    }

    /// The current token kind
    pub(crate) fn current_token(&self) -> Option<Token> {
        self.current.as_ref().map(|t| t.token)
    }

    /// Peek at the next token without consuming it
    pub(crate) fn peek_next(&mut self) -> Option<Token> {
        loop {
            match self.lexer.peek() {
                Some(Ok(token)) => return Some(Self::classify(self.dialect, token.token)),
                Some(Err(_)) => {
                    if let Some(Err(e)) = self.lexer.next_token() {
                        self.errors.push(e);
                    }
                }
                None => return None,
            }
        }
    }

    /// Consume current token if it matches, return error otherwise
    pub(crate) fn expect(&mut self, expected: Token) -> ParseResult<SpannedToken<'a>> {
        match self.current.as_ref() {
            Some(token) if token.token == expected => {
                let span = token.span.clone();
                self.advance()
                    .ok_or_else(|| ParseError::unexpected_eof(expected.describe(), span))
            }
            _ => Err(self.error_expected(expected.describe())),
        }
    }

    /// Consume an identifier and return its text
    pub(crate) fn expect_identifier(&mut self) -> ParseResult<(String, Span)> {
        let token = self.expect(Token::Identifier)?;
        Ok((token.text.to_string(), token.span))
    }

    /// Error for an unexpected current token
    pub(crate) fn error_expected(&self, expected: &str) -> ParseError {
        match &self.current {
            Some(token) => {
                let found = if token.token == Token::Newline {
                    "newline"
                } else {
                    token.text
                };
                ParseError::unexpected_token(found, expected, token.span.clone())
            }
            None => ParseError::unexpected_eof(expected, self.current_span()),
        }
    }

    /// Get the span of the current token
    pub(crate) fn current_span(&self) -> Span {
        self.current
            .as_ref()
            .map(|t| t.span.clone())
            .unwrap_or_else(|| self.source_map.span(self.source.len(), self.source.len()))
    }

    /// Span from `start` up to the last consumed token
    pub(crate) fn span_from(&self, start: &Span) -> Span {
        start.merge(&self.previous)
    }

    /// Check if we're at end of input
    pub(crate) fn is_at_end(&self) -> bool {
        self.current.is_none()
    }

    /// Whether the current token ends a source line
    pub(crate) fn at_line_end(&self) -> bool {
        self.current
            .as_ref()
            .map(|t| t.token.is_line_end())
            .unwrap_or(true)
    }

    /// Consume a trailing comment, returning its text without the slashes
    pub(crate) fn take_comment(&mut self) -> Option<String> {
        if self.check(Token::Comment) {
            self.advance()
                .map(|t| t.text.strip_prefix("//").unwrap_or(t.text).to_string())
        } else {
            None
        }
    }

    /// Expect the end of a source line (newline or end of input)
    pub(crate) fn expect_line_end(&mut self) -> ParseResult<()> {
        if self.is_at_end() {
            return Ok(());
        }
        if self.check(Token::Newline) {
            self.advance();
            return Ok(());
        }
        Err(self.error_expected("end of line"))
    }

    /// Skip empty lines
    pub(crate) fn skip_newlines(&mut self) {
        while self.check(Token::Newline) {
            self.advance();
        }
    }

    /// Error recovery: skip tokens up to and including the next newline
    pub(crate) fn synchronize(&mut self) {
        while !self.is_at_end() {
            if self.check(Token::Newline) {
                self.advance();
                return;
            }
            self.advance();
        }
    }
}

/// Parse YOLOL source code, failing with every collected error
pub fn parse_yolol(source: &str) -> Result<crate::ast::yolol::Program, ParseErrors> {
    let (program, errors) = parse_yolol_with_errors(source);
    if errors.is_empty() {
        Ok(program)
    } else {
        Err(errors)
    }
}

/// Parse YOLOL source code with error recovery
///
/// Returns the (partial) program together with every error.
pub fn parse_yolol_with_errors(source: &str) -> (crate::ast::yolol::Program, ParseErrors) {
    Parser::new(source, Dialect::Yolol).parse_yolol()
}

/// Parse NOLOL source code
pub fn parse_nolol(source: &str) -> Result<crate::ast::nolol::Program, ParseErrors> {
    parse_nolol_file(source, None)
}

/// Parse NOLOL source code, tagging every span with `file`
pub fn parse_nolol_file(
    source: &str,
    file: Option<&str>,
) -> Result<crate::ast::nolol::Program, ParseErrors> {
    let (program, errors) =
        Parser::with_file(source, Dialect::Nolol, file.map(Arc::from)).parse_nolol();
    if errors.is_empty() {
        Ok(program)
    } else {
        Err(errors)
    }
}
