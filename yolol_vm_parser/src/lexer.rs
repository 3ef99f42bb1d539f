//! Lexer for YOLOL and NOLOL source code
//!
//! Wraps the logos-generated lexer with span tracking, one token of
//! lookahead and recovery from unterminated strings.

use std::sync::Arc;

use logos::Logos;

use crate::error::ParseError;
use crate::span::{SourceMap, Span};
use crate::token::Token;

/// A token with its span
#[derive(Debug, Clone)]
pub struct SpannedToken<'a> {
    pub token: Token,
    pub span: Span,
    pub text: &'a str,
}

impl<'a> SpannedToken<'a> {
    pub fn new(token: Token, span: Span, text: &'a str) -> Self {
        Self { token, span, text }
    }
}

/// Source lexer
pub struct Lexer<'a> {
    source: &'a str,
    inner: logos::Lexer<'a, Token>,
    source_map: SourceMap,
    /// Peeked token (for lookahead)
    peeked: Option<Result<SpannedToken<'a>, ParseError>>,
    /// Offset from original source (used after restarting lexer)
    offset: usize,
}

impl std::fmt::Debug for Lexer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexer")
            .field("offset", &self.offset)
            .field("peeked", &self.peeked)
            .finish()
    }
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code
    pub fn new(source: &'a str) -> Self {
        Self::with_file(source, None)
    }

    /// Create a lexer whose spans carry a file tag
    pub fn with_file(source: &'a str, file: Option<Arc<str>>) -> Self {
        Self {
            source,
            inner: Token::lexer(source),
            source_map: SourceMap::with_file(source, file),
            peeked: None,
            offset: 0,
        }
    }

    /// Get the source code
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Get the source map
    pub fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    /// Peek at the next token without consuming it
    pub fn peek(&mut self) -> Option<&Result<SpannedToken<'a>, ParseError>> {
        if self.peeked.is_none() {
            self.peeked = self.next_token_internal();
        }
        self.peeked.as_ref()
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Option<Result<SpannedToken<'a>, ParseError>> {
        if let Some(peeked) = self.peeked.take() {
            return Some(peeked);
        }
        self.next_token_internal()
    }

    fn next_token_internal(&mut self) -> Option<Result<SpannedToken<'a>, ParseError>> {
        let result = self.inner.next()?;
        let span = self.inner.span();
        let start = self.offset + span.start;
        let end = self.offset + span.end;

        match result {
            Ok(token) => {
                let span = self.source_map.span(start, end);
                let text = &self.source[start..end];
                Some(Ok(SpannedToken::new(token, span, text)))
            }
            Err(()) if self.source[start..].starts_with('"') => {
                // An unmatched quote swallows the rest of the line
                let line_end = memchr::memchr(b'\n', &self.source.as_bytes()[start..])
                    .map(|i| start + i)
                    .unwrap_or(self.source.len());
                self.restart_from(line_end);
                Some(Err(ParseError::UnterminatedString {
                    span: self.source_map.span(start, line_end),
                }))
            }
            Err(()) => Some(Err(ParseError::LexerError {
                span: self.source_map.span(start, end),
            })),
        }
    }

    /// Restart the lexer from a new position.
    pub fn restart_from(&mut self, pos: usize) {
        self.peeked = None;
        if pos < self.source.len() {
            self.inner = Token::lexer(&self.source[pos..]);
        } else {
            self.inner = Token::lexer("");
        }
        self.offset = pos;
    }

    /// Check if we're at end of input
    pub fn is_eof(&mut self) -> bool {
        self.peek().is_none()
    }

    /// Collect all tokens (for debugging)
    pub fn collect_all(mut self) -> Vec<Result<SpannedToken<'a>, ParseError>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            tokens.push(token);
        }
        tokens
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<SpannedToken<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Tokenize source code into a vector of spanned tokens
pub fn tokenize(source: &str) -> Vec<Result<SpannedToken<'_>, ParseError>> {
    Lexer::new(source).collect_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_tokens() {
        let tokens: Vec<_> = tokenize("if a>1 then goto 2 end")
            .into_iter()
            .filter_map(|r| r.ok())
            .map(|t| t.token)
            .collect();

        assert_eq!(
            tokens,
            vec![
                Token::KwIf,
                Token::Identifier,
                Token::Gt,
                Token::Number,
                Token::KwThen,
                Token::KwGoto,
                Token::Number,
                Token::KwEnd,
            ]
        );
    }

    #[test]
    fn test_unterminated_string_recovers_on_next_line() {
        let tokens = tokenize("a=\"abc\nb=1");
        assert!(matches!(
            tokens[2],
            Err(ParseError::UnterminatedString { .. })
        ));
        let rest: Vec<_> = tokens[3..]
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .map(|t| t.token)
            .collect();
        assert_eq!(
            rest,
            vec![Token::Newline, Token::Identifier, Token::Eq, Token::Number]
        );
    }

    #[test]
    fn test_spans() {
        let tokens: Vec<_> = tokenize("foo + bar")
            .into_iter()
            .filter_map(|r| r.ok())
            .collect();

        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].span.start, 0);
        assert_eq!(tokens[0].span.end, 3);
        assert_eq!(tokens[0].text, "foo");
        assert_eq!(tokens[2].span.start, 6);
        assert_eq!(tokens[2].span.end, 9);
    }

    #[test]
    fn test_multiline_spans() {
        let tokens: Vec<_> = tokenize("foo\nbar")
            .into_iter()
            .filter_map(|r| r.ok())
            .collect();

        assert_eq!(tokens.len(), 3); // foo, newline, bar
        assert_eq!(tokens[0].span.start_line, 1);
        assert_eq!(tokens[2].span.start_line, 2);
        assert_eq!(tokens[2].span.start_column, 1);
    }

    #[test]
    fn test_file_tag() {
        let mut lexer = Lexer::with_file("x", Some(Arc::from("lib.nolol")));
        let token = lexer.next_token().unwrap().unwrap();
        assert_eq!(token.span.file.as_deref(), Some("lib.nolol"));
    }

    #[test]
    fn test_peek() {
        let mut lexer = Lexer::new("a b c");

        let peeked = lexer.peek().unwrap().as_ref().unwrap();
        assert_eq!(peeked.text, "a");

        let next = lexer.next_token().unwrap().unwrap();
        assert_eq!(next.text, "a");

        let next = lexer.next_token().unwrap().unwrap();
        assert_eq!(next.text, "b");
    }
}
