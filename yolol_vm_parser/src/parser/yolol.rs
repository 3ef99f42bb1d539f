//! YOLOL program parsing: one `Line` per source line

use super::Parser;
use crate::ast::yolol::{Line, Program};
use crate::error::{ParseErrors, ParseResult};
use crate::token::Token;

impl<'a> Parser<'a> {
    /// Parse the source as a YOLOL program
    ///
    /// A line that fails to parse keeps the statements read before the
    /// error, so line numbers stay aligned with the source.
    pub fn parse_yolol(mut self) -> (Program, ParseErrors) {
        let mut lines = Vec::new();
        while !self.is_at_end() {
            let start = self.current_span();
            let mut statements = Vec::new();
            match self.parse_line_statements(&mut statements) {
                Ok(comment) => {
                    let span = if statements.is_empty() && comment.is_none() {
                        start
                    } else {
                        self.span_from(&start)
                    };
                    lines.push(Line {
                        statements,
                        comment,
                        span,
                    });
                    if let Err(e) = self.expect_line_end() {
                        self.errors.push(e);
                        self.synchronize();
                    }
                }
                Err(e) => {
                    self.errors.push(e);
                    let span = self.span_from(&start);
                    lines.push(Line::new(statements, span));
                    self.synchronize();
                }
            }
        }
        (Program::new(lines), self.errors)
    }

    fn parse_line_statements(&mut self, statements: &mut Vec<crate::ast::Stmt>) -> ParseResult<Option<String>> {
        while !self.at_line_end() {
            if self.check(Token::Semicolon) {
                return Err(self.error_expected("statement"));
            }
            statements.push(self.parse_statement()?);
        }
        Ok(self.take_comment())
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::Stmt;
    use crate::parser::parse_yolol;
    use crate::parser::parse_yolol_with_errors;

    #[test]
    fn test_one_line_per_source_line() {
        let program = parse_yolol("a=1 b=2\n\ngoto 1").unwrap();
        assert_eq!(program.lines.len(), 3);
        assert_eq!(program.lines[0].statements.len(), 2);
        assert!(program.lines[1].statements.is_empty());
        assert!(matches!(program.lines[2].statements[0], Stmt::Goto(_)));
    }

    #[test]
    fn test_trailing_newline_adds_no_line() {
        assert_eq!(parse_yolol("a=1\n").unwrap().lines.len(), 1);
        assert_eq!(parse_yolol("a=1\n\n").unwrap().lines.len(), 2);
        assert!(parse_yolol("").unwrap().lines.is_empty());
    }

    #[test]
    fn test_comment_is_kept() {
        let program = parse_yolol("a=1 // set a").unwrap();
        assert_eq!(program.lines[0].comment.as_deref(), Some(" set a"));
    }

    #[test]
    fn test_nolol_keywords_are_identifiers() {
        let program = parse_yolol("while=1 wait++").unwrap();
        assert_eq!(program.lines[0].statements.len(), 2);
    }

    #[test]
    fn test_errors_are_collected_per_line() {
        let (program, errors) = parse_yolol_with_errors("a=\nb=2\nif then\nc=3");
        assert_eq!(errors.len(), 2);
        assert_eq!(program.lines.len(), 4);
        assert_eq!(program.lines[1].statements.len(), 1);
        assert_eq!(program.lines[3].statements.len(), 1);
        assert_eq!(errors.errors()[0].span().start_line, 1);
        assert_eq!(errors.errors()[1].span().start_line, 3);
    }
}
