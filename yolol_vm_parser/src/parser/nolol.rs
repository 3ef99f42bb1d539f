//! NOLOL program parsing
//!
//! Every element starts at the beginning of a source line. Block constructs
//! (`if ... then` followed by a newline, `while`, `macro`) read nested
//! elements until `else` or `end` shows up at the start of a line.

use super::Parser;
use crate::ast::nolol::{
    Block, Definition, Element, IncludeDirective, MacroDefinition, MacroInsertion, MultilineIf,
    Program, StatementLine, WaitDirective, WhileLoop,
};
use crate::ast::{Expr, Stmt};
use crate::error::{ParseErrors, ParseResult};
use crate::span::Span;
use crate::token::Token;

impl<'a> Parser<'a> {
    /// Parse the source as a NOLOL program
    pub fn parse_nolol(mut self) -> (Program, ParseErrors) {
        let elements = self.parse_elements(&[]);
        (Program::new(elements), self.errors)
    }

    /// Elements until one of the terminators appears at the start of a line
    fn parse_elements(&mut self, terminators: &[Token]) -> Vec<Element> {
        let mut elements = Vec::new();
        loop {
            self.skip_newlines();
            if self.is_at_end() || self.check_any(terminators) {
                return elements;
            }
            if let Err(e) = self.parse_element(&mut elements) {
                self.errors.push(e);
                self.synchronize();
            }
        }
    }

    fn parse_block(&mut self, terminators: &[Token]) -> Block {
        let start = self.current_span();
        let elements = self.parse_elements(terminators);
        let span = match (elements.first(), elements.last()) {
            (Some(first), Some(last)) => first.span().merge(last.span()),
            _ => start,
        };
        Block { elements, span }
    }

    /// Optional trailing comment, then the end of the line
    fn finish_line(&mut self) -> ParseResult<()> {
        self.take_comment();
        self.expect_line_end()
    }

    fn parse_element(&mut self, out: &mut Vec<Element>) -> ParseResult<()> {
        let start = self.current_span();
        let element = match self.current_token() {
            Some(Token::KwInclude) => {
                self.advance();
                let file = self.expect(Token::String)?;
                let text = file.text;
                Element::Include(IncludeDirective {
                    file: text[1..text.len() - 1].to_string(),
                    span: self.span_from(&start),
                })
            }
            Some(Token::KwDefine) => self.parse_definition(&start)?,
            Some(Token::KwMacro) => self.parse_macro(&start)?,
            Some(Token::KwInsert) => {
                self.advance();
                let (name, _) = self.expect_identifier()?;
                let arguments = self.parse_argument_list()?;
                Element::Insert(MacroInsertion {
                    name,
                    arguments,
                    span: self.span_from(&start),
                })
            }
            Some(Token::KwWait) => {
                self.advance();
                let condition = self.parse_expression()?;
                Element::Wait(WaitDirective {
                    condition,
                    span: self.span_from(&start),
                })
            }
            _ => return self.parse_statement_line(out),
        };
        out.push(element);
        self.finish_line()
    }

    fn parse_definition(&mut self, start: &Span) -> ParseResult<Element> {
        self.expect(Token::KwDefine)?;
        let (name, _) = self.expect_identifier()?;
        let placeholders = if self.check(Token::LParen) {
            self.parse_name_list(Token::LParen, Token::RParen)?
        } else {
            Vec::new()
        };
        self.expect(Token::Eq)?;
        let value = self.parse_expression()?;
        Ok(Element::Define(Definition {
            name,
            placeholders,
            value,
            span: self.span_from(start),
        }))
    }

    fn parse_macro(&mut self, start: &Span) -> ParseResult<Element> {
        self.expect(Token::KwMacro)?;
        let (name, _) = self.expect_identifier()?;
        let arguments = self.parse_name_list(Token::LParen, Token::RParen)?;
        let externals = if self.check(Token::Lt) {
            self.parse_name_list(Token::Lt, Token::Gt)?
        } else {
            Vec::new()
        };
        self.finish_line()?;
        let block = self.parse_block(&[Token::KwEnd]);
        self.expect(Token::KwEnd)?;
        Ok(Element::Macro(MacroDefinition {
            name,
            arguments,
            externals,
            block,
            span: self.span_from(start),
        }))
    }

    /// Comma separated identifiers between `open` and `close`
    fn parse_name_list(&mut self, open: Token, close: Token) -> ParseResult<Vec<String>> {
        self.expect(open)?;
        let mut names = Vec::new();
        if !self.check(close) {
            loop {
                names.push(self.expect_identifier()?.0);
                if !self.check(Token::Comma) {
                    break;
                }
                self.advance();
            }
        }
        self.expect(close)?;
        Ok(names)
    }

    /// `[$] [label>] statements [$] [// comment]`, or a labeled block construct
    fn parse_statement_line(&mut self, out: &mut Vec<Element>) -> ParseResult<()> {
        let start = self.current_span();
        let has_bol = self.check(Token::Dollar);
        if has_bol {
            self.advance();
        }
        let label = if self.check(Token::Identifier) && self.peek_next() == Some(Token::Gt) {
            let (label, _) = self.expect_identifier()?;
            self.advance();
            Some(label)
        } else {
            None
        };

        match self.current_token() {
            Some(Token::KwIf) => {
                let if_start = self.current_span();
                let condition = self.parse_if_head()?;
                if self.at_line_end() {
                    self.push_label_line(out, label, has_bol, &start);
                    let element = self.parse_multiline_if(condition, &if_start)?;
                    out.push(element);
                    return self.finish_line();
                }
                let first = self.parse_inline_if_rest(condition, &if_start)?;
                self.finish_statement_line(out, label, has_bol, vec![first], &start)
            }
            Some(Token::KwWhile) => {
                self.push_label_line(out, label, has_bol, &start);
                let element = self.parse_while()?;
                out.push(element);
                self.finish_line()
            }
            _ => self.finish_statement_line(out, label, has_bol, Vec::new(), &start),
        }
    }

    /// A label in front of a block construct becomes an empty labeled line
    fn push_label_line(
        &mut self,
        out: &mut Vec<Element>,
        label: Option<String>,
        has_bol: bool,
        start: &Span,
    ) {
        if label.is_some() || has_bol {
            out.push(Element::Line(StatementLine {
                label,
                has_bol,
                has_eol: false,
                statements: Vec::new(),
                comment: None,
                span: self.span_from(start),
            }));
        }
    }

    fn finish_statement_line(
        &mut self,
        out: &mut Vec<Element>,
        label: Option<String>,
        has_bol: bool,
        mut statements: Vec<Stmt>,
        start: &Span,
    ) -> ParseResult<()> {
        statements.extend(self.parse_statement_list(&[Token::Dollar])?);
        let has_eol = self.check(Token::Dollar);
        if has_eol {
            self.advance();
        }
        let comment = self.take_comment();
        let span = if self.previous.start < start.start {
            start.clone()
        } else {
            self.span_from(start)
        };
        self.expect_line_end()?;
        out.push(Element::Line(StatementLine {
            label,
            has_bol,
            has_eol,
            statements,
            comment,
            span,
        }));
        Ok(())
    }

    /// Branches of a multi-line if, after the first `if <cond> then`
    fn parse_multiline_if(&mut self, first: Expr, start: &Span) -> ParseResult<Element> {
        let mut conditions = vec![first];
        let mut blocks = Vec::new();
        let mut else_block = None;
        loop {
            self.finish_line()?;
            blocks.push(self.parse_block(&[Token::KwElse, Token::KwEnd]));
            if !self.check(Token::KwElse) {
                break;
            }
            self.advance();
            if self.check(Token::KwIf) {
                conditions.push(self.parse_if_head()?);
                continue;
            }
            self.finish_line()?;
            else_block = Some(self.parse_block(&[Token::KwEnd]));
            break;
        }
        self.expect(Token::KwEnd)?;
        Ok(Element::If(MultilineIf {
            conditions,
            blocks,
            else_block,
            span: self.span_from(start),
        }))
    }

    fn parse_while(&mut self) -> ParseResult<Element> {
        let start = self.current_span();
        self.expect(Token::KwWhile)?;
        let condition = self.parse_expression()?;
        self.expect(Token::KwDo)?;
        self.finish_line()?;
        let block = self.parse_block(&[Token::KwEnd]);
        self.expect(Token::KwEnd)?;
        Ok(Element::While(WhileLoop {
            condition,
            block,
            span: self.span_from(&start),
        }))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::nolol::Element;
    use crate::ast::Stmt;
    use crate::parser::{parse_nolol, parse_nolol_file};

    #[test]
    fn test_statement_line_markers() {
        let program = parse_nolol("$ start> a=1; b=2 $ // note").unwrap();
        let Element::Line(line) = &program.elements[0] else {
            panic!("expected a statement line");
        };
        assert!(line.has_bol);
        assert!(line.has_eol);
        assert_eq!(line.label.as_deref(), Some("start"));
        assert_eq!(line.statements.len(), 2);
        assert_eq!(line.comment.as_deref(), Some(" note"));
    }

    #[test]
    fn test_inline_and_multiline_if() {
        let source = "if a then b=1 end\nif a then\n b=1\nelse if c then\n b=2\nelse\n b=3\nend";
        let program = parse_nolol(source).unwrap();
        assert_eq!(program.elements.len(), 2);
        assert!(matches!(
            &program.elements[0],
            Element::Line(l) if matches!(l.statements[0], Stmt::If(_))
        ));
        let Element::If(mif) = &program.elements[1] else {
            panic!("expected a multi-line if");
        };
        assert_eq!(mif.conditions.len(), 2);
        assert_eq!(mif.blocks.len(), 2);
        assert!(mif.else_block.is_some());
    }

    #[test]
    fn test_labeled_while_gets_label_line() {
        let program = parse_nolol("loop> while x < 3 do\n x++\n if x == 2 then break end\nend").unwrap();
        assert_eq!(program.elements.len(), 2);
        assert!(matches!(
            &program.elements[0],
            Element::Line(l) if l.label.as_deref() == Some("loop") && l.statements.is_empty()
        ));
        let Element::While(w) = &program.elements[1] else {
            panic!("expected a while loop");
        };
        assert_eq!(w.block.elements.len(), 2);
    }

    #[test]
    fn test_directives() {
        let source = "include \"lib\"\ndefine max = 10\ndefine sq(x) = x*x\n\
                      macro swap(a, b) <tmp>\n tmp=a a=b b=tmp\nend\n\
                      insert swap(x, y)\nwait :busy";
        let program = parse_nolol(source).unwrap();
        assert_eq!(program.elements.len(), 6);
        assert!(matches!(&program.elements[0], Element::Include(i) if i.file == "lib"));
        assert!(matches!(&program.elements[1], Element::Define(d) if d.placeholders.is_empty()));
        assert!(matches!(&program.elements[2], Element::Define(d) if d.placeholders == ["x"]));
        let Element::Macro(m) = &program.elements[3] else {
            panic!("expected a macro");
        };
        assert_eq!(m.arguments, ["a", "b"]);
        assert_eq!(m.externals, ["tmp"]);
        assert!(matches!(&program.elements[4], Element::Insert(i) if i.arguments.len() == 2));
        assert!(matches!(&program.elements[5], Element::Wait(_)));
    }

    #[test]
    fn test_goto_label_and_expression() {
        let program = parse_nolol("goto done\ngoto 3\ngoto x+1").unwrap();
        let kinds: Vec<bool> = program
            .elements
            .iter()
            .map(|e| match e {
                Element::Line(l) => matches!(l.statements[0], Stmt::GotoLabel(_)),
                _ => false,
            })
            .collect();
        assert_eq!(kinds, vec![true, false, false]);
    }

    #[test]
    fn test_file_tag_on_spans() {
        let program = parse_nolol_file("a=1", Some("lib.nolol")).unwrap();
        assert_eq!(program.elements[0].span().file.as_deref(), Some("lib.nolol"));
    }

    #[test]
    fn test_errors_recover_at_next_line() {
        let errors = parse_nolol("a=\nb=1\nc=(\nwhile x do\nend").unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
