//! Statement parsing shared by both dialects

use super::{Dialect, Parser};
use crate::ast::{
    AssignOp, Assignment, DerefOp, Dereference, Expr, GotoLabel, GotoStmt, IfStmt, LoopControl,
    Stmt,
};
use crate::error::ParseResult;
use crate::span::Span;
use crate::token::Token;

impl<'a> Parser<'a> {
    /// Parse a single statement
    pub(crate) fn parse_statement(&mut self) -> ParseResult<Stmt> {
        let Some(token) = self.current_token() else {
            return Err(self.error_expected("statement"));
        };
        match token {
            Token::KwIf => {
                let start = self.current_span();
                let condition = self.parse_if_head()?;
                self.parse_inline_if_rest(condition, &start)
            }
            Token::KwGoto => self.parse_goto(),
            Token::KwBreak | Token::KwContinue => {
                let span = self.current_span();
                self.advance();
                let control = LoopControl { span };
                Ok(if token == Token::KwBreak {
                    Stmt::Break(control)
                } else {
                    Stmt::Continue(control)
                })
            }
            Token::PlusPlus | Token::MinusMinus => match self.parse_expression()? {
                Expr::Deref(deref) => Ok(Stmt::Deref(deref)),
                _ => Err(self.error_expected("statement")),
            },
            Token::Identifier | Token::GlobalIdentifier => self.parse_assignment_or_increment(),
            _ => Err(self.error_expected("statement")),
        }
    }

    /// `if <cond> then`, returning the condition
    pub(crate) fn parse_if_head(&mut self) -> ParseResult<Expr> {
        self.expect(Token::KwIf)?;
        let condition = self.parse_expression()?;
        self.expect(Token::KwThen)?;
        Ok(condition)
    }

    /// Remainder of an inline if after `then`: `stmts [else stmts] end`
    pub(crate) fn parse_inline_if_rest(&mut self, condition: Expr, start: &Span) -> ParseResult<Stmt> {
        let then_block = self.parse_statement_list(&[Token::KwElse, Token::KwEnd])?;
        let else_block = if self.check(Token::KwElse) {
            self.advance();
            Some(self.parse_statement_list(&[Token::KwEnd])?)
        } else {
            None
        };
        self.expect(Token::KwEnd)?;
        Ok(Stmt::If(IfStmt {
            condition,
            then_block,
            else_block,
            span: self.span_from(start),
        }))
    }

    /// Statements up to (not including) one of the terminators or the line end
    pub(crate) fn parse_statement_list(&mut self, terminators: &[Token]) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();
        loop {
            if self.dialect == Dialect::Nolol {
                while self.check(Token::Semicolon) {
                    self.advance();
                }
            }
            if self.at_line_end() || self.check_any(terminators) {
                return Ok(statements);
            }
            statements.push(self.parse_statement()?);
        }
    }

    fn parse_goto(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span();
        self.expect(Token::KwGoto)?;
        if self.dialect == Dialect::Nolol && self.check(Token::Identifier) {
            let next = self.peek_next();
            let ends_statement = match next {
                None => true,
                Some(t) => t.is_line_end()
                    || matches!(
                        t,
                        Token::Semicolon | Token::KwElse | Token::KwEnd | Token::Dollar
                    ),
            };
            if ends_statement {
                let (label, _) = self.expect_identifier()?;
                return Ok(Stmt::GotoLabel(GotoLabel {
                    label,
                    span: self.span_from(&start),
                }));
            }
        }
        let line = self.parse_expression()?;
        Ok(Stmt::Goto(GotoStmt {
            line,
            span: self.span_from(&start),
        }))
    }

    fn parse_assignment_or_increment(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span();
        let variable = self.expect_variable()?;
        if let Some(op) = self.current_token().and_then(AssignOp::from_token) {
            self.advance();
            let value = self.parse_expression()?;
            return Ok(Stmt::Assignment(Assignment {
                variable,
                op,
                value,
                span: self.span_from(&start),
            }));
        }
        let op = match self.current_token() {
            Some(Token::PlusPlus) => DerefOp::PostIncrement,
            Some(Token::MinusMinus) => DerefOp::PostDecrement,
            _ => return Err(self.error_expected("assignment or increment")),
        };
        self.advance();
        Ok(Stmt::Deref(Dereference {
            variable,
            op: Some(op),
            span: self.span_from(&start),
        }))
    }
}
