//! Expression parsing
//!
//! One function per precedence level, lowest binding first. Binary levels
//! loop to build left-associative chains; prefix operators recurse into
//! their own level.

use super::{Dialect, Parser};
use crate::ast::{BinaryOp, DerefOp, Dereference, Expr, FuncCall, UnaryOp};
use crate::error::{ParseError, ParseResult};
use crate::token::Token;

/// Largest integer part a fixed-point literal can hold
const MAX_INTEGER_PART: u64 = (i64::MAX / 1000) as u64;

impl<'a> Parser<'a> {
    /// Parse a full expression
    pub(crate) fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.parse_or()
    }

    /// Parse one left-associative binary level
    fn parse_binary_level(
        &mut self,
        operators: &[Token],
        operand: fn(&mut Self) -> ParseResult<Expr>,
    ) -> ParseResult<Expr> {
        let mut lhs = operand(self)?;
        while let Some(token) = self.current_token().filter(|t| operators.contains(t)) {
            let Some(op) = BinaryOp::from_token(token) else {
                break;
            };
            self.advance();
            let rhs = operand(self)?;
            lhs = Expr::binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        self.parse_binary_level(&[Token::KwOr], Self::parse_and)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        self.parse_binary_level(&[Token::KwAnd], Self::parse_not)
    }

    fn parse_not(&mut self) -> ParseResult<Expr> {
        if self.check(Token::KwNot) {
            let start = self.current_span();
            self.advance();
            let operand = self.parse_not()?;
            return Ok(self.unary(UnaryOp::Not, operand, &start));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        self.parse_binary_level(
            &[
                Token::EqEq,
                Token::NotEq,
                Token::Lt,
                Token::Gt,
                Token::LtEq,
                Token::GtEq,
            ],
            Self::parse_sum,
        )
    }

    fn parse_sum(&mut self) -> ParseResult<Expr> {
        self.parse_binary_level(&[Token::Plus, Token::Minus], Self::parse_product)
    }

    fn parse_product(&mut self) -> ParseResult<Expr> {
        self.parse_binary_level(
            &[Token::Star, Token::Slash, Token::Percent],
            Self::parse_negation,
        )
    }

    fn parse_negation(&mut self) -> ParseResult<Expr> {
        if self.check(Token::Minus) {
            let start = self.current_span();
            self.advance();
            let operand = self.parse_negation()?;
            // `-5` is a negative constant, not a negation
            if let Expr::NumberConst(number) = &operand {
                if !number.value.starts_with('-') {
                    return Ok(Expr::number(
                        format!("-{}", number.value),
                        self.span_from(&start),
                    ));
                }
            }
            return Ok(self.unary(UnaryOp::Neg, operand, &start));
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> ParseResult<Expr> {
        self.parse_binary_level(&[Token::Caret], Self::parse_function)
    }

    /// Keyword functions (`abs x`) and postfix factorial
    fn parse_function(&mut self) -> ParseResult<Expr> {
        if let Some(op) = self.current_token().and_then(UnaryOp::from_keyword) {
            let start = self.current_span();
            self.advance();
            let operand = self.parse_function()?;
            return Ok(self.unary(op, operand, &start));
        }
        let start = self.current_span();
        let mut expr = self.parse_atom()?;
        while self.check(Token::Bang) {
            self.advance();
            expr = self.unary(UnaryOp::Factorial, expr, &start);
        }
        Ok(expr)
    }

    fn unary(&self, op: UnaryOp, operand: Expr, start: &crate::span::Span) -> Expr {
        Expr::Unary(crate::ast::UnaryOperation {
            op,
            operand: Box::new(operand),
            span: self.span_from(start),
        })
    }

    fn parse_atom(&mut self) -> ParseResult<Expr> {
        let Some(token) = self.current.clone() else {
            return Err(self.error_expected("expression"));
        };
        match token.token {
            Token::Number => {
                self.advance();
                let integer_part = token.text.split('.').next().unwrap_or(token.text);
                let fits = integer_part
                    .parse::<u64>()
                    .map(|v| v <= MAX_INTEGER_PART)
                    .unwrap_or(false);
                if !fits {
                    return Err(ParseError::InvalidNumber {
                        literal: token.text.to_string(),
                        span: token.span,
                    });
                }
                Ok(Expr::number(token.text, token.span))
            }
            Token::String => {
                self.advance();
                let value = &token.text[1..token.text.len() - 1];
                Ok(Expr::string(value, token.span))
            }
            Token::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::PlusPlus | Token::MinusMinus => {
                self.advance();
                let name = self.expect_variable()?;
                let op = if token.token == Token::PlusPlus {
                    DerefOp::PreIncrement
                } else {
                    DerefOp::PreDecrement
                };
                Ok(Expr::Deref(Dereference {
                    variable: name,
                    op: Some(op),
                    span: self.span_from(&token.span),
                }))
            }
            Token::Identifier | Token::GlobalIdentifier => {
                self.advance();
                if self.dialect == Dialect::Nolol
                    && token.token == Token::Identifier
                    && self.check(Token::LParen)
                {
                    return self.parse_call(token.text.to_string(), &token.span);
                }
                let op = if self.check(Token::PlusPlus) {
                    Some(DerefOp::PostIncrement)
                } else if self.check(Token::MinusMinus) {
                    Some(DerefOp::PostDecrement)
                } else {
                    None
                };
                if op.is_some() {
                    self.advance();
                }
                Ok(Expr::Deref(Dereference {
                    variable: token.text.to_string(),
                    op,
                    span: self.span_from(&token.span),
                }))
            }
            _ => Err(self.error_expected("expression")),
        }
    }

    /// `name(arg, ...)`, current token is the opening parenthesis
    fn parse_call(&mut self, name: String, start: &crate::span::Span) -> ParseResult<Expr> {
        let args = self.parse_argument_list()?;
        Ok(Expr::FuncCall(FuncCall {
            name,
            args,
            span: self.span_from(start),
        }))
    }

    /// `( expr, expr, ... )`
    pub(crate) fn parse_argument_list(&mut self) -> ParseResult<Vec<Expr>> {
        self.expect(Token::LParen)?;
        let mut args = Vec::new();
        if !self.check(Token::RParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.check(Token::Comma) {
                    break;
                }
                self.advance();
            }
        }
        self.expect(Token::RParen)?;
        Ok(args)
    }

    /// A local or global variable name
    pub(crate) fn expect_variable(&mut self) -> ParseResult<String> {
        if self.check_any(&[Token::Identifier, Token::GlobalIdentifier]) {
            if let Some(token) = self.advance() {
                return Ok(token.text.to_string());
            }
        }
        Err(self.error_expected("variable name"))
    }
}
