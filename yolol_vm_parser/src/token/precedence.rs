//! Operator precedence definitions
//!
//! All binary operators are left associative. Prefix operators sit at fixed
//! levels between the binary ones, which is why `not a == b` means
//! `not (a == b)` while `-a ^ 2` means `-(a ^ 2)`.

use super::Token;

/// Operator precedence levels, lowest binding first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Precedence {
    /// Logical or: `or`
    Or = 1,
    /// Logical and: `and`
    And = 2,
    /// Prefix `not`
    Not = 3,
    /// Comparison: `==`, `!=`, `<`, `>`, `<=`, `>=`
    Comparison = 4,
    /// Sum: `+`, `-`
    Sum = 5,
    /// Product: `*`, `/`, `%`
    Product = 6,
    /// Prefix negation: `-x`
    Negation = 7,
    /// Power: `^`
    Power = 8,
    /// Keyword functions (`abs x`) and postfix factorial (`x!`)
    Function = 9,
    /// Literals, variables, increments, parenthesized expressions
    Atom = 10,
}

impl Precedence {
    /// The next tighter binding level
    pub fn tighter(self) -> Precedence {
        match self {
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Not,
            Precedence::Not => Precedence::Comparison,
            Precedence::Comparison => Precedence::Sum,
            Precedence::Sum => Precedence::Product,
            Precedence::Product => Precedence::Negation,
            Precedence::Negation => Precedence::Power,
            Precedence::Power => Precedence::Function,
            Precedence::Function | Precedence::Atom => Precedence::Atom,
        }
    }
}

impl Token {
    /// Get the precedence of a binary operator token
    pub fn binary_precedence(&self) -> Option<Precedence> {
        Some(match self {
            Token::KwOr => Precedence::Or,
            Token::KwAnd => Precedence::And,
            Token::EqEq | Token::NotEq | Token::Lt | Token::Gt | Token::LtEq | Token::GtEq => {
                Precedence::Comparison
            }
            Token::Plus | Token::Minus => Precedence::Sum,
            Token::Star | Token::Slash | Token::Percent => Precedence::Product,
            Token::Caret => Precedence::Power,
            _ => return None,
        })
    }
}
