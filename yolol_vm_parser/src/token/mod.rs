//! Token definitions shared by the YOLOL and NOLOL lexers
//!
//! Both languages use one token set. Keywords that only exist in NOLOL are
//! still produced by the lexer; the YOLOL parser accepts them as ordinary
//! identifiers.

mod precedence;

#[cfg(test)]
mod tests;

use logos::Logos;

pub use precedence::Precedence;

/// YOLOL / NOLOL tokens
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\f\r]+")] // Skip whitespace (but not newlines)
pub enum Token {
    // ==================== Keywords ====================
    #[token("if", ignore(ascii_case))]
    KwIf,
    #[token("then", ignore(ascii_case))]
    KwThen,
    #[token("else", ignore(ascii_case))]
    KwElse,
    #[token("end", ignore(ascii_case))]
    KwEnd,
    #[token("goto", ignore(ascii_case))]
    KwGoto,
    #[token("and", ignore(ascii_case))]
    KwAnd,
    #[token("or", ignore(ascii_case))]
    KwOr,
    #[token("not", ignore(ascii_case))]
    KwNot,

    // ==================== Keyword Functions ====================
    #[token("abs", ignore(ascii_case))]
    KwAbs,
    #[token("sqrt", ignore(ascii_case))]
    KwSqrt,
    #[token("sin", ignore(ascii_case))]
    KwSin,
    #[token("cos", ignore(ascii_case))]
    KwCos,
    #[token("tan", ignore(ascii_case))]
    KwTan,
    #[token("asin", ignore(ascii_case))]
    KwAsin,
    #[token("acos", ignore(ascii_case))]
    KwAcos,
    #[token("atan", ignore(ascii_case))]
    KwAtan,

    // ==================== NOLOL Keywords ====================
    #[token("while", ignore(ascii_case))]
    KwWhile,
    #[token("do", ignore(ascii_case))]
    KwDo,
    #[token("break", ignore(ascii_case))]
    KwBreak,
    #[token("continue", ignore(ascii_case))]
    KwContinue,
    #[token("define", ignore(ascii_case))]
    KwDefine,
    #[token("macro", ignore(ascii_case))]
    KwMacro,
    #[token("insert", ignore(ascii_case))]
    KwInsert,
    #[token("include", ignore(ascii_case))]
    KwInclude,
    #[token("wait", ignore(ascii_case))]
    KwWait,

    // ==================== Literals and Names ====================
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Identifier,
    #[regex(r":[a-zA-Z0-9_]+")]
    GlobalIdentifier,
    #[regex(r"[0-9]+(\.[0-9]+)?")]
    Number,
    #[regex(r#""[^"\n]*""#)]
    String,

    // ==================== Assignment Operators ====================
    #[token("=")]
    Eq,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("%=")]
    PercentEq,
    #[token("^=")]
    CaretEq,

    // ==================== Operators ====================
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("^")]
    Caret,
    #[token("!")]
    Bang,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,

    // ==================== Punctuation ====================
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token("$")]
    Dollar,

    // ==================== Trivia ====================
    #[regex(r"//[^\n]*")]
    Comment,
    #[token("\n")]
    Newline,
}

impl Token {
    /// Keywords that are only meaningful in NOLOL
    pub fn is_nolol_keyword(&self) -> bool {
        matches!(
            self,
            Token::KwWhile
                | Token::KwDo
                | Token::KwBreak
                | Token::KwContinue
                | Token::KwDefine
                | Token::KwMacro
                | Token::KwInsert
                | Token::KwInclude
                | Token::KwWait
        )
    }

    /// Prefix keyword functions (`abs x`, `sqrt x`, ...)
    pub fn is_keyword_function(&self) -> bool {
        matches!(
            self,
            Token::KwAbs
                | Token::KwSqrt
                | Token::KwSin
                | Token::KwCos
                | Token::KwTan
                | Token::KwAsin
                | Token::KwAcos
                | Token::KwAtan
        )
    }

    /// Assignment operators, including the compound forms
    pub fn is_assignment(&self) -> bool {
        matches!(
            self,
            Token::Eq
                | Token::PlusEq
                | Token::MinusEq
                | Token::StarEq
                | Token::SlashEq
                | Token::PercentEq
                | Token::CaretEq
        )
    }

    /// Tokens that terminate a statement line
    pub fn is_line_end(&self) -> bool {
        matches!(self, Token::Newline | Token::Comment)
    }

    /// Human readable description used in error messages
    pub fn describe(&self) -> &'static str {
        match self {
            Token::KwIf => "'if'",
            Token::KwThen => "'then'",
            Token::KwElse => "'else'",
            Token::KwEnd => "'end'",
            Token::KwGoto => "'goto'",
            Token::KwAnd => "'and'",
            Token::KwOr => "'or'",
            Token::KwNot => "'not'",
            Token::KwAbs
            | Token::KwSqrt
            | Token::KwSin
            | Token::KwCos
            | Token::KwTan
            | Token::KwAsin
            | Token::KwAcos
            | Token::KwAtan => "keyword function",
            Token::KwWhile => "'while'",
            Token::KwDo => "'do'",
            Token::KwBreak => "'break'",
            Token::KwContinue => "'continue'",
            Token::KwDefine => "'define'",
            Token::KwMacro => "'macro'",
            Token::KwInsert => "'insert'",
            Token::KwInclude => "'include'",
            Token::KwWait => "'wait'",
            Token::Identifier => "identifier",
            Token::GlobalIdentifier => "global identifier",
            Token::Number => "number",
            Token::String => "string",
            Token::Eq => "'='",
            Token::PlusEq => "'+='",
            Token::MinusEq => "'-='",
            Token::StarEq => "'*='",
            Token::SlashEq => "'/='",
            Token::PercentEq => "'%='",
            Token::CaretEq => "'^='",
            Token::PlusPlus => "'++'",
            Token::MinusMinus => "'--'",
            Token::Plus => "'+'",
            Token::Minus => "'-'",
            Token::Star => "'*'",
            Token::Slash => "'/'",
            Token::Percent => "'%'",
            Token::Caret => "'^'",
            Token::Bang => "'!'",
            Token::EqEq => "'=='",
            Token::NotEq => "'!='",
            Token::Lt => "'<'",
            Token::Gt => "'>'",
            Token::LtEq => "'<='",
            Token::GtEq => "'>='",
            Token::LParen => "'('",
            Token::RParen => "')'",
            Token::Comma => "','",
            Token::Semicolon => "';'",
            Token::Dollar => "'$'",
            Token::Comment => "comment",
            Token::Newline => "newline",
        }
    }
}
