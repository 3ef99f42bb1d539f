//! Expression nodes shared by YOLOL and NOLOL

use serde::{Deserialize, Serialize};

use crate::span::Span;
use crate::token::{Precedence, Token};

/// An expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    StringConst(StringConst),
    NumberConst(NumberConst),
    Deref(Dereference),
    Unary(UnaryOperation),
    Binary(BinaryOperation),
    /// `name(args)`, NOLOL only
    FuncCall(FuncCall),
}

/// A string literal (without the surrounding quotes)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringConst {
    pub value: String,
    pub span: Span,
}

/// A number literal
///
/// The value is kept in its canonical decimal text form; the runtime number
/// type parses it when the constant is evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberConst {
    pub value: String,
    pub span: Span,
}

/// Increment/decrement attached to a variable read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DerefOp {
    PreIncrement,
    PostIncrement,
    PreDecrement,
    PostDecrement,
}

impl DerefOp {
    pub fn is_prefix(self) -> bool {
        matches!(self, DerefOp::PreIncrement | DerefOp::PreDecrement)
    }

    pub fn is_increment(self) -> bool {
        matches!(self, DerefOp::PreIncrement | DerefOp::PostIncrement)
    }

    pub fn symbol(self) -> &'static str {
        if self.is_increment() {
            "++"
        } else {
            "--"
        }
    }
}

/// A variable read, optionally with pre/post increment or decrement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dereference {
    pub variable: String,
    pub op: Option<DerefOp>,
    pub span: Span,
}

impl Dereference {
    pub fn new(variable: impl Into<String>, span: Span) -> Self {
        Self {
            variable: variable.into(),
            op: None,
            span,
        }
    }

    pub fn is_global(&self) -> bool {
        is_global(&self.variable)
    }
}

/// Global variables are shared between chips and carry a `:` sigil
pub fn is_global(name: &str) -> bool {
    name.starts_with(':')
}

/// Unary operators, including the keyword functions and postfix factorial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
    Abs,
    Sqrt,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Factorial,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "not",
            UnaryOp::Abs => "abs",
            UnaryOp::Sqrt => "sqrt",
            UnaryOp::Sin => "sin",
            UnaryOp::Cos => "cos",
            UnaryOp::Tan => "tan",
            UnaryOp::Asin => "asin",
            UnaryOp::Acos => "acos",
            UnaryOp::Atan => "atan",
            UnaryOp::Factorial => "!",
        }
    }

    pub fn precedence(self) -> Precedence {
        match self {
            UnaryOp::Neg => Precedence::Negation,
            UnaryOp::Not => Precedence::Not,
            _ => Precedence::Function,
        }
    }

    /// Minimum precedence the operand must have to be printed without parentheses
    pub fn operand_precedence(self) -> Precedence {
        match self {
            UnaryOp::Factorial => Precedence::Atom,
            op => op.precedence(),
        }
    }

    pub fn is_postfix(self) -> bool {
        self == UnaryOp::Factorial
    }

    /// Builtin function name to operator, used when lowering NOLOL calls
    pub fn from_function_name(name: &str) -> Option<UnaryOp> {
        Some(match name.to_ascii_lowercase().as_str() {
            "abs" => UnaryOp::Abs,
            "sqrt" => UnaryOp::Sqrt,
            "sin" => UnaryOp::Sin,
            "cos" => UnaryOp::Cos,
            "tan" => UnaryOp::Tan,
            "asin" => UnaryOp::Asin,
            "acos" => UnaryOp::Acos,
            "atan" => UnaryOp::Atan,
            _ => return None,
        })
    }

    pub(crate) fn from_keyword(token: Token) -> Option<UnaryOp> {
        Some(match token {
            Token::KwAbs => UnaryOp::Abs,
            Token::KwSqrt => UnaryOp::Sqrt,
            Token::KwSin => UnaryOp::Sin,
            Token::KwCos => UnaryOp::Cos,
            Token::KwTan => UnaryOp::Tan,
            Token::KwAsin => UnaryOp::Asin,
            Token::KwAcos => UnaryOp::Acos,
            Token::KwAtan => UnaryOp::Atan,
            _ => return None,
        })
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "^",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }

    pub fn precedence(self) -> Precedence {
        match self {
            BinaryOp::Or => Precedence::Or,
            BinaryOp::And => Precedence::And,
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Gt
            | BinaryOp::Le
            | BinaryOp::Ge => Precedence::Comparison,
            BinaryOp::Add | BinaryOp::Sub => Precedence::Sum,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => Precedence::Product,
            BinaryOp::Pow => Precedence::Power,
        }
    }

    pub fn is_comparison(self) -> bool {
        self.precedence() == Precedence::Comparison
    }

    /// The comparison that yields the logical negation of this one
    pub fn inverted_comparison(self) -> Option<BinaryOp> {
        Some(match self {
            BinaryOp::Eq => BinaryOp::Ne,
            BinaryOp::Ne => BinaryOp::Eq,
            BinaryOp::Lt => BinaryOp::Ge,
            BinaryOp::Ge => BinaryOp::Lt,
            BinaryOp::Gt => BinaryOp::Le,
            BinaryOp::Le => BinaryOp::Gt,
            _ => return None,
        })
    }

    pub(crate) fn from_token(token: Token) -> Option<BinaryOp> {
        Some(match token {
            Token::Plus => BinaryOp::Add,
            Token::Minus => BinaryOp::Sub,
            Token::Star => BinaryOp::Mul,
            Token::Slash => BinaryOp::Div,
            Token::Percent => BinaryOp::Mod,
            Token::Caret => BinaryOp::Pow,
            Token::EqEq => BinaryOp::Eq,
            Token::NotEq => BinaryOp::Ne,
            Token::Lt => BinaryOp::Lt,
            Token::Gt => BinaryOp::Gt,
            Token::LtEq => BinaryOp::Le,
            Token::GtEq => BinaryOp::Ge,
            Token::KwAnd => BinaryOp::And,
            Token::KwOr => BinaryOp::Or,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnaryOperation {
    pub op: UnaryOp,
    pub operand: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryOperation {
    pub op: BinaryOp,
    pub lhs: Box<Expr>,
    pub rhs: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncCall {
    pub name: String,
    pub args: Vec<Expr>,
    pub span: Span,
}

impl Expr {
    pub fn number(value: impl Into<String>, span: Span) -> Expr {
        Expr::NumberConst(NumberConst {
            value: value.into(),
            span,
        })
    }

    pub fn string(value: impl Into<String>, span: Span) -> Expr {
        Expr::StringConst(StringConst {
            value: value.into(),
            span,
        })
    }

    pub fn var(name: impl Into<String>, span: Span) -> Expr {
        Expr::Deref(Dereference::new(name, span))
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
        let span = operand.span().clone();
        Expr::Unary(UnaryOperation {
            op,
            operand: Box::new(operand),
            span,
        })
    }

    /// Build a binary operation whose span covers both operands
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        let span = lhs.span().merge(rhs.span());
        Expr::Binary(BinaryOperation {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            span,
        })
    }

    pub fn span(&self) -> &Span {
        match self {
            Expr::StringConst(e) => &e.span,
            Expr::NumberConst(e) => &e.span,
            Expr::Deref(e) => &e.span,
            Expr::Unary(e) => &e.span,
            Expr::Binary(e) => &e.span,
            Expr::FuncCall(e) => &e.span,
        }
    }

    pub fn span_mut(&mut self) -> &mut Span {
        match self {
            Expr::StringConst(e) => &mut e.span,
            Expr::NumberConst(e) => &mut e.span,
            Expr::Deref(e) => &mut e.span,
            Expr::Unary(e) => &mut e.span,
            Expr::Binary(e) => &mut e.span,
            Expr::FuncCall(e) => &mut e.span,
        }
    }

    /// Constants, plain variable reads and increments have no child nodes
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            Expr::StringConst(_) | Expr::NumberConst(_) | Expr::Deref(_)
        )
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Expr::StringConst(_) | Expr::NumberConst(_))
    }

    /// Binding strength of the outermost operator, used for parenthesization
    pub fn precedence(&self) -> Precedence {
        match self {
            Expr::NumberConst(n) if n.value.starts_with('-') => Precedence::Negation,
            Expr::Unary(u) => u.op.precedence(),
            Expr::Binary(b) => b.op.precedence(),
            _ => Precedence::Atom,
        }
    }
}
