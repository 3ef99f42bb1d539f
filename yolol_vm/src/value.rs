//! Runtime values and operator semantics
//!
//! A value is either a [`Number`] or a string. When the two operands of a
//! binary operator have different types, the number is converted to its
//! string form first and the string version of the operator applies.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use yolol_vm_parser::ast::{BinaryOp, UnaryOp};

use crate::number::{ArithmeticError, Number};

/// Errors raised while applying an operator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),

    #[error("operator '{op}' is not defined for strings")]
    StringOperator { op: &'static str },

    #[error("cannot decrement an empty string")]
    EmptyStringDecrement,

    #[error("a string cannot be used as a condition")]
    StringCondition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(Number),
    String(String),
}

impl Default for Value {
    fn default() -> Self {
        Value::Number(Number::ZERO)
    }
}

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(Number::from_i64(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Number(Number::from_bool(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => f.write_str(s),
        }
    }
}

impl Value {
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            Value::String(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::Number(_) => None,
        }
    }

    /// Truth value of a condition; strings have none
    pub fn truthy(&self) -> Result<bool, ValueError> {
        match self {
            Value::Number(n) => Ok(n.is_truthy()),
            Value::String(_) => Err(ValueError::StringCondition),
        }
    }

    /// The value after `++`: numbers grow by one, strings by a space
    pub fn incremented(&self) -> Value {
        match self {
            Value::Number(n) => Value::Number(*n + Number::ONE),
            Value::String(s) => Value::String(format!("{} ", s)),
        }
    }

    /// The value after `--`: numbers shrink by one, strings lose their last character
    pub fn decremented(&self) -> Result<Value, ValueError> {
        match self {
            Value::Number(n) => Ok(Value::Number(*n - Number::ONE)),
            Value::String(s) => {
                let mut s = s.clone();
                s.pop().ok_or(ValueError::EmptyStringDecrement)?;
                Ok(Value::String(s))
            }
        }
    }

    /// Apply a binary operator
    pub fn binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, ValueError> {
        match (lhs, rhs) {
            (Value::Number(a), Value::Number(b)) => number_binary(op, *a, *b).map(Value::Number),
            (Value::String(a), Value::String(b)) => string_binary(op, a, b),
            (Value::String(a), Value::Number(b)) => string_binary(op, a, &b.to_string()),
            (Value::Number(a), Value::String(b)) => string_binary(op, &a.to_string(), b),
        }
    }

    /// Apply a unary operator
    pub fn unary(op: UnaryOp, operand: &Value) -> Result<Value, ValueError> {
        match operand {
            Value::Number(n) => number_unary(op, *n).map(Value::Number),
            Value::String(_) => Err(ValueError::StringOperator { op: op.symbol() }),
        }
    }
}

fn number_binary(op: BinaryOp, a: Number, b: Number) -> Result<Number, ValueError> {
    Ok(match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a.checked_div(b)?,
        BinaryOp::Mod => a.checked_rem(b)?,
        BinaryOp::Pow => a.pow(b),
        BinaryOp::Eq => Number::from_bool(a == b),
        BinaryOp::Ne => Number::from_bool(a != b),
        BinaryOp::Lt => Number::from_bool(a < b),
        BinaryOp::Gt => Number::from_bool(a > b),
        BinaryOp::Le => Number::from_bool(a <= b),
        BinaryOp::Ge => Number::from_bool(a >= b),
        BinaryOp::And => Number::from_bool(a.is_truthy() && b.is_truthy()),
        BinaryOp::Or => Number::from_bool(a.is_truthy() || b.is_truthy()),
    })
}

fn number_unary(op: UnaryOp, n: Number) -> Result<Number, ValueError> {
    Ok(match op {
        UnaryOp::Neg => -n,
        UnaryOp::Not => n.not(),
        UnaryOp::Abs => n.abs(),
        UnaryOp::Sqrt => n.sqrt(),
        UnaryOp::Sin => n.sin(),
        UnaryOp::Cos => n.cos(),
        UnaryOp::Tan => n.tan(),
        UnaryOp::Asin => n.asin(),
        UnaryOp::Acos => n.acos(),
        UnaryOp::Atan => n.atan(),
        UnaryOp::Factorial => n.factorial()?,
    })
}

fn string_binary(op: BinaryOp, a: &str, b: &str) -> Result<Value, ValueError> {
    let flag = |value: bool| Value::Number(Number::from_bool(value));
    Ok(match op {
        BinaryOp::Add => Value::String(format!("{}{}", a, b)),
        BinaryOp::Sub => Value::String(remove_last(a, b)),
        BinaryOp::Eq => flag(a == b),
        BinaryOp::Ne => flag(a != b),
        BinaryOp::Lt => flag(a < b),
        BinaryOp::Gt => flag(a > b),
        BinaryOp::Le => flag(a <= b),
        BinaryOp::Ge => flag(a >= b),
        _ => return Err(ValueError::StringOperator { op: op.symbol() }),
    })
}

/// `a - b` on strings removes the last occurrence of `b`
fn remove_last(a: &str, b: &str) -> String {
    match a.rfind(b) {
        Some(index) if !b.is_empty() => format!("{}{}", &a[..index], &a[index + b.len()..]),
        _ => a.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(text: &str) -> Value {
        Value::Number(text.parse().unwrap())
    }

    #[test]
    fn test_mixed_operands_become_strings() {
        let result = Value::binary(BinaryOp::Add, &Value::from("a"), &num("1.5")).unwrap();
        assert_eq!(result, Value::from("a1.5"));
        let result = Value::binary(BinaryOp::Add, &num("2"), &Value::from("b")).unwrap();
        assert_eq!(result, Value::from("2b"));
        let result = Value::binary(BinaryOp::Eq, &num("1"), &Value::from("1")).unwrap();
        assert_eq!(result, num("1"));
    }

    #[test]
    fn test_string_subtraction_removes_last_occurrence() {
        let result = Value::binary(BinaryOp::Sub, &Value::from("abcabc"), &Value::from("bc")).unwrap();
        assert_eq!(result, Value::from("abca"));
        let result = Value::binary(BinaryOp::Sub, &Value::from("abc"), &Value::from("x")).unwrap();
        assert_eq!(result, Value::from("abc"));
    }

    #[test]
    fn test_string_operators_that_do_not_exist() {
        let err = Value::binary(BinaryOp::Mul, &Value::from("a"), &Value::from("b")).unwrap_err();
        assert_eq!(err, ValueError::StringOperator { op: "*" });
        assert!(Value::unary(UnaryOp::Neg, &Value::from("a")).is_err());
        assert_eq!(Value::from("a").truthy(), Err(ValueError::StringCondition));
    }

    #[test]
    fn test_increment_and_decrement() {
        assert_eq!(num("1").incremented(), num("2"));
        assert_eq!(Value::from("ab").incremented(), Value::from("ab "));
        assert_eq!(Value::from("ab").decremented(), Ok(Value::from("a")));
        assert_eq!(Value::from("").decremented(), Err(ValueError::EmptyStringDecrement));
    }

    #[test]
    fn test_number_operators() {
        assert_eq!(Value::binary(BinaryOp::Lt, &num("1"), &num("2")).unwrap(), num("1"));
        assert_eq!(Value::binary(BinaryOp::And, &num("1"), &num("0")).unwrap(), num("0"));
        assert_eq!(
            Value::binary(BinaryOp::Div, &num("1"), &num("0")),
            Err(ValueError::Arithmetic(ArithmeticError::DivisionByZero))
        );
        assert_eq!(Value::unary(UnaryOp::Factorial, &num("4")).unwrap(), num("24"));
    }

    #[test]
    fn test_untagged_serialization() {
        let json = serde_json::to_string(&vec![num("2"), Value::from("x")]).unwrap();
        assert_eq!(json, "[2.0,\"x\"]");
    }
}
