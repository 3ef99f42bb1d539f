//! Fixed-point numbers
//!
//! YOLOL numbers carry exactly three decimal places. A [`Number`] stores the
//! value multiplied by 1000 in an `i64`; addition, subtraction and
//! multiplication wrap around on overflow like the game's chips do.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

const SCALE: i64 = 1000;

/// Errors raised by number arithmetic
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("modulo by zero")]
    ModuloByZero,
    #[error("factorial is only defined for non-negative integers")]
    InvalidFactorial,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid number literal '{0}'")]
pub struct ParseNumberError(pub String);

/// A fixed-point number with three decimal places
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Number(i64);

impl Number {
    pub const ZERO: Number = Number(0);
    pub const ONE: Number = Number(SCALE);

    /// Build a number from its scaled representation (`1500` is `1.5`)
    pub const fn from_scaled(scaled: i64) -> Number {
        Number(scaled)
    }

    pub const fn scaled(self) -> i64 {
        self.0
    }

    pub fn from_i64(value: i64) -> Number {
        Number(value.wrapping_mul(SCALE))
    }

    pub fn from_bool(value: bool) -> Number {
        if value {
            Number::ONE
        } else {
            Number::ZERO
        }
    }

    /// Convert from a float, truncating extra decimals toward zero
    pub fn from_f64(value: f64) -> Number {
        Number((value * SCALE as f64) as i64)
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / SCALE as f64
    }

    pub fn is_truthy(self) -> bool {
        self.0 != 0
    }

    pub fn is_integer(self) -> bool {
        self.0 % SCALE == 0
    }

    /// Integer part, truncated toward zero
    pub fn trunc(self) -> i64 {
        self.0 / SCALE
    }

    pub fn checked_div(self, rhs: Number) -> Result<Number, ArithmeticError> {
        if rhs.0 == 0 {
            return Err(ArithmeticError::DivisionByZero);
        }
        Ok(Number((self.0 as i128 * SCALE as i128 / rhs.0 as i128) as i64))
    }

    pub fn checked_rem(self, rhs: Number) -> Result<Number, ArithmeticError> {
        if rhs.0 == 0 {
            return Err(ArithmeticError::ModuloByZero);
        }
        Ok(Number(self.0.wrapping_rem(rhs.0)))
    }

    pub fn pow(self, exponent: Number) -> Number {
        Number::from_f64(self.to_f64().powf(exponent.to_f64()))
    }

    pub fn abs(self) -> Number {
        Number(self.0.wrapping_abs())
    }

    pub fn sqrt(self) -> Number {
        Number::from_f64(self.to_f64().sqrt())
    }

    pub fn sin(self) -> Number {
        Number::from_f64(self.to_f64().to_radians().sin())
    }

    pub fn cos(self) -> Number {
        Number::from_f64(self.to_f64().to_radians().cos())
    }

    pub fn tan(self) -> Number {
        Number::from_f64(self.to_f64().to_radians().tan())
    }

    pub fn asin(self) -> Number {
        Number::from_f64(self.to_f64().asin().to_degrees())
    }

    pub fn acos(self) -> Number {
        Number::from_f64(self.to_f64().acos().to_degrees())
    }

    pub fn atan(self) -> Number {
        Number::from_f64(self.to_f64().atan().to_degrees())
    }

    pub fn factorial(self) -> Result<Number, ArithmeticError> {
        if self.0 < 0 || !self.is_integer() {
            return Err(ArithmeticError::InvalidFactorial);
        }
        let mut product = 1i64;
        for n in 2..=self.trunc() {
            product = product.wrapping_mul(n);
            // Enough factors of two have wrapped the product to zero for good
            if product == 0 {
                break;
            }
        }
        Ok(Number::from_i64(product))
    }

    pub fn not(self) -> Number {
        Number::from_bool(!self.is_truthy())
    }

    pub fn compare(self, rhs: Number) -> Ordering {
        self.0.cmp(&rhs.0)
    }
}

impl Add for Number {
    type Output = Number;

    fn add(self, rhs: Number) -> Number {
        Number(self.0.wrapping_add(rhs.0))
    }
}

impl Sub for Number {
    type Output = Number;

    fn sub(self, rhs: Number) -> Number {
        Number(self.0.wrapping_sub(rhs.0))
    }
}

impl Mul for Number {
    type Output = Number;

    fn mul(self, rhs: Number) -> Number {
        Number((self.0 as i128 * rhs.0 as i128 / SCALE as i128) as i64)
    }
}

impl Neg for Number {
    type Output = Number;

    fn neg(self) -> Number {
        Number(self.0.wrapping_neg())
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::from_i64(value)
    }
}

impl From<bool> for Number {
    fn from(value: bool) -> Self {
        Number::from_bool(value)
    }
}

impl FromStr for Number {
    type Err = ParseNumberError;

    /// Parse `[-]digits[.digits]`; decimals beyond the third are dropped
    fn from_str(text: &str) -> Result<Number, ParseNumberError> {
        let error = || ParseNumberError(text.to_string());
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
        if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(error());
        }
        if !frac_part.bytes().all(|b| b.is_ascii_digit()) || digits.ends_with('.') {
            return Err(error());
        }
        let int: i64 = int_part.parse().map_err(|_| error())?;
        let mut frac = 0;
        let mut unit = SCALE / 10;
        for digit in frac_part.bytes().take(3) {
            frac += (digit - b'0') as i64 * unit;
            unit /= 10;
        }
        let scaled = int
            .checked_mul(SCALE)
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(error)?;
        Ok(Number(if negative { -scaled } else { scaled }))
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        let int = magnitude / SCALE as u64;
        let frac = magnitude % SCALE as u64;
        if frac == 0 {
            write!(f, "{}{}", sign, int)
        } else {
            let decimals = format!("{:03}", frac);
            write!(f, "{}{}.{}", sign, int, decimals.trim_end_matches('0'))
        }
    }
}

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

impl<'de> Deserialize<'de> for Number {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Number, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Ok(Number((value * SCALE as f64).round() as i64))
    }
}
