mod context;

use std::cmp::Ordering;
use std::fmt;
use std::result;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{Signed, Zero};

use self::context::{digits, parts, pow10, round_half_even};

pub use self::context::PRECISION;

/// Result binds the std::result::Result::Err type to this module's error type.
pub type Result<T> = result::Result<T, Error>;

/// Error represents the faults the decimal context traps on.
#[derive(thiserror::Error, Debug, PartialEq, Clone)]
pub enum Error {
    #[error("division by zero")]
    DivisionByZero,
    #[error("division undefined (0 / 0)")]
    DivisionUndefined,
    #[error("division impossible: quotient exceeds {} digits", PRECISION)]
    DivisionImpossible,
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),
    #[error("math domain error")]
    Domain,
    #[error("cannot round {0}")]
    Round(&'static str),
}

/// Number is a decimal floating point value: an arbitrary-precision finite
/// decimal, a signed infinity, or a quiet NaN.
#[derive(Debug, Clone, PartialEq)]
pub enum Number {
    Finite(BigDecimal),
    Infinity { negative: bool },
    NaN,
}

impl Number {
    pub fn zero() -> Self {
        Number::from(0)
    }

    pub fn infinity(negative: bool) -> Self {
        Number::Infinity { negative }
    }

    fn from_parts(coefficient: BigInt, exponent: i64) -> Self {
        Number::Finite(BigDecimal::new(coefficient, -exponent))
    }

    /// from_f64 converts a binary float without loss: every finite `f64` has a
    /// terminating decimal expansion and that expansion is the result.
    pub fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            return Number::NaN;
        }
        if value.is_infinite() {
            return Number::infinity(value < 0.0);
        }

        let bits = value.to_bits();
        let negative = bits >> 63 == 1;
        let biased = ((bits >> 52) & 0x7ff) as i64;
        let fraction = bits & ((1u64 << 52) - 1);
        let (mut mantissa, mut exponent) = if biased == 0 {
            (fraction, -1074)
        } else {
            (fraction | (1u64 << 52), biased - 1075)
        };
        if mantissa == 0 {
            return Number::zero();
        }
        while exponent < 0 && mantissa & 1 == 0 {
            mantissa >>= 1;
            exponent += 1;
        }

        let (coefficient, decimal_exponent) = if exponent >= 0 {
            (BigInt::from(mantissa) << exponent as usize, 0)
        } else {
            // m / 2^k == m * 5^k / 10^k
            let five = num_traits::pow(BigInt::from(5), (-exponent) as usize);
            (BigInt::from(mantissa) * five, exponent)
        };
        let coefficient = if negative { -coefficient } else { coefficient };
        Number::from_parts(coefficient, decimal_exponent)
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Number::NaN => f64::NAN,
            Number::Infinity { negative: true } => f64::NEG_INFINITY,
            Number::Infinity { negative: false } => f64::INFINITY,
            Number::Finite(_) => self.to_string().parse().unwrap_or(f64::NAN),
        }
    }

    pub fn is_nan(&self) -> bool {
        match self {
            Number::NaN => true,
            _ => false,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Number::Finite(value) => value.is_zero(),
            _ => false,
        }
    }

    fn is_negative(&self) -> bool {
        match self {
            Number::Finite(value) => value.is_negative(),
            Number::Infinity { negative } => *negative,
            Number::NaN => false,
        }
    }

    pub fn is_integer(&self) -> bool {
        match self {
            Number::Finite(value) => {
                let (coefficient, exponent) = parts(value);
                exponent >= 0 || (&coefficient % pow10((-exponent) as usize)).is_zero()
            }
            _ => false,
        }
    }

    /// compare orders two numbers. Ordering against NaN is an invalid operation.
    pub fn compare(&self, other: &Number) -> Result<Ordering> {
        use self::Number::*;

        match (self, other) {
            (NaN, _) | (_, NaN) => Err(Error::InvalidOperation("comparison involving NaN")),
            (Finite(a), Finite(b)) => Ok(a.cmp(b)),
            (Infinity { negative: a }, Infinity { negative: b }) => Ok(b.cmp(a)),
            (Infinity { negative }, Finite(_)) => Ok(if *negative {
                Ordering::Less
            } else {
                Ordering::Greater
            }),
            (Finite(_), Infinity { negative }) => Ok(if *negative {
                Ordering::Greater
            } else {
                Ordering::Less
            }),
        }
    }

    /// exceeds reports whether this number is strictly greater than `limit`.
    pub fn exceeds(&self, limit: i64) -> Result<bool> {
        Ok(self.compare(&Number::from(limit))? == Ordering::Greater)
    }

    /// magnitude_exceeds reports whether `|self| > limit`.
    pub fn magnitude_exceeds(&self, limit: i64) -> Result<bool> {
        match self {
            Number::NaN => Err(Error::InvalidOperation("comparison involving NaN")),
            Number::Infinity { .. } => Ok(true),
            Number::Finite(value) => Ok(value.abs() > BigDecimal::from(limit)),
        }
    }

    pub fn neg(&self) -> Number {
        match self {
            Number::Finite(value) => fix(&-value),
            Number::Infinity { negative } => Number::infinity(!negative),
            Number::NaN => Number::NaN,
        }
    }

    pub fn abs(&self) -> Number {
        match self {
            Number::Finite(value) => fix(&value.abs()),
            Number::Infinity { .. } => Number::infinity(false),
            Number::NaN => Number::NaN,
        }
    }

    pub fn add(&self, other: &Number) -> Result<Number> {
        use self::Number::*;

        match (self, other) {
            (NaN, _) | (_, NaN) => Ok(NaN),
            (Infinity { negative: a }, Infinity { negative: b }) if a != b => {
                Err(Error::InvalidOperation("-INF + INF"))
            }
            (Infinity { negative }, _) | (_, Infinity { negative }) => {
                Ok(Number::infinity(*negative))
            }
            (Finite(a), Finite(b)) => Ok(fix(&(a + b))),
        }
    }

    pub fn sub(&self, other: &Number) -> Result<Number> {
        match other {
            Number::Finite(value) => self.add(&Number::Finite(-value)),
            other => self.add(&other.neg()),
        }
    }

    pub fn mul(&self, other: &Number) -> Result<Number> {
        use self::Number::*;

        match (self, other) {
            (NaN, _) | (_, NaN) => Ok(NaN),
            (Infinity { .. }, _) | (_, Infinity { .. }) => {
                if self.is_zero() || other.is_zero() {
                    Err(Error::InvalidOperation("0 * INF"))
                } else {
                    Ok(Number::infinity(self.is_negative() != other.is_negative()))
                }
            }
            (Finite(a), Finite(b)) => Ok(fix(&(a * b))),
        }
    }

    pub fn div(&self, other: &Number) -> Result<Number> {
        use self::Number::*;

        let negative = self.is_negative() != other.is_negative();
        match (self, other) {
            (NaN, _) | (_, NaN) => Ok(NaN),
            (Infinity { .. }, Infinity { .. }) => Err(Error::InvalidOperation("INF / INF")),
            (Infinity { .. }, _) => Ok(Number::infinity(negative)),
            (_, Infinity { .. }) => Ok(Number::zero()),
            (Finite(a), Finite(b)) => {
                if b.is_zero() {
                    return if a.is_zero() {
                        Err(Error::DivisionUndefined)
                    } else {
                        Err(Error::DivisionByZero)
                    };
                }
                Ok(context::divide(a, b))
            }
        }
    }

    /// rem is the truncated remainder; its sign follows the dividend.
    pub fn rem(&self, other: &Number) -> Result<Number> {
        use self::Number::*;

        match (self, other) {
            (NaN, _) | (_, NaN) => Ok(NaN),
            (Infinity { .. }, _) => Err(Error::InvalidOperation("INF % x")),
            (Finite(a), Infinity { .. }) => Ok(fix(a)),
            (Finite(a), Finite(b)) => {
                if b.is_zero() {
                    return if a.is_zero() {
                        Err(Error::DivisionUndefined)
                    } else {
                        Err(Error::InvalidOperation("x % 0"))
                    };
                }
                context::remainder(a, b)
            }
        }
    }

    pub fn pow(&self, other: &Number) -> Result<Number> {
        use self::Number::*;

        match (self, other) {
            (NaN, _) | (_, NaN) => Ok(NaN),
            (Finite(base), Finite(exponent)) => {
                if exponent.is_zero() {
                    return if base.is_zero() {
                        Err(Error::InvalidOperation("0 ** 0"))
                    } else {
                        Ok(Number::from(1))
                    };
                }
                if base.is_zero() {
                    return if exponent.is_negative() {
                        Ok(Number::infinity(false))
                    } else {
                        Ok(Number::zero())
                    };
                }
                if other.is_integer() {
                    return self.integer_pow(exponent);
                }
                if base.is_negative() {
                    return Err(Error::InvalidOperation("x ** (non-integer)"));
                }
                Ok(Number::from_f64(self.to_f64().powf(other.to_f64())).rounded())
            }
            _ => Ok(Number::from_f64(self.to_f64().powf(other.to_f64())).rounded()),
        }
    }

    fn integer_pow(&self, exponent: &BigDecimal) -> Result<Number> {
        let (coefficient, shift) = parts(exponent);
        let n = if shift >= 0 {
            coefficient * pow10(shift as usize)
        } else {
            coefficient / pow10((-shift) as usize)
        };
        let magnitude = match n.abs().to_string().parse::<usize>() {
            Ok(magnitude) => magnitude,
            Err(_) => return Ok(Number::from_f64(self.to_f64().powf(exponent_f64(&n)))),
        };

        let base = match self {
            Number::Finite(base) => base,
            _ => return Err(Error::InvalidOperation("x ** n")),
        };
        let (base_coefficient, base_exponent) = parts(base);
        let exact = Number::from_parts(
            num_traits::pow(base_coefficient, magnitude),
            base_exponent * magnitude as i64,
        );

        if n.is_negative() {
            Number::from(1).div(&exact)
        } else {
            Ok(exact.rounded())
        }
    }

    /// round_half_even rounds to the nearest integer, ties to even.
    pub fn round_half_even(&self) -> Result<Number> {
        match self {
            Number::NaN => Err(Error::Round("a NaN")),
            Number::Infinity { .. } => Err(Error::Round("an infinity")),
            Number::Finite(value) => {
                let (coefficient, exponent) = parts(value);
                if exponent >= 0 {
                    return Ok(Number::from_parts(
                        coefficient * pow10(exponent as usize),
                        0,
                    ));
                }
                let divisor = pow10((-exponent) as usize);
                let magnitude = round_half_even(&coefficient.abs(), &divisor);
                let integer = if coefficient.is_negative() {
                    -magnitude
                } else {
                    magnitude
                };
                Ok(Number::from_parts(integer, 0))
            }
        }
    }

    /// rounded applies the context precision to this value.
    fn rounded(self) -> Number {
        match self {
            Number::Finite(value) => fix(&value),
            special => special,
        }
    }
}

fn exponent_f64(n: &BigInt) -> f64 {
    n.to_string().parse().unwrap_or(f64::NAN)
}

fn fix(value: &BigDecimal) -> Number {
    Number::Finite(context::fix(value))
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Finite(BigDecimal::from(value))
    }
}

impl FromStr for Number {
    type Err = bigdecimal::ParseBigDecimalError;

    fn from_str(input: &str) -> result::Result<Self, Self::Err> {
        BigDecimal::from_str(input).map(Number::Finite)
    }
}

impl fmt::Display for Number {
    /// Renders in decimal scientific-string form: plain notation while the
    /// exponent is non-positive and the adjusted exponent is at least -6.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let value = match self {
            Number::NaN => return write!(f, "NaN"),
            Number::Infinity { negative: true } => return write!(f, "-Infinity"),
            Number::Infinity { negative: false } => return write!(f, "Infinity"),
            Number::Finite(value) => value,
        };

        let (coefficient, exponent) = parts(value);
        let sign = if coefficient.is_negative() { "-" } else { "" };
        let digits_text = coefficient.abs().to_string();
        let length = digits(&coefficient) as i64;
        let left_digits = exponent + length;

        let dot_place = if exponent <= 0 && left_digits > -6 {
            left_digits
        } else {
            1
        };

        let (int_part, frac_part) = if dot_place <= 0 {
            (
                "0".to_string(),
                format!(".{}{}", "0".repeat((-dot_place) as usize), digits_text),
            )
        } else if dot_place >= length {
            (
                format!(
                    "{}{}",
                    digits_text,
                    "0".repeat((dot_place - length) as usize)
                ),
                String::new(),
            )
        } else {
            let (int_part, frac_part) = digits_text.split_at(dot_place as usize);
            (int_part.to_string(), format!(".{}", frac_part))
        };

        write!(f, "{}{}{}", sign, int_part, frac_part)?;
        if left_digits != dot_place {
            write!(f, "E{:+}", left_digits - dot_place)?;
        }
        Ok(())
    }
}
