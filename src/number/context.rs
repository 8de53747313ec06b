use std::cmp::Ordering;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};

use super::{Error, Number, Result};

/// PRECISION is the number of significant digits arithmetic results keep.
pub const PRECISION: usize = 28;

/// parts splits a decimal into `(coefficient, exponent)` with
/// `value == coefficient * 10^exponent`.
pub fn parts(value: &BigDecimal) -> (BigInt, i64) {
    let (coefficient, scale) = value.as_bigint_and_exponent();
    (coefficient, -scale)
}

/// digits counts the decimal digits of the coefficient's magnitude; zero has one.
pub fn digits(coefficient: &BigInt) -> usize {
    coefficient.abs().to_string().len()
}

pub fn pow10(n: usize) -> BigInt {
    num_traits::pow(BigInt::from(10), n)
}

fn is_even(n: &BigInt) -> bool {
    (n % BigInt::from(2)).is_zero()
}

/// round_half_even divides a non-negative `magnitude` by `divisor`, rounding the
/// quotient to nearest with ties going to the even neighbour.
pub fn round_half_even(magnitude: &BigInt, divisor: &BigInt) -> BigInt {
    let quotient = magnitude / divisor;
    let twice_remainder = (magnitude % divisor) * BigInt::from(2);

    match twice_remainder.cmp(divisor) {
        Ordering::Greater => quotient + BigInt::one(),
        Ordering::Equal if !is_even(&quotient) => quotient + BigInt::one(),
        _ => quotient,
    }
}

/// fix rounds a value to PRECISION significant digits. A carry that adds a
/// digit drops the last zero and bumps the exponent.
pub fn fix(value: &BigDecimal) -> BigDecimal {
    let (coefficient, exponent) = parts(value);
    let (coefficient, exponent) = fix_parts(coefficient, exponent);
    BigDecimal::new(coefficient, -exponent)
}

fn fix_parts(coefficient: BigInt, exponent: i64) -> (BigInt, i64) {
    let length = digits(&coefficient);
    if length <= PRECISION {
        return (coefficient, exponent);
    }

    let drop = length - PRECISION;
    let mut magnitude = round_half_even(&coefficient.abs(), &pow10(drop));
    let mut exponent = exponent + drop as i64;
    if digits(&magnitude) > PRECISION {
        magnitude = magnitude / BigInt::from(10);
        exponent += 1;
    }

    if coefficient.is_negative() {
        (-magnitude, exponent)
    } else {
        (magnitude, exponent)
    }
}

/// divide computes a correctly rounded quotient of two finite decimals, `b`
/// non-zero. Exact quotients lose trailing zeros down to the ideal exponent
/// `exp(a) - exp(b)`.
pub fn divide(a: &BigDecimal, b: &BigDecimal) -> Number {
    let (dividend, dividend_exponent) = parts(a);
    let (divisor, divisor_exponent) = parts(b);
    let negative = dividend.is_negative() != divisor.is_negative();
    let ideal_exponent = dividend_exponent - divisor_exponent;

    if dividend.is_zero() {
        return Number::from_parts(BigInt::zero(), ideal_exponent);
    }

    let dividend = dividend.abs();
    let divisor = divisor.abs();

    // one digit beyond the precision so the final rounding sees a guard digit
    let shift = digits(&divisor) as i64 - digits(&dividend) as i64 + PRECISION as i64 + 1;
    let mut exponent = ideal_exponent - shift;
    let (mut quotient, remainder) = if shift >= 0 {
        let scaled = dividend * pow10(shift as usize);
        (&scaled / &divisor, &scaled % &divisor)
    } else {
        let scaled = divisor * pow10((-shift) as usize);
        (&dividend / &scaled, &dividend % &scaled)
    };

    if !remainder.is_zero() {
        // sticky digit: an inexact quotient must never look like an exact tie
        if (&quotient % BigInt::from(5)).is_zero() {
            quotient += BigInt::one();
        }
    } else {
        let ten = BigInt::from(10);
        while exponent < ideal_exponent && (&quotient % &ten).is_zero() {
            quotient = quotient / &ten;
            exponent += 1;
        }
    }

    let (quotient, exponent) = fix_parts(quotient, exponent);
    let quotient = if negative { -quotient } else { quotient };
    Number::from_parts(quotient, exponent)
}

/// remainder computes `a - b * trunc(a / b)` for finite decimals, `b` non-zero.
pub fn remainder(a: &BigDecimal, b: &BigDecimal) -> Result<Number> {
    let (dividend, dividend_exponent) = parts(a);
    let (divisor, divisor_exponent) = parts(b);
    let exponent = dividend_exponent.min(divisor_exponent);

    let dividend = dividend * pow10((dividend_exponent - exponent) as usize);
    let divisor = divisor * pow10((divisor_exponent - exponent) as usize);

    let quotient = &dividend / &divisor;
    if digits(&quotient) > PRECISION {
        return Err(Error::DivisionImpossible);
    }

    let (remainder, exponent) = fix_parts(&dividend % &divisor, exponent);
    Ok(Number::from_parts(remainder, exponent))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_round_half_even() {
        let ten = BigInt::from(10);
        assert_eq!(round_half_even(&BigInt::from(25), &ten), BigInt::from(2));
        assert_eq!(round_half_even(&BigInt::from(35), &ten), BigInt::from(4));
        assert_eq!(round_half_even(&BigInt::from(36), &ten), BigInt::from(4));
        assert_eq!(round_half_even(&BigInt::from(34), &ten), BigInt::from(3));
    }

    #[test]
    fn can_count_digits() {
        assert_eq!(digits(&BigInt::from(0)), 1);
        assert_eq!(digits(&BigInt::from(-1234)), 4);
    }

    #[test]
    fn keeps_short_coefficients() {
        let (coefficient, exponent) = fix_parts(BigInt::from(12345), -2);
        assert_eq!(coefficient, BigInt::from(12345));
        assert_eq!(exponent, -2);
    }
}
