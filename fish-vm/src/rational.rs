//! Exact-precision rational arithmetic.
//!
//! `Rational` is the sole numeric type in the VM: every value on every
//! stack is one of these. Values are kept in reduced form (`gcd(n, d) ==
//! 1`, `d > 0`) as a type invariant, enforced by every constructor, so
//! equality is always value equality and no caller needs to normalize
//! before comparing.

use std::cmp::Ordering;
use std::fmt;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::error::VmError;

/// An arbitrary-precision rational number, always stored reduced with a
/// positive denominator.
#[derive(Clone, Debug)]
pub struct Rational {
    n: BigInt,
    d: BigInt,
}

impl Rational {
    /// Builds a rational from a numerator and denominator, reducing to
    /// lowest terms and normalizing the sign of the denominator.
    ///
    /// # Panics
    /// If `d` is zero. Callers that can receive a zero denominator from
    /// user input (division) must check before calling this.
    fn new(mut n: BigInt, mut d: BigInt) -> Self {
        assert!(!d.is_zero(), "rational denominator must be nonzero");
        if d.is_negative() {
            n = -n;
            d = -d;
        }
        let g = n.gcd(&d);
        if !g.is_one() && !g.is_zero() {
            n /= &g;
            d /= &g;
        }
        Rational { n, d }
    }

    /// The rational 0/1.
    pub fn zero() -> Self {
        Rational { n: BigInt::zero(), d: BigInt::one() }
    }

    /// The rational 1/1.
    pub fn one() -> Self {
        Rational { n: BigInt::one(), d: BigInt::one() }
    }

    /// Builds a rational equal to the given integer.
    pub fn from_int(i: i64) -> Self {
        Rational { n: BigInt::from(i), d: BigInt::one() }
    }

    /// Builds `1/1` for `true`, `0/1` for `false`.
    pub fn from_bool(b: bool) -> Self {
        if b {
            Self::one()
        } else {
            Self::zero()
        }
    }

    /// Truncates toward zero, returning `n / d` as an integer.
    ///
    /// Saturates at `i64::MIN`/`i64::MAX` if the value doesn't fit; ><>
    /// programs that teleport or poke the grid with out-of-range values
    /// are responsible for their own good behavior.
    pub fn to_int(&self) -> i64 {
        let q = &self.n / &self.d;
        q.to_i64().unwrap_or(if q.is_negative() { i64::MIN } else { i64::MAX })
    }

    /// `true` iff the numerator is nonzero.
    pub fn to_bool(&self) -> bool {
        !self.n.is_zero()
    }

    /// Adds two rationals.
    pub fn add(&self, other: &Self) -> Self {
        Rational::new(
            &self.n * &other.d + &self.d * &other.n,
            &self.d * &other.d,
        )
    }

    /// Subtracts `other` from `self`.
    pub fn sub(&self, other: &Self) -> Self {
        Rational::new(
            &self.n * &other.d - &self.d * &other.n,
            &self.d * &other.d,
        )
    }

    /// Multiplies two rationals.
    pub fn mul(&self, other: &Self) -> Self {
        Rational::new(&self.n * &other.n, &self.d * &other.d)
    }

    /// Divides `self` by `other`.
    ///
    /// # Errors
    /// [`VmError::DivByZero`] if `other`'s numerator is zero (i.e.
    /// `other` is zero).
    pub fn div(&self, other: &Self) -> Result<Self, VmError> {
        if other.n.is_zero() {
            return Err(VmError::DivByZero);
        }
        Ok(Rational::new(&self.n * &other.d, &self.d * &other.n))
    }

    /// Euclidean-flavored remainder, computed as `a - b * trunc(a / b)` on
    /// the cross-multiplied numerator and denominator.
    ///
    /// The inner division truncates toward zero (matching [`Self::to_int`]
    /// and Rust's native `BigInt` division), per the resolved Open
    /// Question in `DESIGN.md` about the sign behavior of `%`.
    ///
    /// # Errors
    /// [`VmError::DivByZero`] if `other`'s numerator is zero.
    pub fn modulo(&self, other: &Self) -> Result<Self, VmError> {
        if other.n.is_zero() {
            return Err(VmError::DivByZero);
        }
        let num = &self.n * &other.d;
        let den = &self.d * &other.n;
        let quo = &num / &den;
        Ok(Rational::new(&num - &den * &quo, &self.d * &other.d))
    }

    fn cmp_value(&self, other: &Self) -> Ordering {
        (&self.n * &other.d).cmp(&(&self.d * &other.n))
    }

    /// `self < other`.
    pub fn lt(&self, other: &Self) -> bool {
        self.cmp_value(other) == Ordering::Less
    }

    /// `self > other`.
    pub fn gt(&self, other: &Self) -> bool {
        self.cmp_value(other) == Ordering::Greater
    }

    /// `self == other` (value equality of the reduced form).
    pub fn eq_value(&self, other: &Self) -> bool {
        self.cmp_value(other) == Ordering::Equal
    }

    /// `self <= other`.
    pub fn le(&self, other: &Self) -> bool {
        !self.gt(other)
    }

    /// `self >= other`.
    pub fn ge(&self, other: &Self) -> bool {
        !self.lt(other)
    }

    /// `self != other`.
    pub fn ne_value(&self, other: &Self) -> bool {
        !self.eq_value(other)
    }
}

impl PartialEq for Rational {
    fn eq(&self, other: &Self) -> bool {
        self.eq_value(other)
    }
}

impl fmt::Display for Rational {
    /// Formats an integer rational as its plain decimal, and a
    /// non-integer rational as a decimal expansion: exact if the
    /// denominator's only prime factors are 2 and 5 (a finite decimal
    /// exists), otherwise the shortest round-trip decimal of the nearest
    /// `f64`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.d.is_one() {
            return write!(f, "{}", self.n);
        }

        let mut rest = self.d.clone();
        let two = BigInt::from(2);
        let five = BigInt::from(5);
        let mut twos = 0u32;
        while (&rest % &two).is_zero() {
            rest /= &two;
            twos += 1;
        }
        let mut fives = 0u32;
        while (&rest % &five).is_zero() {
            rest /= &five;
            fives += 1;
        }

        if rest.is_one() {
            let scale = twos.max(fives);
            let extra_twos = scale - twos;
            let extra_fives = scale - fives;
            let scaled = &self.n * two.pow(extra_twos) * five.pow(extra_fives);
            let ten_pow = BigInt::from(10).pow(scale);
            let neg = scaled.is_negative();
            let scaled = scaled.abs();
            let whole = &scaled / &ten_pow;
            let frac = &scaled % &ten_pow;
            if neg && (!whole.is_zero() || !frac.is_zero()) {
                write!(f, "-")?;
            }
            let frac_digits = format!("{:0>width$}", frac.to_string(), width = scale as usize);
            write!(f, "{whole}.{frac_digits}")
        } else {
            let nf = self.n.to_f64().unwrap_or(f64::NAN);
            let df = self.d.to_f64().unwrap_or(f64::NAN);
            write!(f, "{}", nf / df)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduces_on_construction() {
        let r = Rational::new(BigInt::from(4), BigInt::from(8));
        assert_eq!(r.to_string(), "0.5");
        let r = Rational::new(BigInt::from(-4), BigInt::from(-8));
        assert_eq!(r.to_string(), "0.5");
        let r = Rational::new(BigInt::from(4), BigInt::from(-8));
        assert_eq!(r.to_string(), "-0.5");
    }

    #[test]
    fn display_integers() {
        assert_eq!(Rational::from_int(32).to_string(), "32");
        assert_eq!(Rational::from_int(-1).to_string(), "-1");
        assert_eq!(Rational::zero().to_string(), "0");
    }

    #[test]
    fn display_terminating_decimal() {
        let r = Rational::from_int(1).div(&Rational::from_int(5)).unwrap();
        assert_eq!(r.to_string(), "0.2");
        let r = Rational::from_int(3).div(&Rational::from_int(4)).unwrap();
        assert_eq!(r.to_string(), "0.75");
        let r = Rational::from_int(-1).div(&Rational::from_int(4)).unwrap();
        assert_eq!(r.to_string(), "-0.25");
    }

    #[test]
    fn display_repeating_decimal_falls_back_to_float() {
        let r = Rational::from_int(1).div(&Rational::from_int(3)).unwrap();
        assert_eq!(r.to_string(), format!("{}", 1.0_f64 / 3.0_f64));
    }

    #[test]
    fn div_by_zero_errors() {
        let r = Rational::from_int(1).div(&Rational::zero());
        assert!(matches!(r, Err(VmError::DivByZero)));
    }

    #[test]
    fn modulo_truncates_toward_zero() {
        let a = Rational::from_int(-7);
        let b = Rational::from_int(2);
        // trunc(-7/2) = -3, so -7 - 2*(-3) = -1
        assert_eq!(a.modulo(&b).unwrap(), Rational::from_int(-1));
    }

    #[test]
    fn ordering_and_equality() {
        let a = Rational::from_int(1).div(&Rational::from_int(2)).unwrap();
        let b = Rational::from_int(2).div(&Rational::from_int(4)).unwrap();
        assert!(a.eq_value(&b));
        assert!(Rational::from_int(1).lt(&Rational::from_int(2)));
        assert!(Rational::from_int(2).gt(&Rational::from_int(1)));
    }

    #[test]
    fn truthiness() {
        assert!(!Rational::zero().to_bool());
        assert!(Rational::from_int(5).to_bool());
        assert!(Rational::from_int(-5).to_bool());
    }

    #[test]
    fn add_sub_roundtrip() {
        let a = Rational::from_int(7);
        let b = Rational::from_int(3);
        assert_eq!(a.add(&b).sub(&b), a);
    }

    #[test]
    fn mul_div_roundtrip() {
        let a = Rational::from_int(7);
        let b = Rational::from_int(3);
        assert_eq!(a.mul(&b).div(&b).unwrap(), a);
    }
}
