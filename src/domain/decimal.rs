//! Lossless decimal money type backed by rust_decimal.
//!
//! All ledger arithmetic goes through this type so that derived quantities
//! (toplam, komisyon, net, devir, kasa top) compare with exact equality.

use rust_decimal::Decimal as RustDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;

/// Exact decimal amount used for every ledger quantity.
///
/// Serializes as a JSON string so large balances survive a round trip
/// through clients that parse numbers as doubles.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Decimal(#[serde(with = "rust_decimal::serde::str")] RustDecimal);

impl Decimal {
    pub const fn new(value: RustDecimal) -> Self {
        Decimal(value)
    }

    /// Parse a Decimal from a string losslessly.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        RustDecimal::from_str(s.trim()).map(Decimal)
    }

    /// Format without trailing zeros or exponent notation.
    pub fn to_canonical_string(&self) -> String {
        self.0.normalize().to_string()
    }

    pub fn inner(&self) -> RustDecimal {
        self.0
    }

    pub fn zero() -> Self {
        Decimal(RustDecimal::ZERO)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    pub fn abs(&self) -> Self {
        Decimal(self.0.abs())
    }

    /// True when `|self - other| > epsilon`.
    pub fn differs_from(&self, other: Decimal, epsilon: Decimal) -> bool {
        (self.0 - other.0).abs() > epsilon.0
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical_string())
    }
}

impl FromStr for Decimal {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

impl From<RustDecimal> for Decimal {
    fn from(value: RustDecimal) -> Self {
        Decimal(value)
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Decimal(RustDecimal::from(value))
    }
}

impl Add for Decimal {
    type Output = Decimal;

    fn add(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 + rhs.0)
    }
}

impl AddAssign for Decimal {
    fn add_assign(&mut self, rhs: Decimal) {
        self.0 += rhs.0;
    }
}

impl Sub for Decimal {
    type Output = Decimal;

    fn sub(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 - rhs.0)
    }
}

impl SubAssign for Decimal {
    fn sub_assign(&mut self, rhs: Decimal) {
        self.0 -= rhs.0;
    }
}

impl Mul for Decimal {
    type Output = Decimal;

    fn mul(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 * rhs.0)
    }
}

impl Neg for Decimal {
    type Output = Decimal;

    fn neg(self) -> Decimal {
        Decimal(-self.0)
    }
}

impl Sum for Decimal {
    fn sum<I: Iterator<Item = Decimal>>(iter: I) -> Self {
        iter.fold(Decimal::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Decimal> for Decimal {
    fn sum<I: Iterator<Item = &'a Decimal>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    #[test]
    fn test_canonical_string_drops_trailing_zeros() {
        assert_eq!(d("1200.00").to_canonical_string(), "1200");
        assert_eq!(d("0.150").to_canonical_string(), "0.15");
        assert_eq!(d("-42.50").to_string(), "-42.5");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(d("  700 "), d("700"));
        assert!(Decimal::from_str_canonical("abc").is_err());
    }

    #[test]
    fn test_commission_multiplication_is_exact() {
        // 0.1 * 3 must not drift the way binary floats do.
        assert_eq!(d("3") * d("0.1"), d("0.3"));
        assert_eq!(d("1000") * d("0.15"), d("150"));
    }

    #[test]
    fn test_equality_ignores_scale() {
        assert_eq!(d("700"), d("700.000"));
    }

    #[test]
    fn test_sum_over_owned_and_borrowed() {
        let values = vec![d("1.5"), d("2.25"), d("-0.75")];
        let owned: Decimal = values.iter().copied().sum();
        let borrowed: Decimal = values.iter().sum();
        assert_eq!(owned, d("3"));
        assert_eq!(borrowed, d("3"));
        assert_eq!(Vec::<Decimal>::new().into_iter().sum::<Decimal>(), Decimal::zero());
    }

    #[test]
    fn test_assign_ops() {
        let mut running = d("100");
        running += d("50");
        running -= d("30.5");
        assert_eq!(running, d("119.5"));
    }

    #[test]
    fn test_differs_from_uses_strict_epsilon() {
        let eps = d("0.01");
        assert!(!d("400").differs_from(d("400.01"), eps));
        assert!(d("400").differs_from(d("400.011"), eps));
        assert!(d("-5").differs_from(d("5"), eps));
    }

    #[test]
    fn test_sign_helpers() {
        assert!(d("-0.01").is_negative());
        assert!(!Decimal::zero().is_negative());
        assert_eq!(d("-200").abs(), d("200"));
        assert_eq!(-d("3"), d("-3"));
    }

    #[test]
    fn test_json_serializes_as_string() {
        let json = serde_json::to_value(d("850.5")).unwrap();
        assert_eq!(json, serde_json::json!("850.5"));
        let back: Decimal = serde_json::from_value(json).unwrap();
        assert_eq!(back, d("850.5"));
    }
}
