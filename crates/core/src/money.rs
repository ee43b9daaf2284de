use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

/// Largest magnitude an expense amount may carry, in cents.
const LIMIT_CENTS: i64 = 99_999_999;

/// A signed two-decimal amount. Negative values are refunds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(Decimal);

impl Money {
    pub const MAX: Money = Money(Decimal::from_parts(LIMIT_CENTS as u32, 0, 0, false, 2));
    pub const MIN: Money = Money(Decimal::from_parts(LIMIT_CENTS as u32, 0, 0, true, 2));

    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    /// `None` only when the value cannot fit an `i64` worth of cents.
    pub fn to_cents(self) -> Option<i64> {
        (self.0 * Decimal::ONE_HUNDRED).round().to_i64()
    }

    pub fn from_decimal(decimal: Decimal) -> Self {
        Money(decimal.round_dp(2))
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Inclusive range check against [`Money::MIN`, `Money::MAX`].
    pub fn is_within_limits(self) -> bool {
        self >= Money::MIN && self <= Money::MAX
    }

    /// Range check on an unrounded value, so `999999.991` is rejected rather
    /// than rounded into range.
    pub fn decimal_within_limits(value: Decimal) -> bool {
        value >= Money::MIN.0 && value <= Money::MAX.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            write!(f, "-${:.2}", self.0.abs())
        } else {
            write!(f, "${:.2}", self.0)
        }
    }
}

// JSON carries amounts as plain numbers.
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = rust_decimal::serde::float::deserialize(deserializer)?;
        Ok(Money::from_decimal(value))
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Money(self.0 + rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |a, b| a + b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn limits_are_inclusive() {
        assert_eq!(Money::MAX.as_decimal(), dec("999999.99"));
        assert_eq!(Money::MIN.as_decimal(), dec("-999999.99"));
        assert!(Money::MAX.is_within_limits());
        assert!(Money::MIN.is_within_limits());
        assert!(!Money::from_cents(100_000_000).is_within_limits());
        assert!(!Money::from_cents(-100_000_000).is_within_limits());
    }

    #[test]
    fn unrounded_value_just_past_limit_is_rejected() {
        assert!(Money::decimal_within_limits(dec("999999.99")));
        assert!(!Money::decimal_within_limits(dec("999999.991")));
        assert!(!Money::decimal_within_limits(dec("-999999.991")));
    }

    #[test]
    fn cents_round_trip() {
        assert_eq!(Money::from_cents(12345).to_cents(), Some(12345));
        assert_eq!(Money::from_cents(-1).to_cents(), Some(-1));
    }

    #[test]
    fn from_decimal_rounds_to_two_places() {
        assert_eq!(Money::from_decimal(dec("1.005")).as_decimal(), dec("1.00"));
        assert_eq!(Money::from_decimal(dec("2.675")).as_decimal(), dec("2.68"));
    }

    #[test]
    fn display_formats_sign_before_currency() {
        assert_eq!(Money::from_cents(123456).to_string(), "$1234.56");
        assert_eq!(Money::from_cents(-550).to_string(), "-$5.50");
    }

    #[test]
    fn sums_amounts() {
        let total: Money = [Money::from_cents(100), Money::from_cents(-25)].into_iter().sum();
        assert_eq!(total, Money::from_cents(75));
    }

    #[test]
    fn serializes_as_json_number() {
        let json = serde_json::to_string(&Money::from_cents(1999)).unwrap();
        assert_eq!(json, "19.99");
        let back: Money = serde_json::from_str("19.99").unwrap();
        assert_eq!(back, Money::from_cents(1999));
    }
}
