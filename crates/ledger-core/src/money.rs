//! Fixed-point monetary value.
//!
//! `Money` never does binary floating-point arithmetic. Internally it is an
//! `i64` count of minor units (cents); the public constructors go through
//! `rust_decimal::Decimal`, quantized to two fractional digits with
//! half-up rounding, so callers never have to think about the minor-unit
//! representation themselves.

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of minor units (cents) per major unit.
const MINOR_UNITS_PER_MAJOR: i64 = 100;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Money {
    minor_units: i64,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("invalid decimal string: {0}")]
    InvalidDecimal(String),
    #[error("amount must be greater than zero")]
    NotPositive,
}

impl Money {
    pub const ZERO: Money = Money { minor_units: 0 };

    /// Construct directly from a minor-unit count (cents). Used at the
    /// storage boundary, where amounts are persisted as `i64`.
    pub fn from_minor_units(minor_units: i64) -> Self {
        Self { minor_units }
    }

    pub fn minor_units(&self) -> i64 {
        self.minor_units
    }

    /// Parse a decimal string (`"10.00"`, `"-5"`, `"3.005"`), quantizing to
    /// two fractional digits with half-up rounding.
    pub fn from_decimal_str(s: &str) -> Result<Self, MoneyError> {
        let d = Decimal::from_str(s.trim()).map_err(|_| MoneyError::InvalidDecimal(s.to_string()))?;
        Self::from_decimal(d)
    }

    pub fn from_decimal(d: Decimal) -> Result<Self, MoneyError> {
        let quantized = d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        // `round_dp_with_strategy` always leaves the result at exactly
        // scale 2, so its mantissa already *is* the minor-unit count —
        // no string round-trip needed (and none that breaks on a
        // fractional amount like the `normalize()`d value used to).
        debug_assert_eq!(quantized.scale(), 2);
        let minor_units = i64::try_from(quantized.mantissa())
            .map_err(|_| MoneyError::InvalidDecimal(d.to_string()))?;
        Ok(Self { minor_units })
    }

    pub fn from_major_units(major: i64) -> Self {
        Self {
            minor_units: major * MINOR_UNITS_PER_MAJOR,
        }
    }

    pub fn is_positive(&self) -> bool {
        self.minor_units > 0
    }

    pub fn is_zero(&self) -> bool {
        self.minor_units == 0
    }

    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.minor_units
            .checked_add(other.minor_units)
            .map(Money::from_minor_units)
    }

    pub fn checked_sub(&self, other: Money) -> Option<Money> {
        self.minor_units
            .checked_sub(other.minor_units)
            .map(Money::from_minor_units)
    }

    pub fn neg(&self) -> Money {
        Money::from_minor_units(-self.minor_units)
    }

    /// Render as a normalized 2-decimal string with no sign for zero/positive
    /// values and a leading `-` for negative values — the canonical form used
    /// both for display and for the hash-chain tuple (§4.3 of the spec).
    pub fn to_canonical_string(&self) -> String {
        let sign = if self.minor_units < 0 { "-" } else { "" };
        let abs = self.minor_units.unsigned_abs();
        format!("{sign}{}.{:02}", abs / 100, abs % 100)
    }

    pub fn require_positive(&self) -> Result<(), MoneyError> {
        if self.is_positive() {
            Ok(())
        } else {
            Err(MoneyError::NotPositive)
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl fmt::Debug for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Money({})", self.to_canonical_string())
    }
}

impl std::ops::Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money::from_minor_units(self.minor_units + rhs.minor_units)
    }
}

impl std::ops::Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money {
        Money::from_minor_units(self.minor_units - rhs.minor_units)
    }
}

impl std::ops::Neg for Money {
    type Output = Money;
    fn neg(self) -> Money {
        self.neg()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_round_trips_minor_units() {
        let m = Money::from_decimal_str("10.00").unwrap();
        assert_eq!(m.minor_units(), 1000);
        assert_eq!(Money::from_minor_units(m.minor_units()), m);
    }

    #[test]
    fn half_up_rounding_at_the_third_digit() {
        // 3.005 rounds away from zero at the midpoint, matching the
        // original's ROUND_HALF_UP semantics.
        let m = Money::from_decimal_str("3.005").unwrap();
        assert_eq!(m.to_canonical_string(), "3.01");
    }

    #[test]
    fn canonical_string_matches_hash_chain_format() {
        let m = Money::from_decimal_str("1500.00").unwrap();
        assert_eq!(m.to_canonical_string(), "1500.00");
    }

    #[test]
    fn negative_amounts_render_with_sign() {
        let m = Money::from_decimal_str("10.00").unwrap().neg();
        assert_eq!(m.to_canonical_string(), "-10.00");
    }

    #[test]
    fn zero_is_not_positive() {
        assert!(Money::ZERO.require_positive().is_err());
    }

    #[test]
    fn addition_and_subtraction() {
        let a = Money::from_decimal_str("5.50").unwrap();
        let b = Money::from_decimal_str("2.25").unwrap();
        assert_eq!((a + b).to_canonical_string(), "7.75");
        assert_eq!((a - b).to_canonical_string(), "3.25");
    }
}
