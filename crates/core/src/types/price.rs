//! Prices in Albanian Lek.
//!
//! The store only sells in Lek (ALL). Amounts arrive from the backend as
//! decimal strings and are shown rounded to whole Lek with `.` as the
//! thousands separator, e.g. `1.250 Lekë`.

use core::fmt;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Display suffix for Lek amounts.
pub const LEK_SUFFIX: &str = "Lekë";

/// A price in Lek.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero Lek.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from a whole number of Lek.
    #[must_use]
    pub fn from_lek(lek: i64) -> Self {
        Self(Decimal::from(lek))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is above zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Multiply by a quantity.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Format for display (e.g., "1.250 Lekë").
    #[must_use]
    pub fn display(&self) -> String {
        format_lek(self.0)
    }
}

impl core::ops::Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl core::iter::Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, p| acc + p)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Format a decimal amount as whole Lek.
///
/// Rounds half away from zero, groups thousands with `.`.
#[must_use]
pub fn format_lek(amount: Decimal) -> String {
    let rounded = amount
        .round_dp_with_strategy(0, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(0);

    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    if rounded < 0 {
        format!("-{grouped} {LEK_SUFFIX}")
    } else {
        format!("{grouped} {LEK_SUFFIX}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_format_small_amounts() {
        assert_eq!(format_lek(Decimal::ZERO), "0 Lekë");
        assert_eq!(format_lek(Decimal::from(999)), "999 Lekë");
    }

    #[test]
    fn test_format_groups_thousands() {
        assert_eq!(format_lek(Decimal::from(1250)), "1.250 Lekë");
        assert_eq!(format_lek(Decimal::from(1_234_567)), "1.234.567 Lekë");
    }

    #[test]
    fn test_format_rounds_to_whole_lek() {
        assert_eq!(format_lek(Decimal::from_str("1499.50").unwrap()), "1.500 Lekë");
        assert_eq!(format_lek(Decimal::from_str("1499.49").unwrap()), "1.499 Lekë");
    }

    #[test]
    fn test_format_negative() {
        assert_eq!(format_lek(Decimal::from(-2500)), "-2.500 Lekë");
    }

    #[test]
    fn test_price_times_and_sum() {
        let total: Price = [Price::from_lek(1200).times(2), Price::from_lek(300)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_lek(2700));
    }

    #[test]
    fn test_price_deserializes_from_string_and_number() {
        let a: Price = serde_json::from_str("\"1250.00\"").unwrap();
        let b: Price = serde_json::from_str("1250").unwrap();
        assert_eq!(a, b);
    }
}
