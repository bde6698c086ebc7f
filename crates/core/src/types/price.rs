//! Type-safe price representation using decimal arithmetic.
//!
//! The storefront backend reports costs and wallet balances as plain JSON
//! numbers in a single currency. `Price` keeps them as `Decimal` so cart
//! totals never accumulate floating point error.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary amount in the store currency.
///
/// Deserializes from JSON numbers (`100`, `19.99`) or numeric strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// A zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `qty` units at this unit price.
    #[must_use]
    pub fn times(self, qty: u32) -> Self {
        Self(self.0 * Decimal::from(qty))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0.normalize())
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<u32> for Price {
    fn from(amount: u32) -> Self {
        Self(Decimal::from(amount))
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl core::str::FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<Decimal>().map(Self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_price_from_json_number() {
        let price: Price = serde_json::from_str("100").unwrap();
        assert_eq!(price, Price::from(100));

        let price: Price = serde_json::from_str("19.99").unwrap();
        assert_eq!(price.to_string(), "$19.99");
    }

    #[test]
    fn test_price_times_and_sum() {
        let total: Price = [Price::from(100).times(2), Price::from(50).times(3)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from(350));
    }

    #[test]
    fn test_price_times_zero() {
        assert_eq!(Price::from(999).times(0), Price::ZERO);
    }

    #[test]
    fn test_price_display_strips_trailing_zeros() {
        let price: Price = "5000.00".parse().unwrap();
        assert_eq!(price.to_string(), "$5000");
    }
}
