//! Money type for plant prices and order totals.
//!
//! The whole catalog is priced in INR, so the wrapper carries no currency
//! code. Arithmetic stays in `Decimal` to keep order totals exact.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Rupees`] value.
#[derive(thiserror::Error, Debug, Clone)]
pub enum PriceError {
    /// The input could not be parsed as a number.
    #[error("price must be a number")]
    NotANumber,
    /// The amount is negative.
    #[error("price cannot be negative")]
    Negative,
}

/// An INR amount.
///
/// Deserializes from whatever numeric shape the backend sends (plain JSON
/// numbers today). Construction through [`Rupees::new`] or
/// [`Rupees::parse`] rejects negative amounts; deserialization is lenient
/// because the backend owns the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Rupees(Decimal);

impl Rupees {
    /// Zero rupees.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] for amounts below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount))
    }

    /// Parse a price from form input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a number or is negative.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let amount: Decimal = s.trim().parse().map_err(|_| PriceError::NotANumber)?;
        Self::new(amount)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// This price multiplied by a line-item quantity.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Add for Rupees {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Rupees {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Rupees {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "₹{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whole_and_fractional_amounts() {
        assert_eq!(Rupees::parse("199").unwrap().to_string(), "₹199");
        assert_eq!(Rupees::parse("49.50").unwrap().to_string(), "₹49.50");
        assert_eq!(Rupees::parse("0").unwrap(), Rupees::ZERO);
    }

    #[test]
    fn rejects_negative_and_garbage() {
        assert!(matches!(Rupees::parse("-1"), Err(PriceError::Negative)));
        assert!(matches!(
            Rupees::parse("free"),
            Err(PriceError::NotANumber)
        ));
        assert!(matches!(Rupees::parse(""), Err(PriceError::NotANumber)));
    }

    #[test]
    fn line_totals_multiply_exactly() {
        let unit = Rupees::parse("199").unwrap();
        assert_eq!(unit.times(2).to_string(), "₹398");
        assert_eq!(unit.times(0), Rupees::ZERO);
    }

    #[test]
    fn sums_across_items() {
        let total: Rupees = [Rupees::parse("199").unwrap(), Rupees::parse("49.50").unwrap()]
            .into_iter()
            .sum();
        assert_eq!(total.to_string(), "₹248.50");
    }

    #[test]
    fn deserializes_from_json_number() {
        let price: Rupees = serde_json::from_str("199").unwrap();
        assert_eq!(price, Rupees::parse("199").unwrap());
    }
}
