//! Non-negative decimal money amount.
//!
//! A menu has a single currency, so [`Price`] carries no currency code; it
//! only guarantees the amount is never negative and formats with two
//! decimal places.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ValidationError;

/// A non-negative amount of money.
///
/// ```
/// use menuboard_core::Price;
///
/// let price = Price::parse("12,50").unwrap();
/// assert_eq!(price.to_string(), "12.50");
/// assert_eq!(price.times(2).to_string(), "25.00");
/// assert!(Price::parse("-1").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NegativePrice`] for amounts below zero.
    pub fn new(amount: Decimal) -> Result<Self, ValidationError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(ValidationError::NegativePrice);
        }
        if amount.is_zero() {
            return Ok(Self::ZERO);
        }
        Ok(Self(amount))
    }

    /// Build a price from an integer number of cents.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NegativePrice`] for negative input.
    pub fn from_cents(cents: i64) -> Result<Self, ValidationError> {
        Self::new(Decimal::new(cents, 2))
    }

    /// Parse a price typed into a form.
    ///
    /// Accepts either `.` or `,` as the decimal separator.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyField`] for blank input,
    /// [`ValidationError::InvalidPrice`] if the text is not a number, and
    /// [`ValidationError::NegativePrice`] if it is below zero.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyField("price"));
        }
        let normalized = trimmed.replace(',', ".");
        let amount = normalized
            .parse::<Decimal>()
            .map_err(|_| ValidationError::InvalidPrice(trimmed.to_owned()))?;
        Self::new(amount)
    }

    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Multiply by a line quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
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

impl TryFrom<Decimal> for Price {
    type Error = ValidationError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}
