//! Type-safe money representation using decimal arithmetic.

use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Money`] amount.
#[derive(thiserror::Error, Debug, Clone)]
pub enum PriceError {
    /// The amount is not a valid decimal number.
    #[error("invalid amount {0:?}")]
    InvalidAmount(String),
}

/// A monetary amount with its ISO 4217 currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: String,
}

impl Money {
    /// Create a new amount.
    #[must_use]
    pub fn new(amount: Decimal, currency_code: impl Into<String>) -> Self {
        Self {
            amount,
            currency_code: currency_code.into(),
        }
    }

    /// Parse a provider amount string such as `"19.99"`.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::InvalidAmount`] if the amount is not a decimal.
    pub fn parse(amount: &str, currency_code: impl Into<String>) -> Result<Self, PriceError> {
        let amount =
            Decimal::from_str(amount).map_err(|_| PriceError::InvalidAmount(amount.to_owned()))?;
        Ok(Self::new(amount, currency_code))
    }

    /// Multiply by a line quantity.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self::new(self.amount * Decimal::from(quantity), self.currency_code.clone())
    }

    /// Format for display (e.g., `"$19.99 USD"`).
    #[must_use]
    pub fn formatted(&self) -> String {
        format!("${} {}", self.amount, self.currency_code)
    }

    /// Round to cents.
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self::new(self.amount.round_dp(2), self.currency_code.clone())
    }
}
