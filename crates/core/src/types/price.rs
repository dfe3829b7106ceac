//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are entered by staff as free text in a dialog and are sent to the
//! backend as JSON numbers. A [`Price`] can only be constructed from a value
//! that parsed as a number and is not negative.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// Errors produced when validating a price draft.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceError {
    /// Nothing was entered.
    #[error("Please enter a valid price")]
    Empty,
    /// The draft does not parse as a number.
    #[error("Please enter a valid price ('{0}' is not a number)")]
    NotANumber(String),
    /// The draft parsed but is below zero.
    #[error("Please enter a valid price (price cannot be negative)")]
    Negative,
}

/// A validated, non-negative price in the shop's currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// Wrap an amount, rejecting negative values.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount))
    }

    /// Parse a draft typed into a price field.
    ///
    /// Accepts plain decimals (`12`, `12.50`, ` 3.5 `) and scientific
    /// notation (`1e2`).
    ///
    /// # Errors
    ///
    /// Returns [`PriceError`] if the draft is empty, not a number, or negative.
    pub fn parse(draft: &str) -> Result<Self, PriceError> {
        let trimmed = draft.trim();
        if trimmed.is_empty() {
            return Err(PriceError::Empty);
        }

        let amount = Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_err(|_| PriceError::NotANumber(trimmed.to_owned()))?;

        Self::new(amount)
    }

    /// The underlying amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format_money(self.0))
    }
}

/// Format an amount as `$x.xx`, rounding half away from zero.
#[must_use]
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("${rounded:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_plain_decimals() {
        assert_eq!(Price::parse("12").map(|p| p.amount()), Ok(Decimal::new(12, 0)));
        assert_eq!(
            Price::parse(" 12.50 ").map(|p| p.amount()),
            Ok(Decimal::new(1250, 2))
        );
        assert_eq!(Price::parse("0").map(|p| p.amount()), Ok(Decimal::ZERO));
    }

    #[test]
    fn test_parse_accepts_scientific_notation() {
        assert_eq!(Price::parse("1e2").map(|p| p.amount()), Ok(Decimal::new(100, 0)));
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(Price::parse(""), Err(PriceError::Empty));
        assert_eq!(Price::parse("   "), Err(PriceError::Empty));
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert_eq!(
            Price::parse("abc"),
            Err(PriceError::NotANumber("abc".to_string()))
        );
        assert!(matches!(Price::parse("12,50"), Err(PriceError::NotANumber(_))));
        assert!(matches!(Price::parse("NaN"), Err(PriceError::NotANumber(_))));
    }

    #[test]
    fn test_parse_rejects_negative() {
        assert_eq!(Price::parse("-1"), Err(PriceError::Negative));
        assert_eq!(Price::parse("-0.01"), Err(PriceError::Negative));
    }

    #[test]
    fn test_negative_zero_is_allowed() {
        assert!(Price::parse("-0").is_ok());
    }

    #[test]
    fn test_error_messages_lead_with_the_same_prompt() {
        for err in [
            PriceError::Empty,
            PriceError::NotANumber("x".to_string()),
            PriceError::Negative,
        ] {
            assert!(err.to_string().starts_with("Please enter a valid price"));
        }
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(Decimal::new(5, 0)), "$5.00");
        assert_eq!(format_money(Decimal::new(12345, 3)), "$12.35");
        assert_eq!(Price::parse("7.1").expect("valid").to_string(), "$7.10");
    }

    #[test]
    fn test_serializes_as_json_number() {
        let price = Price::parse("12.5").expect("valid");
        let json = serde_json::to_string(&price).expect("serialize");
        assert_eq!(json, "12.5");
    }
}
