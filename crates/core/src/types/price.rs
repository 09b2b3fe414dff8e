//! Type-safe price representation using decimal arithmetic.
//!
//! All prices in the market are US dollars stored as `NUMERIC(10, 2)`.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// Prices cannot be negative.
    #[error("price cannot be negative")]
    Negative,
}

/// A non-negative amount of US dollars.
///
/// Serializes as a decimal string (`"299.99"`) so clients never see
/// floating point rounding artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// A price of zero dollars.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if the amount is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units at this unit price.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Apply a rate (e.g. a tax rate of `0.15`) and round to cents.
    ///
    /// Rounds half away from zero, like a till receipt.
    #[must_use]
    pub fn percentage(&self, rate: Decimal) -> Self {
        Self((self.0 * rate).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }

    /// Round to whole cents.
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Divide evenly into `parts`, rounding to cents. Zero parts yields zero.
    #[must_use]
    pub fn split(&self, parts: u64) -> Self {
        if parts == 0 {
            return Self::ZERO;
        }
        Self(self.0 / Decimal::from(parts)).rounded()
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Self> for Price {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // CHECK constraints keep stored prices non-negative
        Ok(Self(amount))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn price(s: &str) -> Price {
        Price::new(s.parse().unwrap()).unwrap()
    }

    #[test]
    fn test_rejects_negative() {
        assert_eq!(
            Price::new(Decimal::new(-1, 2)),
            Err(PriceError::Negative)
        );
        assert!(Price::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_times_and_sum() {
        let lines = [price("299.99").times(2), price("59.99").times(1)];
        let total: Price = lines.iter().sum();
        assert_eq!(total, price("659.97"));
    }

    #[test]
    fn test_percentage_rounds_to_cents() {
        // 15% of 89.99 = 13.4985
        assert_eq!(price("89.99").percentage(Decimal::new(15, 2)), price("13.50"));
        assert_eq!(price("0").percentage(Decimal::new(15, 2)), Price::ZERO);
    }

    #[test]
    fn test_split() {
        assert_eq!(price("100").split(3), price("33.33"));
        assert_eq!(price("100").split(0), Price::ZERO);
    }

    #[test]
    fn test_display() {
        assert_eq!(price("5").to_string(), "$5.00");
        assert_eq!(price("129.999").rounded().to_string(), "$130.00");
    }

    #[test]
    fn test_serde_uses_strings_and_validates() {
        let json = serde_json::to_string(&price("19.90")).unwrap();
        assert_eq!(json, "\"19.90\"");

        let parsed: Price = serde_json::from_str("\"19.90\"").unwrap();
        assert_eq!(parsed, price("19.90"));

        assert!(serde_json::from_str::<Price>("\"-3.00\"").is_err());
    }

    #[derive(Deserialize)]
    struct Listing {
        price: Price,
    }

    #[test]
    fn test_deserializes_inside_request_bodies() {
        let listing: Listing = serde_json::from_str(r#"{"price": "35.00"}"#).unwrap();
        assert_eq!(listing.price, price("35.00"));

        let err = serde_json::from_str::<Listing>(r#"{"price": "-0.01"}"#)
            .err()
            .unwrap();
        assert!(err.to_string().contains("price cannot be negative"));
    }
}
