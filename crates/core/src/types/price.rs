//! Money amounts using decimal arithmetic.
//!
//! The store sells in a single currency (roubles), so a [`Price`] is a
//! non-negative decimal with two fractional digits. Storage is `NUMERIC(12, 2)`.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    #[error("price cannot be negative")]
    Negative,
    #[error("price must be greater than zero")]
    Zero,
    #[error("price must be below 10 000 000 000")]
    TooLarge,
    #[error("price is not a number: {0}")]
    NotANumber(String),
}

/// A non-negative amount in roubles, rounded to kopecks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(transparent))]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest amount that fits `NUMERIC(12, 2)`.
    #[must_use]
    pub fn max_amount() -> Decimal {
        Decimal::new(999_999_999_999, 2)
    }

    /// Create a price from any non-negative decimal that fits the column.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] for amounts below zero and
    /// [`PriceError::TooLarge`] above [`Self::max_amount`].
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        let amount = amount.round_dp(2);
        if amount > Self::max_amount() {
            return Err(PriceError::TooLarge);
        }
        Ok(Self(amount))
    }

    /// Create a price that must be strictly positive, as catalog prices are.
    ///
    /// # Errors
    ///
    /// Returns an error for zero or negative amounts.
    pub fn positive(amount: Decimal) -> Result<Self, PriceError> {
        let price = Self::new(amount)?;
        if price.0.is_zero() {
            return Err(PriceError::Zero);
        }
        Ok(price)
    }

    /// Price from whole kopecks.
    #[must_use]
    pub fn from_kopecks(kopecks: u32) -> Self {
        Self(Decimal::new(i64::from(kopecks), 2))
    }

    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Human readable form, e.g. `1 500.00 ₽`.
    #[must_use]
    pub fn display(&self) -> String {
        let text = format!("{:.2}", self.0);
        let (whole, frac) = text.split_once('.').unwrap_or((text.as_str(), "00"));
        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, c) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(' ');
            }
            grouped.push(c);
        }
        format!("{grouped}.{frac} ₽")
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl std::str::FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s
            .trim()
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| if c == ',' { '.' } else { c })
            .collect();
        let amount: Decimal = cleaned
            .parse()
            .map_err(|_| PriceError::NotANumber(s.to_owned()))?;
        Self::new(amount)
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_amounts_beyond_the_column() {
        assert_eq!(
            Price::new(Decimal::new(99_999_999_999, 0)),
            Err(PriceError::TooLarge)
        );
        assert_eq!(
            Price::positive(Decimal::new(10_000_000_000, 0)),
            Err(PriceError::TooLarge)
        );
        assert_eq!(
            Price::new(Decimal::new(999_999_999_999, 2)).map(|p| p.amount()),
            Ok(Price::max_amount())
        );
        assert_eq!("9999999999,999".parse::<Price>(), Err(PriceError::TooLarge));
    }

    #[test]
    fn test_new_rejects_negative() {
        assert_eq!(Price::new(Decimal::new(-1, 0)), Err(PriceError::Negative));
        assert!(Price::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_positive_rejects_zero() {
        assert_eq!(Price::positive(Decimal::ZERO), Err(PriceError::Zero));
        assert!(Price::positive(Decimal::new(1, 2)).is_ok());
    }

    #[test]
    fn test_rounds_to_kopecks() {
        let price = Price::new(Decimal::new(12_345, 3)).unwrap();
        assert_eq!(price.to_string(), "12.34");
    }

    #[test]
    fn test_times_and_sum() {
        let a = Price::from_kopecks(150_000).times(2);
        let b = Price::from_kopecks(99);
        let total: Price = [a, b].into_iter().sum();
        assert_eq!(total.to_string(), "3000.99");
    }

    #[test]
    fn test_parse_accepts_comma_and_spaces() {
        let price: Price = "1 500,50".parse().unwrap();
        assert_eq!(price, Price::from_kopecks(150_050));
        assert!("abc".parse::<Price>().is_err());
    }

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Price::from_kopecks(150_000).display(), "1 500.00 ₽");
        assert_eq!(Price::from_kopecks(99).display(), "0.99 ₽");
        assert_eq!(Price::from_kopecks(123_456_789).display(), "1 234 567.89 ₽");
    }
}
