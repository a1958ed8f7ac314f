//! Currency amounts. Amounts are persisted as `NUMERIC(12,2)`, so in memory they're held as a
//! [`Decimal`] rounded to cents. Floats only appear at the JSON boundary, see
//! [`Amount::from_f64`] and [`Amount::to_f64`].

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Digits kept after the decimal point.
const SCALE: u32 = 2;
/// `NUMERIC(12,2)` leaves ten digits for the integer part.
const MAX_EXCLUSIVE: i64 = 10_000_000_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("amount must be positive")]
    NotPositive,
    #[error("amount must be less than {}", MAX_EXCLUSIVE)]
    TooLarge,
    #[error("amount is not a finite number")]
    NotFinite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

impl Amount {
    /// Rounds the value to cents (half away from zero) and checks that it fits the column.
    pub fn new(value: Decimal) -> Result<Self, Error> {
        let value = value.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero);
        if value <= Decimal::ZERO {
            Err(Error::NotPositive)
        } else if value >= Decimal::from(MAX_EXCLUSIVE) {
            Err(Error::TooLarge)
        } else {
            Ok(Self(value))
        }
    }

    pub fn from_f64(value: f64) -> Result<Self, Error> {
        if !value.is_finite() {
            return Err(Error::NotFinite);
        }
        Decimal::from_f64(value)
            .ok_or(Error::TooLarge)
            .and_then(Self::new)
    }

    /// Wraps a value read back from the database, where the column constraints already hold.
    pub(crate) fn from_stored(value: Decimal) -> Self {
        Self(value)
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }
}
