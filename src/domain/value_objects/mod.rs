//! Value Objects for the storefront

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use thiserror::Error;

/// Unit price in store currency (USD). Never negative.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "PriceRepr", into = "PriceRepr")]
pub struct Price(Decimal);

impl Price {
    pub const ZERO: Price = Price(Decimal::ZERO);
    pub const MAX: Price = Price(Decimal::MAX);

    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() { return Err(PriceError::Negative(amount)); }
        Ok(Self(amount.normalize()))
    }

    /// Builds a price from a whole number of cents.
    pub fn from_cents(cents: u64) -> Self { Self(Decimal::from(cents) / Decimal::ONE_HUNDRED) }

    pub fn amount(&self) -> Decimal { self.0 }

    /// Saturates at [`Price::MAX`].
    pub fn times(&self, qty: Quantity) -> Price { Price(self.0.saturating_mul(Decimal::from(qty.value()))) }
}

/// Saturates at [`Price::MAX`].
impl Add for Price {
    type Output = Price;
    fn add(self, rhs: Price) -> Price { Price(self.0.saturating_add(rhs.0)) }
}

impl std::iter::Sum for Price {
    fn sum<I: Iterator<Item = Price>>(iter: I) -> Price { iter.fold(Price::ZERO, Add::add) }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "${:.2}", self.0) }
}

/// Wire form of a price: a plain JSON number.
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
struct PriceRepr(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl TryFrom<PriceRepr> for Price {
    type Error = PriceError;
    fn try_from(repr: PriceRepr) -> Result<Self, Self::Error> { Price::new(repr.0) }
}

impl From<Price> for PriceRepr {
    fn from(price: Price) -> Self { PriceRepr(price.0) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("price cannot be negative: {0}")]
    Negative(Decimal),
}

/// Line item quantity. Always at least one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    pub const ONE: Quantity = Quantity(1);

    pub fn new(value: u32) -> Result<Self, QuantityError> {
        if value == 0 { return Err(QuantityError::Zero); }
        Ok(Self(value))
    }

    /// Clamps an arbitrary requested quantity into the valid range.
    pub fn clamped(requested: i64) -> Self {
        Self(requested.clamp(1, i64::from(u32::MAX)) as u32)
    }

    pub fn value(&self) -> u32 { self.0 }
    pub fn add(&self, other: Quantity) -> Self { Self(self.0.saturating_add(other.0)) }
}

impl Default for Quantity { fn default() -> Self { Self::ONE } }

impl TryFrom<u32> for Quantity {
    type Error = QuantityError;
    fn try_from(value: u32) -> Result<Self, Self::Error> { Quantity::new(value) }
}

impl From<Quantity> for u32 {
    fn from(qty: Quantity) -> u32 { qty.0 }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("quantity must be at least 1")]
    Zero,
}
