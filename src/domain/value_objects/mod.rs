//! Value Objects for the storefront

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self { Self(Uuid::now_v7()) }
            pub fn from_uuid(id: Uuid) -> Self { Self(id) }
            pub fn as_uuid(&self) -> Uuid { self.0 }
        }

        impl Default for $name { fn default() -> Self { Self::new() } }

        impl From<Uuid> for $name { fn from(id: Uuid) -> Self { Self(id) } }

        impl FromStr for $name {
            type Err = uuid::Error;
            fn from_str(s: &str) -> Result<Self, Self::Err> { Uuid::parse_str(s).map(Self) }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
        }
    };
}

uuid_id!(
    /// Catalog product identifier; the cart key for a line.
    ProductId
);
uuid_id!(CategoryId);
uuid_id!(CouponId);

/// Unit price. Never negative, at most two decimal places and below
/// 100,000,000 (the `NUMERIC(10, 2)` column); serialized as an exact decimal string.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    pub const MAX_SCALE: u32 = 2;

    /// Largest storable price, 99,999,999.99.
    pub fn max() -> Decimal { Decimal::new(9_999_999_999, 2) }

    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() { return Err(PriceError::Negative); }
        if amount.normalize().scale() > Self::MAX_SCALE { return Err(PriceError::TooPrecise); }
        if amount > Self::max() { return Err(PriceError::TooLarge); }
        Ok(Self(amount))
    }
    pub fn zero() -> Self { Self(Decimal::ZERO) }
    pub fn amount(&self) -> Decimal { self.0 }
    /// `None` on overflow.
    pub fn times(&self, quantity: u32) -> Option<Decimal> { self.0.checked_mul(Decimal::from(quantity)) }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;
    fn try_from(amount: Decimal) -> Result<Self, Self::Error> { Self::new(amount) }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self { price.0 }
}

impl FromStr for Price {
    type Err = PriceError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s.trim()).map_err(|_| PriceError::Unparseable(s.to_string()))?;
        Self::new(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum PriceError { Negative, TooPrecise, TooLarge, Unparseable(String) }
impl std::error::Error for PriceError {}
impl fmt::Display for PriceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Negative => write!(f, "price must not be negative"),
            Self::TooPrecise => write!(f, "price must have at most {} decimal places", Price::MAX_SCALE),
            Self::TooLarge => write!(f, "price must not exceed {}", Price::max()),
            Self::Unparseable(raw) => write!(f, "'{}' is not a decimal price", raw),
        }
    }
}
