//! Cart Aggregate
//!
//! The cart lives inside the visitor's [`Session`] under a configurable key,
//! as an ordered list of [`CartLine`]s. A [`Cart`] borrows the session for the
//! duration of a request and writes every mutation straight back into it,
//! marking the session modified so the handler persists it.
//!
//! Unit prices are captured when a product is first added and are not
//! refreshed from the catalog afterwards.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Catalog;
use crate::coupons::CouponStore;
use crate::domain::aggregates::{Coupon, Product};
use crate::domain::value_objects::{CouponId, Price, ProductId};
use crate::session::Session;
use crate::{Result, ShopError};

/// Session keys the cart reads and writes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CartSettings {
    pub cart_session_key: String,
    pub coupon_session_key: String,
}

impl Default for CartSettings {
    fn default() -> Self {
        Self { cart_session_key: "cart".to_string(), coupon_session_key: "coupon_id".to_string() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Price,
}

impl CartLine {
    pub fn total_price(&self) -> Result<Decimal> {
        self.price.times(self.quantity).ok_or(ShopError::Cart(CartError::AmountOverflow))
    }
}

/// A cart line joined with its catalog product.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CartEntry {
    pub product: Product,
    pub quantity: u32,
    pub price: Price,
    pub total_price: Decimal,
}

#[derive(Debug, Error)]
pub enum CartError {
    #[error("Cart is not present in the session")]
    NotInSession,
    #[error("Cart amount is out of range")]
    AmountOverflow,
}

pub struct Cart<'s> {
    session: &'s mut Session,
    cart_key: String,
    lines: Vec<CartLine>,
    coupon_id: Option<CouponId>,
}

impl<'s> Cart<'s> {
    /// Bind to `session`, storing an empty cart there if it holds none.
    pub fn new(session: &'s mut Session, settings: &CartSettings) -> Result<Self> {
        let cart_key = settings.cart_session_key.clone();
        let lines = match session.get::<Vec<CartLine>>(&cart_key)? {
            Some(lines) => lines,
            None => {
                session.insert(&cart_key, &Vec::<CartLine>::new())?;
                Vec::new()
            }
        };
        let coupon_id = session.get::<CouponId>(&settings.coupon_session_key)?;
        Ok(Self { session, cart_key, lines, coupon_id })
    }

    pub fn lines(&self) -> &[CartLine] { &self.lines }
    pub fn coupon_id(&self) -> Option<CouponId> { self.coupon_id }
    pub fn is_empty(&self) -> bool { self.lines.is_empty() }

    /// Total quantity across all lines.
    pub fn len(&self) -> u64 { self.lines.iter().map(|l| u64::from(l.quantity)).sum() }

    pub fn quantity_of(&self, product_id: &ProductId) -> Option<u32> {
        self.lines.iter().find(|l| &l.product_id == product_id).map(|l| l.quantity)
    }

    /// Add `quantity` of `product`, or set it to exactly `quantity` when
    /// `override_quantity` is set. A line that ends at zero is dropped.
    pub fn add(&mut self, product: &Product, quantity: u32, override_quantity: bool) -> Result<()> {
        let idx = match self.lines.iter().position(|l| l.product_id == product.id) {
            Some(idx) => idx,
            None => {
                self.lines.push(CartLine { product_id: product.id, quantity: 0, price: product.price });
                self.lines.len() - 1
            }
        };
        let line = &mut self.lines[idx];
        line.quantity = if override_quantity { quantity } else { line.quantity.saturating_add(quantity) };
        tracing::debug!(product_id = %product.id, quantity = line.quantity, "cart line updated");
        if line.quantity == 0 {
            self.lines.remove(idx);
        }
        self.save()
    }

    /// Returns whether a line was removed.
    pub fn remove(&mut self, product_id: &ProductId) -> Result<bool> {
        let before = self.lines.len();
        self.lines.retain(|l| &l.product_id != product_id);
        if self.lines.len() == before {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Drop the cart from the session. Errors when it is already gone.
    pub fn clear(&mut self) -> Result<()> {
        self.session.remove(&self.cart_key).ok_or(CartError::NotInSession)?;
        self.lines.clear();
        self.session.mark_modified();
        Ok(())
    }

    pub fn total_price(&self) -> Result<Decimal> {
        self.lines.iter().try_fold(Decimal::ZERO, |total, line| {
            total.checked_add(line.total_price()?).ok_or(ShopError::Cart(CartError::AmountOverflow))
        })
    }

    /// Lines joined with their products, in cart order. Lines whose product
    /// has left the catalog are skipped but stay in the cart.
    pub async fn items<C: Catalog + ?Sized>(&self, catalog: &C, language: &str) -> Result<Vec<CartEntry>> {
        let ids: Vec<ProductId> = self.lines.iter().map(|l| l.product_id).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut products: HashMap<ProductId, Product> =
            catalog.products_by_ids(&ids, language).await?.into_iter().map(|p| (p.id, p)).collect();

        let mut entries = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            let Some(product) = products.remove(&line.product_id) else {
                tracing::debug!(product_id = %line.product_id, "cart line has no catalog product");
                continue;
            };
            entries.push(CartEntry { product, quantity: line.quantity, price: line.price, total_price: line.total_price()? });
        }
        Ok(entries)
    }

    /// The applied coupon, if one is set and still exists.
    pub async fn coupon<S: CouponStore + ?Sized>(&self, store: &S) -> Result<Option<Coupon>> {
        let Some(id) = self.coupon_id else { return Ok(None) };
        let coupon = store.coupon(id).await?;
        if coupon.is_none() {
            tracing::warn!(coupon_id = %id, "session references unknown coupon");
        }
        Ok(coupon)
    }

    pub async fn discount<S: CouponStore + ?Sized>(&self, store: &S) -> Result<Decimal> {
        self.discount_with(self.coupon(store).await?.as_ref())
    }

    pub async fn total_price_after_discount<S: CouponStore + ?Sized>(&self, store: &S) -> Result<Decimal> {
        let discount = self.discount(store).await?;
        self.total_price()?.checked_sub(discount).ok_or(ShopError::Cart(CartError::AmountOverflow))
    }

    /// Discount `coupon` grants on this cart; zero without one.
    pub fn discount_with(&self, coupon: Option<&Coupon>) -> Result<Decimal> {
        let Some(coupon) = coupon else { return Ok(Decimal::ZERO) };
        coupon.discount_on(self.total_price()?).ok_or(ShopError::Cart(CartError::AmountOverflow))
    }

    fn save(&mut self) -> Result<()> {
        self.session.insert(&self.cart_key, &self.lines)
    }
}
