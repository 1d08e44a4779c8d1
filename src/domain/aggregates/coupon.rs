//! Coupon Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::domain::value_objects::CouponId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: CouponId,
    pub code: String,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    /// Percentage, 0..=100.
    pub discount: i32,
    pub active: bool,
}

impl Coupon {
    pub fn is_redeemable_at(&self, at: DateTime<Utc>) -> bool {
        self.active && self.valid_from <= at && at <= self.valid_to
    }

    pub fn matches_code(&self, code: &str) -> bool { self.code.eq_ignore_ascii_case(code.trim()) }

    /// Discount this coupon grants on `amount`; `None` on overflow.
    pub fn discount_on(&self, amount: Decimal) -> Option<Decimal> {
        Decimal::from(self.discount).checked_div(Decimal::ONE_HUNDRED)?.checked_mul(amount)
    }
}
