//! Coupon lookup
//!
//! The cart resolves its stored coupon id through [`CouponStore::coupon`];
//! coupon entry resolves a typed-in code through [`CouponStore::redeemable`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::aggregates::Coupon;
use crate::domain::value_objects::CouponId;
use crate::Result;

#[async_trait]
pub trait CouponStore: Send + Sync {
    async fn coupon(&self, id: CouponId) -> Result<Option<Coupon>>;
    /// Active coupon whose code matches case-insensitively and whose
    /// validity window contains `at`.
    async fn redeemable(&self, code: &str, at: DateTime<Utc>) -> Result<Option<Coupon>>;
}

#[derive(Default)]
pub struct MemoryCouponStore { coupons: RwLock<Vec<Coupon>> }

impl MemoryCouponStore {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&self, coupon: Coupon) {
        let mut coupons = self.coupons.write();
        coupons.retain(|c| c.id != coupon.id);
        coupons.push(coupon);
    }
}

#[async_trait]
impl CouponStore for MemoryCouponStore {
    async fn coupon(&self, id: CouponId) -> Result<Option<Coupon>> {
        Ok(self.coupons.read().iter().find(|c| c.id == id).cloned())
    }

    async fn redeemable(&self, code: &str, at: DateTime<Utc>) -> Result<Option<Coupon>> {
        Ok(self.coupons.read().iter().find(|c| c.matches_code(code) && c.is_redeemable_at(at)).cloned())
    }
}

#[derive(sqlx::FromRow)]
struct CouponRow { id: Uuid, code: String, valid_from: DateTime<Utc>, valid_to: DateTime<Utc>, discount: i32, active: bool }

impl From<CouponRow> for Coupon {
    fn from(r: CouponRow) -> Self {
        Coupon { id: r.id.into(), code: r.code, valid_from: r.valid_from, valid_to: r.valid_to, discount: r.discount, active: r.active }
    }
}

#[derive(Clone)]
pub struct PgCouponStore { pool: PgPool }

impl PgCouponStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

#[async_trait]
impl CouponStore for PgCouponStore {
    async fn coupon(&self, id: CouponId) -> Result<Option<Coupon>> {
        let row = sqlx::query_as::<_, CouponRow>("SELECT id, code, valid_from, valid_to, discount, active FROM coupons WHERE id = $1")
            .bind(id.as_uuid()).fetch_optional(&self.pool).await?;
        Ok(row.map(Coupon::from))
    }

    async fn redeemable(&self, code: &str, at: DateTime<Utc>) -> Result<Option<Coupon>> {
        let row = sqlx::query_as::<_, CouponRow>("SELECT id, code, valid_from, valid_to, discount, active FROM coupons \
                                                  WHERE LOWER(code) = LOWER($1) AND valid_from <= $2 AND valid_to >= $2 AND active")
            .bind(code.trim()).bind(at).fetch_optional(&self.pool).await?;
        Ok(row.map(Coupon::from))
    }
}
