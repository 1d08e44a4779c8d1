use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::PgPool;

use super::{Session, SessionStore};
use crate::Result;

/// Sessions in the `sessions` table, data as JSONB.
#[derive(Clone)]
pub struct PgSessionStore { pool: PgPool }

#[derive(sqlx::FromRow)]
struct SessionRow { id: String, data: Json<HashMap<String, Value>>, expiry_date: DateTime<Utc> }

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn load(&self, id: &str) -> Result<Option<Session>> {
        let row = sqlx::query_as::<_, SessionRow>("SELECT id, data, expiry_date FROM sessions WHERE id = $1 AND expiry_date > NOW()")
            .bind(id).fetch_optional(&self.pool).await?;
        Ok(row.map(|r| Session::from_parts(r.id, r.data.0, r.expiry_date)))
    }

    async fn save(&self, session: &Session) -> Result<()> {
        sqlx::query("INSERT INTO sessions (id, data, expiry_date) VALUES ($1, $2, $3) ON CONFLICT (id) DO UPDATE SET data = EXCLUDED.data, expiry_date = EXCLUDED.expiry_date")
            .bind(session.id()).bind(Json(session.data())).bind(session.expires_at())
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64> {
        let done = sqlx::query("DELETE FROM sessions WHERE expiry_date <= NOW()").execute(&self.pool).await?;
        Ok(done.rows_affected())
    }
}
