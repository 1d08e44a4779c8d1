use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;

use super::{Session, SessionStore};
use crate::Result;

/// Process-local session store; contents are lost on restart.
#[derive(Default)]
pub struct MemorySessionStore {
    records: RwLock<HashMap<String, (HashMap<String, Value>, DateTime<Utc>)>>,
}

impl MemorySessionStore {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &str) -> Result<Option<Session>> {
        let records = self.records.read();
        Ok(records
            .get(id)
            .filter(|(_, expires_at)| *expires_at > Utc::now())
            .map(|(data, expires_at)| Session::from_parts(id.to_string(), data.clone(), *expires_at)))
    }

    async fn save(&self, session: &Session) -> Result<()> {
        self.records
            .write()
            .insert(session.id().to_string(), (session.data().clone(), session.expires_at()));
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.records.write().remove(id);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64> {
        let now = Utc::now();
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|_, (_, expires_at)| *expires_at > now);
        Ok((before - records.len()) as u64)
    }
}
