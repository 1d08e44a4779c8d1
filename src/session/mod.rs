//! Visitor sessions
//!
//! A [`Session`] is a string-keyed map of JSON values with an expiry. Values
//! are typed at the edges: [`Session::get`] deserializes into the caller's
//! type and reports a malformed entry as [`ShopError::MalformedSession`].
//!
//! Any mutation marks the session modified; handlers persist it through a
//! [`SessionStore`] only when [`Session::is_modified`] is set.

mod memory;
mod postgres;

pub use memory::MemorySessionStore;
pub use postgres::PgSessionStore;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::{Result, ShopError};

const MAX_SESSION_ID_LEN: usize = 128;

#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    id: String,
    data: HashMap<String, Value>,
    expires_at: DateTime<Utc>,
    modified: bool,
}

impl Session {
    pub fn new(id: impl Into<String>, ttl: Duration) -> Self {
        Self { id: id.into(), data: HashMap::new(), expires_at: expiry_after(ttl), modified: false }
    }

    /// Rebuild a session read back from a store.
    pub fn from_parts(id: String, data: HashMap<String, Value>, expires_at: DateTime<Utc>) -> Self {
        Self { id, data, expires_at, modified: false }
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn data(&self) -> &HashMap<String, Value> { &self.data }
    pub fn expires_at(&self) -> DateTime<Utc> { self.expires_at }
    pub fn is_expired(&self) -> bool { Utc::now() >= self.expires_at }
    pub fn contains_key(&self, key: &str) -> bool { self.data.contains_key(key) }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.data.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::deserialize(value)
                .map(Some)
                .map_err(|source| ShopError::MalformedSession { key: key.to_string(), source }),
        }
    }

    pub fn insert<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        self.data.insert(key.to_string(), serde_json::to_value(value)?);
        self.modified = true;
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let removed = self.data.remove(key);
        if removed.is_some() { self.modified = true; }
        removed
    }

    pub fn mark_modified(&mut self) { self.modified = true; }
    pub fn is_modified(&self) -> bool { self.modified }

    /// Push the expiry out by `ttl` from now.
    pub fn extend(&mut self, ttl: Duration) {
        self.expires_at = expiry_after(ttl);
        self.modified = true;
    }
}

/// Persistence for sessions. Expired sessions are never returned by `load`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: &str) -> Result<Option<Session>>;
    async fn save(&self, session: &Session) -> Result<()>;
    async fn delete(&self, id: &str) -> Result<()>;
    /// Remove expired sessions, returning how many went.
    async fn purge_expired(&self) -> Result<u64>;
}

pub fn validate_session_id(id: &str) -> Result<()> {
    let valid = !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LEN
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid { Ok(()) } else { Err(ShopError::InvalidSessionId) }
}

/// Stored session for `id`, or a fresh empty one carrying that id.
/// `ttl` from now, clamped to the latest representable instant.
fn expiry_after(ttl: Duration) -> DateTime<Utc> {
    Utc::now().checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

pub async fn load_or_create(store: &dyn SessionStore, id: &str, ttl: Duration) -> Result<Session> {
    validate_session_id(id)?;
    match store.load(id).await? {
        Some(session) if !session.is_expired() => Ok(session),
        _ => {
            tracing::debug!(session_id = %id, "starting new session");
            Ok(Session::new(id, ttl))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_marks_modified() {
        let mut s = Session::new("abc", Duration::hours(1));
        assert!(!s.is_modified());
        s.insert("n", &3u32).unwrap();
        assert!(s.is_modified());
        assert_eq!(s.get::<u32>("n").unwrap(), Some(3));
        assert_eq!(s.get::<u32>("missing").unwrap(), None);
    }

    #[test]
    fn test_malformed_entry_is_reported() {
        let mut s = Session::new("abc", Duration::hours(1));
        s.insert("n", &"not a number").unwrap();
        match s.get::<u32>("n") {
            Err(ShopError::MalformedSession { key, .. }) => assert_eq!(key, "n"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_remove_absent_keeps_unmodified() {
        let mut s = Session::new("abc", Duration::hours(1));
        assert!(s.remove("nothing").is_none());
        assert!(!s.is_modified());
    }

    #[test]
    fn test_expiry_clamps_on_oversized_ttl() {
        let ttl = Duration::try_seconds(i64::MAX / 1000).unwrap();
        let mut s = Session::new("abc", ttl);
        assert_eq!(s.expires_at(), DateTime::<Utc>::MAX_UTC);
        s.extend(ttl);
        assert_eq!(s.expires_at(), DateTime::<Utc>::MAX_UTC);
        assert!(!s.is_expired());
    }

    #[test]
    fn test_session_id_rules() {
        assert!(validate_session_id("3f2a-visitor_1").is_ok());
        assert!(validate_session_id("").is_err());
        assert!(validate_session_id("has space").is_err());
        assert!(validate_session_id(&"x".repeat(129)).is_err());
    }

    #[tokio::test]
    async fn test_load_or_create_returns_stored() {
        let store = MemorySessionStore::new();
        let mut s = Session::new("known", Duration::hours(1));
        s.insert("k", &1).unwrap();
        store.save(&s).await.unwrap();

        let loaded = load_or_create(&store, "known", Duration::hours(1)).await.unwrap();
        assert_eq!(loaded.get::<i32>("k").unwrap(), Some(1));
        assert!(!loaded.is_modified());

        let fresh = load_or_create(&store, "unknown", Duration::hours(1)).await.unwrap();
        assert!(fresh.data().is_empty());
    }
}
