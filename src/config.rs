//! Runtime configuration, read from the environment (and `.env` when present).

use std::str::FromStr;

use chrono::{Duration, Utc};

use crate::domain::aggregates::CartSettings;
use crate::{Result, ShopError};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// In-memory stores are used when unset.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub cart: CartSettings,
    pub session_ttl: Duration,
    pub default_language: String,
    pub languages: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str, default: &str| lookup(name).filter(|v| !v.trim().is_empty()).unwrap_or_else(|| default.to_string());

        let port = parse::<u16>("PORT", &get("PORT", "8083"))?;
        let database_max_connections = parse::<u32>("DATABASE_MAX_CONNECTIONS", &get("DATABASE_MAX_CONNECTIONS", "10"))?;
        let ttl_secs = parse::<i64>("SESSION_TTL_SECS", &get("SESSION_TTL_SECS", "1209600"))?;
        if ttl_secs <= 0 {
            return Err(ShopError::Config("SESSION_TTL_SECS must be positive".to_string()));
        }
        let session_ttl = Duration::try_seconds(ttl_secs)
            .filter(|ttl| Utc::now().checked_add_signed(*ttl).is_some())
            .ok_or_else(|| ShopError::Config(format!("SESSION_TTL_SECS {} is out of range", ttl_secs)))?;

        let default_language = get("DEFAULT_LANGUAGE", "en").to_lowercase();
        let mut languages: Vec<String> = get("LANGUAGES", "en,es")
            .split(',')
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty())
            .collect();
        if !languages.contains(&default_language) {
            languages.insert(0, default_language.clone());
        }

        let cart = CartSettings {
            cart_session_key: get("CART_SESSION_ID", "cart"),
            coupon_session_key: get("COUPON_SESSION_ID", "coupon_id"),
        };
        if cart.cart_session_key == cart.coupon_session_key {
            return Err(ShopError::Config("CART_SESSION_ID and COUPON_SESSION_ID must differ".to_string()));
        }

        let config = Self {
            host: get("HOST", "0.0.0.0"),
            port,
            database_url: lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()),
            database_max_connections,
            cart,
            session_ttl,
            default_language,
            languages,
        };
        tracing::info!(port = config.port, persistent = config.database_url.is_some(), "configuration loaded");
        Ok(config)
    }

    /// `requested` when it is a configured language, else the default.
    pub fn resolve_language(&self, requested: Option<&str>) -> String {
        requested
            .map(|l| l.trim().to_lowercase())
            .filter(|l| self.languages.contains(l))
            .unwrap_or_else(|| self.default_language.clone())
    }

    pub fn bind_addr(&self) -> String { format!("{}:{}", self.host, self.port) }
}

fn parse<T: FromStr>(name: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ShopError::Config(format!("Invalid {}: {}", name, e)))
}
