//! Storefront - session cart and catalog admin service

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use storefront::config::AppConfig;
use storefront::http::{self, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let addr = config.bind_addr();
    let state = match config.database_url.clone() {
        Some(url) => {
            let db = PgPoolOptions::new().max_connections(config.database_max_connections).connect(&url).await?;
            sqlx::migrate!("./migrations").run(&db).await?;
            AppState::postgres(db, config)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory stores");
            AppState::in_memory(config)
        }
    };

    let sessions = state.sessions.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            tick.tick().await;
            match sessions.purge_expired().await {
                Ok(0) => {}
                Ok(n) => tracing::debug!(purged = n, "expired sessions removed"),
                Err(e) => tracing::warn!(error = %e, "session sweep failed"),
            }
        }
    });

    let app = http::router(state);
    tracing::info!("storefront listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, app).await?;
    Ok(())
}
