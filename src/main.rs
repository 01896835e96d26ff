use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use protected_pages_rust::app::{demo_content, router, AppState};
use protected_pages_rust::clock::SystemClock;
use protected_pages_rust::config;
use protected_pages_rust::database::{DatabaseManager, PgRegistry};
use protected_pages_rust::path::AliasTable;
use protected_pages_rust::session::MemorySessionStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL and friends
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::config().clone();
    tracing::info!("Starting Protected Pages in {:?} mode", config.environment);
    if config.security.jwt_secret.is_empty() {
        tracing::warn!("SECURITY_JWT_SECRET is not set; admin API and gate bypass are disabled");
    }

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to protected pages database")?;
    let registry = PgRegistry::new(pool);
    registry.ensure_schema().await?;

    let clock = Arc::new(SystemClock);
    let sessions = MemorySessionStore::new(clock.clone(), config.session.idle_timeout_secs);
    let state = AppState::new(
        config,
        Arc::new(registry),
        Arc::new(AliasTable::new()),
        Arc::new(sessions),
        clock,
    );

    let app = router(state, demo_content());

    // Allow tests or deployments to override port via env
    let port = std::env::var("PROTECTED_PAGES_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Protected Pages listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
