//! Bookstore backend server
//! Accounts, seller catalog, orders and dashboards over a JSON API

use anyhow::{Context, Result};
use bookstore_backend::{
    api::{build_state, create_router},
    config::{load_env, AppConfig},
};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    let config = AppConfig::from_env()?;
    info!("📚 Bookstore backend starting");

    if config.jwt_secret == AppConfig::default().jwt_secret {
        warn!("⚠️  JWT_SECRET not set, using the development secret");
    }

    let state = build_state(&config)?;
    info!("💾 Database ready at: {}", config.database_path);

    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("🎯 API server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookstore_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
