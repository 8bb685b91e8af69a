//! Formsmith API server

use anyhow::Context;
use formsmith_api::{build_router, ApiConfig, ApiState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env();
    let bind_addr = config.bind_addr.clone();
    let app = build_router(ApiState::in_memory(config));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!("Formsmith API listening on {}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
