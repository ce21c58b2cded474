//! The `searchctl-server` binary: a thin bootstrap that parses [`Config`],
//! installs tracing, constructs the engine client, and serves the admin and
//! public routes from [`searchctl_server::create_router`].

use searchctl_core::Config;
use searchctl_engine::RestEngineClient;
use searchctl_server::AppState;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path = std::env::var("SEARCHCTL_CONFIG").ok().map(std::path::PathBuf::from);
    let config = Config::load(config_path.as_deref())?;

    let index_template_raw = std::fs::read_to_string(&config.index_template_path).unwrap_or_else(|_| "{}".into());
    let index_template: serde_json::Value = serde_json::from_str(&index_template_raw)?;

    let engine = Arc::new(RestEngineClient::new(config.engine_base_url.clone()));
    let state = AppState::new(engine, config, index_template);

    let addr = std::env::var("SEARCHCTL_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "searchctl-server listening");

    axum::serve(listener, searchctl_server::create_router(state)).await?;
    Ok(())
}
