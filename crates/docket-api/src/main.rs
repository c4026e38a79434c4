//! # docket-api: Binary Entry Point
//!
//! Starts the Axum HTTP server. Reads pipeline configuration from the YAML
//! file named by `DOCKET_CONFIG` (optional) plus `DOCKET_*` overrides, and
//! binds to `PORT` (default 8080).

use std::path::PathBuf;

use docket_api::{AppConfig, AppState};
use docket_pipeline::PipelineConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let config_path = std::env::var("DOCKET_CONFIG").ok().map(PathBuf::from);

    let pipeline = PipelineConfig::load(config_path.as_deref()).map_err(|e| {
        tracing::error!("configuration failed: {e}");
        e
    })?;
    tracing::info!(?pipeline, "pipeline configuration loaded");

    let (state, worker) = AppState::in_memory(AppConfig { port }, &pipeline)?;
    tokio::spawn(worker.run());

    let app = docket_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Docket API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// `LOG_FORMAT=json` switches to JSON lines; the filter defaults to `info`.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
