//! SMS Scam Analyzer — Binary Entrypoint
//! Boots the Axum HTTP server, wiring the classification pipeline, watchlist,
//! scam log, and metrics.

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sms_scam_analyzer::api::{self, AppState};
use sms_scam_analyzer::classify::{OllamaClient, Pipeline};
use sms_scam_analyzer::config::ServiceConfig;
use sms_scam_analyzer::metrics::Metrics;
use sms_scam_analyzer::scamlog::ScamLogWriter;
use sms_scam_analyzer::watchlist::WatchlistStore;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sms_scam_analyzer=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = ServiceConfig::from_env();

    let watchlist = Arc::new(WatchlistStore::load(
        &cfg.watchlist_path,
        &cfg.default_country_code,
    ));
    if watchlist.is_empty() {
        warn!(path = %cfg.watchlist_path, "watchlist is empty; lookups will always miss");
    } else {
        info!(entries = watchlist.len(), "watchlist loaded");
    }

    let metrics = Metrics::init(watchlist.len());

    let inference = Arc::new(OllamaClient::new(
        &cfg.ollama_url,
        &cfg.ollama_model,
        cfg.ollama_timeout,
    ));
    let scam_log = Arc::new(ScamLogWriter::new(&cfg.scam_log_path));
    let pipeline = Arc::new(Pipeline::new(inference, watchlist, scam_log));

    let router = api::router(AppState { pipeline }).merge(metrics.router());

    info!(bind = %cfg.bind_addr, model = %cfg.ollama_model, ollama = %cfg.ollama_url,
          "sms-scam-analyzer starting");
    info!("endpoints: GET /health, POST /analyze, POST /classify_sms, POST /batch_classify, GET /models, GET /metrics");

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
