mod config;
mod errors;
mod recognizer;
mod routes;
mod skills;
mod state;

#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::recognizer::PatternRuler;
use crate::routes::build_router;
use crate::skills::fetcher::Fetcher;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV skill scanner v{}", env!("CARGO_PKG_VERSION"));

    // Load the rule-based recognizer once; handlers share it read-only.
    let ruler = PatternRuler::from_path(&config.skill_patterns_path)
        .with_context(|| format!("Failed to load skill patterns from {}", config.skill_patterns_path))?;
    if ruler.is_empty() {
        warn!("Skill pattern file is empty; only forced skills will be reported");
    }

    let fetcher = Fetcher::new(config.file_base_url.clone(), config.fetch_timeout)
        .context("Failed to build HTTP client")?;
    info!(
        "Fetching CVs from {} (timeout {:?})",
        config.file_base_url, config.fetch_timeout
    );

    let state = AppState {
        fetcher,
        recognizer: Arc::new(ruler),
    };

    let app = build_router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("HOST/PORT do not form a valid socket address")?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
