//! PADDOCK: headless-browser wager placement
//!
//! Entry point. Loads configuration, initialises structured logging and
//! serves the wager API until Ctrl+C.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use paddock::api::{self, routes::ServiceState};
use paddock::config;
use paddock::engine::Orchestrator;
use paddock::session::ChromeLauncher;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = std::env::var("PADDOCK_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let cfg = config::AppConfig::load(&config_path)?;

    init_logging();

    info!(
        config = %config_path,
        headless = cfg.browser.headless,
        pacing_ms = cfg.timing.pacing_ms,
        "PADDOCK starting up"
    );

    let launcher = ChromeLauncher::new(cfg.browser.clone(), cfg.site.clone(), cfg.timing.clone());
    let state = Arc::new(ServiceState::new(
        Arc::new(launcher),
        Orchestrator::new(cfg.timing.clone()),
    ));

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", cfg.server.host, cfg.server.port))?;

    api::serve(state, addr).await?;

    info!("PADDOCK shut down cleanly.");
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("paddock=info,tower_http=info"));

    let json_logging = std::env::var("PADDOCK_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
