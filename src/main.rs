use anyhow::{Context, Result};
use moexscraper::{
    config::Config,
    server::{routes, AppState},
};
use reqwest::Client;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) config + logging ─────────────────────────────────────────
    let config = Config::from_env()?;
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(config.log_level.parse().unwrap_or(Level::INFO.into())),
        )
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!(?config, "startup");

    std::panic::set_hook(Box::new(|info| {
        eprintln!("panic: {:?}", info);
    }));

    // ─── 2) shared client ────────────────────────────────────────────
    let client = Client::builder()
        .gzip(true)
        .build()
        .context("building HTTP client")?;
    let port = config.port;
    let state = Arc::new(AppState { client, config });

    // ─── 3) serve ────────────────────────────────────────────────────
    info!("Dashboard: http://localhost:{}/", port);
    info!("Health check: http://localhost:{}/health", port);
    warp::serve(routes(state)).run(([0, 0, 0, 0], port)).await;

    Ok(())
}
