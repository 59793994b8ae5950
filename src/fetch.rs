// src/fetch.rs

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use tracing::{debug, info, instrument, warn};

use crate::config::Config;

/// Trades page for one security on the configured board.
///
/// The identifier is embedded as given; no percent-encoding is applied here.
pub fn trades_url(config: &Config, secid: &str) -> String {
    format!(
        "{}/iss/engines/stock/markets/bonds/boards/{}/trades.html?securities={}",
        config.iss_host, config.board, secid
    )
}

/// One GET for the trades page of `secid`.
///
/// Returns `Ok(None)` when the exchange answers with anything but 200.
/// Transport failures are returned as errors.
#[instrument(level = "info", skip(client, config))]
pub async fn fetch_trades_page(
    client: &Client,
    config: &Config,
    secid: &str,
) -> Result<Option<String>> {
    let url = trades_url(config, secid);
    debug!(%url, "requesting trades page");

    let resp = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("GET {}", url))?;

    let status = resp.status();
    if status != StatusCode::OK {
        warn!(%url, %status, "exchange returned non-200");
        return Ok(None);
    }

    let html = resp
        .text()
        .await
        .with_context(|| format!("reading body from {}", url))?;
    info!(bytes = html.len(), "fetched trades page");
    Ok(Some(html))
}
