// src/server.rs

use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;
use std::{convert::Infallible, sync::Arc, time::Instant};
use tracing::{error, info, instrument};
use warp::{http::StatusCode, reject::Rejection, reply::Reply, Filter};

use crate::{
    config::Config,
    fetch::fetch_trades_page,
    parse::parse_tables,
    present::{
        page::{render_error_page, render_page, Body, PAGE_TITLE},
        render_tables,
    },
};

/// Shared by every request; read-only.
pub struct AppState {
    pub client: Client,
    pub config: Config,
}

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub secid: Option<String>,
}

/// Fetch → parse → render for one identifier. An empty identifier shows the
/// form only.
#[instrument(level = "info", skip(state))]
pub async fn build_dashboard(state: &AppState, secid: &str) -> Result<String> {
    if secid.is_empty() {
        return render_page(secid, Body::Empty);
    }

    let start = Instant::now();
    let Some(html) = fetch_trades_page(&state.client, &state.config, secid).await? else {
        return render_page(secid, Body::FetchFailed);
    };

    let tables = parse_tables(&html)?;
    let panels = render_tables(&tables)?;
    let page = render_page(secid, Body::Panels(&panels))?;

    info!(
        tables = tables.len(),
        panels = panels.len(),
        elapsed = ?start.elapsed(),
        "dashboard rendered"
    );
    Ok(page)
}

async fn dashboard(
    query: DashboardQuery,
    state: Arc<AppState>,
) -> Result<impl Reply, Rejection> {
    let secid = query
        .secid
        .unwrap_or_else(|| state.config.default_secid.clone());

    let (body, status) = match build_dashboard(&state, &secid).await {
        Ok(page) => (page, StatusCode::OK),
        Err(e) => {
            error!(secid = %secid, error = ?e, "dashboard failed");
            let page = render_error_page().unwrap_or_else(|e| {
                error!(error = ?e, "error page failed");
                PAGE_TITLE.to_string()
            });
            (page, StatusCode::INTERNAL_SERVER_ERROR)
        }
    };
    Ok(warp::reply::with_status(warp::reply::html(body), status))
}

async fn health_check() -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&serde_json::json!({
        "status": "healthy",
        "service": "moexscraper"
    })))
}

fn with_state(
    state: Arc<AppState>,
) -> impl Filter<Extract = (Arc<AppState>,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// `GET /health` and `GET /?secid=...`.
pub fn routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(health_check);

    let dashboard = warp::path::end()
        .and(warp::get())
        .and(warp::query::<DashboardQuery>())
        .and(with_state(state))
        .and_then(dashboard);

    health.or(dashboard)
}
