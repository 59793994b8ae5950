// src/present/page.rs

use anyhow::{Context as _, Result};
use once_cell::sync::Lazy;
use serde::Serialize;
use tera::{Context, Tera};

use super::{chart::Figure, Panel};

pub const PAGE_TITLE: &str = "MOEX bond trading data";
pub const FETCH_FAILED: &str = "Failed to fetch data from the MOEX site.";
const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

const DASHBOARD_TEMPLATE: &str = "dashboard.html";
const ERROR_TEMPLATE: &str = "error.html";

// `.html` names keep tera's autoescaping on for every `{{ }}` expression.
static TEMPLATES: Lazy<Tera> = Lazy::new(|| {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        (
            DASHBOARD_TEMPLATE,
            include_str!("../../templates/dashboard.html"),
        ),
        (ERROR_TEMPLATE, include_str!("../../templates/error.html")),
    ])
    .expect("page templates");
    tera
});

/// What goes under the input form.
#[derive(Debug)]
pub enum Body<'a> {
    /// Nothing submitted yet.
    Empty,
    /// The exchange did not answer with 200.
    FetchFailed,
    Panels(&'a [Panel]),
}

/// Template-facing view of a [`Panel`].
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum PanelView<'a> {
    Header {
        name: &'a str,
    },
    Grid {
        columns: &'a [String],
        rows: &'a [Vec<String>],
    },
    Chart {
        id: String,
        figure: String,
    },
}

/// Figure JSON that is safe to inline in a `<script>` block.
fn figure_json(fig: &Figure) -> Result<String> {
    Ok(serde_json::to_string(fig)?.replace("</", "<\\/"))
}

fn panel_views(panels: &[Panel]) -> Result<Vec<PanelView<'_>>> {
    let mut views = Vec::with_capacity(panels.len());
    let mut charts = 0;
    for panel in panels {
        views.push(match panel {
            Panel::Header(name) => PanelView::Header { name },
            Panel::Grid(grid) => PanelView::Grid {
                columns: &grid.columns,
                rows: &grid.rows,
            },
            Panel::Chart(fig) => {
                let id = format!("chart-{}", charts);
                charts += 1;
                PanelView::Chart {
                    id,
                    figure: figure_json(fig)?,
                }
            }
        });
    }
    Ok(views)
}

/// Full dashboard page: title, the identifier form, then `body`.
pub fn render_page(secid: &str, body: Body<'_>) -> Result<String> {
    let mut ctx = Context::new();
    ctx.insert("title", PAGE_TITLE);
    ctx.insert("plotly_js", PLOTLY_JS);
    ctx.insert("secid", secid);

    let (error, panels) = match body {
        Body::Empty => (None, Vec::new()),
        Body::FetchFailed => (Some(FETCH_FAILED), Vec::new()),
        Body::Panels(panels) => (None, panel_views(panels)?),
    };
    ctx.insert("error", &error);
    ctx.insert("panels", &panels);

    TEMPLATES
        .render(DASHBOARD_TEMPLATE, &ctx)
        .context("rendering dashboard page")
}

/// Bare error page for failures past the status check.
pub fn render_error_page() -> Result<String> {
    let mut ctx = Context::new();
    ctx.insert("title", PAGE_TITLE);
    TEMPLATES
        .render(ERROR_TEMPLATE, &ctx)
        .context("rendering error page")
}
