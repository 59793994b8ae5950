// src/present/chart.rs
//
// Plotly figure descriptions. The page hands these to plotly.js as is.

use serde::Serialize;

use super::aggregate::{MetricSeries, TradeVolume, SYSTIME_COLUMN};
use crate::parse::date_parser::{DATETIME_FORMAT, TIME_FORMAT};
use chrono::NaiveDateTime;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub mode: &'static str,
    pub x: Vec<Option<String>>,
    pub y: Vec<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

impl Trace {
    fn line(x: Vec<Option<String>>, y: Vec<Option<f64>>) -> Self {
        Self {
            kind: "scatter",
            mode: "lines",
            x,
            y,
            name: None,
            line: None,
            opacity: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Line {
    pub color: &'static str,
    pub width: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Title {
    pub text: String,
}

impl Title {
    fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Axis {
    pub title: Title,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Legend {
    pub title: Title,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Layout {
    pub title: Title,
    pub xaxis: Axis,
    pub yaxis: Axis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<Legend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovermode: Option<&'static str>,
}

/// Sell and buy volume overlaid on one time axis.
pub fn volume_figure(vol: &TradeVolume) -> Figure {
    let x: Vec<Option<String>> = vol
        .times
        .iter()
        .map(|t| Some(t.format(TIME_FORMAT).to_string()))
        .collect();

    let side = |name: &str, color: &'static str, y: &[f64]| Trace {
        name: Some(name.to_string()),
        line: Some(Line { color, width: 2.0 }),
        opacity: Some(0.7),
        ..Trace::line(x.clone(), y.iter().copied().map(Some).collect())
    };

    Figure {
        data: vec![
            side("Sell Trades (S)", "red", &vol.sell),
            side("Buy Trades (B)", "green", &vol.buy),
        ],
        layout: Layout {
            title: Title::new("Volume (Buy vs Sell)"),
            xaxis: Axis {
                title: Title::new("TRADETIME"),
            },
            yaxis: Axis {
                title: Title::new("VALUE"),
            },
            legend: Some(Legend {
                title: Title::new("Trade Type"),
            }),
            hovermode: Some("x unified"),
        },
    }
}

/// Single-series line chart of one yield metric.
pub fn metric_figure(times: &[Option<NaiveDateTime>], metric: &MetricSeries) -> Figure {
    let x = times
        .iter()
        .map(|t| t.map(|t| t.format(DATETIME_FORMAT).to_string()))
        .collect();

    Figure {
        data: vec![Trace::line(x, metric.values.clone())],
        layout: Layout {
            title: Title::new(metric.title),
            xaxis: Axis {
                title: Title::new(SYSTIME_COLUMN),
            },
            yaxis: Axis {
                title: Title::new(metric.column),
            },
            legend: None,
            hovermode: None,
        },
    }
}
