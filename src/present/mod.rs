// src/present/mod.rs
pub mod aggregate;
pub mod chart;
pub mod page;

pub use aggregate::{trade_volume, yield_series, TradeVolume, YieldSeries};
pub use chart::Figure;

use anyhow::Result;
use arrow::{array::Array, record_batch::RecordBatch, util::display::array_value_to_string};
use tracing::{debug, instrument};

use crate::parse::NamedTable;

pub const TRADES_TABLE: &str = "trades";
pub const YIELDS_TABLE: &str = "trades_yields";

/// A table flattened to display strings. Nulls render as empty cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Grid {
    pub fn from_batch(batch: &RecordBatch) -> Result<Self> {
        let columns = batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();

        let mut rows = Vec::with_capacity(batch.num_rows());
        for row in 0..batch.num_rows() {
            let mut cells = Vec::with_capacity(batch.num_columns());
            for col in batch.columns() {
                if col.is_null(row) {
                    cells.push(String::new());
                } else {
                    cells.push(array_value_to_string(col.as_ref(), row)?);
                }
            }
            rows.push(cells);
        }
        Ok(Self { columns, rows })
    }
}

/// One block of the dashboard, in display order.
#[derive(Debug, Clone, PartialEq)]
pub enum Panel {
    Header(String),
    Grid(Grid),
    Chart(Figure),
}

/// Every table as header + grid; the trades and yields tables also get
/// their charts right after the grid.
#[instrument(level = "info", skip(tables), fields(tables = tables.len()))]
pub fn render_tables(tables: &[NamedTable]) -> Result<Vec<Panel>> {
    let mut panels = Vec::new();

    for table in tables {
        panels.push(Panel::Header(table.name.clone()));
        panels.push(Panel::Grid(Grid::from_batch(&table.batch)?));

        match table.name.as_str() {
            TRADES_TABLE => {
                let vol = trade_volume(&table.batch)?;
                debug!(points = vol.times.len(), "trade volume");
                panels.push(Panel::Chart(chart::volume_figure(&vol)));
            }
            YIELDS_TABLE => {
                let ys = yield_series(&table.batch)?;
                debug!(points = ys.times.len(), "yield series");
                for metric in &ys.metrics {
                    panels.push(Panel::Chart(chart::metric_figure(&ys.times, metric)));
                }
            }
            _ => {}
        }
    }

    Ok(panels)
}
