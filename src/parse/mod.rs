// src/parse/mod.rs
pub mod coerce;
pub mod date_parser;

pub use coerce::{coerce_column, ColumnKind};

use anyhow::{bail, Context, Result};
use arrow::{
    array::{ArrayRef, StringArray},
    datatypes::{Field, Schema},
    record_batch::{RecordBatch, RecordBatchOptions},
};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use tracing::{debug, info, warn};

static HEADING: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").expect("h1 selector"));
static TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").expect("table selector"));
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("tr selector"));
static HEADER_CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("th").expect("th selector"));
static DATA_CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td").expect("td selector"));

/// One `<h1>` heading and the table paired with it.
#[derive(Debug, Clone)]
pub struct NamedTable {
    pub name: String,
    pub batch: RecordBatch,
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect()
}

/// Extract every heading/table pair from an ISS HTML page.
///
/// Headings and tables are zipped by position, so the result has
/// `min(#h1, #table)` entries in document order. Names may repeat.
pub fn parse_tables(html: &str) -> Result<Vec<NamedTable>> {
    let doc = Html::parse_document(html);
    let headings: Vec<ElementRef<'_>> = doc.select(&HEADING).collect();
    let tables: Vec<ElementRef<'_>> = doc.select(&TABLE).collect();

    if headings.len() != tables.len() {
        debug!(
            headings = headings.len(),
            tables = tables.len(),
            "heading/table counts differ; pairing truncated"
        );
    }

    let mut out = Vec::with_capacity(headings.len().min(tables.len()));
    for (heading, table) in headings.into_iter().zip(tables) {
        let name = text_of(heading).trim().to_string();
        let batch =
            read_table(&name, table).with_context(|| format!("building table `{}`", name))?;
        info!(
            table = %name,
            rows = batch.num_rows(),
            columns = batch.num_columns(),
            "parsed"
        );
        out.push(NamedTable { name, batch });
    }
    Ok(out)
}

/// First `<tr>` supplies column names from its `<th>` cells, every later
/// `<tr>` one data row from its `<td>` cells. Short rows are null-padded;
/// a table without rows or with a row wider than the header is rejected.
fn read_table(name: &str, table: ElementRef<'_>) -> Result<RecordBatch> {
    let mut rows = table.select(&ROW);
    let Some(first) = rows.next() else {
        bail!("table has no rows");
    };

    let headers: Vec<String> = first.select(&HEADER_CELL).map(text_of).collect();
    let body: Vec<Vec<String>> = rows
        .map(|row| row.select(&DATA_CELL).map(text_of).collect())
        .collect();

    if let Some((idx, row)) = body
        .iter()
        .enumerate()
        .find(|(_, r)| r.len() > headers.len())
    {
        warn!(
            table = name,
            headers = headers.len(),
            cells = row.len(),
            row = idx,
            "row wider than header"
        );
        if headers.is_empty() {
            bail!("header row has no <th> cells but data row {} has {}", idx, row.len());
        }
        bail!(
            "data row {} has {} cells, header has {}",
            idx,
            row.len(),
            headers.len()
        );
    }

    let mut fields = Vec::with_capacity(headers.len());
    let mut columns = Vec::with_capacity(headers.len());
    for (idx, header) in headers.iter().enumerate() {
        let raw: ArrayRef = Arc::new(
            body.iter()
                .map(|row| row.get(idx).map(String::as_str))
                .collect::<StringArray>(),
        );
        let col = coerce_column(header, &raw, ColumnKind::from_name(header));
        fields.push(Field::new(header.as_str(), col.data_type().clone(), true));
        columns.push(col);
    }

    let options = RecordBatchOptions::new().with_row_count(Some(body.len()));
    RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), columns, &options)
        .map_err(Into::into)
}
