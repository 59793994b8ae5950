// src/present/aggregate.rs

use anyhow::{anyhow, Result};
use arrow::{
    array::{Array, ArrayRef, AsArray},
    compute::cast,
    datatypes::{DataType, Float64Type, Time32SecondType, TimeUnit, TimestampMillisecondType},
    record_batch::RecordBatch,
};
use chrono::{NaiveDateTime, NaiveTime};
use std::collections::BTreeMap;

use crate::parse::{coerce_column, date_parser, ColumnKind};

pub const BUYSELL_COLUMN: &str = "BUYSELL (string:3)";
pub const TRADETIME_COLUMN: &str = "TRADETIME (time:10)";
pub const VALUE_COLUMN: &str = "VALUE (double)";
pub const SYSTIME_COLUMN: &str = "SYSTIME (datetime:19)";

/// Charted columns of the yields table with their chart titles.
pub const YIELD_METRICS: [(&str, &str); 4] = [
    ("EFFECTIVEYIELD (double)", "Effective Yield Over Time"),
    ("DURATION (int32)", "Duration Over Time"),
    ("ZSPREADBP (int32)", "ZSPREADBP Over Time"),
    ("GSPREADBP (int32)", "GSPREADBP Over Time"),
];

const SELL: &str = "S";
const BUY: &str = "B";

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| anyhow!("column `{}` not found", name))
}

/// Traded value per trade time, sell and buy side on a shared axis.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TradeVolume {
    /// Union of the times seen on either side, ascending.
    pub times: Vec<NaiveTime>,
    pub sell: Vec<f64>,
    pub buy: Vec<f64>,
}

/// Sum `VALUE` by `TRADETIME` separately for `S` and `B` rows, then outer-join
/// the two sums on time. A time present on one side only gets 0 on the other.
pub fn trade_volume(batch: &RecordBatch) -> Result<TradeVolume> {
    let side = cast(column(batch, BUYSELL_COLUMN)?, &DataType::Utf8)?;
    let side = side.as_string::<i32>();

    let time = coerce_column(
        TRADETIME_COLUMN,
        column(batch, TRADETIME_COLUMN)?,
        ColumnKind::Time,
    );
    let time = time
        .as_primitive_opt::<Time32SecondType>()
        .ok_or_else(|| anyhow!("column `{}` is not a time column", TRADETIME_COLUMN))?;

    let value = coerce_column(VALUE_COLUMN, column(batch, VALUE_COLUMN)?, ColumnKind::Float);
    let value = value
        .as_primitive_opt::<Float64Type>()
        .ok_or_else(|| anyhow!("column `{}` is not numeric", VALUE_COLUMN))?;

    let mut sell: BTreeMap<i32, f64> = BTreeMap::new();
    let mut buy: BTreeMap<i32, f64> = BTreeMap::new();

    for row in 0..batch.num_rows() {
        if side.is_null(row) || time.is_null(row) {
            continue;
        }
        let bucket = match side.value(row) {
            SELL => &mut sell,
            BUY => &mut buy,
            _ => continue,
        };
        let sum = bucket.entry(time.value(row)).or_insert(0.0);
        if value.is_valid(row) {
            *sum += value.value(row);
        }
    }

    let mut keys: Vec<i32> = sell.keys().chain(buy.keys()).copied().collect();
    keys.sort_unstable();
    keys.dedup();

    let mut out = TradeVolume::default();
    for key in keys {
        let Some(t) = date_parser::seconds_to_time(key) else {
            continue;
        };
        out.times.push(t);
        out.sell.push(sell.get(&key).copied().unwrap_or(0.0));
        out.buy.push(buy.get(&key).copied().unwrap_or(0.0));
    }
    Ok(out)
}

/// One metric of the yields table, aligned with [`YieldSeries::times`].
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSeries {
    pub column: &'static str,
    pub title: &'static str,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct YieldSeries {
    pub times: Vec<Option<NaiveDateTime>>,
    pub metrics: Vec<MetricSeries>,
}

/// Time series of the four yield metrics against `SYSTIME`.
pub fn yield_series(batch: &RecordBatch) -> Result<YieldSeries> {
    let times = reparse_timestamps(SYSTIME_COLUMN, column(batch, SYSTIME_COLUMN)?)?;

    let metrics = YIELD_METRICS
        .iter()
        .map(|&(name, title)| -> Result<MetricSeries> {
            let values = cast(column(batch, name)?, &DataType::Float64)?;
            let values = values.as_primitive::<Float64Type>();
            Ok(MetricSeries {
                column: name,
                title,
                values: values.iter().collect(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(YieldSeries { times, metrics })
}

/// Read a column as timestamps whatever the parser made of it.
///
/// An existing millisecond timestamp column is taken as is. Text is parsed
/// leniently; a non-empty cell that is not a timestamp is an error.
fn reparse_timestamps(name: &str, array: &ArrayRef) -> Result<Vec<Option<NaiveDateTime>>> {
    if let DataType::Timestamp(TimeUnit::Millisecond, _) = array.data_type() {
        return Ok(array
            .as_primitive::<TimestampMillisecondType>()
            .iter()
            .map(|ms| ms.and_then(date_parser::millis_to_datetime))
            .collect());
    }

    let text = cast(array, &DataType::Utf8)?;
    text.as_string::<i32>()
        .iter()
        .map(|cell| match cell.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(None),
            Some(s) => date_parser::parse_flexible(s)
                .map(Some)
                .ok_or_else(|| anyhow!("`{}` in column `{}` is not a timestamp", s, name)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use std::sync::Arc;

    fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    fn text_batch(columns: &[(&str, Vec<Option<&str>>)]) -> RecordBatch {
        let fields: Vec<Field> = columns
            .iter()
            .map(|(n, _)| Field::new(*n, DataType::Utf8, true))
            .collect();
        let arrays: Vec<ArrayRef> = columns
            .iter()
            .map(|(_, v)| Arc::new(v.iter().copied().collect::<StringArray>()) as ArrayRef)
            .collect();
        RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).unwrap()
    }

    fn trades_batch() -> RecordBatch {
        text_batch(&[
            (BUYSELL_COLUMN, vec![Some("S"), Some("B"), Some("S")]),
            (
                TRADETIME_COLUMN,
                vec![Some("10:00:00"), Some("10:00:00"), Some("10:01:00")],
            ),
            (VALUE_COLUMN, vec![Some("100"), Some("50"), Some("30")]),
        ])
    }

    #[test]
    fn sell_and_buy_are_outer_joined_with_zero_fill() -> Result<()> {
        let vol = trade_volume(&trades_batch())?;
        assert_eq!(vol.times, vec![hms(10, 0, 0), hms(10, 1, 0)]);
        assert_eq!(vol.sell, vec![100.0, 30.0]);
        assert_eq!(vol.buy, vec![50.0, 0.0]);
        assert!(!vol.times.contains(&hms(9, 0, 0)));
        Ok(())
    }

    #[test]
    fn same_result_after_parser_coercion() -> Result<()> {
        let html = "<h1>trades</h1><table>\
            <tr><th>BUYSELL (string:3)</th><th>TRADETIME (time:10)</th><th>VALUE (double)</th></tr>\
            <tr><td>S</td><td>10:00:00</td><td>100</td></tr>\
            <tr><td>B</td><td>10:00:00</td><td>50</td></tr>\
            <tr><td>S</td><td>10:01:00</td><td>30</td></tr>\
            </table>";
        let tables = crate::parse::parse_tables(html)?;
        assert_eq!(trade_volume(&tables[0].batch)?, trade_volume(&trades_batch())?);
        Ok(())
    }

    #[test]
    fn other_sides_null_times_and_null_values_are_skipped() -> Result<()> {
        let batch = text_batch(&[
            (
                BUYSELL_COLUMN,
                vec![Some("S"), Some("X"), Some("B"), Some("B"), None],
            ),
            (
                TRADETIME_COLUMN,
                vec![Some("10:00:00"), Some("10:05:00"), None, Some("10:02:00"), Some("10:00:00")],
            ),
            (
                VALUE_COLUMN,
                vec![Some("5"), Some("7"), Some("9"), Some("oops"), Some("11")],
            ),
        ]);
        let vol = trade_volume(&batch)?;
        // 10:02 appears with a null value: the group exists and sums to 0
        assert_eq!(vol.times, vec![hms(10, 0, 0), hms(10, 2, 0)]);
        assert_eq!(vol.sell, vec![5.0, 0.0]);
        assert_eq!(vol.buy, vec![0.0, 0.0]);
        Ok(())
    }

    #[test]
    fn every_key_from_either_side_is_present() -> Result<()> {
        let batch = text_batch(&[
            (BUYSELL_COLUMN, vec![Some("B"), Some("S"), Some("B")]),
            (
                TRADETIME_COLUMN,
                vec![Some("09:59:59"), Some("10:30:00"), Some("11:00:00")],
            ),
            (VALUE_COLUMN, vec![Some("1"), Some("2"), Some("3")]),
        ]);
        let vol = trade_volume(&batch)?;
        assert_eq!(vol.times.len(), 3);
        for (i, t) in vol.times.iter().enumerate() {
            assert!(vol.sell[i] == 0.0 || vol.buy[i] == 0.0, "at {}", t);
        }
        assert_eq!(vol.sell, vec![0.0, 2.0, 0.0]);
        assert_eq!(vol.buy, vec![1.0, 0.0, 3.0]);
        Ok(())
    }

    #[test]
    fn missing_trade_column_is_an_error() {
        let batch = text_batch(&[(BUYSELL_COLUMN, vec![Some("S")])]);
        let err = trade_volume(&batch).unwrap_err();
        assert!(err.to_string().contains(TRADETIME_COLUMN));
    }

    fn yields_batch(systime: ArrayRef) -> RecordBatch {
        let schema = Schema::new(vec![
            Field::new(SYSTIME_COLUMN, systime.data_type().clone(), true),
            Field::new("EFFECTIVEYIELD (double)", DataType::Float64, true),
            Field::new("DURATION (int32)", DataType::Int64, true),
            Field::new("ZSPREADBP (int32)", DataType::Int64, true),
            Field::new("GSPREADBP (int32)", DataType::Utf8, true),
        ]);
        RecordBatch::try_new(
            Arc::new(schema),
            vec![
                systime,
                Arc::new(Float64Array::from(vec![Some(17.5), None])),
                Arc::new(Int64Array::from(vec![Some(640), Some(639)])),
                Arc::new(Int64Array::from(vec![Some(120), Some(118)])),
                Arc::new(StringArray::from(vec![Some("95"), Some("-")])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn yield_series_from_text_times() -> Result<()> {
        let systime: ArrayRef = Arc::new(StringArray::from(vec![
            Some("2024-10-01 10:00:00"),
            Some("2024-10-01T10:05:00"),
        ]));
        let ys = yield_series(&yields_batch(systime))?;
        assert_eq!(ys.times.len(), 2);
        assert_eq!(ys.times[1].unwrap().format("%H:%M").to_string(), "10:05");
        assert_eq!(ys.metrics.len(), 4);
        assert_eq!(ys.metrics[0].title, "Effective Yield Over Time");
        assert_eq!(ys.metrics[0].values, vec![Some(17.5), None]);
        assert_eq!(ys.metrics[1].values, vec![Some(640.0), Some(639.0)]);
        assert_eq!(ys.metrics[3].values, vec![Some(95.0), None]);
        Ok(())
    }

    #[test]
    fn yield_series_keeps_parsed_timestamps() -> Result<()> {
        let raw: ArrayRef = Arc::new(StringArray::from(vec![
            Some("2024-10-01 10:00:00"),
            Some(""),
        ]));
        let systime = coerce_column(SYSTIME_COLUMN, &raw, ColumnKind::DateTime);
        let ys = yield_series(&yields_batch(systime))?;
        assert_eq!(ys.times[0].unwrap().to_string(), "2024-10-01 10:00:00");
        assert_eq!(ys.times[1], None);
        Ok(())
    }

    #[test]
    fn bad_yield_timestamp_is_an_error() {
        let systime: ArrayRef = Arc::new(StringArray::from(vec![Some("soon"), None]));
        assert!(yield_series(&yields_batch(systime)).is_err());
    }
}
