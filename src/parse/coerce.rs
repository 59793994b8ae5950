use crate::parse::date_parser;
use arrow::{
    array::{
        Array, ArrayRef, AsArray, Float64Array, Int64Array, StringArray, Time32SecondArray,
        TimestampMillisecondArray,
    },
    compute::cast,
    datatypes::{DataType, TimeUnit},
};
use std::sync::Arc;
use tracing::debug;

/// Target type hinted by a column name such as `VALUE (double)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    DateTime,
    Time,
    Text,
}

impl ColumnKind {
    /// Case-insensitive substring match; the first hint found in
    /// `int`, `double`/`float`, `datetime`, `time` order wins.
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.contains("int") {
            ColumnKind::Integer
        } else if lower.contains("double") || lower.contains("float") {
            ColumnKind::Float
        } else if lower.contains("datetime") {
            ColumnKind::DateTime
        } else if lower.contains("time") {
            ColumnKind::Time
        } else {
            ColumnKind::Text
        }
    }

    /// Whether `dt` is already a final type for this kind.
    fn accepts(self, dt: &DataType) -> bool {
        match self {
            ColumnKind::Integer => matches!(dt, DataType::Int64 | DataType::Float64),
            ColumnKind::Float => matches!(dt, DataType::Float64),
            ColumnKind::DateTime => {
                matches!(dt, DataType::Timestamp(TimeUnit::Millisecond, None))
            }
            ColumnKind::Time => matches!(dt, DataType::Time32(TimeUnit::Second)),
            ColumnKind::Text => true,
        }
    }
}

enum Number {
    Int(i64),
    Float(f64),
}

fn parse_number(s: &str) -> Option<Number> {
    if let Ok(v) = s.parse::<i64>() {
        return Some(Number::Int(v));
    }
    s.parse::<f64>()
        .ok()
        .filter(|v| !v.is_nan())
        .map(Number::Float)
}

/// Coerce one column to the type its name hints at.
///
/// Unparseable cells become nulls and are only logged. An array that already
/// has the target type is returned as is.
pub fn coerce_column(name: &str, array: &ArrayRef, kind: ColumnKind) -> ArrayRef {
    if kind.accepts(array.data_type()) {
        return array.clone();
    }

    let text = match array.data_type() {
        DataType::Utf8 => array.clone(),
        _ => match cast(array, &DataType::Utf8) {
            Ok(a) => a,
            Err(e) => {
                debug!(column = name, error = %e, "cannot read column as text; left unchanged");
                return array.clone();
            }
        },
    };
    let strings = text.as_string::<i32>();

    let (out, failed) = match kind {
        ColumnKind::Integer => to_numeric(strings, true),
        ColumnKind::Float => to_numeric(strings, false),
        ColumnKind::DateTime => to_datetime(strings),
        ColumnKind::Time => to_time(strings),
        ColumnKind::Text => (text.clone(), 0),
    };

    if failed > 0 {
        debug!(
            column = name,
            failed,
            target = ?kind,
            "cells could not be converted; stored as null"
        );
    }
    out
}

/// Non-empty trimmed cell text.
fn cells(strings: &StringArray) -> impl Iterator<Item = Option<&str>> + '_ {
    strings
        .iter()
        .map(|opt| opt.map(str::trim).filter(|s| !s.is_empty()))
}

fn to_numeric(strings: &StringArray, integer: bool) -> (ArrayRef, usize) {
    let mut failed = 0;
    let parsed: Vec<Option<Number>> = cells(strings)
        .map(|cell| {
            let cell = cell?;
            let n = parse_number(cell);
            if n.is_none() {
                failed += 1;
            }
            n
        })
        .collect();

    // integer hint: keep integers only when every valid value is integral
    let integral = parsed.iter().flatten().all(|n| match n {
        Number::Int(_) => true,
        Number::Float(v) => v.fract() == 0.0 && v.abs() < i64::MAX as f64,
    });

    let out: ArrayRef = if integer && integral {
        Arc::new(
            parsed
                .into_iter()
                .map(|n| {
                    n.map(|n| match n {
                        Number::Int(v) => v,
                        Number::Float(v) => v as i64,
                    })
                })
                .collect::<Int64Array>(),
        )
    } else {
        Arc::new(
            parsed
                .into_iter()
                .map(|n| {
                    n.map(|n| match n {
                        Number::Int(v) => v as f64,
                        Number::Float(v) => v,
                    })
                })
                .collect::<Float64Array>(),
        )
    };
    (out, failed)
}

fn to_datetime(strings: &StringArray) -> (ArrayRef, usize) {
    let mut failed = 0;
    let arr: TimestampMillisecondArray = cells(strings)
        .map(|cell| {
            let ms = date_parser::parse_datetime_millis(cell?);
            if ms.is_none() {
                failed += 1;
            }
            ms
        })
        .collect();
    (Arc::new(arr), failed)
}

fn to_time(strings: &StringArray) -> (ArrayRef, usize) {
    let mut failed = 0;
    let arr: Time32SecondArray = cells(strings)
        .map(|cell| {
            let secs = date_parser::parse_time_seconds(cell?);
            if secs.is_none() {
                failed += 1;
            }
            secs
        })
        .collect();
    (Arc::new(arr), failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::{Float64Type, Int64Type, Time32SecondType};

    fn text(values: &[Option<&str>]) -> ArrayRef {
        Arc::new(values.iter().copied().collect::<StringArray>())
    }

    #[test]
    fn kind_priority_follows_name_hints() {
        assert_eq!(ColumnKind::from_name("DURATION (int32)"), ColumnKind::Integer);
        assert_eq!(ColumnKind::from_name("VALUE (double)"), ColumnKind::Float);
        assert_eq!(ColumnKind::from_name("PRICE (Float)"), ColumnKind::Float);
        assert_eq!(
            ColumnKind::from_name("SYSTIME (datetime:19)"),
            ColumnKind::DateTime
        );
        assert_eq!(ColumnKind::from_name("TRADETIME (time:10)"), ColumnKind::Time);
        assert_eq!(ColumnKind::from_name("BUYSELL (string:3)"), ColumnKind::Text);
        // `int` is checked before everything else
        assert_eq!(ColumnKind::from_name("POINTTIME"), ColumnKind::Integer);
    }

    #[test]
    fn integers_with_failures_become_null() {
        let input = text(&[Some("1"), Some("x"), None, Some(" 7 ")]);
        let out = coerce_column("N (int32)", &input, ColumnKind::Integer);
        let ints = out.as_primitive::<Int64Type>();
        assert_eq!(ints.len(), 4);
        assert_eq!(ints.value(0), 1);
        assert!(ints.is_null(1));
        assert!(ints.is_null(2));
        assert_eq!(ints.value(3), 7);
    }

    #[test]
    fn integer_hint_with_fractions_stays_float() {
        let input = text(&[Some("1"), Some("2.5")]);
        let out = coerce_column("N (int32)", &input, ColumnKind::Integer);
        assert_eq!(out.data_type(), &DataType::Float64);
        assert_eq!(out.as_primitive::<Float64Type>().value(1), 2.5);
    }

    #[test]
    fn floats_and_times_parse() {
        let input = text(&[Some("100.5"), Some("")]);
        let f = coerce_column("V (double)", &input, ColumnKind::Float);
        let f = f.as_primitive::<Float64Type>();
        assert_eq!(f.value(0), 100.5);
        assert!(f.is_null(1));

        let input = text(&[Some("10:00:00"), Some("bad")]);
        let t = coerce_column("T (time:10)", &input, ColumnKind::Time);
        let t = t.as_primitive::<Time32SecondType>();
        assert_eq!(t.value(0), 36_000);
        assert!(t.is_null(1));

        let d = coerce_column(
            "S (datetime:19)",
            &text(&[Some("2024-10-01 10:00:00")]),
            ColumnKind::DateTime,
        );
        assert_eq!(
            d.data_type(),
            &DataType::Timestamp(TimeUnit::Millisecond, None)
        );
    }

    #[test]
    fn coercion_is_idempotent() {
        for (name, cell) in [
            ("N (int32)", "42"),
            ("V (double)", "1.25"),
            ("S (datetime:19)", "2024-10-01 10:00:00"),
            ("T (time:10)", "10:00:00"),
            ("B (string:3)", "S"),
        ] {
            let kind = ColumnKind::from_name(name);
            let once = coerce_column(name, &text(&[Some(cell), None]), kind);
            let twice = coerce_column(name, &once, kind);
            assert_eq!(once.as_ref(), twice.as_ref(), "column {}", name);
        }
    }

    #[test]
    fn non_text_input_is_cast_first() {
        let ints: ArrayRef = Arc::new(Int64Array::from(vec![Some(3), None]));
        let out = coerce_column("V (double)", &ints, ColumnKind::Float);
        let out = out.as_primitive::<Float64Type>();
        assert_eq!(out.value(0), 3.0);
        assert!(out.is_null(1));
    }
}
