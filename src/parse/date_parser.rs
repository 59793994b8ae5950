use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Exact format of `(datetime:N)` columns.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Exact format of `(time:N)` columns.
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Accepted when a timestamp column is re-read for charting.
const FLEXIBLE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// `"YYYY-MM-DD HH:MM:SS"` → millis since epoch, naive (no zone).
pub fn parse_datetime_millis(s: &str) -> Option<i64> {
    NaiveDateTime::parse_from_str(s.trim(), DATETIME_FORMAT)
        .ok()
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// `"HH:MM:SS"` → seconds since midnight.
pub fn parse_time_seconds(s: &str) -> Option<i32> {
    NaiveTime::parse_from_str(s.trim(), TIME_FORMAT)
        .ok()
        .map(|t| t.num_seconds_from_midnight() as i32)
}

/// Lenient timestamp parse: a handful of ISO-like layouts, or a bare date.
pub fn parse_flexible(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    FLEXIBLE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

pub fn millis_to_datetime(ms: i64) -> Option<NaiveDateTime> {
    chrono::DateTime::<chrono::Utc>::from_timestamp_millis(ms).map(|dt| dt.naive_utc())
}

pub fn seconds_to_time(secs: i32) -> Option<NaiveTime> {
    u32::try_from(secs)
        .ok()
        .and_then(|s| NaiveTime::from_num_seconds_from_midnight_opt(s, 0))
}
