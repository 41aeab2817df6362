//! Column-name resolution and cell parsing shared by every table shape

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

/// Epoch values above this are treated as milliseconds
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Smallest epoch (seconds, 2001-09-09) accepted as a date; smaller integers
/// are row numbers or compact dates, not timestamps
const EPOCH_SECONDS_FLOOR: i64 = 1_000_000_000;

/// Date columns of record-oriented tables, most date-like first
const DATE_COLUMNS: [&str; 5] = ["date", "datetime", "timestamp", "time", "index"];

/// One of the five price columns of a bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl PriceField {
    pub const ALL: [PriceField; 5] = [
        PriceField::Open,
        PriceField::High,
        PriceField::Low,
        PriceField::Close,
        PriceField::Volume,
    ];

    /// Resolve a provider column name, ignoring case and ordinal prefixes
    /// such as `"4. close"`.
    pub fn resolve(column: &str) -> Option<Self> {
        match canonical_column(column).as_str() {
            "open" => Some(Self::Open),
            "high" => Some(Self::High),
            "low" => Some(Self::Low),
            "close" => Some(Self::Close),
            "volume" => Some(Self::Volume),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::High => "high",
            Self::Low => "low",
            Self::Close => "close",
            Self::Volume => "volume",
        }
    }
}

/// Priority of a column as the row date in record-oriented tables; lower wins.
///
/// `index` ranks last since it is often a row number next to the real date.
pub fn date_column_rank(column: &str) -> Option<usize> {
    let column = canonical_column(column);
    DATE_COLUMNS.iter().position(|name| *name == column)
}

/// Lower-cased column name with any leading `"<n>. "` prefix removed
fn canonical_column(column: &str) -> String {
    let trimmed = column.trim();
    let without_ordinal = match trimmed.split_once('.') {
        Some((prefix, rest)) if !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_digit()) => {
            rest.trim_start()
        }
        _ => trimmed,
    };
    without_ordinal.to_ascii_lowercase()
}

/// Parse a numeric cell that may be a JSON number or a numeric string
pub fn parse_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

/// Parse a volume cell; fractional volumes are rounded
pub fn parse_volume(value: &Value) -> Option<f64> {
    parse_number(value).filter(|v| *v >= 0.0).map(f64::round)
}

/// Parse a date cell: a date/datetime string or an epoch number
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => parse_date_str(s),
        Value::Number(n) => n.as_i64().and_then(date_from_epoch),
        _ => None,
    }
}

/// Parse the date forms providers put in table keys and date columns
pub fn parse_date_str(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(s, format) {
            return Some(datetime.date());
        }
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(s) {
        return Some(datetime.date_naive());
    }
    if let Ok(datetime) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(datetime.date_naive());
    }
    // compact YYYYMMDD
    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        let year = s[..4].parse().ok()?;
        let month = s[4..6].parse().ok()?;
        let day = s[6..].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    s.parse::<i64>().ok().and_then(date_from_epoch)
}

fn date_from_epoch(epoch: i64) -> Option<NaiveDate> {
    if epoch < EPOCH_SECONDS_FLOOR {
        return None;
    }
    let datetime = if epoch > EPOCH_MILLIS_THRESHOLD {
        DateTime::from_timestamp_millis(epoch)?
    } else {
        DateTime::from_timestamp(epoch, 0)?
    };
    Some(datetime.date_naive())
}
