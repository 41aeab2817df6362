//! Canonical series normalizer
//!
//! Providers hand back daily price tables in different layouts: row records
//! with lower-case or capitalized columns, a field-major table keyed by date
//! strings, or a date-major time-series object wrapped in a metadata envelope.
//! [`normalize`] detects the layout, reads every row through the matching
//! adapter and returns one ascending, de-duplicated [`PriceSeries`]. Anything
//! short of a fully parseable table is [`NoData`]; a partial series is never
//! returned.

mod fields;
mod shape;

pub(crate) use fields::{parse_date, parse_number};
pub use fields::PriceField;
pub use shape::TableShape;

use crate::series::PriceSeries;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// The upstream payload was missing, empty or unparseable
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct NoData {
    pub reason: String,
}

impl NoData {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Normalize one provider's raw price table.
///
/// `bar_limit` keeps only the most recent bars after sorting; sources that
/// return unbounded history pass their limit, bounded sources pass `None`.
pub fn normalize(raw: &Value, bar_limit: Option<usize>) -> Result<PriceSeries, NoData> {
    let table = shape::unwrap_envelope(raw);
    let shape = TableShape::detect(table)
        .ok_or_else(|| NoData::new("missing, empty or unrecognized price table"))?;
    debug!(?shape, "Detected price table shape");

    let bars = shape.extract(table)?;
    let series = PriceSeries::from_bars(bars);
    let series = match bar_limit {
        Some(limit) => series.tail(limit),
        None => series,
    };

    if series.is_empty() {
        return Err(NoData::new("price table has no rows"));
    }
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn assert_ascending_unique(series: &PriceSeries) {
        assert!(
            series.bars().windows(2).all(|w| w[0].date < w[1].date),
            "series must be strictly ascending"
        );
    }

    #[test]
    fn test_lower_case_records() {
        let raw = json!([
            {"symbol": "AAPL", "date": "2024-01-03", "open": 184.2, "high": 185.9, "low": 183.4, "close": 184.3, "volume": 58414460, "adjclose": 183.9},
            {"symbol": "AAPL", "date": "2024-01-02", "open": 187.2, "high": 188.4, "low": 183.9, "close": 185.6, "volume": 82488700, "adjclose": 185.2}
        ]);

        let series = normalize(&raw, None).unwrap();
        assert_eq!(series.len(), 2);
        assert_ascending_unique(&series);
        assert_eq!(series.first().unwrap().date, ymd(2024, 1, 2));
        assert_eq!(series.last().unwrap().close, 184.3);
        assert_eq!(series.last().unwrap().volume, 58_414_460);
    }

    #[test]
    fn test_capitalized_columns_match_lower_case() {
        let lower = json!([
            {"date": "2024-01-02", "open": 10, "high": 12, "low": 9, "close": 11, "volume": 100}
        ]);
        let upper = json!([
            {"Date": "2024-01-02", "Open": 10, "High": 12, "Low": 9, "Close": 11, "Volume": 100}
        ]);

        assert_eq!(normalize(&lower, None).unwrap(), normalize(&upper, None).unwrap());
    }

    #[test]
    fn test_field_major_table() {
        let raw = json!({
            "Open": {"2024-01-03": 11.0, "2024-01-02": 10.0},
            "High": {"2024-01-03": 12.5, "2024-01-02": 11.5},
            "Low": {"2024-01-03": 10.5, "2024-01-02": 9.5},
            "Close": {"2024-01-03": 12.0, "2024-01-02": 11.0},
            "Volume": {"2024-01-03": 2000, "2024-01-02": 1000},
            "Dividends": {"2024-01-03": 0.0, "2024-01-02": 0.0}
        });

        let series = normalize(&raw, None).unwrap();
        assert_eq!(series.closes(), vec![11.0, 12.0]);
        assert_eq!(series.first().unwrap().volume, 1000);
    }

    #[test]
    fn test_time_series_envelope() {
        let raw = json!({
            "Meta Data": {"1. Information": "Daily Prices", "2. Symbol": "IBM"},
            "Time Series (Daily)": {
                "2024-01-03": {"1. open": "161.0000", "2. high": "161.7300", "3. low": "160.0800", "4. close": "160.1000", "5. volume": "4086133"},
                "2024-01-02": {"1. open": "162.8300", "2. high": "163.2900", "3. low": "160.5000", "4. close": "161.5000", "5. volume": "3836126"}
            }
        });

        let series = normalize(&raw, None).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.first().unwrap().date, ymd(2024, 1, 2));
        assert_eq!(series.first().unwrap().open, 162.83);
        assert_eq!(series.last().unwrap().volume, 4_086_133);
    }

    #[test]
    fn test_unsorted_input_with_duplicates() {
        let raw = json!([
            {"date": "2024-01-04", "open": 3, "high": 3, "low": 3, "close": 3, "volume": 3},
            {"date": "2024-01-02", "open": 1, "high": 1, "low": 1, "close": 1, "volume": 1},
            {"date": "2024-01-04", "open": 4, "high": 4, "low": 4, "close": 4, "volume": 4},
            {"date": "2024-01-03", "open": 2, "high": 2, "low": 2, "close": 2, "volume": 2}
        ]);

        let series = normalize(&raw, None).unwrap();
        assert_ascending_unique(&series);
        assert_eq!(series.closes(), vec![1.0, 2.0, 4.0]);
    }

    #[test]
    fn test_epoch_millis_dates() {
        let raw = json!([
            {"date": 1_704_240_000_000_i64, "open": 2, "high": 2, "low": 2, "close": 2, "volume": 2},
            {"date": 1_704_153_600_000_i64, "open": 1, "high": 1, "low": 1, "close": 1, "volume": 1}
        ]);

        let series = normalize(&raw, None).unwrap();
        assert_eq!(series.first().unwrap().date, ymd(2024, 1, 2));
        assert_eq!(series.last().unwrap().date, ymd(2024, 1, 3));
    }

    #[test]
    fn test_row_number_index_does_not_shadow_date() {
        let raw = json!([
            {"index": 0, "timestamp": "2024-01-02", "open": 1, "high": 1, "low": 1, "close": 1, "volume": 1},
            {"index": 1, "timestamp": "2024-01-03", "open": 2, "high": 2, "low": 2, "close": 2, "volume": 2}
        ]);

        let series = normalize(&raw, None).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.first().unwrap().date, ymd(2024, 1, 2));
        assert_eq!(series.last().unwrap().date, ymd(2024, 1, 3));
    }

    #[test]
    fn test_row_numbers_alone_are_no_data() {
        let records = json!([
            {"index": 0, "open": 1, "high": 1, "low": 1, "close": 1, "volume": 1},
            {"index": 1, "open": 2, "high": 2, "low": 2, "close": 2, "volume": 2}
        ]);
        assert!(normalize(&records, None).is_err());

        // row-number keyed table
        let keyed = json!({
            "0": {"open": 1, "high": 1, "low": 1, "close": 1, "volume": 1},
            "1": {"open": 2, "high": 2, "low": 2, "close": 2, "volume": 2}
        });
        assert!(normalize(&keyed, None).is_err());
    }

    #[test]
    fn test_compact_date_keys() {
        let raw = json!({
            "20240103": {"open": 2, "high": 2, "low": 2, "close": 2, "volume": 2},
            "20240102": {"open": 1, "high": 1, "low": 1, "close": 1, "volume": 1}
        });

        let series = normalize(&raw, None).unwrap();
        assert_eq!(series.first().unwrap().date, ymd(2024, 1, 2));
        assert_eq!(series.closes(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_bar_limit_keeps_most_recent() {
        let rows: serde_json::Map<String, serde_json::Value> = (0..300_u64)
            .map(|i| {
                let date = ymd(2022, 1, 1) + chrono::Days::new(i);
                (
                    date.format("%Y-%m-%d").to_string(),
                    json!({"1. open": i, "2. high": i, "3. low": i, "4. close": i, "5. volume": i}),
                )
            })
            .collect();
        let raw = json!({ "Time Series (Daily)": rows });

        let series = normalize(&raw, Some(250)).unwrap();
        assert_eq!(series.len(), 250);
        assert_eq!(series.first().unwrap().close, 50.0);
        assert_eq!(series.last().unwrap().close, 299.0);

        assert_eq!(normalize(&raw, None).unwrap().len(), 300);
    }

    #[test]
    fn test_no_data_cases() {
        assert!(normalize(&json!(null), None).is_err());
        assert!(normalize(&json!([]), None).is_err());
        assert!(normalize(&json!({}), None).is_err());
        assert!(normalize(&json!({"Error Message": "Invalid API call"}), None).is_err());
        assert!(normalize(&json!({"Time Series (Daily)": {}}), None).is_err());

        // one bad row poisons the whole table
        let raw = json!([
            {"date": "2024-01-02", "open": 1, "high": 1, "low": 1, "close": 1, "volume": 1},
            {"date": "2024-01-03", "open": 1, "high": 1, "low": 1, "close": null, "volume": 1}
        ]);
        let err = normalize(&raw, None).unwrap_err();
        assert!(err.reason.contains("close"));
    }
}
