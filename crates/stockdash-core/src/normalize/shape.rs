//! Input-shape adapters for upstream price tables

use super::NoData;
use super::fields::{PriceField, date_column_rank, parse_date, parse_date_str, parse_number, parse_volume};
use crate::series::Bar;
use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

type Cells = [Option<f64>; 5];

/// Layout of a raw price table, detected from its keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableShape {
    /// `[{"date": .., "open": .., ...}, ...]`
    Records,
    /// `{"close": {"<date>": .., ...}, ...}`: field names as rows, dates as columns
    FieldMajor,
    /// `{"<date>": {"1. open": .., ...}, ...}`
    DateMajor,
}

impl TableShape {
    /// Inspect a table and pick the adapter that reads it
    pub fn detect(table: &Value) -> Option<Self> {
        match table {
            Value::Array(rows) if !rows.is_empty() => Some(Self::Records),
            Value::Object(map) if !map.is_empty() => {
                if map.keys().any(|key| PriceField::resolve(key).is_some()) {
                    Some(Self::FieldMajor)
                } else if map.keys().all(|key| parse_date_str(key).is_some()) {
                    Some(Self::DateMajor)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Read every row of the table into bars, failing on the first bad cell
    pub fn extract(self, table: &Value) -> Result<Vec<Bar>, NoData> {
        match self {
            Self::Records => extract_records(table),
            Self::FieldMajor => extract_field_major(table),
            Self::DateMajor => extract_date_major(table),
        }
    }
}

/// Strip a provider envelope such as `{"Meta Data": .., "Time Series (Daily)": {..}}`
pub fn unwrap_envelope(raw: &Value) -> &Value {
    if let Value::Object(map) = raw {
        let series = map.iter().find(|(key, value)| {
            key.to_ascii_lowercase().starts_with("time series") && value.is_object()
        });
        if let Some((_, inner)) = series {
            return inner;
        }
    }
    raw
}

fn extract_records(table: &Value) -> Result<Vec<Bar>, NoData> {
    let Value::Array(rows) = table else {
        return Err(NoData::new("expected an array of rows"));
    };

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let row = row
                .as_object()
                .ok_or_else(|| NoData::new(format!("row {i} is not an object")))?;
            let date = row
                .iter()
                .filter_map(|(key, value)| date_column_rank(key).map(|rank| (rank, value)))
                .min_by_key(|(rank, _)| *rank)
                .and_then(|(_, value)| parse_date(value))
                .ok_or_else(|| NoData::new(format!("row {i} has no parseable date")))?;
            bar_from_cells(date, &cells_from_fields(row)?)
        })
        .collect()
}

fn extract_field_major(table: &Value) -> Result<Vec<Bar>, NoData> {
    let Value::Object(columns) = table else {
        return Err(NoData::new("expected an object keyed by field"));
    };

    let mut rows: BTreeMap<NaiveDate, Cells> = BTreeMap::new();
    let mut seen = [false; 5];
    for (column, cells) in columns {
        // extra columns (adjclose, dividends, ...) are not part of a bar
        let Some(field) = PriceField::resolve(column) else {
            continue;
        };
        seen[field.index()] = true;
        let cells = cells
            .as_object()
            .ok_or_else(|| NoData::new(format!("column {column} is not keyed by date")))?;
        for (date_key, cell) in cells {
            let date = parse_date_str(date_key)
                .ok_or_else(|| NoData::new(format!("unparseable date {date_key:?}")))?;
            let value = parse_cell(field, cell)
                .ok_or_else(|| NoData::new(format!("bad {} value on {date_key}", field.name())))?;
            rows.entry(date).or_default()[field.index()] = Some(value);
        }
    }

    if let Some(missing) = PriceField::ALL.iter().find(|f| !seen[f.index()]) {
        return Err(NoData::new(format!("missing column {}", missing.name())));
    }

    rows.into_iter()
        .map(|(date, cells)| bar_from_cells(date, &cells))
        .collect()
}

fn extract_date_major(table: &Value) -> Result<Vec<Bar>, NoData> {
    let Value::Object(rows) = table else {
        return Err(NoData::new("expected an object keyed by date"));
    };

    rows.iter()
        .map(|(date_key, row)| {
            let date = parse_date_str(date_key)
                .ok_or_else(|| NoData::new(format!("unparseable date {date_key:?}")))?;
            let row = row
                .as_object()
                .ok_or_else(|| NoData::new(format!("row {date_key} is not an object")))?;
            bar_from_cells(date, &cells_from_fields(row)?)
        })
        .collect()
}

fn cells_from_fields(row: &Map<String, Value>) -> Result<Cells, NoData> {
    let mut cells: Cells = [None; 5];
    for (column, cell) in row {
        if let Some(field) = PriceField::resolve(column) {
            let value = parse_cell(field, cell)
                .ok_or_else(|| NoData::new(format!("bad {} value {cell}", field.name())))?;
            cells[field.index()] = Some(value);
        }
    }
    Ok(cells)
}

fn parse_cell(field: PriceField, cell: &Value) -> Option<f64> {
    match field {
        PriceField::Volume => parse_volume(cell),
        _ => parse_number(cell),
    }
}

fn bar_from_cells(date: NaiveDate, cells: &Cells) -> Result<Bar, NoData> {
    let get = |field: PriceField| {
        cells[field.index()]
            .ok_or_else(|| NoData::new(format!("{date} is missing {}", field.name())))
    };

    Ok(Bar {
        date,
        open: get(PriceField::Open)?,
        high: get(PriceField::High)?,
        low: get(PriceField::Low)?,
        close: get(PriceField::Close)?,
        volume: get(PriceField::Volume)? as u64,
    })
}
