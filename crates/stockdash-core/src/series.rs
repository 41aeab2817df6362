//! Canonical daily price series

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// One trading day's OHLCV record
///
/// OHLC consistency (`low <= open, close <= high`) is trusted from the
/// provider and not validated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Daily bars sorted ascending by date with no duplicate dates
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceSeries {
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Build a series from bars in any order.
    ///
    /// Bars are sorted by date; when a date appears more than once the bar
    /// that came later in the input wins.
    pub fn from_bars(mut bars: Vec<Bar>) -> Self {
        // stable sort keeps input order among equal dates
        bars.sort_by_key(|bar| bar.date);
        let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => deduped.push(bar),
            }
        }
        Self { bars: deduped }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.last().map(|bar| bar.date)
    }

    /// Closing prices in date order
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.close).collect()
    }

    /// Low prices in date order
    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.low).collect()
    }

    /// The most recent `n` bars (all of them if the series is shorter)
    pub fn tail(&self, n: usize) -> PriceSeries {
        let start = self.bars.len().saturating_sub(n);
        Self {
            bars: self.bars[start..].to_vec(),
        }
    }

    /// Bars dated within `[last_date - days, last_date]`.
    ///
    /// The result is an independent series: indicators computed on it see
    /// only these bars.
    pub fn trailing_days(&self, days: u32) -> PriceSeries {
        let Some(last) = self.last_date() else {
            return Self::default();
        };
        let start = last
            .checked_sub_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MIN);
        let first_inside = self.bars.partition_point(|bar| bar.date < start);
        Self {
            bars: self.bars[first_inside..].to_vec(),
        }
    }
}
