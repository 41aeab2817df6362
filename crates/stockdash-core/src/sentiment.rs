//! Analyst sentiment aggregation
//!
//! Free-text analyst grades are bucketed by case-insensitive substring match
//! into buy / hold / sell. Grades outside the three buckets are dropped from
//! the counts. The overall rating comes from a fixed decision table in which
//! buy-side thresholds are checked first, so a buy/hold tie reads as "Buy".

use crate::normalize::parse_date;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

const POSITIVE_GRADES: [&str; 3] = ["buy", "outperform", "overweight"];
const NEUTRAL_GRADES: [&str; 2] = ["hold", "neutral"];
const NEGATIVE_GRADES: [&str; 3] = ["sell", "underperform", "underweight"];

const GRADE_KEYS: [&str; 5] = ["tograde", "grade", "rating", "recommendation", "action"];
const TIMESTAMP_KEYS: [&str; 4] = ["epochgradedate", "gradedate", "date", "timestamp"];

/// One analyst action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationEvent {
    pub grade: String,
    pub timestamp: Option<NaiveDate>,
}

impl RecommendationEvent {
    pub fn new(grade: impl Into<String>) -> Self {
        Self {
            grade: grade.into(),
            timestamp: None,
        }
    }

    pub fn at(grade: impl Into<String>, timestamp: NaiveDate) -> Self {
        Self {
            grade: grade.into(),
            timestamp: Some(timestamp),
        }
    }
}

/// Bucket a grade falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeBucket {
    Positive,
    Neutral,
    Negative,
}

impl GradeBucket {
    /// Match a free-text grade; `None` when it fits no bucket
    pub fn classify(grade: &str) -> Option<Self> {
        let grade = grade.to_lowercase();
        let matches = |stems: &[&str]| stems.iter().any(|stem| grade.contains(stem));

        if matches(&POSITIVE_GRADES) {
            Some(Self::Positive)
        } else if matches(&NEUTRAL_GRADES) {
            Some(Self::Neutral)
        } else if matches(&NEGATIVE_GRADES) {
            Some(Self::Negative)
        } else {
            None
        }
    }
}

/// Categorical overall rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverallRating {
    StrongBuy,
    Buy,
    Hold,
    Sell,
}

impl OverallRating {
    /// Decision table, first matching rule wins
    pub fn classify(buy_pct: f64, hold_pct: f64, sell_pct: f64) -> Self {
        if buy_pct >= 60.0 {
            Self::StrongBuy
        } else if buy_pct >= 40.0 {
            Self::Buy
        } else if hold_pct >= 50.0 {
            Self::Hold
        } else if sell_pct >= 40.0 {
            Self::Sell
        } else {
            Self::Hold
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::StrongBuy => "Strong Buy",
            Self::Buy => "Buy",
            Self::Hold => "Hold",
            Self::Sell => "Sell",
        }
    }
}

impl fmt::Display for OverallRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Buy/hold/sell breakdown with its overall rating
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub buy: u32,
    pub hold: u32,
    pub sell: u32,
    pub total: u32,
    pub buy_pct: f64,
    pub hold_pct: f64,
    pub sell_pct: f64,
    pub overall: OverallRating,
}

impl RatingSummary {
    /// `None` when there is nothing to rate
    pub fn from_counts(buy: u32, hold: u32, sell: u32) -> Option<Self> {
        let total = buy.saturating_add(hold).saturating_add(sell);
        if total == 0 {
            return None;
        }

        // shares come from the unsaturated sum so they always add to 100
        let sum = f64::from(buy) + f64::from(hold) + f64::from(sell);
        let pct = |count: u32| f64::from(count) / sum * 100.0;
        let (buy_pct, hold_pct, sell_pct) = (pct(buy), pct(hold), pct(sell));
        Some(Self {
            buy,
            hold,
            sell,
            total,
            buy_pct,
            hold_pct,
            sell_pct,
            overall: OverallRating::classify(buy_pct, hold_pct, sell_pct),
        })
    }
}

/// Rating outcome: a summary, or nothing to rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Rating {
    Rated(RatingSummary),
    Unrated,
}

impl Rating {
    fn from_summary(summary: Option<RatingSummary>) -> Self {
        summary.map_or(Self::Unrated, Self::Rated)
    }

    pub fn summary(&self) -> Option<&RatingSummary> {
        match self {
            Self::Rated(summary) => Some(summary),
            Self::Unrated => None,
        }
    }

    /// Label shown on the rating tile
    pub fn label(&self) -> &'static str {
        match self {
            Self::Rated(summary) => summary.overall.label(),
            Self::Unrated => crate::profile::UNAVAILABLE,
        }
    }
}

/// Rate the most recent `window` events.
///
/// Events are taken in input order (most recent last) unless every event
/// carries a timestamp, in which case they are ordered by it first.
pub fn aggregate(events: &[RecommendationEvent], window: usize) -> Rating {
    let mut ordered: Vec<&RecommendationEvent> = events.iter().collect();
    if !ordered.is_empty() && ordered.iter().all(|event| event.timestamp.is_some()) {
        ordered.sort_by_key(|event| event.timestamp);
    }
    let recent = &ordered[ordered.len().saturating_sub(window)..];

    let (mut buy, mut hold, mut sell) = (0, 0, 0);
    for event in recent {
        match GradeBucket::classify(&event.grade) {
            Some(GradeBucket::Positive) => buy += 1,
            Some(GradeBucket::Neutral) => hold += 1,
            Some(GradeBucket::Negative) => sell += 1,
            None => {}
        }
    }

    Rating::from_summary(RatingSummary::from_counts(buy, hold, sell))
}

/// One row of a provider's recommendation-trend table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrendCounts {
    pub strong_buy: u32,
    pub buy: u32,
    pub hold: u32,
    pub sell: u32,
    pub strong_sell: u32,
}

/// Rate a trend row: strong buys count as buys, strong sells as sells
pub fn from_trend_counts(counts: &TrendCounts) -> Rating {
    Rating::from_summary(RatingSummary::from_counts(
        counts.strong_buy.saturating_add(counts.buy),
        counts.hold,
        counts.sell.saturating_add(counts.strong_sell),
    ))
}

/// Graded events from a raw recommendation table, in table order
pub fn parse_recommendations(raw: &Value) -> Vec<RecommendationEvent> {
    rows(raw)
        .filter_map(|row| {
            let grade = find_key(row, &GRADE_KEYS)?.as_str()?.trim();
            if grade.is_empty() {
                return None;
            }
            Some(RecommendationEvent {
                grade: grade.to_string(),
                timestamp: find_key(row, &TIMESTAMP_KEYS).and_then(parse_date),
            })
        })
        .collect()
}

/// The latest (last) trend row of a raw recommendation table
pub fn parse_trend(raw: &Value) -> Option<TrendCounts> {
    rows(raw)
        .filter(|row| row.keys().any(|key| key.eq_ignore_ascii_case("strongBuy")))
        .filter_map(|row| serde_json::from_value(Value::Object(row.clone())).ok())
        .last()
}

/// Rating for whatever recommendation data a provider returned.
///
/// Graded events win; a trend table is used when no graded events exist.
pub fn recommendation_rating(raw: Option<&Value>, window: usize) -> Rating {
    let Some(raw) = raw else {
        return Rating::Unrated;
    };

    let events = parse_recommendations(raw);
    if !events.is_empty() {
        return aggregate(&events, window);
    }
    parse_trend(raw).map_or(Rating::Unrated, |counts| from_trend_counts(&counts))
}

/// Row objects of a table given as an array, or nested one level under a key
fn rows(raw: &Value) -> Box<dyn Iterator<Item = &Map<String, Value>> + '_> {
    match raw {
        Value::Array(rows) => Box::new(rows.iter().filter_map(Value::as_object)),
        Value::Object(map) => Box::new(
            map.values()
                .filter_map(Value::as_array)
                .flatten()
                .filter_map(Value::as_object),
        ),
        _ => Box::new(std::iter::empty()),
    }
}

/// Column lookup ignoring case, spaces and underscores ("To Grade" == "toGrade")
fn find_key<'a>(row: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|wanted| {
        row.iter()
            .find(|(key, _)| {
                let key: String = key.chars().filter(|c| *c != ' ' && *c != '_').collect();
                key.eq_ignore_ascii_case(wanted)
            })
            .map(|(_, value)| value)
    })
}
