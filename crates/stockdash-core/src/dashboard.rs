//! Presentation-facing assembly: metric tiles, chart views and peers

use crate::config::DashboardConfig;
use crate::error::DashboardError;
use crate::indicators::{self, IndicatorPoint, RsiZone};
use crate::profile::{CompanyProfile, UNAVAILABLE};
use crate::sentiment::Rating;
use crate::series::PriceSeries;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lookback presets offered by the price chart
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChartRange {
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[default]
    #[serde(rename = "1y")]
    OneYear,
}

impl ChartRange {
    pub const ALL: [ChartRange; 3] = [Self::ThreeMonths, Self::SixMonths, Self::OneYear];

    /// Window length in calendar days
    pub fn days(self) -> u32 {
        match self {
            Self::ThreeMonths => 90,
            Self::SixMonths => 180,
            Self::OneYear => 365,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ThreeMonths => "3mo",
            Self::SixMonths => "6mo",
            Self::OneYear => "1y",
        }
    }
}

impl fmt::Display for ChartRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartRange {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "3mo" => Ok(Self::ThreeMonths),
            "6mo" => Ok(Self::SixMonths),
            "1y" => Ok(Self::OneYear),
            other => Err(DashboardError::ConfigError(format!(
                "Unknown chart range '{other}' (expected 3mo, 6mo or 1y)"
            ))),
        }
    }
}

/// Headline numbers shown above the chart
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricTiles {
    pub current_price: f64,
    pub low_200: Option<f64>,
    pub ma_long: Option<f64>,
    pub ma_short: Option<f64>,
    pub rsi: Option<f64>,
    /// Current price against the 200-day low, in percent
    pub vs_low_pct: Option<f64>,
    pub vs_ma_long_pct: Option<f64>,
    pub vs_ma_short_pct: Option<f64>,
}

impl MetricTiles {
    /// Tiles for the full committed series; `None` for an empty series
    pub fn compute(series: &PriceSeries, config: &DashboardConfig) -> Option<Self> {
        let current_price = series.last()?.close;
        let low_200 = indicators::rolling_low(series, config.low_window);
        let ma_long = indicators::sma(series, config.long_ma_window);
        let ma_short = indicators::sma(series, config.short_ma_window);
        let vs = |reference: Option<f64>| {
            reference.and_then(|value| indicators::pct_change(current_price, value))
        };

        Some(Self {
            current_price,
            low_200,
            ma_long,
            ma_short,
            rsi: indicators::rsi(series, config.rsi_period),
            vs_low_pct: vs(low_200),
            vs_ma_long_pct: vs(ma_long),
            vs_ma_short_pct: vs(ma_short),
        })
    }

    pub fn rsi_zone(&self) -> Option<RsiZone> {
        self.rsi.map(RsiZone::classify)
    }
}

/// One chart range with overlays recomputed on the filtered bars
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartView {
    pub range: ChartRange,
    pub series: PriceSeries,
    pub ma_short: Vec<IndicatorPoint>,
    pub ma_long: Vec<IndicatorPoint>,
    pub rsi: Vec<IndicatorPoint>,
    /// Horizontal reference line, taken from the full series
    pub low_200: Option<f64>,
}

impl ChartView {
    pub fn compute(
        series: &PriceSeries,
        range: ChartRange,
        low_200: Option<f64>,
        config: &DashboardConfig,
    ) -> Self {
        let filtered = series.trailing_days(range.days());

        Self {
            range,
            ma_short: indicators::sma_series(&filtered, config.short_ma_window),
            ma_long: indicators::sma_series(&filtered, config.long_ma_window),
            rsi: indicators::rsi_series(&filtered, config.rsi_period),
            series: filtered,
            low_200,
        }
    }
}

/// Price performance of one peer over its fetched history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerPerformance {
    pub symbol: String,
    pub change_pct: f64,
}

impl PeerPerformance {
    /// First close to last close; `None` when the change is undefined
    pub fn from_series(symbol: impl Into<String>, series: &PriceSeries) -> Option<Self> {
        let first = series.first()?.close;
        let last = series.last()?.close;
        Some(Self {
            symbol: symbol.into(),
            change_pct: indicators::pct_change(last, first)?,
        })
    }
}

/// Order peers best performer first
pub fn rank_peers(peers: &mut [PeerPerformance]) {
    peers.sort_by(|a, b| b.change_pct.total_cmp(&a.change_pct));
}

/// Everything the dashboard shows for one successfully fetched symbol
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub symbol: String,
    /// Name of the source whose series was committed
    pub source: &'static str,
    pub series: PriceSeries,
    pub profile: CompanyProfile,
    pub tiles: MetricTiles,
    pub rating: Rating,
    pub peers: Vec<PeerPerformance>,
    pub fetched_at: DateTime<Utc>,
}

impl DashboardSnapshot {
    pub fn display_name(&self) -> &str {
        self.profile.display_name(&self.symbol)
    }

    /// Chart data for a range of the committed series
    pub fn chart(&self, range: ChartRange, config: &DashboardConfig) -> ChartView {
        ChartView::compute(&self.series, range, self.tiles.low_200, config)
    }
}

/// Two-decimal rendering of an optional number, `N/A` when absent
pub fn display_or_na(value: Option<f64>) -> String {
    value.map_or_else(|| UNAVAILABLE.to_string(), |v| format!("{v:.2}"))
}

/// Percent rendering of an optional change, `N/A` when absent
pub fn pct_or_na(change: Option<f64>) -> String {
    change.map_or_else(|| UNAVAILABLE.to_string(), indicators::format_pct)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::tests::series_from_closes;

    const EPS: f64 = 1e-9;

    fn ramp(len: usize) -> PriceSeries {
        series_from_closes(&(0..len).map(|i| 100.0 + i as f64).collect::<Vec<_>>())
    }

    #[test]
    fn test_chart_range_parse() {
        assert_eq!("3mo".parse::<ChartRange>().unwrap(), ChartRange::ThreeMonths);
        assert_eq!(" 6MO ".parse::<ChartRange>().unwrap(), ChartRange::SixMonths);
        assert_eq!("1y".parse::<ChartRange>().unwrap(), ChartRange::OneYear);
        assert!("5y".parse::<ChartRange>().is_err());
        assert_eq!(ChartRange::default(), ChartRange::OneYear);

        for range in ChartRange::ALL {
            assert_eq!(range.to_string().parse::<ChartRange>().unwrap(), range);
        }
        assert_eq!(serde_json::to_string(&ChartRange::ThreeMonths).unwrap(), "\"3mo\"");
    }

    #[test]
    fn test_tiles_full_history() {
        let series = ramp(300);
        let tiles = MetricTiles::compute(&series, &DashboardConfig::default()).unwrap();

        assert_eq!(tiles.current_price, 399.0);
        // lows are close - 1 over the last 200 bars
        assert_eq!(tiles.low_200, Some(199.0));
        assert!((tiles.ma_short.unwrap() - 389.5).abs() < EPS);
        assert!((tiles.ma_long.unwrap() - 374.5).abs() < EPS);
        assert_eq!(tiles.rsi, Some(100.0));
        assert_eq!(tiles.rsi_zone(), Some(RsiZone::Overbought));
        assert_eq!(pct_or_na(tiles.vs_low_pct), "100.50%");
    }

    #[test]
    fn test_tiles_short_history() {
        let series = ramp(10);
        let tiles = MetricTiles::compute(&series, &DashboardConfig::default()).unwrap();

        assert_eq!(tiles.low_200, Some(99.0));
        assert_eq!(tiles.ma_short, None);
        assert_eq!(tiles.ma_long, None);
        assert_eq!(tiles.rsi, None);
        assert_eq!(display_or_na(tiles.ma_short), UNAVAILABLE);
        assert_eq!(pct_or_na(tiles.vs_ma_long_pct), UNAVAILABLE);

        assert!(MetricTiles::compute(&PriceSeries::default(), &DashboardConfig::default()).is_none());
    }

    #[test]
    fn test_chart_view_recomputes_on_range() {
        let series = ramp(400);
        let config = DashboardConfig::default();
        let view = ChartView::compute(&series, ChartRange::ThreeMonths, Some(1.0), &config);

        assert_eq!(view.series.len(), 91);
        assert_eq!(view.ma_short.len(), 91 - 19);
        assert_eq!(view.ma_long.len(), 91 - 49);
        assert_eq!(view.rsi.len(), 91 - 14);
        assert_eq!(view.ma_long[0].date, view.series.bars()[49].date);
        assert_eq!(view.low_200, Some(1.0));

        let full = ChartView::compute(&series, ChartRange::OneYear, None, &config);
        assert_eq!(full.series.len(), 366);
    }

    #[test]
    fn test_peer_ranking() {
        let mut peers = vec![
            PeerPerformance::from_series("MSFT", &series_from_closes(&[100.0, 105.0])).unwrap(),
            PeerPerformance::from_series("GOOG", &series_from_closes(&[100.0, 120.0])).unwrap(),
            PeerPerformance::from_series("IBM", &series_from_closes(&[100.0, 90.0])).unwrap(),
        ];
        rank_peers(&mut peers);

        let order: Vec<_> = peers.iter().map(|p| p.symbol.as_str()).collect();
        assert_eq!(order, vec!["GOOG", "MSFT", "IBM"]);
        assert!((peers[2].change_pct + 10.0).abs() < EPS);

        assert!(PeerPerformance::from_series("ZERO", &series_from_closes(&[0.0, 1.0])).is_none());
        assert!(PeerPerformance::from_series("NONE", &PriceSeries::default()).is_none());
    }

    #[test]
    fn test_display_helpers() {
        assert_eq!(display_or_na(Some(12.346)), "12.35");
        assert_eq!(display_or_na(None), "N/A");
        assert_eq!(pct_or_na(Some(-2.5)), "-2.50%");
    }
}
