//! Technical indicators over a canonical price series
//!
//! Every function is a pure function of the series it is given. Rolling
//! outputs only carry points where a full window exists; callers that view a
//! filtered range must pass the filtered series rather than slice these
//! outputs afterwards.

use crate::series::PriceSeries;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ta::Next;
use ta::indicators::{Minimum, SimpleMovingAverage};

/// RSI level above which the chart marks the stock overbought
pub const RSI_OVERBOUGHT: f64 = 70.0;

/// RSI level below which the chart marks the stock oversold
pub const RSI_OVERSOLD: f64 = 30.0;

/// One value of a rolling indicator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Simple moving average of the last `window` closes.
///
/// `None` when the series holds fewer than `window` bars.
pub fn sma(series: &PriceSeries, window: usize) -> Option<f64> {
    sma_series(series, window).last().map(|point| point.value)
}

/// Rolling simple moving average of closes.
///
/// The first `window - 1` bars have no value and are left out of the output.
pub fn sma_series(series: &PriceSeries, window: usize) -> Vec<IndicatorPoint> {
    let Ok(mut sma) = SimpleMovingAverage::new(window) else {
        return Vec::new();
    };

    series
        .bars()
        .iter()
        .enumerate()
        .filter_map(|(i, bar)| {
            let value = sma.next(bar.close);
            (i + 1 >= window).then_some(IndicatorPoint {
                date: bar.date,
                value,
            })
        })
        .collect()
}

/// Lowest `low` over the last `min(window, len)` bars.
///
/// Short series fall back to however many bars exist.
pub fn rolling_low(series: &PriceSeries, window: usize) -> Option<f64> {
    let Ok(mut minimum) = Minimum::new(window) else {
        return None;
    };
    series.bars().iter().map(|bar| minimum.next(bar.low)).last()
}

/// 200-day low
pub fn low_200(series: &PriceSeries) -> Option<f64> {
    rolling_low(series, 200)
}

/// Relative Strength Index from rolling means of gains and losses.
///
/// The first point sits at bar index `period`, once `period` close-to-close
/// changes are available.
pub fn rsi_series(series: &PriceSeries, period: usize) -> Vec<IndicatorPoint> {
    let bars = series.bars();
    if period == 0 || bars.len() <= period {
        return Vec::new();
    }

    // gains[i] / losses[i] describe the move into bars[i + 1]
    let (gains, losses): (Vec<f64>, Vec<f64>) = bars
        .windows(2)
        .map(|pair| {
            let delta = pair[1].close - pair[0].close;
            (delta.max(0.0), (-delta).max(0.0))
        })
        .unzip();

    (period..=gains.len())
        .map(|end| IndicatorPoint {
            date: bars[end].date,
            value: rsi_value(mean(&gains[end - period..end]), mean(&losses[end - period..end])),
        })
        .collect()
}

/// Latest RSI value
pub fn rsi(series: &PriceSeries, period: usize) -> Option<f64> {
    rsi_series(series, period).last().map(|point| point.value)
}

/// RSI from average gain and loss.
///
/// A zero average loss makes RS undefined; the reading is pinned to 100.
pub fn rsi_value(mean_gain: f64, mean_loss: f64) -> f64 {
    if mean_loss == 0.0 {
        return 100.0;
    }
    let rs = mean_gain / mean_loss;
    100.0 - 100.0 / (1.0 + rs)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Percent change of `current` against `reference`.
///
/// `None` when the reference is zero or not finite.
pub fn pct_change(current: f64, reference: f64) -> Option<f64> {
    if reference == 0.0 || !reference.is_finite() || !current.is_finite() {
        return None;
    }
    Some((current - reference) / reference * 100.0)
}

/// Render a percent change the way the metric tiles show it, e.g. `10.00%`
pub fn format_pct(change: f64) -> String {
    format!("{change:.2}%")
}

/// Where an RSI reading sits relative to the chart's reference lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RsiZone {
    Overbought,
    Neutral,
    Oversold,
}

impl RsiZone {
    pub fn classify(rsi: f64) -> Self {
        if rsi > RSI_OVERBOUGHT {
            Self::Overbought
        } else if rsi < RSI_OVERSOLD {
            Self::Oversold
        } else {
            Self::Neutral
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Overbought => "Overbought",
            Self::Neutral => "Neutral",
            Self::Oversold => "Oversold",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::tests::{bar, day, series_from_closes};

    const EPS: f64 = 1e-9;

    fn wave(len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| 100.0 + 10.0 * (i as f64 / 7.0).sin() + (i % 5) as f64)
            .collect()
    }

    #[test]
    fn test_sma_undefined_below_window() {
        let series = series_from_closes(&[1.0, 2.0, 3.0]);
        assert_eq!(sma(&series, 4), None);
        assert!(sma_series(&series, 4).is_empty());
        assert_eq!(sma(&series, 0), None);
    }

    #[test]
    fn test_sma_is_mean_of_last_window() {
        let closes = wave(120);
        let series = series_from_closes(&closes);

        for window in [1, 20, 50, 120] {
            let expected = closes[closes.len() - window..].iter().sum::<f64>() / window as f64;
            let actual = sma(&series, window).unwrap();
            assert!((actual - expected).abs() < EPS, "window {window}");
        }
    }

    #[test]
    fn test_sma_series_starts_at_full_window() {
        let series = series_from_closes(&[2.0, 4.0, 6.0, 8.0]);
        let points = sma_series(&series, 3);

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, day(2));
        assert!((points[0].value - 4.0).abs() < EPS);
        assert!((points[1].value - 6.0).abs() < EPS);
    }

    #[test]
    fn test_rolling_low_short_series_uses_all_bars() {
        let closes = wave(50);
        let series = series_from_closes(&closes);
        let expected = series.lows().into_iter().fold(f64::INFINITY, f64::min);

        assert_eq!(low_200(&series), Some(expected));
    }

    #[test]
    fn test_rolling_low_ignores_bars_outside_window() {
        let mut closes = vec![100.0; 250];
        closes[10] = 5.0; // older than the last 200 bars
        closes[120] = 50.0;
        let series = series_from_closes(&closes);

        assert_eq!(low_200(&series), Some(49.0));
        assert_eq!(rolling_low(&series, 250), Some(4.0));
        assert_eq!(rolling_low(&PriceSeries::default(), 200), None);
    }

    #[test]
    fn test_rsi_known_values() {
        let series = series_from_closes(&[10.0, 12.0, 11.0]);
        // mean gain 1.0, mean loss 0.5, RS 2
        let value = rsi(&series, 2).unwrap();
        assert!((value - (100.0 - 100.0 / 3.0)).abs() < EPS);

        let series = series_from_closes(&[1.0, 2.0, 1.0, 2.0]);
        let points = rsi_series(&series, 2);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, day(2));
        assert!(points.iter().all(|p| (p.value - 50.0).abs() < EPS));
    }

    #[test]
    fn test_rsi_zero_loss_is_one_hundred() {
        let rising = series_from_closes(&(0..30).map(f64::from).collect::<Vec<_>>());
        assert!(rsi_series(&rising, 14).iter().all(|p| p.value == 100.0));

        // no movement at all: mean loss is still zero
        let flat = series_from_closes(&[50.0; 20]);
        assert_eq!(rsi(&flat, 14), Some(100.0));
    }

    #[test]
    fn test_rsi_all_losses_is_zero() {
        let falling = series_from_closes(&(0..30).map(|i| 100.0 - f64::from(i)).collect::<Vec<_>>());
        assert_eq!(rsi(&falling, 14), Some(0.0));
    }

    #[test]
    fn test_rsi_bounded() {
        let series = series_from_closes(&wave(300));
        let points = rsi_series(&series, 14);

        assert_eq!(points.len(), 300 - 14);
        assert!(points.iter().all(|p| p.value.is_finite()));
        assert!(points.iter().all(|p| (0.0..=100.0).contains(&p.value)));
    }

    #[test]
    fn test_rsi_needs_period_changes() {
        let series = series_from_closes(&[1.0; 14]);
        assert_eq!(rsi(&series, 14), None);
        assert_eq!(rsi(&series, 0), None);
    }

    #[test]
    fn test_rsi_recomputed_on_filtered_range() {
        // 400 calendar days of bars, viewed through a 90-day window
        let series = series_from_closes(&wave(400));
        let filtered = series.trailing_days(90);
        assert_eq!(filtered.len(), 91);

        let recomputed = rsi_series(&filtered, 14);
        let full = rsi_series(&series, 14);
        let first_in_view = filtered.first().unwrap().date;
        let sliced: Vec<_> = full.iter().filter(|p| p.date >= first_in_view).collect();

        // the filtered view warms up from its own first bar
        assert_eq!(recomputed.len(), filtered.len() - 14);
        assert_eq!(recomputed[0].date, filtered.bars()[14].date);
        assert_eq!(sliced.len(), filtered.len());
        assert_ne!(recomputed.len(), sliced.len());
        assert!(recomputed.iter().all(|p| p.date >= first_in_view));

        // where both are defined the windows hold the same bars
        let last = recomputed.last().unwrap();
        assert_eq!(last.date, sliced.last().unwrap().date);
        assert!((last.value - sliced.last().unwrap().value).abs() < EPS);
    }

    #[test]
    fn test_rsi_filtered_view_ignores_older_bars() {
        // a crash before the window must not leak into the filtered RSI
        let mut bars: Vec<_> = (0..200).map(|i| bar(i, 100.0 + i as f64)).collect();
        bars[100].close = 1.0;
        let series = PriceSeries::from_bars(bars);
        let filtered = series.trailing_days(60);

        assert!(rsi_series(&filtered, 14).iter().all(|p| p.value == 100.0));
        assert!(rsi_series(&series, 14).iter().any(|p| p.value < 100.0));
    }

    #[test]
    fn test_pct_change() {
        let change = pct_change(110.0, 100.0).unwrap();
        assert_eq!(format_pct(change), "10.00%");
        assert_eq!(format_pct(pct_change(90.0, 100.0).unwrap()), "-10.00%");
        assert_eq!(pct_change(110.0, 0.0), None);
        assert_eq!(pct_change(110.0, f64::NAN), None);
    }

    #[test]
    fn test_rsi_zone() {
        assert_eq!(RsiZone::classify(75.0), RsiZone::Overbought);
        assert_eq!(RsiZone::classify(25.0), RsiZone::Oversold);
        assert_eq!(RsiZone::classify(50.0), RsiZone::Neutral);
        assert_eq!(RsiZone::classify(70.0), RsiZone::Neutral);
        assert_eq!(RsiZone::Overbought.label(), "Overbought");
    }
}
