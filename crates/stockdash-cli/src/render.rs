//! Plain-text rendering of a dashboard snapshot

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Table};
use stockdash_core::dashboard::{display_or_na, pct_or_na};
use stockdash_core::indicators::{IndicatorPoint, RsiZone};
use stockdash_core::profile::UNAVAILABLE;
use stockdash_core::{Bar, ChartRange, ChartView, DashboardConfig, DashboardSnapshot, Rating};

/// Bars listed under the chart summary
const RECENT_ROWS: usize = 10;

fn table<T: Into<Cell>>(header: Vec<T>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header);
    table
}

/// Full dashboard for one snapshot and chart range
pub fn dashboard(snapshot: &DashboardSnapshot, range: ChartRange, config: &DashboardConfig) -> String {
    let chart = snapshot.chart(range, config);
    [
        header(snapshot),
        tiles(snapshot, config).to_string(),
        company(snapshot).to_string(),
        rating(&snapshot.rating).to_string(),
        chart_summary(&chart, config),
        peers(snapshot),
    ]
    .join("\n\n")
}

fn header(snapshot: &DashboardSnapshot) -> String {
    format!(
        "{} ({})  source: {}  fetched: {}",
        snapshot.display_name(),
        snapshot.symbol,
        snapshot.source,
        snapshot.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

fn tiles(snapshot: &DashboardSnapshot, config: &DashboardConfig) -> Table {
    let tiles = &snapshot.tiles;
    let mut table = table(vec!["Metric", "Value", "Current vs"]);
    table.add_row(vec![
        "Current Price".to_string(),
        format!("{:.2}", tiles.current_price),
        String::new(),
    ]);
    table.add_row(vec![
        format!("{}-Day Low", config.low_window),
        display_or_na(tiles.low_200),
        pct_or_na(tiles.vs_low_pct),
    ]);
    table.add_row(vec![
        format!("{}-Day MA", config.long_ma_window),
        display_or_na(tiles.ma_long),
        pct_or_na(tiles.vs_ma_long_pct),
    ]);
    table.add_row(vec![
        format!("{}-Day MA", config.short_ma_window),
        display_or_na(tiles.ma_short),
        pct_or_na(tiles.vs_ma_short_pct),
    ]);
    table.add_row(vec![
        format!("RSI ({})", config.rsi_period),
        display_or_na(tiles.rsi),
        tiles.rsi_zone().map_or(UNAVAILABLE, RsiZone::label).to_string(),
    ]);
    table
}

fn company(snapshot: &DashboardSnapshot) -> Table {
    let profile = &snapshot.profile;
    let mut table = table(vec!["Sector", "Industry", "Trailing EPS"]);
    table.add_row(vec![
        profile.sector_or_na().to_string(),
        profile.industry_or_na().to_string(),
        profile.trailing_eps_display(),
    ]);
    table
}

fn rating(rating: &Rating) -> Table {
    let mut table = table(vec!["Analyst Rating", "Buy", "Hold", "Sell", "Total"]);
    match rating.summary() {
        Some(summary) => table.add_row(vec![
            summary.overall.label().to_string(),
            format!("{} ({:.1}%)", summary.buy, summary.buy_pct),
            format!("{} ({:.1}%)", summary.hold, summary.hold_pct),
            format!("{} ({:.1}%)", summary.sell, summary.sell_pct),
            summary.total.to_string(),
        ]),
        None => table.add_row(vec![rating.label(); 5]),
    };
    table
}

fn chart_summary(chart: &ChartView, config: &DashboardConfig) -> String {
    let (Some(first), Some(last)) = (chart.series.first(), chart.series.last()) else {
        return format!("Chart ({}): no bars in range", chart.range);
    };

    let mut table = table(vec![
        "Date".to_string(),
        "Close".to_string(),
        format!("MA{}", config.short_ma_window),
        format!("MA{}", config.long_ma_window),
        format!("RSI ({})", config.rsi_period),
    ]);

    let bars = chart.series.bars();
    for bar in &bars[bars.len().saturating_sub(RECENT_ROWS)..] {
        let rsi = value_on(&chart.rsi, bar);
        table.add_row(vec![
            bar.date.to_string(),
            format!("{:.2}", bar.close),
            display_or_na(value_on(&chart.ma_short, bar)),
            display_or_na(value_on(&chart.ma_long, bar)),
            match rsi {
                Some(value) => format!("{value:.2} {}", RsiZone::classify(value).label()),
                None => UNAVAILABLE.to_string(),
            },
        ]);
    }

    format!(
        "Chart ({}): {} bars from {} to {}, {}-day low reference {}\n{table}",
        chart.range,
        chart.series.len(),
        first.date,
        last.date,
        config.low_window,
        display_or_na(chart.low_200),
    )
}

/// Overlay value on the bar's date, if the overlay is defined there
fn value_on(points: &[IndicatorPoint], bar: &Bar) -> Option<f64> {
    points.iter().find(|p| p.date == bar.date).map(|p| p.value)
}

fn peers(snapshot: &DashboardSnapshot) -> String {
    if snapshot.peers.is_empty() {
        return format!("Sector peers: {UNAVAILABLE}");
    }
    let mut table = table(vec!["Peer", "Change"]);
    for peer in &snapshot.peers {
        table.add_row(vec![peer.symbol.clone(), pct_or_na(Some(peer.change_pct))]);
    }
    format!("Sector peers\n{table}")
}
