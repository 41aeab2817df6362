//! Configuration for dashboard operations

use crate::dashboard::ChartRange;
use crate::error::{DashboardError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable naming the fixture/data directory
pub const DATA_DIR_ENV: &str = "STOCKDASH_DATA_DIR";

/// What happens to the displayed data when a re-fetch fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Keep the last successfully fetched snapshot on screen
    #[default]
    PreserveLastGood,
    /// Drop whatever was loaded before the failed fetch
    Clear,
}

/// Configuration for dashboard operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Number of most recent analyst events considered for the rating
    pub recommendation_window: usize,

    /// RSI lookback period
    pub rsi_period: usize,

    /// Short moving average window (20-day MA)
    pub short_ma_window: usize,

    /// Long moving average window (50-day MA)
    pub long_ma_window: usize,

    /// Rolling low window (200-day low)
    pub low_window: usize,

    /// Bars kept from sources that return unbounded history
    pub fallback_bar_limit: usize,

    /// Maximum number of peers fetched for the sector comparison
    pub max_peers: usize,

    /// Initial chart range
    pub default_range: ChartRange,

    /// Cache TTL for provider payloads
    pub cache_ttl: Duration,

    /// Session behavior on a failed fetch
    pub failure_policy: FailurePolicy,

    /// Directory holding file-backed provider payloads (optional)
    pub data_dir: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            recommendation_window: 10,
            rsi_period: 14,
            short_ma_window: 20,
            long_ma_window: 50,
            low_window: 200,
            fallback_bar_limit: 250,
            max_peers: 5,
            default_range: ChartRange::OneYear,
            cache_ttl: Duration::from_secs(3600), // 1 hour
            failure_policy: FailurePolicy::PreserveLastGood,
            data_dir: None,
        }
    }
}

impl DashboardConfig {
    /// Create a new configuration builder
    pub fn builder() -> DashboardConfigBuilder {
        DashboardConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let windows = [
            ("recommendation_window", self.recommendation_window),
            ("rsi_period", self.rsi_period),
            ("short_ma_window", self.short_ma_window),
            ("long_ma_window", self.long_ma_window),
            ("low_window", self.low_window),
            ("fallback_bar_limit", self.fallback_bar_limit),
        ];
        if let Some((name, _)) = windows.iter().find(|(_, value)| *value == 0) {
            return Err(DashboardError::ConfigError(format!(
                "{name} must be greater than 0"
            )));
        }

        if self.short_ma_window >= self.long_ma_window {
            return Err(DashboardError::ConfigError(format!(
                "short_ma_window ({}) must be smaller than long_ma_window ({})",
                self.short_ma_window, self.long_ma_window
            )));
        }

        Ok(())
    }
}

/// Builder for DashboardConfig
#[derive(Debug, Default)]
pub struct DashboardConfigBuilder {
    recommendation_window: Option<usize>,
    rsi_period: Option<usize>,
    short_ma_window: Option<usize>,
    long_ma_window: Option<usize>,
    low_window: Option<usize>,
    fallback_bar_limit: Option<usize>,
    max_peers: Option<usize>,
    default_range: Option<ChartRange>,
    cache_ttl: Option<Duration>,
    failure_policy: Option<FailurePolicy>,
    data_dir: Option<PathBuf>,
}

impl DashboardConfigBuilder {
    /// Set the analyst event window
    pub fn recommendation_window(mut self, window: usize) -> Self {
        self.recommendation_window = Some(window);
        self
    }

    /// Set the RSI period
    pub fn rsi_period(mut self, period: usize) -> Self {
        self.rsi_period = Some(period);
        self
    }

    /// Set the short and long moving average windows
    pub fn ma_windows(mut self, short: usize, long: usize) -> Self {
        self.short_ma_window = Some(short);
        self.long_ma_window = Some(long);
        self
    }

    /// Set the rolling low window
    pub fn low_window(mut self, window: usize) -> Self {
        self.low_window = Some(window);
        self
    }

    /// Set the bar limit applied to unbounded sources
    pub fn fallback_bar_limit(mut self, limit: usize) -> Self {
        self.fallback_bar_limit = Some(limit);
        self
    }

    /// Set the maximum number of peers
    pub fn max_peers(mut self, peers: usize) -> Self {
        self.max_peers = Some(peers);
        self
    }

    /// Set the initial chart range
    pub fn default_range(mut self, range: ChartRange) -> Self {
        self.default_range = Some(range);
        self
    }

    /// Set cache TTL
    pub fn cache_ttl(mut self, duration: Duration) -> Self {
        self.cache_ttl = Some(duration);
        self
    }

    /// Set the failed-fetch policy
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = Some(policy);
        self
    }

    /// Set the data directory
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Load the data directory from the environment unless already set
    pub fn with_env(self) -> Self {
        let dir = std::env::var(DATA_DIR_ENV).ok();
        self.env_data_dir(dir)
    }

    fn env_data_dir(mut self, dir: Option<String>) -> Self {
        if self.data_dir.is_none() {
            self.data_dir = dir.filter(|d| !d.is_empty()).map(PathBuf::from);
        }
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<DashboardConfig> {
        let defaults = DashboardConfig::default();

        let config = DashboardConfig {
            recommendation_window: self
                .recommendation_window
                .unwrap_or(defaults.recommendation_window),
            rsi_period: self.rsi_period.unwrap_or(defaults.rsi_period),
            short_ma_window: self.short_ma_window.unwrap_or(defaults.short_ma_window),
            long_ma_window: self.long_ma_window.unwrap_or(defaults.long_ma_window),
            low_window: self.low_window.unwrap_or(defaults.low_window),
            fallback_bar_limit: self
                .fallback_bar_limit
                .unwrap_or(defaults.fallback_bar_limit),
            max_peers: self.max_peers.unwrap_or(defaults.max_peers),
            default_range: self.default_range.unwrap_or(defaults.default_range),
            cache_ttl: self.cache_ttl.unwrap_or(defaults.cache_ttl),
            failure_policy: self.failure_policy.unwrap_or(defaults.failure_policy),
            data_dir: self.data_dir,
        };

        config.validate()?;
        Ok(config)
    }
}
