//! Session state and the fetch transition
//!
//! The session is an explicit value: it is moved into [`Dashboard::fetch`] and
//! handed back in the returned [`FetchTransition`], so two fetches can never
//! overlap on the same state. A successful fetch swaps in a complete snapshot;
//! a failed one follows the configured [`FailurePolicy`].

use crate::cache::CachedSource;
use crate::config::{DashboardConfig, FailurePolicy};
use crate::dashboard::{DashboardSnapshot, MetricTiles, PeerPerformance, rank_peers};
use crate::error::{DashboardError, Result};
use crate::profile::CompanyProfile;
use crate::sentiment::recommendation_rating;
use crate::source::{JsonFileSource, SourceChain};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Subdirectory of the data directory read first
pub const PRIMARY_DIR: &str = "primary";

/// Subdirectory read when the primary source has nothing
pub const FALLBACK_DIR: &str = "fallback";

/// What the dashboard currently shows
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionState {
    #[default]
    Empty,
    Loaded(Box<DashboardSnapshot>),
}

impl SessionState {
    pub fn snapshot(&self) -> Option<&DashboardSnapshot> {
        match self {
            Self::Loaded(snapshot) => Some(snapshot),
            Self::Empty => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

/// Outcome of one fetch: the next state plus the error to surface, if any
#[derive(Debug)]
pub struct FetchTransition {
    pub state: SessionState,
    pub error: Option<DashboardError>,
}

/// Fetches symbols through a source chain and assembles snapshots
#[derive(Clone)]
pub struct Dashboard {
    config: Arc<DashboardConfig>,
    chain: SourceChain,
}

impl Dashboard {
    pub fn new(config: DashboardConfig, chain: SourceChain) -> Self {
        Self {
            config: Arc::new(config),
            chain,
        }
    }

    /// Dashboard reading `<data_dir>/primary` (cached) then `<data_dir>/fallback`
    pub fn with_data_dir(config: DashboardConfig) -> Result<Self> {
        config.validate()?;
        let dir = config.data_dir.clone().ok_or_else(|| {
            DashboardError::ConfigError(format!(
                "No data directory configured (set {} or pass --data-dir)",
                crate::config::DATA_DIR_ENV
            ))
        })?;

        let primary = JsonFileSource::new(PRIMARY_DIR, dir.join(PRIMARY_DIR));
        let fallback = JsonFileSource::new(FALLBACK_DIR, dir.join(FALLBACK_DIR))
            .with_bar_limit(config.fallback_bar_limit);
        let chain = SourceChain::new()
            .with_source(Arc::new(CachedSource::new(primary, config.cache_ttl)))
            .with_source(Arc::new(fallback));

        info!(data_dir = %dir.display(), "Using file-backed sources");
        Ok(Self::new(config, chain))
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Fetch `symbol` and compute the next session state.
    ///
    /// The symbol is trimmed and upper-cased first; a blank symbol leaves the
    /// state untouched.
    pub async fn fetch(&self, state: SessionState, symbol: &str) -> FetchTransition {
        let symbol = symbol.trim().to_ascii_uppercase();
        if symbol.is_empty() {
            return FetchTransition {
                state,
                error: Some(DashboardError::InvalidSymbol(symbol)),
            };
        }

        match self.load(&symbol).await {
            Ok(snapshot) => FetchTransition {
                state: SessionState::Loaded(Box::new(snapshot)),
                error: None,
            },
            Err(e) => {
                warn!(symbol = %symbol, policy = ?self.config.failure_policy, "Fetch failed: {e}");
                let state = match self.config.failure_policy {
                    FailurePolicy::PreserveLastGood => state,
                    FailurePolicy::Clear => SessionState::Empty,
                };
                FetchTransition {
                    state,
                    error: Some(e),
                }
            }
        }
    }

    async fn load(&self, symbol: &str) -> Result<DashboardSnapshot> {
        let data = self.chain.fetch(symbol).await?;
        let tiles = MetricTiles::compute(&data.series, &self.config)
            .ok_or_else(|| DashboardError::no_data(data.source, "empty price series"))?;
        let profile = CompanyProfile::from_raw(data.payload.profile.as_ref(), symbol);
        let rating = recommendation_rating(
            data.payload.recommendations.as_ref(),
            self.config.recommendation_window,
        );
        let peers = self.peer_performance(symbol, &data.payload.peers).await;

        Ok(DashboardSnapshot {
            symbol: symbol.to_string(),
            source: data.source,
            series: data.series,
            profile,
            tiles,
            rating,
            peers,
            fetched_at: Utc::now(),
        })
    }

    /// Fetch up to `max_peers` peers; peers that fail are left out
    async fn peer_performance(&self, symbol: &str, peers: &[String]) -> Vec<PeerPerformance> {
        let mut candidates: Vec<String> = Vec::new();
        for peer in peers {
            let peer = peer.trim().to_ascii_uppercase();
            if !peer.is_empty() && peer != symbol && !candidates.contains(&peer) {
                candidates.push(peer);
            }
        }
        candidates.truncate(self.config.max_peers);

        let mut performances = Vec::with_capacity(candidates.len());
        for peer in candidates {
            match self.chain.fetch(&peer).await {
                Ok(data) => match PeerPerformance::from_series(peer.as_str(), &data.series) {
                    Some(performance) => performances.push(performance),
                    None => debug!(peer = %peer, "Peer change undefined, skipping"),
                },
                Err(e) => warn!(peer = %peer, "Skipping peer: {e}"),
            }
        }

        rank_peers(&mut performances);
        performances
    }
}
