//! Price sources and the ordered fallback chain
//!
//! A source stands in for one upstream data provider. The dashboard only
//! relies on the shape of what a provider returns ([`SourcePayload`]); how the
//! payload is fetched is up to the implementation.

use crate::error::{DashboardError, Result};
use crate::normalize::normalize;
use crate::series::PriceSeries;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything one provider returned for one symbol
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcePayload {
    /// Raw price table in any supported shape
    pub prices: Value,
    /// Free-form company profile mapping
    pub profile: Option<Value>,
    /// Raw analyst recommendation table
    pub recommendations: Option<Value>,
    /// Peer symbols for the sector comparison
    pub peers: Vec<String>,
}

impl SourcePayload {
    pub fn with_prices(prices: Value) -> Self {
        Self {
            prices,
            ..Self::default()
        }
    }
}

/// An upstream provider of daily price data
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Provider name used in logs and error messages
    fn name(&self) -> &'static str;

    /// Most recent bars to keep; `None` when the provider already bounds
    /// the requested range
    fn bar_limit(&self) -> Option<usize>;

    /// Fetch the raw payload for an upper-cased symbol.
    ///
    /// Return [`DashboardError::NoData`] when the provider has nothing usable
    /// so the chain can move on.
    async fn fetch(&self, symbol: &str) -> Result<SourcePayload>;
}

/// A payload committed from exactly one source
#[derive(Debug, Clone)]
pub struct SourcedData {
    pub source: &'static str,
    pub series: PriceSeries,
    pub payload: SourcePayload,
}

/// Ordered list of sources tried until one yields a series
#[derive(Clone, Default)]
pub struct SourceChain {
    sources: Vec<Arc<dyn PriceSource>>,
}

impl SourceChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source; sources are tried in insertion order
    pub fn with_source(mut self, source: Arc<dyn PriceSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Try each source in order and commit to the first usable series.
    ///
    /// `NoData` from a fetch or from normalization moves on to the next
    /// source; any other error stops the chain.
    pub async fn fetch(&self, symbol: &str) -> Result<SourcedData> {
        let mut attempted = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            attempted.push(source.name().to_string());
            debug!(source = source.name(), symbol, "Fetching price data");

            let attempt = match source.fetch(symbol).await {
                Ok(payload) => normalize(&payload.prices, source.bar_limit())
                    .map(|series| (series, payload))
                    .map_err(|e| DashboardError::no_data(source.name(), e.reason)),
                Err(e) => Err(e),
            };

            match attempt {
                Ok((series, payload)) => {
                    info!(
                        source = source.name(),
                        symbol,
                        bars = series.len(),
                        "Committed price series"
                    );
                    return Ok(SourcedData {
                        source: source.name(),
                        series,
                        payload,
                    });
                }
                Err(e) if e.is_no_data() => {
                    warn!(source = source.name(), symbol, "{e}, trying next source");
                }
                Err(e) => return Err(e),
            }
        }

        Err(DashboardError::SourcesExhausted {
            symbol: symbol.to_string(),
            attempted,
        })
    }
}

/// Source backed by `<dir>/<SYMBOL>.json` files holding a [`SourcePayload`]
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    name: &'static str,
    dir: PathBuf,
    bar_limit: Option<usize>,
}

impl JsonFileSource {
    pub fn new(name: &'static str, dir: impl Into<PathBuf>) -> Self {
        Self {
            name,
            dir: dir.into(),
            bar_limit: None,
        }
    }

    /// Treat the files as unbounded history and keep only the last `limit` bars
    pub fn with_bar_limit(mut self, limit: usize) -> Self {
        self.bar_limit = Some(limit);
        self
    }

    fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.json"))
    }
}

#[async_trait]
impl PriceSource for JsonFileSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn bar_limit(&self) -> Option<usize> {
        self.bar_limit
    }

    async fn fetch(&self, symbol: &str) -> Result<SourcePayload> {
        let path = self.path_for(symbol);
        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| DashboardError::no_data(self.name, format!("{}: {e}", path.display())))?;

        serde_json::from_str(&contents)
            .map_err(|e| DashboardError::no_data(self.name, format!("{}: {e}", path.display())))
    }
}
