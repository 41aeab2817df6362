//! Time-bounded caching of source payloads to reduce upstream calls

use crate::error::Result;
use crate::source::{PriceSource, SourcePayload};
use async_trait::async_trait;
use cached::{Cached, TimedCache};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Wraps a [`PriceSource`] and reuses successful payloads for the TTL.
///
/// Failed fetches are never cached, so a provider that had nothing a minute
/// ago is asked again on the next refresh.
pub struct CachedSource<S> {
    inner: S,
    cache: Arc<RwLock<TimedCache<String, SourcePayload>>>,
}

impl<S: PriceSource> CachedSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    async fn get(&self, symbol: &str) -> Option<SourcePayload> {
        let mut cache = self.cache.write().await;
        cache.cache_get(symbol).cloned()
    }

    /// Drop the cached payload for one symbol
    pub async fn invalidate(&self, symbol: &str) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_remove(symbol);
    }

    /// Clear all cached entries
    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.cache_clear();
    }

    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.cache_size()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl<S: PriceSource> PriceSource for CachedSource<S> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn bar_limit(&self) -> Option<usize> {
        self.inner.bar_limit()
    }

    async fn fetch(&self, symbol: &str) -> Result<SourcePayload> {
        if let Some(payload) = self.get(symbol).await {
            debug!(source = self.name(), symbol, "Cache hit");
            return Ok(payload);
        }

        debug!(source = self.name(), symbol, "Cache miss");
        let payload = self.inner.fetch(symbol).await?;

        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(symbol.to_string(), payload.clone());
        Ok(payload)
    }
}
