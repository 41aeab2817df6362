//! Stock dashboard core
//!
//! This crate holds everything behind the stockdash dashboard that is more
//! than plumbing:
//!
//! - Normalization of differently shaped provider price tables into one
//!   canonical, ascending daily series
//! - Technical indicators over that series (20/50-day moving averages,
//!   14-period RSI, 200-day low, percent-change tiles)
//! - Analyst sentiment aggregation into a buy/hold/sell rating
//! - An ordered provider chain (primary, then fallback) with a TTL cache
//! - An explicit session state with a keep-last-good fetch transition
//!
//! # Architecture
//!
//! Providers implement [`PriceSource`]. A [`SourceChain`] tries them in order
//! and commits to the first one whose payload normalizes into a non-empty
//! [`PriceSeries`]. [`Dashboard::fetch`] turns the committed payload into a
//! [`DashboardSnapshot`] (tiles, rating, profile, peers) and returns the next
//! [`SessionState`].
//!
//! # Example
//!
//! ```rust,ignore
//! use stockdash_core::{ChartRange, Dashboard, DashboardConfig, SessionState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = DashboardConfig::builder()
//!         .data_dir("./data")
//!         .build()?;
//!     let dashboard = Dashboard::with_data_dir(config)?;
//!
//!     let transition = dashboard.fetch(SessionState::Empty, "aapl").await;
//!     if let Some(snapshot) = transition.state.snapshot() {
//!         let chart = snapshot.chart(ChartRange::ThreeMonths, dashboard.config());
//!         println!("{} bars, rating {}", chart.series.len(), snapshot.rating.label());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod indicators;
pub mod normalize;
pub mod profile;
pub mod sentiment;
pub mod series;
pub mod session;
pub mod source;

// Re-export main types for convenience
pub use cache::CachedSource;
pub use config::{DashboardConfig, FailurePolicy};
pub use dashboard::{ChartRange, ChartView, DashboardSnapshot, MetricTiles, PeerPerformance};
pub use error::{DashboardError, Result};
pub use normalize::{NoData, normalize};
pub use profile::CompanyProfile;
pub use sentiment::{OverallRating, Rating, RatingSummary, RecommendationEvent};
pub use series::{Bar, PriceSeries};
pub use session::{Dashboard, FetchTransition, SessionState};
pub use source::{JsonFileSource, PriceSource, SourceChain, SourcePayload};
