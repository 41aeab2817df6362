//! Error types for dashboard operations

use thiserror::Error;

/// Dashboard specific errors
#[derive(Debug, Error)]
pub enum DashboardError {
    /// A source returned nothing usable; the next source should be tried
    #[error("No usable data from {provider}: {reason}")]
    NoData {
        provider: String,
        reason: String,
    },

    /// Every configured source was tried and none produced a series
    #[error("Could not fetch data for {symbol} (tried: {})", .attempted.join(", "))]
    SourcesExhausted {
        symbol: String,
        attempted: Vec<String>,
    },

    /// Invalid stock symbol provided
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Filesystem error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl DashboardError {
    /// Shorthand for a [`DashboardError::NoData`]
    pub fn no_data(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NoData {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    /// Whether the source chain may recover by trying the next source
    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData { .. })
    }
}

/// Result type alias for dashboard operations
pub type Result<T> = std::result::Result<T, DashboardError>;

/// Convert anyhow::Error to DashboardError
impl From<anyhow::Error> for DashboardError {
    fn from(err: anyhow::Error) -> Self {
        DashboardError::Other(err.to_string())
    }
}
