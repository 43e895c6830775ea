//! Typed errors for the finder library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.
//!
//! Only two failures are fatal to a search: exhausting every geocoding
//! strategy and exhausting every POI discovery strategy. Transport errors
//! are always recovered locally by a retry loop or the next strategy.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised by a [`Fetcher`](crate::traits::fetcher::Fetcher).
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed at the transport level
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Request did not complete in time
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// URL could not be built or parsed
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Local rate limiter refused the request
    #[error("rate limit exceeded")]
    RateLimited,
}

/// Why a single strategy attempt failed.
#[derive(Debug, Error)]
pub enum StrategyError {
    /// Transport failure
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Non-success HTTP status
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// Payload did not have the expected shape
    #[error("malformed response: {0}")]
    Parse(String),

    /// Source answered but explicitly had nothing for this input
    #[error("no result: {0}")]
    NoResult(String),

    /// Source answered successfully with zero records
    #[error("no records returned")]
    Empty,

    /// Strategy is not configured (e.g. missing access token)
    #[error("strategy unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for StrategyError {
    fn from(e: serde_json::Error) -> Self {
        StrategyError::Parse(e.to_string())
    }
}

/// A failed attempt recorded by the cascade combinator.
#[derive(Debug)]
pub struct StrategyFailure {
    pub strategy: String,
    pub error: StrategyError,
}

/// Every strategy in a cascade failed.
#[derive(Debug, Default)]
pub struct CascadeError {
    pub attempts: Vec<StrategyFailure>,
}

impl CascadeError {
    /// The last underlying failure, if any strategy ran at all.
    pub fn last(&self) -> Option<&StrategyFailure> {
        self.attempts.last()
    }

    /// True if at least one strategy answered with zero records rather
    /// than failing outright.
    pub fn any_empty(&self) -> bool {
        self.attempts
            .iter()
            .any(|a| matches!(a.error, StrategyError::Empty))
    }
}

impl fmt::Display for CascadeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.last() {
            None => write!(f, "no strategies configured"),
            Some(last) => write!(
                f,
                "all {} strategies failed - last error ({}): {}",
                self.attempts.len(),
                last.strategy,
                last.error
            ),
        }
    }
}

impl std::error::Error for CascadeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.last()
            .map(|a| &a.error as &(dyn std::error::Error + 'static))
    }
}

/// All geocoding strategies exhausted.
#[derive(Debug, Error)]
#[error("geocoding failed: {0}")]
pub struct GeocodeError(#[from] pub CascadeError);

/// All POI discovery strategies exhausted.
#[derive(Debug, Error)]
#[error("location search failed: {0}")]
pub struct LocateError(#[from] pub CascadeError);

/// Errors surfaced by library setup and the search pipeline.
#[derive(Debug, Error)]
pub enum FinderError {
    /// HTTP client could not be built or a fetch failed
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Geocoding exhausted
    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    /// POI discovery exhausted
    #[error(transparent)]
    Locate(#[from] LocateError),

    /// Override table could not be read
    #[error("failed to read override table {path}: {source}")]
    OverrideTable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Invalid configuration value
    #[error("config error: {0}")]
    Config(String),

    /// Device location collaborator failed
    #[error("device location unavailable: {0}")]
    DeviceLocation(String),

    /// Operation was cancelled
    #[error("operation cancelled")]
    Cancelled,
}

impl FinderError {
    /// The outcome-level classification of this error, if it is one the
    /// search reports to its caller.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            FinderError::Geocode(_) | FinderError::DeviceLocation(_) => Some(ErrorKind::Geocode),
            FinderError::Locate(_) => Some(ErrorKind::Locate),
            FinderError::Cancelled => Some(ErrorKind::Cancelled),
            _ => None,
        }
    }
}

/// Error classification carried by a `SearchOutcome`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Geocode,
    Locate,
    Cancelled,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Geocode => write!(f, "geocode"),
            ErrorKind::Locate => write!(f, "locate"),
            ErrorKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for a single strategy attempt.
pub type StrategyResult<T> = std::result::Result<T, StrategyError>;

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, FinderError>;
