//! Chilito Finder
//!
//! Finds the nearest chain location whose menu carries a given item, using
//! only public web sources that can fail, rate-limit or change shape at any
//! time. Concretely: the nearest Taco Bell serving the Chili Cheese Burrito.
//!
//! # Pipeline
//!
//! 1. Geocode the query ([`GeocodeResolver`], cascading strategies)
//! 2. Discover nearby locations ([`PoiLocator`], primary API with fallback)
//! 3. Rank by distance ([`DistanceRanker`])
//! 4. For each of the nearest few: resolve the store identifier
//!    ([`IdentifierResolver`]) and check its menu ([`ContentVerifier`])
//! 5. Return the first verified location, or "not found"
//!
//! # Usage
//!
//! ```rust,ignore
//! use chilito_finder::{Finder, FinderConfig};
//!
//! let finder = Finder::with_http(FinderConfig::default())?;
//! let outcome = finder.search("123 Main St, Springfield, IL", 100_000).await;
//!
//! match outcome.location {
//!     Some(location) => println!("{} ({:.1} km)", location.address, location.distance_km),
//!     None => println!("{}", outcome.message.unwrap_or_default()),
//! }
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core seams (Fetcher, Strategy, IdentityRotator, DeviceLocator)
//! - [`types`] - Coordinates, POI records, outcomes, configuration
//! - [`fetchers`] - HTTP transport implementations
//! - [`geocode`], [`locate`], [`rank`], [`identify`], [`verify`] - Pipeline stages
//! - [`pipeline`] - The [`Finder`] orchestrator
//! - [`testing`] - Mock transport for tests

pub mod error;
pub mod fetchers;
pub mod geocode;
pub mod identify;
pub mod locate;
pub mod pipeline;
pub mod rank;
pub mod testing;
pub mod traits;
pub mod types;
pub mod verify;

// Re-export core types at crate root
pub use error::{
    CascadeError, ErrorKind, FetchError, FinderError, GeocodeError, LocateError, StrategyError,
};
pub use traits::{
    device::{DeviceLocator, FixedLocation},
    fetcher::{FetchRequest, FetchResponse, Fetcher},
    identity::{FixedIdentity, IdentityRotator, RandomUserAgents, RoundRobinIdentity},
    strategy::{cascade, Cascaded, Strategy, StrategyRef},
};
pub use types::{
    config::FinderConfig,
    geo::{haversine_km, parse_distance_km, Coordinates},
    location::PoiRecord,
    outcome::{
        CandidateAttempt, Heuristic, SearchOutcome, VerificationReport, VerificationResult,
    },
};

// Re-export pipeline stages
pub use fetchers::{FetcherExt, HttpFetcher, RateLimitedFetcher};
pub use geocode::GeocodeResolver;
pub use identify::{addresses_similar, IdentifierResolver};
pub use locate::{LocateQuery, PoiLocator};
pub use pipeline::{Finder, SearchStage};
pub use rank::DistanceRanker;
pub use verify::{ContentVerifier, MenuPredicate, OverrideTable, RetryPolicy};

// Re-export testing utilities
pub use testing::{MockFetcher, MockReply};
