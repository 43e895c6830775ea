//! Fetcher implementations.
//!
//! - `HttpFetcher` - reqwest client with pooling, cookies and timeouts
//! - `RateLimitedFetcher` - Wrapper that adds a governor quota
//! - `MockFetcher` (in [`crate::testing`]) - canned responses for tests

pub mod http;
pub mod rate_limited;

pub use http::HttpFetcher;
pub use rate_limited::{FetcherExt, RateLimitedFetcher};

use url::Url;

use crate::error::{FetchError, FetchResult};

/// Build an endpoint URL from a base, percent-encoded path segments and
/// query pairs.
pub fn build_url(base: &str, segments: &[&str], query: &[(&str, &str)]) -> FetchResult<String> {
    let invalid = || FetchError::InvalidUrl {
        url: base.to_string(),
    };

    let mut url = Url::parse(base).map_err(|_| invalid())?;
    if !segments.is_empty() {
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(segments);
    }
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }

    Ok(url.into())
}
