//! Rate-limited fetcher wrapper.
//!
//! Wraps any Fetcher implementation with rate limiting using the governor crate.
//! Retries and fallbacks never multiply the request rate past the quota.

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::error::FetchResult;
use crate::traits::fetcher::{FetchRequest, FetchResponse, Fetcher};

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// A fetcher wrapper that enforces rate limits.
///
/// Uses the governor crate for precise rate limiting with burst support.
pub struct RateLimitedFetcher<F: Fetcher> {
    inner: F,
    limiter: Arc<DefaultRateLimiter>,
}

impl<F: Fetcher> RateLimitedFetcher<F> {
    /// Create a new rate-limited fetcher.
    ///
    /// # Arguments
    /// * `fetcher` - The underlying fetcher to wrap
    /// * `requests_per_second` - Maximum requests per second
    pub fn new(fetcher: F, requests_per_second: NonZeroU32) -> Self {
        Self::with_quota(fetcher, Quota::per_second(requests_per_second))
    }

    /// Create with a custom quota.
    pub fn with_quota(fetcher: F, quota: Quota) -> Self {
        Self {
            inner: fetcher,
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Create with burst support.
    ///
    /// # Arguments
    /// * `fetcher` - The underlying fetcher to wrap
    /// * `requests_per_second` - Sustained rate
    /// * `burst` - Maximum burst size
    pub fn with_burst(fetcher: F, requests_per_second: NonZeroU32, burst: NonZeroU32) -> Self {
        Self::with_quota(fetcher, Quota::per_second(requests_per_second).allow_burst(burst))
    }

    /// The wrapped fetcher.
    pub fn inner(&self) -> &F {
        &self.inner
    }
}

#[async_trait]
impl<F: Fetcher> Fetcher for RateLimitedFetcher<F> {
    async fn fetch(&self, request: &FetchRequest) -> FetchResult<FetchResponse> {
        self.limiter.until_ready().await;
        self.inner.fetch(request).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Extension trait for easy rate limiting.
pub trait FetcherExt: Fetcher + Sized {
    /// Wrap this fetcher with rate limiting.
    fn rate_limited(self, requests_per_second: NonZeroU32) -> RateLimitedFetcher<Self> {
        RateLimitedFetcher::new(self, requests_per_second)
    }
}

impl<F: Fetcher + Sized> FetcherExt for F {}
