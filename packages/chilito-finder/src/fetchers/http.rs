//! reqwest-backed fetcher.
//!
//! One client per process: connection pooling with keep-alive, a cookie
//! store (menu pages set session cookies on first visit), bounded redirects
//! and timeouts. Nothing else is kept between searches.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};
use crate::traits::fetcher::{FetchRequest, FetchResponse, Fetcher};
use crate::traits::identity::DEFAULT_USER_AGENTS;

/// Default whole-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// HTTP fetcher using a shared `reqwest::Client`.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with default settings.
    pub fn new() -> FetchResult<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a fetcher with a custom whole-request timeout.
    pub fn with_timeout(timeout: Duration) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(DEFAULT_USER_AGENTS[0])
            .cookie_store(true)
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        Ok(Self { client })
    }

    /// Use a pre-configured client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn classify(url: &str, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else if e.is_builder() {
            FetchError::InvalidUrl {
                url: url.to_string(),
            }
        } else {
            FetchError::Http(Box::new(e))
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> FetchResult<FetchResponse> {
        debug!(url = %request.url, "HTTP fetch starting");

        let mut builder = self.client.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(url = %request.url, error = %e, "HTTP request failed");
            Self::classify(&request.url, e)
        })?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();

        let body = response
            .text()
            .await
            .map_err(|e| Self::classify(&request.url, e))?;

        debug!(
            url = %request.url,
            status,
            content_length = body.len(),
            "HTTP fetch complete"
        );

        Ok(FetchResponse::new(final_url, status, body))
    }

    fn name(&self) -> &str {
        "http"
    }
}
