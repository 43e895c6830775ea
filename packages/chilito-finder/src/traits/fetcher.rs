//! Fetcher trait: the single HTTP transport seam.
//!
//! Every network access in the pipeline goes through an `Arc<dyn Fetcher>`,
//! so one client (connection pool, cookie jar) is shared across components
//! and tests can swap in [`MockFetcher`](crate::testing::MockFetcher).
//!
//! A fetcher only fails on transport problems. Non-success statuses come
//! back as a normal [`FetchResponse`] and callers decide what they mean.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{FetchResult, StrategyError, StrategyResult};

/// Accept header for JSON APIs.
pub const ACCEPT_JSON: &str = "application/json";

/// Accept header a desktop browser sends for documents.
pub const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// An outgoing GET request.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            timeout: None,
        }
    }

    /// Add a header, replacing any earlier value with the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Headers for a JSON API call.
    pub fn accept_json(self) -> Self {
        self.header("Accept", ACCEPT_JSON)
    }

    /// Headers that make the request look like a browser page load.
    pub fn browser_like(self, user_agent: &str) -> Self {
        self.header("User-Agent", user_agent)
            .header("Accept", ACCEPT_HTML)
            .header("Accept-Language", "en-US,en;q=0.5")
            .header("Connection", "keep-alive")
            .header("Upgrade-Insecure-Requests", "1")
            .header("Cache-Control", "max-age=0")
    }

    /// Look up a header value (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A response with its body already read.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    /// Final URL after redirects
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status,
            body: body.into(),
        }
    }

    /// A 200 response.
    pub fn ok(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(url, 200, body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-success status into a strategy failure.
    pub fn ensure_success(self) -> StrategyResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(StrategyError::Status(self.status))
        }
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Transport abstraction for all outgoing HTTP.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform a request and read the whole body.
    async fn fetch(&self, request: &FetchRequest) -> FetchResult<FetchResponse>;

    /// Convenience GET without extra headers.
    async fn get(&self, url: &str) -> FetchResult<FetchResponse> {
        self.fetch(&FetchRequest::new(url)).await
    }

    /// Get the fetcher name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    async fn fetch(&self, request: &FetchRequest) -> FetchResult<FetchResponse> {
        (**self).fetch(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_headers_replace() {
        let request = FetchRequest::new("https://example.com")
            .header("Accept", "text/plain")
            .accept_json();

        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.header_value("accept"), Some(ACCEPT_JSON));
    }

    #[test]
    fn test_browser_like_headers() {
        let request = FetchRequest::new("https://example.com").browser_like("TestAgent/1.0");

        assert_eq!(request.header_value("User-Agent"), Some("TestAgent/1.0"));
        assert_eq!(request.header_value("Accept"), Some(ACCEPT_HTML));
        assert_eq!(request.header_value("Cache-Control"), Some("max-age=0"));
    }

    #[test]
    fn test_response_status() {
        assert!(FetchResponse::ok("u", "").is_success());
        assert!(FetchResponse::new("u", 204, "").is_success());

        let err = FetchResponse::new("u", 403, "denied").ensure_success();
        assert!(matches!(err, Err(StrategyError::Status(403))));
    }

    #[test]
    fn test_response_json() {
        #[derive(serde::Deserialize)]
        struct Body {
            success: bool,
        }

        let response = FetchResponse::ok("u", r#"{"success": true, "extra": 1}"#);
        let body: Body = response.json().unwrap();
        assert!(body.success);

        assert!(FetchResponse::ok("u", "<html>").json::<Body>().is_err());
    }
}
