//! Configuration types for the search pipeline.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{FinderError, Result};
use crate::verify::retry::RetryPolicy;

/// Configuration for a [`Finder`](crate::pipeline::Finder).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinderConfig {
    /// Chain name used for display names and open-data name matching.
    pub chain_name: String,

    /// Public website root (store locator, location search, menu pages).
    pub site_base: String,

    /// Chain API root (geocoding).
    pub api_base: String,

    /// Mapbox access token. The Mapbox geocoder is skipped without one.
    #[serde(default)]
    pub mapbox_token: Option<String>,

    /// User-Agent sent to Nominatim, which requires an identifying one.
    pub nominatim_user_agent: String,

    /// Maximum number of nearest candidates to verify.
    ///
    /// Caps worst-case latency and request volume. Default: 5.
    pub max_candidates: usize,

    /// Delay between candidates in milliseconds.
    pub candidate_delay_ms: u64,

    /// Menu page categories checked per location, in order.
    #[serde(default = "default_menu_categories")]
    pub menu_categories: Vec<String>,

    /// Retry, backoff and politeness settings for menu pages.
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
}

fn default_menu_categories() -> Vec<String> {
    vec![
        "menu".to_string(),
        "burritos".to_string(),
        "specialties".to_string(),
    ]
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            chain_name: "Taco Bell".to_string(),
            site_base: "https://www.tacobell.com".to_string(),
            api_base: "https://api.tacobell.com".to_string(),
            mapbox_token: None,
            nominatim_user_agent: "ChilitoFinder/1.0 (chilito-finder)".to_string(),
            max_candidates: 5,
            candidate_delay_ms: 1000,
            menu_categories: default_menu_categories(),
            retry: RetryPolicy::default(),
            request_timeout_ms: 20_000,
        }
    }
}

impl FinderConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Point every chain endpoint at one base URL (useful for mirrors and tests).
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        self.site_base = base.clone();
        self.api_base = base;
        self
    }

    /// Set the public website root.
    pub fn with_site_base(mut self, base: impl Into<String>) -> Self {
        self.site_base = base.into();
        self
    }

    /// Set the chain API root.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Set the Mapbox token.
    pub fn with_mapbox_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.mapbox_token = if token.trim().is_empty() {
            None
        } else {
            Some(token)
        };
        self
    }

    /// Set the maximum number of candidates verified.
    pub fn with_max_candidates(mut self, max: usize) -> Self {
        self.max_candidates = max;
        self
    }

    /// Set the delay between candidates.
    pub fn with_candidate_delay_ms(mut self, ms: u64) -> Self {
        self.candidate_delay_ms = ms;
        self
    }

    /// Replace the menu page categories.
    pub fn with_menu_categories(
        mut self,
        categories: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.menu_categories = categories.into_iter().map(|c| c.into()).collect();
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the per-request timeout.
    pub fn with_request_timeout_ms(mut self, ms: u64) -> Self {
        self.request_timeout_ms = ms;
        self
    }

    /// No waiting anywhere. For tests.
    pub fn immediate(self) -> Self {
        self.with_candidate_delay_ms(0)
            .with_retry(RetryPolicy::immediate())
    }

    pub fn candidate_delay(&self) -> Duration {
        Duration::from_millis(self.candidate_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Site base without a trailing slash.
    pub fn site_root(&self) -> &str {
        self.site_base.trim_end_matches('/')
    }

    /// API base without a trailing slash.
    pub fn api_root(&self) -> &str {
        self.api_base.trim_end_matches('/')
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_candidates == 0 {
            return Err(FinderError::Config("max_candidates must be > 0".into()));
        }
        if self.menu_categories.is_empty() {
            return Err(FinderError::Config(
                "at least one menu category is required".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(FinderError::Config("retry.max_attempts must be > 0".into()));
        }
        for base in [&self.site_base, &self.api_base] {
            url::Url::parse(base)
                .map_err(|e| FinderError::Config(format!("invalid base URL {}: {}", base, e)))?;
        }
        Ok(())
    }
}
