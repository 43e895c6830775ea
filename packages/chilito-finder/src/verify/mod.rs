//! Menu verification for one store identifier.
//!
//! The override table is consulted first and needs no network. Otherwise
//! each menu category page is fetched in order with bounded retries, and
//! the first page that satisfies the [`MenuPredicate`] ends the check.
//!
//! Outcome rules:
//! - any hit is `Found`
//! - at least one page read, no hit is `NotFound`
//! - no page could be read at all is `Inconclusive`

pub mod detect;
pub mod overrides;
pub mod retry;

pub use detect::{Detection, MenuPredicate, DEFAULT_KEYWORDS};
pub use overrides::OverrideTable;
pub use retry::RetryPolicy;

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::fetchers::build_url;
use crate::traits::fetcher::{FetchRequest, Fetcher};
use crate::traits::identity::{IdentityRotator, RandomUserAgents};
use crate::types::config::FinderConfig;
use crate::types::outcome::{Heuristic, VerificationReport, VerificationResult};
use retry::pause;

/// Checks whether a store's menu carries the item.
pub struct ContentVerifier {
    fetcher: Arc<dyn Fetcher>,
    overrides: Arc<OverrideTable>,
    predicate: MenuPredicate,
    retry: RetryPolicy,
    identity: Arc<dyn IdentityRotator>,
    site_base: String,
    categories: Vec<String>,
}

impl ContentVerifier {
    /// Verifier with the builtin overrides and default settings.
    pub fn new(fetcher: Arc<dyn Fetcher>, site_base: impl Into<String>) -> Self {
        let defaults = FinderConfig::default();
        Self {
            fetcher,
            overrides: Arc::new(OverrideTable::builtin()),
            predicate: MenuPredicate::default(),
            retry: defaults.retry,
            identity: Arc::new(RandomUserAgents::default()),
            site_base: site_base.into(),
            categories: defaults.menu_categories,
        }
    }

    /// Site, categories and retry policy from a config.
    pub fn from_config(fetcher: Arc<dyn Fetcher>, config: &FinderConfig) -> Self {
        Self::new(fetcher, config.site_root())
            .with_categories(config.menu_categories.clone())
            .with_retry(config.retry.clone())
    }

    pub fn with_overrides(mut self, overrides: impl Into<Arc<OverrideTable>>) -> Self {
        self.overrides = overrides.into();
        self
    }

    pub fn with_predicate(mut self, predicate: MenuPredicate) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_identity(mut self, identity: Arc<dyn IdentityRotator>) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }

    /// `{site}/food/{category}?store={identifier}` for each category.
    pub fn menu_urls(&self, identifier: &str) -> Vec<String> {
        self.categories
            .iter()
            .filter_map(|category| {
                build_url(
                    &self.site_base,
                    &["food", category.as_str()],
                    &[("store", identifier)],
                )
                .map_err(|e| warn!(category = %category, error = %e, "Skipping menu URL"))
                .ok()
            })
            .collect()
    }

    /// Found / NotFound / Inconclusive for one identifier.
    pub async fn verify(&self, identifier: &str) -> VerificationResult {
        self.verify_detailed(identifier).await.result
    }

    /// Like [`verify`](Self::verify), with what matched and page counts.
    #[instrument(skip(self))]
    pub async fn verify_detailed(&self, identifier: &str) -> VerificationReport {
        if self.overrides.is_positive(identifier) {
            info!("Identifier is in the override table");
            return VerificationReport {
                heuristic: Some(Heuristic::Override),
                ..VerificationReport::empty(VerificationResult::Found)
            };
        }

        let mut report = VerificationReport::empty(VerificationResult::Inconclusive);

        for (index, url) in self.menu_urls(identifier).iter().enumerate() {
            if index > 0 {
                pause(self.retry.politeness_delay()).await;
            }

            let Some(page) = self.fetch_with_retry(url).await else {
                report.pages_failed += 1;
                continue;
            };
            report.pages_fetched += 1;

            if let Some(detection) = self.predicate.detect(&page) {
                info!(
                    url = %url,
                    heuristic = ?detection.heuristic,
                    matched = %detection.matched_text,
                    "Menu item found"
                );
                report.result = VerificationResult::Found;
                report.matched_url = Some(url.clone());
                report.heuristic = Some(detection.heuristic);
                report.matched_text = Some(detection.matched_text);
                return report;
            }

            debug!(url = %url, "Menu page has no match");
        }

        report.result = if report.pages_fetched > 0 {
            VerificationResult::NotFound
        } else {
            VerificationResult::Inconclusive
        };

        info!(
            result = ?report.result,
            fetched = report.pages_fetched,
            failed = report.pages_failed,
            "Menu check finished"
        );

        report
    }

    /// Up to `max_attempts` fetches with backoff. `None` once exhausted.
    async fn fetch_with_retry(&self, url: &str) -> Option<String> {
        let attempts = self.retry.max_attempts.max(1);

        for attempt in 0..attempts {
            let request = FetchRequest::new(url).browser_like(&self.identity.next_identity());

            match self.fetcher.fetch(&request).await {
                Ok(response) if response.is_success() => return Some(response.body),
                Ok(response) => {
                    warn!(url, attempt, status = response.status, "Menu page returned error status")
                }
                Err(e) => warn!(url, attempt, error = %e, "Menu page fetch failed"),
            }

            if attempt + 1 < attempts {
                pause(self.retry.backoff(attempt)).await;
            }
        }

        warn!(url, attempts, "Giving up on menu page");
        None
    }
}
