//! POI record to canonical chain identifier.
//!
//! Resolution never fails. Strategies run in order over one shared
//! [`LookupContext`]:
//!
//! 1. [`KnownIdentifier`] - already known from discovery, no network
//! 2. [`LocationCards`] - `data-store-id` on a card with a matching address
//! 3. [`ScriptIdentifier`] - store id assigned in inline script
//! 4. [`LinkIdentifier`] - store id in a link query string
//!
//! When all of them miss, the record's `source_key` is used.

pub mod heuristics;
pub mod similarity;

pub use heuristics::{
    is_store_number, KnownIdentifier, LinkIdentifier, LocationCards, LookupContext,
    ScriptIdentifier,
};
pub use similarity::{addresses_similar, normalize_address};

use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::fetchers::build_url;
use crate::traits::fetcher::Fetcher;
use crate::traits::identity::IdentityRotator;
use crate::traits::strategy::{cascade, StrategyRef};
use crate::types::location::PoiRecord;

/// Cascading identifier lookup.
pub struct IdentifierResolver {
    fetcher: Arc<dyn Fetcher>,
    identity: Arc<dyn IdentityRotator>,
    site_base: String,
    strategies: Vec<StrategyRef<LookupContext, String>>,
}

impl IdentifierResolver {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        identity: Arc<dyn IdentityRotator>,
        site_base: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            identity,
            site_base: site_base.into(),
            strategies: vec![
                Arc::new(KnownIdentifier),
                Arc::new(LocationCards),
                Arc::new(ScriptIdentifier),
                Arc::new(LinkIdentifier),
            ],
        }
    }

    pub fn with_identity(mut self, identity: Arc<dyn IdentityRotator>) -> Self {
        self.identity = identity;
        self
    }

    /// Replace the strategy order.
    pub fn with_strategies(mut self, strategies: Vec<StrategyRef<LookupContext, String>>) -> Self {
        self.strategies = strategies;
        self
    }

    /// `{site}/locations/search?q={address}`, or nothing when the record
    /// has no address to search for.
    fn search_url(&self, record: &PoiRecord) -> Option<String> {
        if !record.has_address() {
            return None;
        }
        build_url(
            &self.site_base,
            &["locations", "search"],
            &[("q", record.address.as_str())],
        )
        .ok()
    }

    /// Best available identifier for `record`. Always returns something.
    #[instrument(skip(self, record), fields(source_key = %record.source_key))]
    pub async fn resolve_id(&self, record: &PoiRecord) -> String {
        let ctx = LookupContext::new(
            record.clone(),
            self.search_url(record),
            self.fetcher.clone(),
            self.identity.clone(),
        );

        match cascade(&self.strategies, &ctx).await {
            Ok(found) => {
                debug!(strategy = %found.strategy, id = %found.output, "Identifier resolved");
                found.output
            }
            Err(_) => {
                warn!(
                    name = %record.display_name,
                    "Could not find store identifier, using source key"
                );
                record.source_key.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_identity, MockFetcher};
    use crate::types::geo::Coordinates;

    const SEARCH: &str = "https://chain.test/locations/search?q=";

    fn resolver(mock: &MockFetcher) -> IdentifierResolver {
        IdentifierResolver::new(
            Arc::new(mock.clone()),
            Arc::new(test_identity()),
            "https://chain.test",
        )
    }

    fn osm_record() -> PoiRecord {
        PoiRecord::new(
            "osm-node-42",
            "Taco Bell",
            Coordinates::new(39.1, -89.6).unwrap(),
            1.0,
        )
        .with_address("123 Main St, Springfield, IL 62701")
    }

    #[tokio::test]
    async fn test_known_identifier_skips_network() {
        let mock = MockFetcher::new();
        let resolver = resolver(&mock);

        let chain = PoiRecord::new("000111", "Taco Bell 000111", Coordinates::new(0.0, 0.0).unwrap(), 1.0)
            .with_canonical_id("000111");
        assert_eq!(resolver.resolve_id(&chain).await, "000111");

        let mapped = osm_record().with_canonical_id("031234");
        assert_eq!(resolver.resolve_id(&mapped).await, "031234");

        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_location_card_match() {
        let page = r#"<div class="location-card" data-store-id="031234">
            <span class="address">123 Main Street, Springfield IL 62701</span></div>"#;
        let mock = MockFetcher::new().with_prefix_page(SEARCH, page);

        assert_eq!(resolver(&mock).resolve_id(&osm_record()).await, "031234");

        let request = &mock.calls()[0];
        assert!(request.url.starts_with(SEARCH));
        assert_eq!(request.header_value("User-Agent"), Some("ChilitoTest/1.0"));
    }

    #[tokio::test]
    async fn test_later_heuristics_share_one_fetch() {
        let page = r#"<html><body>
            <div class="location-card" data-store-id="000999"><p class="address">9 Elm Rd, Peoria</p></div>
            <a href="/food/menu?store=000555">menu</a>
        </body></html>"#;
        let mock = MockFetcher::new().with_prefix_page(SEARCH, page);

        // Card address does not match, no script id, link wins
        assert_eq!(resolver(&mock).resolve_id(&osm_record()).await, "000555");
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_script_before_links() {
        let page = r#"<script>var storeNumber = 777001;</script>
            <a href="/food/menu?store=000555">menu</a>"#;
        let mock = MockFetcher::new().with_prefix_page(SEARCH, page);

        assert_eq!(resolver(&mock).resolve_id(&osm_record()).await, "777001");
    }

    #[tokio::test]
    async fn test_fallback_to_source_key() {
        let mock = MockFetcher::new().fail_prefix(SEARCH);
        assert_eq!(resolver(&mock).resolve_id(&osm_record()).await, "osm-node-42");
        assert_eq!(mock.call_count(), 1);

        let mock = MockFetcher::new().with_prefix_page(SEARCH, "<p>nothing here</p>");
        assert_eq!(resolver(&mock).resolve_id(&osm_record()).await, "osm-node-42");
    }

    #[tokio::test]
    async fn test_no_address_no_search() {
        let mock = MockFetcher::new();
        let record = PoiRecord::new("osm-way-7", "Taco Bell", Coordinates::new(0.0, 0.0).unwrap(), 1.0);

        assert_eq!(resolver(&mock).resolve_id(&record).await, "osm-way-7");
        assert_eq!(mock.call_count(), 0);
    }
}
