//! Identifier extraction strategies.
//!
//! Each strategy works on a shared [`LookupContext`]. The ones that need
//! the location search page ask the context for it, so the page is fetched
//! at most once per record no matter how many strategies look at it.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::similarity::addresses_similar;
use crate::error::{StrategyError, StrategyResult};
use crate::traits::fetcher::{FetchRequest, Fetcher};
use crate::traits::identity::IdentityRotator;
use crate::traits::strategy::Strategy;
use crate::types::location::PoiRecord;

lazy_static! {
    static ref CARD_SELECTOR: Selector =
        Selector::parse(".location-card, .store-card, [data-store-id]").unwrap();
    static ref CARD_ADDRESS_SELECTOR: Selector =
        Selector::parse(".address, .location-address").unwrap();
    static ref SCRIPT_SELECTOR: Selector = Selector::parse("script").unwrap();
    static ref STORE_LINK_SELECTOR: Selector = Selector::parse(
        "a[href*='store='], a[href*='storeId='], a[href*='storeNumber=']"
    )
    .unwrap();
    static ref SCRIPT_ID: Regex =
        Regex::new(r#"(?:storeId|store_id|storeNumber)[\s:"'=]+(\d+)"#).unwrap();
    static ref LINK_ID: Regex = Regex::new(r"(?:store|storeId|storeNumber)=(\d+)").unwrap();
}

/// Exactly six ASCII digits, the chain's store number shape.
pub fn is_store_number(candidate: &str) -> bool {
    candidate.len() == 6 && candidate.bytes().all(|b| b.is_ascii_digit())
}

/// Per-record state shared by the strategies of one resolution.
pub struct LookupContext {
    record: PoiRecord,
    search_url: Option<String>,
    fetcher: Arc<dyn Fetcher>,
    identity: Arc<dyn IdentityRotator>,
    page: OnceCell<Option<String>>,
}

impl LookupContext {
    pub fn new(
        record: PoiRecord,
        search_url: Option<String>,
        fetcher: Arc<dyn Fetcher>,
        identity: Arc<dyn IdentityRotator>,
    ) -> Self {
        Self {
            record,
            search_url,
            fetcher,
            identity,
            page: OnceCell::new(),
        }
    }

    pub fn record(&self) -> &PoiRecord {
        &self.record
    }

    /// The location search page body, fetched on first use.
    pub async fn page(&self) -> Option<&str> {
        self.page
            .get_or_init(|| self.fetch_page())
            .await
            .as_deref()
    }

    async fn fetch_page(&self) -> Option<String> {
        let url = self.search_url.as_deref()?;
        let request = FetchRequest::new(url).browser_like(&self.identity.next_identity());

        match self.fetcher.fetch(&request).await {
            Ok(response) if response.is_success() => Some(response.body),
            Ok(response) => {
                warn!(url, status = response.status, "Location search page unavailable");
                None
            }
            Err(e) => {
                warn!(url, error = %e, "Location search fetch failed");
                None
            }
        }
    }

    async fn require_page(&self) -> StrategyResult<&str> {
        self.page()
            .await
            .ok_or_else(|| StrategyError::Unavailable("no location search page".into()))
    }
}

/// Identifier already known from discovery.
#[derive(Debug, Default, Clone, Copy)]
pub struct KnownIdentifier;

#[async_trait]
impl Strategy<LookupContext, String> for KnownIdentifier {
    fn name(&self) -> &str {
        "known"
    }

    async fn attempt(&self, ctx: &LookupContext) -> StrategyResult<String> {
        let record = ctx.record();

        if let Some(id) = &record.canonical_id {
            if id != &record.source_key {
                return Ok(id.clone());
            }
        }
        if is_store_number(&record.source_key) {
            return Ok(record.source_key.clone());
        }

        Err(StrategyError::NoResult("identifier not known yet".into()))
    }
}

/// `data-store-id` on a location card whose address matches the record.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocationCards;

fn find_card_id(page: &str, address: &str) -> Option<String> {
    let document = Html::parse_document(page);

    document.select(&CARD_SELECTOR).find_map(|card| {
        let id = card.value().attr("data-store-id")?.trim();
        if id.is_empty() {
            return None;
        }
        let card_address: String = card
            .select(&CARD_ADDRESS_SELECTOR)
            .flat_map(|el| el.text())
            .collect::<Vec<_>>()
            .join(" ");

        addresses_similar(&card_address, address).then(|| id.to_string())
    })
}

#[async_trait]
impl Strategy<LookupContext, String> for LocationCards {
    fn name(&self) -> &str {
        "location_cards"
    }

    async fn attempt(&self, ctx: &LookupContext) -> StrategyResult<String> {
        let page = ctx.require_page().await?;
        find_card_id(page, &ctx.record().address)
            .ok_or_else(|| StrategyError::NoResult("no matching location card".into()))
    }
}

/// Store id assigned in inline script.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptIdentifier;

fn find_script_id(page: &str) -> Option<String> {
    let document = Html::parse_document(page);

    document.select(&SCRIPT_SELECTOR).find_map(|script| {
        let text: String = script.text().collect();
        SCRIPT_ID
            .captures(&text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    })
}

#[async_trait]
impl Strategy<LookupContext, String> for ScriptIdentifier {
    fn name(&self) -> &str {
        "script"
    }

    async fn attempt(&self, ctx: &LookupContext) -> StrategyResult<String> {
        let page = ctx.require_page().await?;
        find_script_id(page).ok_or_else(|| StrategyError::NoResult("no store id in scripts".into()))
    }
}

/// Store id in a link query string.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinkIdentifier;

fn find_link_id(page: &str) -> Option<String> {
    let document = Html::parse_document(page);

    document.select(&STORE_LINK_SELECTOR).find_map(|link| {
        let href = link.value().attr("href")?;
        LINK_ID
            .captures(href)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    })
}

#[async_trait]
impl Strategy<LookupContext, String> for LinkIdentifier {
    fn name(&self) -> &str {
        "store_links"
    }

    async fn attempt(&self, ctx: &LookupContext) -> StrategyResult<String> {
        let page = ctx.require_page().await?;
        let id = find_link_id(page)
            .ok_or_else(|| StrategyError::NoResult("no store links".into()))?;
        debug!(id = %id, "Store id taken from link");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_number_shape() {
        assert!(is_store_number("018678"));
        assert!(!is_store_number("18678"));
        assert!(!is_store_number("osm-node-1"));
        assert!(!is_store_number("01867a"));
        assert!(!is_store_number("０１８６７８"));
    }

    #[test]
    fn test_card_requires_similar_address() {
        let page = r#"
            <div class="location-card" data-store-id="000999">
                <p class="address">456 Oak Ave, Chicago IL</p>
            </div>
            <div class="location-card" data-store-id="000111">
                <p class="address">123 Main Street</p>
                <p class="location-address">Springfield IL 62701</p>
            </div>
            <div class="store-card"><p class="address">123 Main St</p></div>
        "#;

        assert_eq!(
            find_card_id(page, "123 Main St, Springfield, IL 62701").as_deref(),
            Some("000111")
        );
        assert_eq!(find_card_id(page, "1 Elm Rd, Peoria"), None);
    }

    #[test]
    fn test_first_script_match_wins() {
        let page = r#"
            <script>var config = {"theme": "dark"};</script>
            <script>window.__STATE__ = {"storeId": "031234", "storeNumber": 2};</script>
            <script>var store_id = 999999;</script>
        "#;
        assert_eq!(find_script_id(page).as_deref(), Some("031234"));
        assert_eq!(find_script_id("<p>storeId: 1</p>"), None);
    }

    #[test]
    fn test_link_ids() {
        let page = r#"
            <a href="/about">About</a>
            <a href="/food/menu?category=burritos&store=004321">Menu</a>
            <a href="/order?storeNumber=001111">Order</a>
        "#;
        assert_eq!(find_link_id(page).as_deref(), Some("004321"));
        assert_eq!(find_link_id(r#"<a href="/x?store=abc">x</a>"#), None);
    }
}
