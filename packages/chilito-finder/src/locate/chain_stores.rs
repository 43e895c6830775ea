//! The chain's store locator API.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use super::LocateQuery;
use crate::error::{StrategyError, StrategyResult};
use crate::fetchers::build_url;
use crate::traits::fetcher::{FetchRequest, Fetcher};
use crate::traits::identity::DEFAULT_USER_AGENTS;
use crate::traits::strategy::Strategy;
use crate::types::geo::{parse_distance_km, Coordinates};
use crate::types::location::PoiRecord;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct StoresResponse {
    near_by_stores: Vec<Store>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Store {
    store_number: Option<String>,
    phone_number: Option<String>,
    address: Option<StoreAddress>,
    geo_point: Option<GeoPoint>,
    formatted_distance: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct StoreAddress {
    line1: Option<String>,
    line2: Option<String>,
    town: Option<String>,
    postal_code: Option<String>,
    region: Option<Region>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Region {
    isocode: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeoPoint {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

fn text(value: &Option<String>) -> &str {
    value.as_deref().map(str::trim).unwrap_or("")
}

/// `line1[, line2], town, REGION POSTAL`
fn format_address(address: &StoreAddress) -> String {
    let mut street = text(&address.line1).to_string();
    let line2 = text(&address.line2);
    if !line2.is_empty() && !line2.eq_ignore_ascii_case("null") {
        if street.is_empty() {
            street = line2.to_string();
        } else {
            street = format!("{}, {}", street, line2);
        }
    }

    let region = address
        .region
        .as_ref()
        .map(|r| text(&r.isocode))
        .unwrap_or("");
    let region = region.strip_prefix("US-").unwrap_or(region);
    let region_postal = format!("{} {}", region, text(&address.postal_code))
        .trim()
        .to_string();

    [street.as_str(), text(&address.town), region_postal.as_str()]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
}

/// Primary discovery source: the chain's structured store API.
pub struct ChainStoreLocator {
    fetcher: Arc<dyn Fetcher>,
    site_base: String,
    chain_name: String,
}

impl ChainStoreLocator {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        site_base: impl Into<String>,
        chain_name: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            site_base: site_base.into(),
            chain_name: chain_name.into(),
        }
    }

    fn to_record(&self, store: &Store, origin: &Coordinates) -> Option<PoiRecord> {
        let store_number = text(&store.store_number);
        if store_number.is_empty() {
            return None;
        }

        let point = store.geo_point.as_ref()?;
        let coordinates = Coordinates::new(point.latitude?, point.longitude?).ok()?;

        let distance_km = parse_distance_km(text(&store.formatted_distance))
            .unwrap_or_else(|| origin.distance_km(&coordinates));

        let mut record = PoiRecord::new(
            store_number,
            format!("{} {}", self.chain_name, store_number),
            coordinates,
            distance_km,
        )
        .with_canonical_id(store_number)
        .with_phone(text(&store.phone_number));

        if let Some(address) = &store.address {
            record = record.with_address(format_address(address));
        }

        Some(record)
    }
}

#[async_trait]
impl Strategy<LocateQuery, Vec<PoiRecord>> for ChainStoreLocator {
    fn name(&self) -> &str {
        "chain_store_api"
    }

    async fn attempt(&self, query: &LocateQuery) -> StrategyResult<Vec<PoiRecord>> {
        let latitude = query.origin.latitude().to_string();
        let longitude = query.origin.longitude().to_string();
        let cache_buster = chrono::Utc::now().timestamp_millis().to_string();

        let url = build_url(
            &self.site_base,
            &["tacobellwebservices", "v4", "tacobell", "stores"],
            &[
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("_", cache_buster.as_str()),
            ],
        )?;
        let request = FetchRequest::new(url)
            .header("User-Agent", DEFAULT_USER_AGENTS[0])
            .accept_json()
            .header("Referer", format!("{}/", self.site_base.trim_end_matches('/')));

        let response = self.fetcher.fetch(&request).await?.ensure_success()?;
        let body: StoresResponse = response.json()?;

        let total = body.near_by_stores.len();
        let records: Vec<PoiRecord> = body
            .near_by_stores
            .iter()
            .filter_map(|store| self.to_record(store, &query.origin))
            .collect();

        debug!(total, usable = records.len(), "Parsed chain stores");

        if records.is_empty() {
            return Err(StrategyError::Empty);
        }
        Ok(records)
    }
}
