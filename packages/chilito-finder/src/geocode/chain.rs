//! The chain's own geocoding API.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{StrategyError, StrategyResult};
use crate::fetchers::build_url;
use crate::traits::fetcher::{FetchRequest, Fetcher};
use crate::traits::identity::DEFAULT_USER_AGENTS;
use crate::traits::strategy::Strategy;
use crate::types::geo::Coordinates;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChainGeocodeResponse {
    success: bool,
    geometry: Option<Geometry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Geometry {
    lat: Option<f64>,
    lng: Option<f64>,
}

/// `GET {api_base}/location/v1/{address}`.
pub struct ChainGeocoder {
    fetcher: Arc<dyn Fetcher>,
    api_base: String,
    site_base: String,
}

impl ChainGeocoder {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        api_base: impl Into<String>,
        site_base: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            api_base: api_base.into(),
            site_base: site_base.into(),
        }
    }
}

#[async_trait]
impl Strategy<str, Coordinates> for ChainGeocoder {
    fn name(&self) -> &str {
        "chain_api"
    }

    async fn attempt(&self, address: &str) -> StrategyResult<Coordinates> {
        let url = build_url(&self.api_base, &["location", "v1", address], &[])?;
        let request = FetchRequest::new(url)
            .header("User-Agent", DEFAULT_USER_AGENTS[0])
            .accept_json()
            .header("Referer", format!("{}/", self.site_base.trim_end_matches('/')));

        let response = self.fetcher.fetch(&request).await?.ensure_success()?;
        let body: ChainGeocodeResponse = response.json()?;

        if !body.success {
            return Err(StrategyError::NoResult("success = false".into()));
        }

        match body.geometry {
            Some(Geometry {
                lat: Some(lat),
                lng: Some(lng),
            }) => Coordinates::new(lat, lng).map_err(|e| StrategyError::Parse(e.to_string())),
            _ => Err(StrategyError::Parse("missing geometry".into())),
        }
    }
}
