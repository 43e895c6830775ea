//! OpenStreetMap Nominatim search.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{StrategyError, StrategyResult};
use crate::fetchers::build_url;
use crate::traits::fetcher::{FetchRequest, Fetcher};
use crate::traits::strategy::Strategy;
use crate::types::geo::Coordinates;

pub const NOMINATIM_BASE: &str = "https://nominatim.openstreetmap.org";

/// Nominatim returns coordinates as strings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

pub struct NominatimGeocoder {
    fetcher: Arc<dyn Fetcher>,
    user_agent: String,
    base: String,
}

impl NominatimGeocoder {
    /// Nominatim's usage policy requires an identifying User-Agent.
    pub fn new(fetcher: Arc<dyn Fetcher>, user_agent: impl Into<String>) -> Self {
        Self {
            fetcher,
            user_agent: user_agent.into(),
            base: NOMINATIM_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }
}

#[async_trait]
impl Strategy<str, Coordinates> for NominatimGeocoder {
    fn name(&self) -> &str {
        "nominatim"
    }

    async fn attempt(&self, address: &str) -> StrategyResult<Coordinates> {
        let url = build_url(
            &self.base,
            &["search"],
            &[
                ("q", address),
                ("format", "json"),
                ("limit", "1"),
                ("addressdetails", "1"),
            ],
        )?;
        let request = FetchRequest::new(url)
            .header("User-Agent", self.user_agent.as_str())
            .accept_json();

        let response = self.fetcher.fetch(&request).await?.ensure_success()?;
        let places: Vec<NominatimPlace> = response.json()?;

        let place = places
            .first()
            .ok_or_else(|| StrategyError::NoResult("no places".into()))?;

        let lat: f64 = place
            .lat
            .trim()
            .parse()
            .map_err(|_| StrategyError::Parse(format!("bad latitude {:?}", place.lat)))?;
        let lon: f64 = place
            .lon
            .trim()
            .parse()
            .map_err(|_| StrategyError::Parse(format!("bad longitude {:?}", place.lon)))?;

        Coordinates::new(lat, lon).map_err(|e| StrategyError::Parse(e.to_string()))
    }
}
