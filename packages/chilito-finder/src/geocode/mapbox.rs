//! Mapbox forward geocoding.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{StrategyError, StrategyResult};
use crate::fetchers::build_url;
use crate::traits::fetcher::{FetchRequest, Fetcher};
use crate::traits::strategy::Strategy;
use crate::types::geo::Coordinates;

pub const MAPBOX_BASE: &str = "https://api.mapbox.com";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MapboxResponse {
    features: Vec<Feature>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Feature {
    /// `[lng, lat]`
    center: Vec<f64>,
}

/// Requires an access token. Without one the strategy is unavailable and
/// makes no request.
pub struct MapboxGeocoder {
    fetcher: Arc<dyn Fetcher>,
    token: Option<String>,
    base: String,
}

impl MapboxGeocoder {
    pub fn new(fetcher: Arc<dyn Fetcher>, token: Option<String>) -> Self {
        Self {
            fetcher,
            token,
            base: MAPBOX_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }
}

#[async_trait]
impl Strategy<str, Coordinates> for MapboxGeocoder {
    fn name(&self) -> &str {
        "mapbox"
    }

    async fn attempt(&self, address: &str) -> StrategyResult<Coordinates> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| StrategyError::Unavailable("no Mapbox access token".into()))?;

        let place = format!("{}.json", address);
        let url = build_url(
            &self.base,
            &["geocoding", "v5", "mapbox.places", &place],
            &[("access_token", token)],
        )?;

        let response = self
            .fetcher
            .fetch(&FetchRequest::new(url).accept_json())
            .await?
            .ensure_success()?;
        let body: MapboxResponse = response.json()?;

        let feature = body
            .features
            .first()
            .ok_or_else(|| StrategyError::NoResult("no features".into()))?;

        match feature.center.as_slice() {
            [lng, lat, ..] => {
                Coordinates::new(*lat, *lng).map_err(|e| StrategyError::Parse(e.to_string()))
            }
            _ => Err(StrategyError::Parse("feature has no center".into())),
        }
    }
}
