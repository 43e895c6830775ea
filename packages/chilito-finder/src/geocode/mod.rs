//! Free-text address to coordinates.
//!
//! The resolver runs an ordered list of geocoding strategies through
//! [`cascade`] and returns the first answer. Default order, most
//! authoritative first:
//!
//! 1. [`CoordinateLiteral`] - "lat,lng" text, no network
//! 2. [`ChainGeocoder`] - the chain's own location API
//! 3. [`MapboxGeocoder`] - skipped without an access token
//! 4. [`NominatimGeocoder`] - OpenStreetMap
//!
//! Answers are never cross-checked: a wrong first answer is returned as-is.

pub mod chain;
pub mod literal;
pub mod mapbox;
pub mod nominatim;

pub use chain::ChainGeocoder;
pub use literal::CoordinateLiteral;
pub use mapbox::MapboxGeocoder;
pub use nominatim::NominatimGeocoder;

use std::sync::Arc;
use tracing::{info, instrument};

use crate::error::GeocodeError;
use crate::traits::fetcher::Fetcher;
use crate::traits::strategy::{cascade, StrategyRef};
use crate::types::config::FinderConfig;
use crate::types::geo::Coordinates;

/// Cascading geocoder.
pub struct GeocodeResolver {
    strategies: Vec<StrategyRef<str, Coordinates>>,
}

impl GeocodeResolver {
    /// Use an explicit strategy order.
    pub fn new(strategies: Vec<StrategyRef<str, Coordinates>>) -> Self {
        Self { strategies }
    }

    /// The standard strategy order for a configuration.
    pub fn from_config(fetcher: Arc<dyn Fetcher>, config: &FinderConfig) -> Self {
        Self::new(vec![
            Arc::new(CoordinateLiteral),
            Arc::new(ChainGeocoder::new(
                fetcher.clone(),
                config.api_root(),
                config.site_root(),
            )),
            Arc::new(MapboxGeocoder::new(fetcher.clone(), config.mapbox_token.clone())),
            Arc::new(NominatimGeocoder::new(
                fetcher,
                config.nominatim_user_agent.clone(),
            )),
        ])
    }

    /// Strategy names in the order they are tried.
    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Resolve an address. Fails only if every strategy failed.
    #[instrument(skip(self))]
    pub async fn resolve(&self, address: &str) -> Result<Coordinates, GeocodeError> {
        let resolved = cascade(&self.strategies, address).await?;

        info!(
            strategy = %resolved.strategy,
            coordinates = %resolved.output,
            "Address geocoded"
        );

        Ok(resolved.output)
    }
}
