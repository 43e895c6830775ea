//! Coordinates + radius to candidate chain locations.
//!
//! Two discovery sources, tried in order and never merged:
//!
//! 1. [`ChainStoreLocator`] - the chain's store API
//! 2. [`OverpassLocator`] - OpenStreetMap, used only when the primary
//!    failed or returned nothing
//!
//! Whatever source wins, records are deduplicated by `source_key` and
//! anything beyond the radius is dropped.

pub mod chain_stores;
pub mod overpass;

pub use chain_stores::ChainStoreLocator;
pub use overpass::OverpassLocator;

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::error::LocateError;
use crate::traits::fetcher::Fetcher;
use crate::traits::strategy::{cascade, StrategyRef};
use crate::types::config::FinderConfig;
use crate::types::geo::Coordinates;
use crate::types::location::PoiRecord;

/// Input to every discovery strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocateQuery {
    pub origin: Coordinates,
    pub radius_meters: u32,
}

impl LocateQuery {
    pub fn new(origin: Coordinates, radius_meters: u32) -> Self {
        Self {
            origin,
            radius_meters,
        }
    }

    pub fn radius_km(&self) -> f64 {
        f64::from(self.radius_meters) / 1000.0
    }
}

/// Cascading POI discovery.
pub struct PoiLocator {
    strategies: Vec<StrategyRef<LocateQuery, Vec<PoiRecord>>>,
}

impl PoiLocator {
    pub fn new(strategies: Vec<StrategyRef<LocateQuery, Vec<PoiRecord>>>) -> Self {
        Self { strategies }
    }

    /// Chain store API first, Overpass second.
    pub fn from_config(fetcher: Arc<dyn Fetcher>, config: &FinderConfig) -> Self {
        Self::new(vec![
            Arc::new(ChainStoreLocator::new(
                fetcher.clone(),
                config.site_root(),
                config.chain_name.clone(),
            )),
            Arc::new(OverpassLocator::new(fetcher, config.chain_name.clone())),
        ])
    }

    /// Find locations within `radius_meters` of `origin`.
    ///
    /// Errors only when no strategy produced an answer. A source that
    /// answered with zero records counts as an answer.
    #[instrument(skip(self, origin), fields(origin = %origin))]
    pub async fn locate(
        &self,
        origin: Coordinates,
        radius_meters: u32,
    ) -> Result<Vec<PoiRecord>, LocateError> {
        let query = LocateQuery::new(origin, radius_meters);

        let (strategy, records) = match cascade(&self.strategies, &query).await {
            Ok(found) => (found.strategy, found.output),
            Err(e) if e.any_empty() => ("none".to_string(), Vec::new()),
            Err(e) => return Err(LocateError(e)),
        };

        let raw = records.len();
        let records = within_radius(dedup_by_key(records), query.radius_km());

        info!(
            strategy = %strategy,
            raw,
            kept = records.len(),
            radius_meters,
            "Locations discovered"
        );

        Ok(records)
    }
}

/// Keep the first record for each `source_key`.
fn dedup_by_key(records: Vec<PoiRecord>) -> Vec<PoiRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.source_key.clone()))
        .collect()
}

fn within_radius(records: Vec<PoiRecord>, radius_km: f64) -> Vec<PoiRecord> {
    records
        .into_iter()
        .filter(|r| r.distance_km <= radius_km)
        .collect()
}
