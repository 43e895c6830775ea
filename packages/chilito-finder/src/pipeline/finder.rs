//! The Finder - main entry point for the finder library.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::{ErrorKind, Result};
use crate::fetchers::HttpFetcher;
use crate::geocode::GeocodeResolver;
use crate::identify::IdentifierResolver;
use crate::locate::PoiLocator;
use crate::rank::DistanceRanker;
use crate::traits::device::DeviceLocator;
use crate::traits::fetcher::Fetcher;
use crate::traits::identity::{IdentityRotator, RandomUserAgents};
use crate::types::config::FinderConfig;
use crate::types::geo::Coordinates;
use crate::types::location::PoiRecord;
use crate::types::outcome::{CandidateAttempt, SearchOutcome};
use crate::verify::retry::pause;
use crate::verify::{ContentVerifier, MenuPredicate, OverrideTable};

/// Where a search is. Each transition consumes the current stage.
#[derive(Debug)]
pub enum SearchStage {
    Geocoding,
    Locating {
        origin: Coordinates,
    },
    Ranking {
        records: Vec<PoiRecord>,
    },
    Verifying {
        candidates: Vec<PoiRecord>,
        index: usize,
    },
    Done(SearchOutcome),
}

impl SearchStage {
    fn name(&self) -> &'static str {
        match self {
            SearchStage::Geocoding => "geocoding",
            SearchStage::Locating { .. } => "locating",
            SearchStage::Ranking { .. } => "ranking",
            SearchStage::Verifying { .. } => "verifying",
            SearchStage::Done(_) => "done",
        }
    }
}

/// Finds the nearest location whose menu carries the item.
///
/// # Example
///
/// ```rust,ignore
/// let finder = Finder::with_http(FinderConfig::default())?;
///
/// let outcome = finder.search("123 Main St, Springfield, IL", 100_000).await;
/// if let Some(location) = outcome.location {
///     println!("{} - {}", location.display_name, location.address);
/// }
/// ```
pub struct Finder {
    config: FinderConfig,
    geocoder: GeocodeResolver,
    locator: PoiLocator,
    ranker: DistanceRanker,
    identifiers: IdentifierResolver,
    verifier: ContentVerifier,
}

impl Finder {
    /// Standard components over a shared fetcher.
    pub fn new(fetcher: Arc<dyn Fetcher>, config: FinderConfig) -> Result<Self> {
        config.validate()?;

        let identity: Arc<dyn IdentityRotator> = Arc::new(RandomUserAgents::default());

        Ok(Self {
            geocoder: GeocodeResolver::from_config(fetcher.clone(), &config),
            locator: PoiLocator::from_config(fetcher.clone(), &config),
            ranker: DistanceRanker,
            identifiers: IdentifierResolver::new(
                fetcher.clone(),
                identity.clone(),
                config.site_root(),
            ),
            verifier: ContentVerifier::from_config(fetcher, &config).with_identity(identity),
            config,
        })
    }

    /// Standard components over a fresh reqwest client.
    pub fn with_http(config: FinderConfig) -> Result<Self> {
        let fetcher = HttpFetcher::with_timeout(config.request_timeout())?;
        Self::new(Arc::new(fetcher), config)
    }

    /// Assemble from explicit components.
    pub fn from_parts(
        config: FinderConfig,
        geocoder: GeocodeResolver,
        locator: PoiLocator,
        identifiers: IdentifierResolver,
        verifier: ContentVerifier,
    ) -> Self {
        Self {
            config,
            geocoder,
            locator,
            ranker: DistanceRanker,
            identifiers,
            verifier,
        }
    }

    /// Replace the override table.
    pub fn with_overrides(mut self, overrides: OverrideTable) -> Self {
        self.verifier = self.verifier.with_overrides(overrides);
        self
    }

    /// Replace the menu predicate.
    pub fn with_predicate(mut self, predicate: MenuPredicate) -> Self {
        self.verifier = self.verifier.with_predicate(predicate);
        self
    }

    /// Use one identity rotator for page lookups and menu fetches.
    pub fn with_identity(mut self, identity: Arc<dyn IdentityRotator>) -> Self {
        self.identifiers = self.identifiers.with_identity(identity.clone());
        self.verifier = self.verifier.with_identity(identity);
        self
    }

    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Search outward from a free-text address (or "lat,lng").
    ///
    /// Never fails: geocoding and discovery failures come back as an
    /// outcome with `error_kind` set, and "not found" is a normal outcome.
    #[instrument(skip(self))]
    pub async fn search(&self, address: &str, radius_meters: u32) -> SearchOutcome {
        let mut stage = SearchStage::Geocoding;
        let mut origin = None;
        let mut attempts = Vec::new();

        loop {
            debug!(stage = stage.name(), "Search stage");

            stage = match stage {
                SearchStage::Geocoding => match self.geocoder.resolve(address).await {
                    Ok(coordinates) => {
                        origin = Some(coordinates);
                        SearchStage::Locating {
                            origin: coordinates,
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Geocoding failed");
                        SearchStage::Done(SearchOutcome::failed(ErrorKind::Geocode, e.to_string()))
                    }
                },

                SearchStage::Locating { origin } => {
                    match self.locator.locate(origin, radius_meters).await {
                        Ok(records) if records.is_empty() => {
                            SearchStage::Done(SearchOutcome::not_found(format!(
                                "No {} locations within {:.1} km",
                                self.config.chain_name,
                                f64::from(radius_meters) / 1000.0
                            )))
                        }
                        Ok(records) => SearchStage::Ranking { records },
                        Err(e) => {
                            warn!(error = %e, "Location search failed");
                            SearchStage::Done(SearchOutcome::failed(ErrorKind::Locate, e.to_string()))
                        }
                    }
                }

                SearchStage::Ranking { records } => {
                    let mut candidates = self.ranker.rank(records);
                    let total = candidates.len();
                    candidates.truncate(self.config.max_candidates);
                    info!(total, checking = candidates.len(), "Candidates ranked");

                    SearchStage::Verifying {
                        candidates,
                        index: 0,
                    }
                }

                SearchStage::Verifying {
                    mut candidates,
                    index,
                } => {
                    if index >= candidates.len() {
                        SearchStage::Done(SearchOutcome::not_found(format!(
                            "None of the {} nearest {} locations appear to have the item",
                            candidates.len(),
                            self.config.chain_name
                        )))
                    } else {
                        if index > 0 {
                            pause(self.config.candidate_delay()).await;
                        }

                        let identifier = self.identifiers.resolve_id(&candidates[index]).await;
                        candidates[index].canonical_id = Some(identifier.clone());

                        let result = self.verifier.verify(&identifier).await;
                        let candidate = &candidates[index];
                        info!(
                            rank = index + 1,
                            name = %candidate.display_name,
                            identifier = %identifier,
                            distance_km = candidate.distance_km,
                            result = ?result,
                            "Candidate checked"
                        );

                        attempts.push(CandidateAttempt {
                            record: candidate.clone(),
                            identifier,
                            result,
                        });

                        if result.is_found() {
                            SearchStage::Done(SearchOutcome::found(candidates.swap_remove(index)))
                        } else {
                            SearchStage::Verifying {
                                candidates,
                                index: index + 1,
                            }
                        }
                    }
                }

                SearchStage::Done(outcome) => {
                    return outcome.with_origin(origin).with_attempts(attempts);
                }
            };
        }
    }

    /// [`search`](Self::search) that stops when `cancel` fires.
    pub async fn search_with_cancel(
        &self,
        address: &str,
        radius_meters: u32,
        cancel: CancellationToken,
    ) -> SearchOutcome {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("Search cancelled");
                SearchOutcome::failed(ErrorKind::Cancelled, "search cancelled")
            }
            outcome = self.search(address, radius_meters) => outcome,
        }
    }

    /// [`search`](Self::search) with a deadline.
    pub async fn search_with_timeout(
        &self,
        address: &str,
        radius_meters: u32,
        timeout: Duration,
    ) -> SearchOutcome {
        let cancel = CancellationToken::new();
        let deadline = cancel.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            deadline.cancel();
        });

        let mut outcome = self.search_with_cancel(address, radius_meters, cancel).await;
        timer.abort();

        if outcome.error_kind == Some(ErrorKind::Cancelled) {
            outcome.message = Some(format!("search timed out after {:?}", timeout));
        }
        outcome
    }

    /// Search from wherever the device is.
    pub async fn search_from_device(
        &self,
        device: &dyn DeviceLocator,
        radius_meters: u32,
    ) -> SearchOutcome {
        match device.current_coordinates().await {
            Ok(coordinates) => {
                self.search(&coordinates.to_query_text(), radius_meters)
                    .await
            }
            Err(e) => {
                warn!(error = %e, "Device location unavailable");
                SearchOutcome::failed(e.kind().unwrap_or(ErrorKind::Geocode), e.to_string())
            }
        }
    }
}
