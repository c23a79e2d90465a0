//! The search pipeline: geocode the user, filter the directory, pre-rank by
//! straight-line distance, fetch driving distances for the closest few, then
//! rank and page.

use super::error::SearchError;
use super::progress::{no_progress, ProgressFn, SearchStage};
use super::query::{RankedFacility, SearchResult, UserQuery};
use crate::sdk::directory::{FacilityDirectory, FacilityRecord};
use crate::sdk::filter::within_radius;
use crate::sdk::routing::distance::haversine_distance;
use crate::sdk::routing::geocode::GeoPoint;
use crate::sdk::routing::route::{get_driving_distance, DrivingDistance};
use crate::sdk::routing::service::{Geocoder, Router};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Hard ceiling on simultaneous routing requests.
pub const MAX_ROUTE_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    /// How many of the closest candidates get a driving-distance lookup.
    pub max_driving_calc: usize,
    pub page_size: usize,
    pub route_timeout: Duration,
    pub geocode_timeout: Duration,
    /// Routing requests allowed in flight at once. 1 means strictly sequential.
    pub route_concurrency: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_driving_calc: 15,
            page_size: 10,
            route_timeout: Duration::from_millis(5000),
            geocode_timeout: Duration::from_secs(10),
            route_concurrency: 1,
        }
    }
}

/// Returns `true` while the search that owns it is still the newest one.
pub type StillCurrent<'a> = &'a (dyn Fn() -> bool + Send + Sync);

fn always_current() -> bool {
    true
}

pub struct RankingPipeline<G, R> {
    geocoder: G,
    router: R,
    directory: Arc<FacilityDirectory>,
    settings: PipelineSettings,
}

impl<G: Geocoder, R: Router> RankingPipeline<G, R> {
    pub fn new(
        geocoder: G,
        router: R,
        directory: Arc<FacilityDirectory>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            geocoder,
            router,
            directory,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn geocoder(&self) -> &G {
        &self.geocoder
    }

    pub fn directory(&self) -> &FacilityDirectory {
        &self.directory
    }

    pub async fn search(&self, query: &UserQuery) -> Result<SearchResult, SearchError> {
        self.search_with_progress(query, &no_progress).await
    }

    pub async fn search_with_progress(
        &self,
        query: &UserQuery,
        on_progress: ProgressFn<'_>,
    ) -> Result<SearchResult, SearchError> {
        self.run(query, on_progress, &always_current).await
    }

    /// Runs one search to completion, reporting every stage. Once `still_current`
    /// turns false no further routing requests are issued.
    pub async fn run(
        &self,
        query: &UserQuery,
        on_progress: ProgressFn<'_>,
        still_current: StillCurrent<'_>,
    ) -> Result<SearchResult, SearchError> {
        on_progress(SearchStage::Idle);
        let outcome = self.execute(query, on_progress, still_current).await;
        match &outcome {
            Ok(result) => {
                log::info!(
                    "Search for \"{}\" returned {} of {} facilities",
                    query.address,
                    result.facilities.len(),
                    result.total_filtered
                );
                on_progress(SearchStage::Done);
            }
            Err(err) => {
                log::info!("Search for \"{}\" failed: {}", query.address, err);
                on_progress(SearchStage::Failed);
            }
        }
        outcome
    }

    async fn execute(
        &self,
        query: &UserQuery,
        on_progress: ProgressFn<'_>,
        still_current: StillCurrent<'_>,
    ) -> Result<SearchResult, SearchError> {
        query.validate()?;

        on_progress(SearchStage::Geocoding);
        let origin = self.locate(&query.address).await?;
        ensure_current(still_current)?;

        on_progress(SearchStage::Filtering);
        let filtered = query.filter.apply(self.directory.iter());
        log::debug!(
            "{} of {} facilities pass the filters",
            filtered.len(),
            self.directory.len()
        );
        if filtered.is_empty() {
            return Err(SearchError::NoMatches);
        }

        on_progress(SearchStage::PreRanking);
        let mut candidates = pre_rank(&origin, filtered, query.max_miles)?;
        if candidates.is_empty() {
            return Err(SearchError::NoMatches);
        }
        let total_filtered = candidates.len();

        let bound = self.settings.max_driving_calc.min(candidates.len());
        let remainder = candidates.split_off(bound);
        let enriched = self
            .enrich(&origin, candidates, on_progress, still_current)
            .await?;
        ensure_current(still_current)?;

        on_progress(SearchStage::FinalRanking);
        let ranked = final_rank(enriched, remainder);

        let page_size = self.settings.page_size;
        let start = (query.page - 1).saturating_mul(page_size);
        let facilities: Vec<RankedFacility> =
            ranked.into_iter().skip(start).take(page_size).collect();

        Ok(SearchResult {
            facilities,
            total_filtered,
            user_location: origin,
            page: query.page,
            page_size,
        })
    }

    async fn locate(&self, address: &str) -> Result<GeoPoint, SearchError> {
        let not_found = || SearchError::AddressNotFound(address.to_string());
        match tokio::time::timeout(self.settings.geocode_timeout, self.geocoder.geocode(address))
            .await
        {
            Ok(Some(point)) if point.is_finite() => {
                log::debug!(
                    "Located \"{}\" at ({}, {})",
                    address,
                    point.lat,
                    point.lng
                );
                Ok(point)
            }
            Ok(Some(point)) => {
                log::warn!("Geocoder returned unusable coordinates {:?}", point);
                Err(not_found())
            }
            Ok(None) => Err(not_found()),
            Err(_) => {
                log::warn!(
                    "Geocoding \"{}\" timed out after {} ms",
                    address,
                    self.settings.geocode_timeout.as_millis()
                );
                Err(not_found())
            }
        }
    }

    /// Looks up driving distances for `candidates`, keeping their order.
    async fn enrich(
        &self,
        origin: &GeoPoint,
        candidates: Vec<RankedFacility>,
        on_progress: ProgressFn<'_>,
        still_current: StillCurrent<'_>,
    ) -> Result<Vec<RankedFacility>, SearchError> {
        let total = candidates.len();
        let completed = AtomicUsize::new(0);
        let concurrency = self.settings.route_concurrency.clamp(1, MAX_ROUTE_CONCURRENCY);
        on_progress(SearchStage::EnrichingDriving {
            completed: 0,
            total,
        });

        let lookups = candidates.iter().map(|candidate| {
            let completed = &completed;
            async move {
                ensure_current(still_current)?;
                let driving = self.route_to(origin, &candidate.facility).await;
                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                on_progress(SearchStage::EnrichingDriving {
                    completed: done,
                    total,
                });
                Ok::<Option<DrivingDistance>, SearchError>(driving)
            }
        });

        // `buffered` yields in input order, so the outcome never depends on
        // which request finishes first.
        let distances: Vec<Option<DrivingDistance>> = stream::iter(lookups)
            .buffered(concurrency)
            .try_collect()
            .await?;

        Ok(candidates
            .into_iter()
            .zip(distances)
            .map(|(mut candidate, driving)| {
                candidate.driving = driving;
                candidate
            })
            .collect())
    }

    async fn route_to(&self, origin: &GeoPoint, facility: &FacilityRecord) -> Option<DrivingDistance> {
        let destination = facility.coordinates()?;
        let driving = get_driving_distance(
            &self.router,
            origin,
            &destination,
            self.settings.route_timeout,
        )
        .await;
        if driving.is_none() {
            log::debug!(
                "No driving distance for facility {} ({}); falling back to straight line",
                facility.id,
                facility.name
            );
        }
        driving
    }
}

fn ensure_current(still_current: StillCurrent<'_>) -> Result<(), SearchError> {
    if still_current() {
        Ok(())
    } else {
        Err(SearchError::Superseded)
    }
}

/// Attaches straight-line distances, drops anything outside `max_miles` and
/// sorts nearest first. The sort is stable, so ties keep directory order.
pub fn pre_rank(
    origin: &GeoPoint,
    filtered: Vec<&FacilityRecord>,
    max_miles: Option<f64>,
) -> Result<Vec<RankedFacility>, SearchError> {
    let mut candidates = Vec::with_capacity(filtered.len());
    for facility in filtered {
        // Filtering already guarantees coordinates.
        let Some(point) = facility.coordinates() else {
            continue;
        };
        let miles = haversine_distance(origin.lat, origin.lng, point.lat, point.lng);
        if !miles.is_finite() {
            return Err(SearchError::TransportFailure(format!(
                "could not compute distance to facility {}",
                facility.id
            )));
        }
        if !within_radius(miles, max_miles) {
            continue;
        }
        candidates.push(RankedFacility {
            facility: facility.clone(),
            straight_line_miles: miles,
            driving: None,
        });
    }
    candidates.sort_by(|a, b| a.straight_line_miles.total_cmp(&b.straight_line_miles));
    Ok(candidates)
}

/// Orders enriched candidates by driving meters, using the straight-line
/// fallback where routing failed, then appends the un-enriched remainder.
pub fn final_rank(
    mut enriched: Vec<RankedFacility>,
    remainder: Vec<RankedFacility>,
) -> Vec<RankedFacility> {
    enriched.sort_by(|a, b| a.ranking_meters().total_cmp(&b.ranking_meters()));
    enriched.extend(remainder);
    enriched
}
