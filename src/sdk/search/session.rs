use super::error::SearchError;
use super::pipeline::{PipelineSettings, RankingPipeline};
use super::progress::{no_progress, ProgressFn};
use super::query::{SearchResult, UserQuery};
use crate::sdk::directory::FacilityDirectory;
use crate::sdk::routing::cache::SessionGeoCache;
use crate::sdk::routing::geocode::CachedGeocoder;
use crate::sdk::routing::service::{Geocoder, Router};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// One user's searches. Owns the geocode cache for the session and makes
/// sure only the newest search can produce a result.
pub struct SearchSession<G, R> {
    pipeline: RankingPipeline<CachedGeocoder<G, SessionGeoCache>, R>,
    generation: AtomicU64,
}

impl<G: Geocoder, R: Router> SearchSession<G, R> {
    pub fn new(
        geocoder: G,
        router: R,
        directory: Arc<FacilityDirectory>,
        settings: PipelineSettings,
    ) -> Self {
        let geocoder = CachedGeocoder::new(geocoder, SessionGeoCache::new());
        Self {
            pipeline: RankingPipeline::new(geocoder, router, directory, settings),
            generation: AtomicU64::new(0),
        }
    }

    pub async fn search(&self, query: &UserQuery) -> Result<SearchResult, SearchError> {
        self.search_with_progress(query, &no_progress).await
    }

    /// Starts a new search, invalidating any still in flight. A search that
    /// has been overtaken resolves to [`SearchError::Superseded`].
    pub async fn search_with_progress(
        &self,
        query: &UserQuery,
        on_progress: ProgressFn<'_>,
    ) -> Result<SearchResult, SearchError> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let still_current = || self.generation.load(Ordering::SeqCst) == ticket;

        let outcome = self.pipeline.run(query, on_progress, &still_current).await;
        if !still_current() {
            log::debug!("Discarding result of superseded search #{}", ticket);
            return Err(SearchError::Superseded);
        }
        outcome
    }

    /// Number of addresses geocoded so far in this session.
    pub fn cached_addresses(&self) -> usize {
        self.pipeline.geocoder().cache().len()
    }

    pub fn directory(&self) -> &FacilityDirectory {
        self.pipeline.directory()
    }
}
