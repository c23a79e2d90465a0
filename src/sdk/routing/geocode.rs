use super::cache::GeocodeCache;
use super::service::Geocoder;
use serde::{Deserialize, Serialize};

/// A coordinate in degrees, optionally with a human-readable label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            label: None,
        }
    }

    pub fn labelled(lat: f64, lng: f64, label: impl Into<String>) -> Self {
        Self {
            lat,
            lng,
            label: Some(label.into()),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// Wraps a geocoder with a cache. Only successful lookups are stored, so an
/// address that failed once is retried on the next search.
pub struct CachedGeocoder<G, C> {
    inner: G,
    cache: C,
}

impl<G: Geocoder, C: GeocodeCache> CachedGeocoder<G, C> {
    pub fn new(inner: G, cache: C) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }
}

impl<G: Geocoder, C: GeocodeCache> Geocoder for CachedGeocoder<G, C> {
    async fn geocode(&self, address: &str) -> Option<GeoPoint> {
        if let Some(point) = self.cache.get(address) {
            log::debug!("[CACHE HIT] geocode \"{}\"", address);
            return Some(point);
        }

        let point = self.inner.geocode(address).await?;
        self.cache.put(address, point.clone());
        Some(point)
    }
}
