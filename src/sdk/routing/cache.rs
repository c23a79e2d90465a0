use super::geocode::GeoPoint;
use std::{collections::HashMap, sync::Mutex};

/// Storage for geocode results keyed by the exact address text.
pub trait GeocodeCache: Send + Sync {
    fn get(&self, address: &str) -> Option<GeoPoint>;
    fn put(&self, address: &str, point: GeoPoint);
}

/// Append-only cache that lives exactly as long as one search session.
#[derive(Debug, Default)]
pub struct SessionGeoCache {
    geocodes: Mutex<HashMap<String, GeoPoint>>,
}

impl SessionGeoCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.geocodes.lock().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl GeocodeCache for SessionGeoCache {
    fn get(&self, address: &str) -> Option<GeoPoint> {
        let map = self.geocodes.lock().ok()?;
        map.get(address).cloned()
    }

    fn put(&self, address: &str, point: GeoPoint) {
        if let Ok(mut map) = self.geocodes.lock() {
            // First write wins; later lookups must see what was stored then.
            map.entry(address.to_string()).or_insert(point);
        }
    }
}
