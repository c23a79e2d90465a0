pub mod cache;
pub mod distance;
pub mod error;
pub mod geocode;
pub mod provider;
pub mod route;
pub mod service;

pub use cache::{GeocodeCache, SessionGeoCache};
pub use distance::{directions_url, haversine_distance};
pub use error::RoutingError;
pub use geocode::{CachedGeocoder, GeoPoint};
pub use provider::{NominatimGeocoder, OsrmRouter};
pub use route::{get_driving_distance, try_driving_distance, DrivingDistance};
pub use service::{Geocoder, Router};
