use super::error::RoutingError;
use super::geocode::GeoPoint;
use super::route::DrivingDistance;
use std::future::Future;
use std::sync::Arc;

pub trait Geocoder: Send + Sync {
    /// Resolves a free-text address to its best match.
    ///
    /// `None` covers both "no match" and any transport failure, so a broken
    /// upstream can never be mistaken for a located address.
    fn geocode(&self, address: &str) -> impl Future<Output = Option<GeoPoint>> + Send;
}

pub trait Router: Send + Sync {
    /// Gets the driving distance between two points.
    fn driving_distance(
        &self,
        from: &GeoPoint,
        to: &GeoPoint,
    ) -> impl Future<Output = Result<DrivingDistance, RoutingError>> + Send;
}

// Adapters are shared between sessions behind an `Arc`.
impl<T: Geocoder> Geocoder for Arc<T> {
    fn geocode(&self, address: &str) -> impl Future<Output = Option<GeoPoint>> + Send {
        (**self).geocode(address)
    }
}

impl<T: Router> Router for Arc<T> {
    fn driving_distance(
        &self,
        from: &GeoPoint,
        to: &GeoPoint,
    ) -> impl Future<Output = Result<DrivingDistance, RoutingError>> + Send {
        (**self).driving_distance(from, to)
    }
}
