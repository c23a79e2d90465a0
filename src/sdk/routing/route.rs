use super::distance::{round_tenth, MILES_PER_METER};
use super::error::RoutingError;
use super::geocode::GeoPoint;
use super::service::Router;
use serde::Serialize;
use std::time::Duration;

/// Road-network distance and travel time between two points.
///
/// Meters and seconds are canonical; miles and minutes are derived for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DrivingDistance {
    pub distance_meters: f64,
    pub distance_miles: f64,
    pub duration_seconds: f64,
    pub duration_minutes: u64,
}

impl DrivingDistance {
    pub fn from_route(distance_meters: f64, duration_seconds: f64) -> Self {
        Self {
            distance_meters,
            distance_miles: round_tenth(distance_meters * MILES_PER_METER),
            duration_seconds,
            duration_minutes: (duration_seconds / 60.0).round().max(0.0) as u64,
        }
    }

    pub fn zero() -> Self {
        Self::from_route(0.0, 0.0)
    }
}

/// Asks the router for a driving distance, giving up once `timeout` elapses.
pub async fn try_driving_distance<R: Router>(
    router: &R,
    from: &GeoPoint,
    to: &GeoPoint,
    timeout: Duration,
) -> Result<DrivingDistance, RoutingError> {
    tokio::time::timeout(timeout, router.driving_distance(from, to))
        .await
        .map_err(|_| RoutingError::Timeout(timeout.as_millis() as u64))?
}

/// Like [`try_driving_distance`], but any failure (timeout, no route,
/// transport) is logged and yields `None`; the caller ranks such facilities
/// by straight-line distance instead.
pub async fn get_driving_distance<R: Router>(
    router: &R,
    from: &GeoPoint,
    to: &GeoPoint,
    timeout: Duration,
) -> Option<DrivingDistance> {
    match try_driving_distance(router, from, to, timeout).await {
        Ok(distance) => Some(distance),
        Err(err) => {
            log::warn!(
                "Routing failed for ({}, {}) -> ({}, {}): {}",
                from.lat,
                from.lng,
                to.lat,
                to.lng,
                err
            );
            None
        }
    }
}
