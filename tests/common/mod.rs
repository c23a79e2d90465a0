#![allow(dead_code)]

use facility_finder::sdk::routing::{
    error::RoutingError, service::Geocoder, service::Router, DrivingDistance, GeoPoint,
};
use facility_finder::sdk::search::PipelineSettings;
use facility_finder::{Category, FacilityDirectory, FacilityRecord, Rating};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const ATLANTA: (f64, f64) = (33.749, -84.388);
pub const HOME_ADDRESS: &str = "100 Peachtree St NW, Atlanta, GA 30303";

/// Degrees of latitude spanning `miles` along a meridian.
pub fn lat_offset(miles: f64) -> f64 {
    (miles / 3959.0).to_degrees()
}

pub fn facility(id: u32, lat: Option<f64>, lng: Option<f64>) -> FacilityRecord {
    FacilityRecord {
        id,
        name: format!("Facility {id}"),
        category: Category::PhysicalTherapy,
        address: Some(format!("{id} Ponce de Leon Ave, Atlanta, GA")),
        lat,
        lng,
        languages: vec!["English".to_string()],
        rating: Rating::try_from(2).ok(),
        insurance: None,
        preferred: false,
        hours: None,
        services: None,
    }
}

/// A facility due north of Atlanta, `miles` away in a straight line.
pub fn facility_north(id: u32, miles: f64) -> FacilityRecord {
    facility(id, Some(ATLANTA.0 + lat_offset(miles)), Some(ATLANTA.1))
}

pub fn directory(records: Vec<FacilityRecord>) -> Arc<FacilityDirectory> {
    Arc::new(FacilityDirectory::from_records(records).expect("unique ids"))
}

pub fn settings() -> PipelineSettings {
    PipelineSettings {
        max_driving_calc: 15,
        page_size: 10,
        route_timeout: Duration::from_millis(5000),
        geocode_timeout: Duration::from_secs(10),
        route_concurrency: 1,
    }
}

pub struct MockGeocoder {
    answers: HashMap<String, GeoPoint>,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl MockGeocoder {
    pub fn new() -> Self {
        Self {
            answers: HashMap::new(),
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Geocodes `HOME_ADDRESS` to Atlanta.
    pub fn atlanta() -> Self {
        Self::new().answer(
            HOME_ADDRESS,
            GeoPoint::labelled(ATLANTA.0, ATLANTA.1, "Atlanta, Fulton County, Georgia"),
        )
    }

    pub fn answer(mut self, address: &str, point: GeoPoint) -> Self {
        self.answers.insert(address.to_string(), point);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl Geocoder for MockGeocoder {
    async fn geocode(&self, address: &str) -> Option<GeoPoint> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.answers.get(address).cloned()
    }
}

#[derive(Debug, Clone, Copy)]
pub enum RouteBehavior {
    Meters(f64),
    Fail,
    Slow(Duration, f64),
}

#[derive(Default)]
pub struct RouterLog {
    pub destinations: Mutex<Vec<GeoPoint>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl RouterLog {
    pub fn calls(&self) -> usize {
        self.destinations.lock().map(|d| d.len()).unwrap_or(0)
    }

    pub fn called_for(&self, record: &FacilityRecord) -> bool {
        let Some(target) = record.coordinates() else {
            return false;
        };
        self.destinations
            .lock()
            .map(|d| d.iter().any(|p| p.lat == target.lat && p.lng == target.lng))
            .unwrap_or(false)
    }
}

/// Router that answers per destination. Unknown destinations get a route
/// 1.3x their straight-line distance.
pub struct MockRouter {
    behaviors: Vec<(GeoPoint, RouteBehavior)>,
    default_delay: Duration,
    log: Arc<RouterLog>,
}

impl MockRouter {
    pub fn new() -> Self {
        Self {
            behaviors: Vec::new(),
            default_delay: Duration::ZERO,
            log: Arc::new(RouterLog::default()),
        }
    }

    pub fn route_to(mut self, record: &FacilityRecord, behavior: RouteBehavior) -> Self {
        let point = record.coordinates().expect("routable facility");
        self.behaviors.push((point, behavior));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    pub fn log(&self) -> Arc<RouterLog> {
        self.log.clone()
    }

    fn behavior_for(&self, to: &GeoPoint) -> Option<RouteBehavior> {
        self.behaviors
            .iter()
            .find(|(p, _)| p.lat == to.lat && p.lng == to.lng)
            .map(|(_, b)| *b)
    }
}

impl Router for MockRouter {
    async fn driving_distance(
        &self,
        from: &GeoPoint,
        to: &GeoPoint,
    ) -> Result<DrivingDistance, RoutingError> {
        if let Ok(mut d) = self.log.destinations.lock() {
            d.push(to.clone());
        }
        let now = self.log.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.log.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let outcome = match self.behavior_for(to) {
            Some(RouteBehavior::Meters(m)) => Ok(DrivingDistance::from_route(m, m / 20.0)),
            Some(RouteBehavior::Fail) => Err(RoutingError::NoRoute),
            Some(RouteBehavior::Slow(delay, m)) => {
                tokio::time::sleep(delay).await;
                Ok(DrivingDistance::from_route(m, m / 20.0))
            }
            None => {
                if !self.default_delay.is_zero() {
                    tokio::time::sleep(self.default_delay).await;
                }
                let miles =
                    facility_finder::haversine_distance(from.lat, from.lng, to.lat, to.lng);
                Ok(DrivingDistance::from_route(miles * 1609.34 * 1.3, miles * 90.0))
            }
        };

        self.log.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}

pub fn ids(result: &facility_finder::SearchResult) -> Vec<u32> {
    result.facilities.iter().map(|f| f.facility.id).collect()
}
