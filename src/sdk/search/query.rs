use super::error::SearchError;
use crate::sdk::directory::{Category, FacilityRecord, Rating};
use crate::sdk::filter::FacilityFilter;
use crate::sdk::routing::distance::{directions_url, miles_to_meters};
use crate::sdk::routing::geocode::GeoPoint;
use crate::sdk::routing::route::DrivingDistance;
use serde::Serialize;

/// What the user asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct UserQuery {
    pub address: String,
    pub filter: FacilityFilter,
    /// Maximum straight-line distance in miles.
    pub max_miles: Option<f64>,
    /// 1-based page number.
    pub page: usize,
}

impl UserQuery {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            filter: FacilityFilter::default(),
            max_miles: None,
            page: 1,
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.filter.category = Some(category);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.filter.language = Some(language.into());
        self
    }

    pub fn with_rating(mut self, rating: Rating) -> Self {
        self.filter.rating = Some(rating);
        self
    }

    pub fn within_miles(mut self, miles: f64) -> Self {
        self.max_miles = Some(miles);
        self
    }

    pub fn on_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        if self.address.trim().is_empty() {
            return Err(SearchError::InvalidQuery("address is required".into()));
        }
        if self.page == 0 {
            return Err(SearchError::InvalidQuery("pages start at 1".into()));
        }
        if let Some(max) = self.max_miles {
            if !max.is_finite() || max < 0.0 {
                return Err(SearchError::InvalidQuery(format!(
                    "maximum distance must be a non-negative number, got {}",
                    max
                )));
            }
        }
        Ok(())
    }
}

/// A facility with the distances computed for one search.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedFacility {
    #[serde(flatten)]
    pub facility: FacilityRecord,
    pub straight_line_miles: f64,
    pub driving: Option<DrivingDistance>,
}

impl RankedFacility {
    /// Meters used for final ordering: the driving distance when known,
    /// otherwise the straight-line distance.
    pub fn ranking_meters(&self) -> f64 {
        match &self.driving {
            Some(driving) => driving.distance_meters,
            None => miles_to_meters(self.straight_line_miles),
        }
    }

    /// Directions link from the user's address, for facilities with a real street address.
    pub fn directions_url(&self, from_address: &str) -> Option<String> {
        if self.facility.is_virtual() {
            return None;
        }
        let to = self.facility.address.as_deref()?;
        Some(directions_url(from_address, to))
    }
}

/// One page of ranked facilities.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub facilities: Vec<RankedFacility>,
    /// Facilities that passed every filter, before paging.
    pub total_filtered: usize,
    pub user_location: GeoPoint,
    pub page: usize,
    pub page_size: usize,
}

impl SearchResult {
    pub fn total_pages(&self) -> usize {
        if self.page_size == 0 {
            return 0;
        }
        self.total_filtered.div_ceil(self.page_size)
    }
}
