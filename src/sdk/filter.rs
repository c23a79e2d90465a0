//! Directory predicates applied before any distance work.

use crate::sdk::directory::{Category, FacilityRecord, Rating};

/// Category/language/rating criteria. `None` means "any".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacilityFilter {
    pub category: Option<Category>,
    pub language: Option<String>,
    pub rating: Option<Rating>,
}

impl FacilityFilter {
    pub fn matches(&self, record: &FacilityRecord) -> bool {
        // Records without coordinates can never be distance-ranked.
        if record.coordinates().is_none() {
            return false;
        }
        if let Some(category) = self.category {
            if record.category != category {
                return false;
            }
        }
        if let Some(language) = &self.language {
            if !record.speaks(language) {
                return false;
            }
        }
        if let Some(rating) = self.rating {
            // Exact match, not a minimum
            if record.rating != Some(rating) {
                return false;
            }
        }
        true
    }

    /// Keeps matching records in directory order.
    pub fn apply<'a, I>(&self, records: I) -> Vec<&'a FacilityRecord>
    where
        I: IntoIterator<Item = &'a FacilityRecord>,
    {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}

/// Keeps only distances within `max_miles`, inclusive. `None` keeps everything.
pub fn within_radius(distance_miles: f64, max_miles: Option<f64>) -> bool {
    max_miles.map_or(true, |max| distance_miles <= max)
}
