use facility_finder::sdk::routing::distance::miles_to_meters;
use facility_finder::sdk::search::pipeline::final_rank;
use facility_finder::{haversine_distance, Category, DrivingDistance, FacilityRecord, RankedFacility};
use proptest::prelude::*;

fn candidate(id: u32, miles: f64, driving: Option<f64>) -> RankedFacility {
    RankedFacility {
        facility: FacilityRecord {
            id,
            name: format!("F{id}"),
            category: Category::Neurology,
            address: None,
            lat: Some(0.0),
            lng: Some(0.0),
            languages: vec![],
            rating: None,
            insurance: None,
            preferred: false,
            hours: None,
            services: None,
        },
        straight_line_miles: miles,
        driving: driving.map(|m| DrivingDistance::from_route(m, 60.0)),
    }
}

proptest! {
    #[test]
    fn test_haversine_symmetric(
        lat1 in -90.0f64..90.0, lon1 in -180.0f64..180.0,
        lat2 in -90.0f64..90.0, lon2 in -180.0f64..180.0,
    ) {
        let ab = haversine_distance(lat1, lon1, lat2, lon2);
        let ba = haversine_distance(lat2, lon2, lat1, lon1);
        prop_assert!((ab - ba).abs() < 1e-9);
        prop_assert!(ab >= 0.0);
    }

    #[test]
    fn test_haversine_identity(lat in -90.0f64..90.0, lon in -180.0f64..180.0) {
        prop_assert_eq!(haversine_distance(lat, lon, lat, lon), 0.0);
    }

    #[test]
    fn test_fallback_metric_exact(miles in 0.0f64..500.0) {
        let c = candidate(1, miles, None);
        prop_assert_eq!(c.ranking_meters(), miles * 1609.34);
        prop_assert_eq!(c.ranking_meters(), miles_to_meters(miles));
    }

    #[test]
    fn test_final_rank_is_sorted_and_order_independent(
        entries in prop::collection::vec((0.0f64..100.0, prop::option::of(0.0f64..200_000.0)), 1..20)
    ) {
        let candidates: Vec<RankedFacility> = entries
            .iter()
            .enumerate()
            .map(|(i, (miles, driving))| candidate(i as u32, *miles, *driving))
            .collect();

        let ranked = final_rank(candidates.clone(), vec![]);
        prop_assert_eq!(ranked.len(), candidates.len());
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].ranking_meters() <= pair[1].ranking_meters());
        }

        // Ranking depends only on the metrics, not on arrival order
        let mut reversed = candidates.clone();
        reversed.reverse();
        let metrics = |v: &[RankedFacility]| v.iter().map(|c| c.ranking_meters()).collect::<Vec<_>>();
        prop_assert_eq!(metrics(&final_rank(reversed, vec![])), metrics(&ranked));
    }
}
