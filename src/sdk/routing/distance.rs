//! Straight-line distance and unit helpers.
//!
//! Everything here is pure: no network, no allocation beyond the directions URL.

use reqwest::Url;

/// Mean Earth radius in miles.
pub const EARTH_RADIUS_MILES: f64 = 3959.0;

/// Meters per statute mile, used for the fallback ranking metric.
pub const METERS_PER_MILE: f64 = 1609.34;

/// Miles per meter, used when displaying driving distances.
pub const MILES_PER_METER: f64 = 0.000621371;

const DIRECTIONS_BASE_URL: &str = "https://www.google.com/maps/dir/";

/// Great-circle distance in miles between two points given in degrees.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push `a` just past 1 for antipodal points.
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_MILES * c
}

/// Converts a straight-line distance into the meters used to rank facilities
/// whose driving distance is unknown.
pub fn miles_to_meters(miles: f64) -> f64 {
    miles * METERS_PER_MILE
}

/// Rounds to one decimal place.
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Builds a driving-directions link between two free-text addresses.
pub fn directions_url(from_address: &str, to_address: &str) -> String {
    // The base is a constant, so parsing cannot fail.
    match Url::parse_with_params(
        DIRECTIONS_BASE_URL,
        &[
            ("api", "1"),
            ("origin", from_address),
            ("destination", to_address),
            ("travelmode", "driving"),
        ],
    ) {
        Ok(url) => url.to_string(),
        Err(_) => DIRECTIONS_BASE_URL.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_same_point_is_zero() {
        assert_eq!(haversine_distance(33.749, -84.388, 33.749, -84.388), 0.0);
    }

    #[test]
    fn test_haversine_atlanta_to_savannah() {
        // Roughly 223 miles as the crow flies
        let d = haversine_distance(33.749, -84.388, 32.0809, -81.0912);
        assert!((d - 223.0).abs() < 3.0, "got {d}");
    }

    #[test]
    fn test_haversine_one_degree_latitude() {
        let d = haversine_distance(0.0, 0.0, 1.0, 0.0);
        let expected = EARTH_RADIUS_MILES * 1.0_f64.to_radians();
        assert!((d - expected).abs() < 1e-9);
    }

    #[test]
    fn test_haversine_antipodal_points_are_finite() {
        let half_circumference = EARTH_RADIUS_MILES * std::f64::consts::PI;
        for (lat, lng) in [(-20.7, -178.3), (45.0, 10.0), (-89.0, 0.5), (0.0, 0.0)] {
            let opposite_lng = if lng > 0.0 { lng - 180.0 } else { lng + 180.0 };
            let d = haversine_distance(lat, lng, -lat, opposite_lng);
            assert!(d.is_finite(), "({lat}, {lng}) gave {d}");
            assert!((d - half_circumference).abs() < 1e-3, "got {d}");
        }
    }

    #[test]
    fn test_miles_to_meters_is_exact_product() {
        assert_eq!(miles_to_meters(1.0), 1609.34);
        assert_eq!(miles_to_meters(2.5), 2.5 * 1609.34);
    }

    #[test]
    fn test_round_tenth() {
        assert_eq!(round_tenth(3.14159), 3.1);
        assert_eq!(round_tenth(2.25), 2.3);
    }

    #[test]
    fn test_directions_url_encodes_addresses() {
        let url = directions_url("123 Main St, Atlanta, GA", "5 Oak & Pine Rd");
        assert!(url.starts_with("https://www.google.com/maps/dir/?api=1&origin="));
        assert!(url.contains("origin=123+Main+St%2C+Atlanta%2C+GA"));
        assert!(url.contains("destination=5+Oak+%26+Pine+Rd"));
        assert!(url.ends_with("travelmode=driving"));
    }
}
