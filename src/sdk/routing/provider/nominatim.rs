use super::types::SearchPlace;
use crate::sdk::routing::error::RoutingError;
use crate::sdk::routing::geocode::GeoPoint;
use crate::sdk::routing::service::Geocoder;
use crate::sdk::util::rate_limit::{self, Limiter};
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

/// Geocoder backed by a Nominatim-compatible `/search` endpoint.
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
    country_codes: Option<String>,
    limiter: Option<Limiter>,
}

impl NominatimGeocoder {
    pub fn new(
        base_url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, RoutingError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            country_codes: None,
            limiter: None,
        })
    }

    /// Restricts matches to a comma-separated list of ISO country codes.
    pub fn with_country_codes(mut self, codes: impl Into<String>) -> Self {
        let codes = codes.into();
        self.country_codes = (!codes.trim().is_empty()).then_some(codes);
        self
    }

    pub fn with_limiter(mut self, limiter: Option<Limiter>) -> Self {
        self.limiter = limiter;
        self
    }

    /// Looks up an address, distinguishing "no match" (`Ok(None)`) from
    /// transport and parse failures.
    pub async fn lookup(&self, address: &str) -> Result<Option<GeoPoint>, RoutingError> {
        rate_limit::wait(self.limiter.as_ref()).await;

        let url = format!("{}/search", self.base_url);
        let mut params = vec![("format", "json"), ("q", address), ("limit", "1")];
        if let Some(codes) = &self.country_codes {
            params.push(("countrycodes", codes.as_str()));
        }
        log::debug!("[PROVIDER] Calling geocode for address: \"{}\"", address);

        let response = self.client.get(&url).query(&params).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            log::error!("Geocoder returned HTTP {}. Body: {}", status, text);
            return Err(RoutingError::RawApiError {
                status: status.as_u16(),
                body: text,
            });
        }

        let places: Vec<SearchPlace> = serde_json::from_str(&text).map_err(|e| {
            log::error!(
                "Failed to parse geocode response. URL: {}\nError: {}. Body: {}",
                url,
                e,
                text
            );
            e
        })?;

        let Some(place) = places.into_iter().next() else {
            return Ok(None);
        };

        let lat = parse_degrees(&place.lat)?;
        let lng = parse_degrees(&place.lon)?;
        Ok(Some(GeoPoint {
            lat,
            lng,
            label: place.display_name,
        }))
    }
}

fn parse_degrees(raw: &str) -> Result<f64, RoutingError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| RoutingError::Malformed(format!("invalid coordinate \"{}\"", raw)))
}

impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> Option<GeoPoint> {
        match self.lookup(address).await {
            Ok(point) => point,
            Err(err) => {
                log::warn!("Geocoding \"{}\" failed: {}", address, err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_degrees() {
        assert_eq!(parse_degrees("33.749").ok(), Some(33.749));
        assert_eq!(parse_degrees(" -84.388 ").ok(), Some(-84.388));
        assert!(parse_degrees("north").is_err());
        assert!(parse_degrees("NaN").is_err());
    }

    #[test]
    fn test_blank_country_codes_are_dropped() {
        let geocoder = NominatimGeocoder::new(DEFAULT_NOMINATIM_URL, "test", Duration::from_secs(1))
            .map(|g| g.with_country_codes("  "));
        assert!(geocoder.is_ok_and(|g| g.country_codes.is_none()));
    }
}
