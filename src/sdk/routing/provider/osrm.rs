use super::types::RouteResponse;
use crate::sdk::routing::error::{RouterErrorPayload, RoutingError};
use crate::sdk::routing::geocode::GeoPoint;
use crate::sdk::routing::route::DrivingDistance;
use crate::sdk::routing::service::Router;
use crate::sdk::util::rate_limit::{self, Limiter};
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_OSRM_URL: &str = "https://router.project-osrm.org";

/// Router backed by an OSRM-compatible `/route/v1/driving` endpoint.
pub struct OsrmRouter {
    client: Client,
    base_url: String,
    limiter: Option<Limiter>,
}

impl OsrmRouter {
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
            limiter: None,
        })
    }

    pub fn with_limiter(mut self, limiter: Option<Limiter>) -> Self {
        self.limiter = limiter;
        self
    }

    fn route_url(&self, from: &GeoPoint, to: &GeoPoint) -> String {
        // OSRM wants lon,lat
        format!(
            "{}/route/v1/driving/{},{};{},{}",
            self.base_url, from.lng, from.lat, to.lng, to.lat
        )
    }
}

impl Router for OsrmRouter {
    async fn driving_distance(
        &self,
        from: &GeoPoint,
        to: &GeoPoint,
    ) -> Result<DrivingDistance, RoutingError> {
        if from.lat == to.lat && from.lng == to.lng {
            log::debug!("Start and end coordinates are identical. Returning zero route.");
            return Ok(DrivingDistance::zero());
        }

        rate_limit::wait(self.limiter.as_ref()).await;

        let url = self.route_url(from, to);
        log::debug!("[PROVIDER] Calling driving route {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("overview", "false")])
            .send()
            .await
            .map_err(|e| {
                log::debug!("Failed to send route request. URL: {}\nError: {}", url, e);
                e
            })?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            // Try to parse the structured error first
            if let Ok(payload) = serde_json::from_str::<RouterErrorPayload>(&text) {
                return Err(classify(payload.code, payload.message));
            }
            log::error!(
                "Router returned non-success status: {}. Unparseable Body: {}",
                status,
                text
            );
            return Err(RoutingError::RawApiError {
                status: status.as_u16(),
                body: text,
            });
        }

        let body: RouteResponse = serde_json::from_str(&text).map_err(|e| {
            log::error!(
                "Failed to parse route response. URL: {}\nError: {}. Body: {}",
                url,
                e,
                text
            );
            e
        })?;

        if body.code != "Ok" {
            return Err(classify(body.code, body.message));
        }

        let route = body.routes.first().ok_or(RoutingError::NoRoute)?;
        if !route.distance.is_finite() || !route.duration.is_finite() {
            return Err(RoutingError::Malformed(format!(
                "non-finite route summary {:?}",
                route
            )));
        }
        Ok(DrivingDistance::from_route(route.distance, route.duration))
    }
}

fn classify(code: String, message: Option<String>) -> RoutingError {
    match code.as_str() {
        "NoRoute" | "NoSegment" => RoutingError::NoRoute,
        _ => RoutingError::ApiError {
            code,
            message: message.unwrap_or_default(),
        },
    }
}
