use serde::Deserialize;
use thiserror::Error;

// Error body returned by OSRM-compatible routers on non-2xx responses
#[derive(Deserialize, Debug)]
pub struct RouterErrorPayload {
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("No drivable route between the two points")]
    NoRoute,

    // Structured error from the routing API
    #[error("API Error ({code}): {message}")]
    ApiError { code: String, message: String },

    // A fallback for when the error body isn't in the expected JSON format
    #[error("Unstructured API Error (HTTP {status}): {body}")]
    RawApiError { status: u16, body: String },

    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    #[error("Underlying request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Malformed response: {0}")]
    Malformed(String),
}
