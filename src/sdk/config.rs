use crate::sdk::routing::provider::nominatim::DEFAULT_NOMINATIM_URL;
use crate::sdk::routing::provider::osrm::DEFAULT_OSRM_URL;
use crate::sdk::search::pipeline::{PipelineSettings, MAX_ROUTE_CONCURRENCY};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const ENV_PREFIX: &str = "FINDER_";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{key} has an invalid value \"{value}\"")]
    Invalid { key: String, value: String },

    #[error("{key} must be greater than 0")]
    Zero { key: String },

    #[error("{key} must be at most {max}, got {value}")]
    TooLarge { key: String, max: usize, value: usize },
}

/// Runtime settings, read from `FINDER_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct FinderConfig {
    pub geocoder_url: String,
    pub router_url: String,
    pub user_agent: String,
    pub country_codes: String,
    pub route_timeout: Duration,
    pub geocode_timeout: Duration,
    pub max_driving_calc: usize,
    pub page_size: usize,
    /// Minimum spacing between requests to the same upstream service.
    pub request_delay: Duration,
    pub route_concurrency: usize,
    pub directory: PathBuf,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            geocoder_url: DEFAULT_NOMINATIM_URL.to_string(),
            router_url: DEFAULT_OSRM_URL.to_string(),
            user_agent: concat!("FacilityFinder/", env!("CARGO_PKG_VERSION")).to_string(),
            country_codes: "us".to_string(),
            route_timeout: Duration::from_millis(5000),
            geocode_timeout: Duration::from_millis(10_000),
            max_driving_calc: 15,
            page_size: 10,
            request_delay: Duration::from_millis(150),
            route_concurrency: 1,
            directory: PathBuf::from("data/facilities.json"),
        }
    }
}

impl FinderConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            let key = format!("{}{}", ENV_PREFIX, name);
            lookup(&key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(|v| (key, v))
        };
        let mut config = Self::default();

        if let Some((_, v)) = get("GEOCODER_URL") {
            config.geocoder_url = v;
        }
        if let Some((_, v)) = get("ROUTER_URL") {
            config.router_url = v;
        }
        if let Some((_, v)) = get("USER_AGENT") {
            config.user_agent = v;
        }
        if let Some((_, v)) = get("COUNTRY_CODES") {
            config.country_codes = v;
        }
        if let Some((k, v)) = get("ROUTE_TIMEOUT_MS") {
            config.route_timeout = Duration::from_millis(parse(&k, &v)?);
        }
        if let Some((k, v)) = get("GEOCODE_TIMEOUT_MS") {
            config.geocode_timeout = Duration::from_millis(parse(&k, &v)?);
        }
        if let Some((k, v)) = get("MAX_DRIVING_CALC") {
            config.max_driving_calc = parse(&k, &v)?;
        }
        if let Some((k, v)) = get("PAGE_SIZE") {
            config.page_size = parse(&k, &v)?;
        }
        if let Some((k, v)) = get("REQUEST_DELAY_MS") {
            config.request_delay = Duration::from_millis(parse(&k, &v)?);
        }
        if let Some((k, v)) = get("ROUTE_CONCURRENCY") {
            config.route_concurrency = parse(&k, &v)?;
        }
        if let Some((_, v)) = get("DIRECTORY") {
            config.directory = PathBuf::from(v);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let zero = |name: &str| ConfigError::Zero {
            key: format!("{}{}", ENV_PREFIX, name),
        };
        if self.max_driving_calc == 0 {
            return Err(zero("MAX_DRIVING_CALC"));
        }
        if self.page_size == 0 {
            return Err(zero("PAGE_SIZE"));
        }
        if self.route_concurrency == 0 {
            return Err(zero("ROUTE_CONCURRENCY"));
        }
        if self.route_concurrency > MAX_ROUTE_CONCURRENCY {
            return Err(ConfigError::TooLarge {
                key: format!("{}ROUTE_CONCURRENCY", ENV_PREFIX),
                max: MAX_ROUTE_CONCURRENCY,
                value: self.route_concurrency,
            });
        }
        if self.route_timeout.is_zero() {
            return Err(zero("ROUTE_TIMEOUT_MS"));
        }
        if self.geocode_timeout.is_zero() {
            return Err(zero("GEOCODE_TIMEOUT_MS"));
        }
        Ok(())
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            max_driving_calc: self.max_driving_calc,
            page_size: self.page_size,
            route_timeout: self.route_timeout,
            geocode_timeout: self.geocode_timeout,
            route_concurrency: self.route_concurrency,
        }
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
    })
}
