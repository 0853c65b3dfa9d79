use crate::domains::activity::status_codec::WireMode;
use crate::errors::{ServiceError, ServiceResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

pub const ENV_API_BASE_URL: &str = "CRONOGRAMA_API_BASE_URL";
pub const ENV_STATUS_WIRE_MODE: &str = "CRONOGRAMA_STATUS_WIRE_MODE";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "CRONOGRAMA_REQUEST_TIMEOUT_SECS";

/// Process-wide settings, validated once by `globals::initialize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub api_base_url: String,
    /// Must match the backend's status encoding at deploy time
    #[serde(default)]
    pub status_wire_mode: WireMode,
    /// `None` keeps the network default
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl AppConfig {
    pub fn new(api_base_url: &str, status_wire_mode: WireMode) -> Self {
        Self {
            api_base_url: api_base_url.to_string(),
            status_wire_mode,
            request_timeout_secs: None,
        }
    }

    /// Read from the environment, loading `.env` first when present.
    pub fn from_env() -> ServiceResult<Self> {
        dotenv::dotenv().ok();

        let api_base_url = env::var(ENV_API_BASE_URL).map_err(|_| {
            ServiceError::Configuration(format!("{} is not set", ENV_API_BASE_URL))
        })?;

        let status_wire_mode = match env::var(ENV_STATUS_WIRE_MODE) {
            Ok(raw) => raw
                .parse::<WireMode>()
                .map_err(|e| ServiceError::Configuration(e.to_string()))?,
            Err(_) => WireMode::default(),
        };

        let request_timeout_secs = match env::var(ENV_REQUEST_TIMEOUT_SECS) {
            Ok(raw) => Some(raw.trim().parse::<u64>().map_err(|_| {
                ServiceError::Configuration(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    ENV_REQUEST_TIMEOUT_SECS, raw
                ))
            })?),
            Err(_) => None,
        };

        let config = Self {
            api_base_url,
            status_wire_mode,
            request_timeout_secs,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ServiceResult<()> {
        let url = self.api_base_url.trim();
        if url.is_empty() {
            return Err(ServiceError::Configuration(
                "API base URL must not be empty".to_string(),
            ));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ServiceError::Configuration(format!(
                "API base URL must start with http:// or https://, got '{}'",
                url
            )));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(ServiceError::Configuration(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
