use std::time::Duration;

use crate::constants::{
    DEFAULT_DATA_PATH, DEFAULT_HOST, DEFAULT_PORT, MIN_SESSION_SECRET_LENGTH,
};

const DEFAULT_CLASSIFIER_TIMEOUT_MS: u64 = 2_000;

/// Server configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: String,
    pub data_path: String,
    pub session_secret: String,
    /// Endpoint of the category classifier service. When unset, every
    /// classification falls back to the per-call default category.
    pub classifier_url: Option<String>,
    pub classifier_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let host = std::env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = std::env::var("PORT").unwrap_or_else(|_| DEFAULT_PORT.to_string());
        let data_path = std::env::var("DATA_PATH").unwrap_or_else(|_| DEFAULT_DATA_PATH.to_string());

        let session_secret = std::env::var("SESSION_SECRET")
            .map_err(|_| "SESSION_SECRET must be set".to_string())?;
        if session_secret.len() < MIN_SESSION_SECRET_LENGTH {
            return Err(format!(
                "SESSION_SECRET must be at least {} characters",
                MIN_SESSION_SECRET_LENGTH
            ));
        }

        let classifier_url = std::env::var("CLASSIFIER_URL").ok().filter(|u| !u.is_empty());
        let classifier_timeout = std::env::var("CLASSIFIER_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(DEFAULT_CLASSIFIER_TIMEOUT_MS));

        Ok(Self {
            host,
            port,
            data_path,
            session_secret,
            classifier_url,
            classifier_timeout,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
