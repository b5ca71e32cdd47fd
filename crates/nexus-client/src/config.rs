//! Client configuration.

use std::time::Duration;

use reqwest::Url;

use crate::error::ClientError;

/// Orchestrator origin used when none is configured.
pub const DEFAULT_ORIGIN: &str = "http://localhost:8000";

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Orchestrator origin; endpoints are resolved beneath it.
    pub origin: String,

    /// Upper bound for the submit call. `None` waits indefinitely.
    pub submit_timeout: Option<Duration>,

    /// Consecutive undecodable frames after which a stream is treated as
    /// dead. `0` never gives up.
    pub max_consecutive_malformed: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            submit_timeout: None,
            max_consecutive_malformed: 3,
        }
    }
}

impl ClientConfig {
    /// Create a configuration for the given origin with default settings.
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Self::default()
        }
    }

    /// Bound the submit call.
    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = Some(timeout);
        self
    }

    /// Parse and check the origin.
    pub fn origin_url(&self) -> Result<Url, ClientError> {
        let url = Url::parse(&self.origin)
            .map_err(|e| ClientError::InvalidConfig(format!("origin '{}': {}", self.origin, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::InvalidConfig(format!(
                "origin '{}' must use http or https",
                self.origin
            )));
        }
        if url.cannot_be_a_base() {
            return Err(ClientError::InvalidConfig(format!(
                "origin '{}' cannot be used as a base URL",
                self.origin
            )));
        }

        Ok(url)
    }
}
