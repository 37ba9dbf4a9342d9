//! Configuration for allocation API clients.

use crate::error::{Error, Result};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

const fn default_request_timeout_secs() -> u64 {
    30
}

/// Configuration for an allocation API client instance.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ClientConfig {
    /// Allocation API base URL, including any path prefix
    /// (e.g. "https://allocations.example.com/rest/api").
    #[validate(url)]
    pub endpoint: String,

    /// Project to scope requests to, sent as the X-PROJECT-ID header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    /// Pre-issued auth token, sent as the X-Auth-Token header. Never
    /// serialized.
    #[serde(skip_serializing, default)]
    token: Option<SecretString>,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl ClientConfig {
    /// Create a new client configuration for the given endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not a valid URL or validation
    /// fails.
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let config = Self {
            endpoint: endpoint.into(),
            project_id: None,
            token: None,
            request_timeout_secs: default_request_timeout_secs(),
        };

        config
            .validate()
            .map_err(|err| Error::ConfigError(format!("invalid configuration: {err}")))?;

        Ok(config)
    }

    /// Set the project to scope requests to.
    #[must_use]
    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Set the auth token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(SecretString::from(token.into()));
        self
    }

    /// Set the request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// The configured auth token, if any.
    #[must_use]
    pub fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn new_validates_the_endpoint() {
        assert!(ClientConfig::new("https://allocations.example.com/rest/api").is_ok());
        assert!(ClientConfig::new("not a url").is_err());
    }

    #[test]
    fn builder_methods() {
        let config = ClientConfig::new("https://allocations.example.com")
            .unwrap()
            .with_project_id("abc123")
            .with_token("s3cret")
            .with_timeout(60);

        assert_eq!(config.project_id.as_deref(), Some("abc123"));
        assert_eq!(config.token().unwrap().expose_secret(), "s3cret");
        assert_eq!(config.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn token_is_never_serialized() {
        let config = ClientConfig::new("https://allocations.example.com")
            .unwrap()
            .with_token("s3cret");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("s3cret"));
        assert!(!json.contains("token"));
    }

    #[test]
    fn timeout_defaults_when_deserialized() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"endpoint": "https://allocations.example.com"}"#).unwrap();
        assert_eq!(config.request_timeout_secs, 30);
    }
}
