//! Asana connector configuration.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::{AsanaError, AsanaResult};

/// Public Asana REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://app.asana.com/api/1.0";

/// Largest page Asana serves for paginated collections.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Environment variable holding the personal access token.
pub const TOKEN_ENV: &str = "ASANA_TOKEN";
/// Environment variable overriding the API base URL.
pub const BASE_URL_ENV: &str = "ASANA_BASE_URL";
/// Environment variable overriding the page size.
pub const PAGE_SIZE_ENV: &str = "ASANA_PAGE_SIZE";

/// Configuration for the Asana connector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsanaConfig {
    /// Personal access token or service account token.
    #[serde(
        serialize_with = "serialize_redacted",
        deserialize_with = "deserialize_secret"
    )]
    pub token: SecretString,

    /// API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Records requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_page_size() -> u32 {
    MAX_PAGE_SIZE
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

fn serialize_redacted<S: serde::Serializer>(
    _token: &SecretString,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str("***")
}

fn deserialize_secret<'de, D: serde::Deserializer<'de>>(
    deserializer: D,
) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

impl AsanaConfig {
    /// Creates a config with defaults for everything but the token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
            base_url: default_base_url(),
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }

    /// Starts a builder.
    #[must_use]
    pub fn builder() -> AsanaConfigBuilder {
        AsanaConfigBuilder::default()
    }

    /// Loads the configuration from `ASANA_TOKEN`, `ASANA_BASE_URL` and
    /// `ASANA_PAGE_SIZE`.
    ///
    /// # Errors
    ///
    /// Returns `AsanaError::Config` if the token is missing or a value is invalid.
    pub fn from_env() -> AsanaResult<Self> {
        let mut builder = Self::builder().token(std::env::var(TOKEN_ENV).unwrap_or_default());

        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            builder = builder.base_url(base_url);
        }

        if let Ok(page_size) = std::env::var(PAGE_SIZE_ENV) {
            let page_size = page_size.parse::<u32>().map_err(|e| {
                AsanaError::Config(format!("{PAGE_SIZE_ENV} must be a number: {e}"))
            })?;
            builder = builder.page_size(page_size);
        }

        builder.build()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `AsanaError::Config` describing the first invalid field.
    pub fn validate(&self) -> AsanaResult<()> {
        if self.token.expose_secret().trim().is_empty() {
            return Err(AsanaError::Config("token is required".into()));
        }

        let url = url::Url::parse(&self.base_url)
            .map_err(|e| AsanaError::Config(format!("invalid base_url: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AsanaError::Config(format!(
                "unsupported base_url scheme: {}",
                url.scheme()
            )));
        }

        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(AsanaError::Config(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                self.page_size
            )));
        }

        if self.timeout_secs == 0 {
            return Err(AsanaError::Config("timeout_secs must be positive".into()));
        }

        Ok(())
    }

    /// Request timeout as a `Duration`.
    #[must_use]
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

/// Builder for [`AsanaConfig`].
#[derive(Default)]
pub struct AsanaConfigBuilder {
    token: Option<String>,
    base_url: Option<String>,
    page_size: Option<u32>,
    timeout_secs: Option<u64>,
    user_agent: Option<String>,
}

impl AsanaConfigBuilder {
    /// Sets the API token.
    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Overrides the API base URL.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Overrides the page size.
    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Overrides the request timeout.
    #[must_use]
    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Overrides the user agent.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `AsanaError::Config` if validation fails.
    pub fn build(self) -> AsanaResult<AsanaConfig> {
        let mut config = AsanaConfig::new(self.token.unwrap_or_default());
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(page_size) = self.page_size {
            config.page_size = page_size;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.timeout_secs = timeout_secs;
        }
        if let Some(user_agent) = self.user_agent {
            config.user_agent = user_agent;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = AsanaConfig::builder().token("pat-123").build().unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.page_size, MAX_PAGE_SIZE);
        assert_eq!(config.timeout_secs, 30);
        assert!(config.user_agent.starts_with("xavyo-connector-asana/"));
    }

    #[test]
    fn test_empty_token_rejected() {
        let err = AsanaConfig::builder().token("  ").build().unwrap_err();
        assert!(matches!(err, AsanaError::Config(ref m) if m == "token is required"));

        let err = AsanaConfig::builder().build().unwrap_err();
        assert!(matches!(err, AsanaError::Config(_)));
    }

    #[test]
    fn test_page_size_bounds() {
        assert!(AsanaConfig::builder()
            .token("t")
            .page_size(0)
            .build()
            .is_err());
        assert!(AsanaConfig::builder()
            .token("t")
            .page_size(101)
            .build()
            .is_err());
        assert!(AsanaConfig::builder()
            .token("t")
            .page_size(50)
            .build()
            .is_ok());
    }

    #[test]
    fn test_invalid_base_url() {
        let err = AsanaConfig::builder()
            .token("t")
            .base_url("not a url")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("invalid base_url"));

        let err = AsanaConfig::builder()
            .token("t")
            .base_url("ftp://app.asana.com")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("unsupported base_url scheme"));
    }

    #[test]
    fn test_token_not_leaked() {
        let config = AsanaConfig::new("super-secret-token");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret-token"));

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("super-secret-token"));
        assert!(json.contains("\"token\":\"***\""));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: AsanaConfig = serde_json::from_str(r#"{"token": "abc"}"#).unwrap();
        assert_eq!(config.token.expose_secret(), "abc");
        assert_eq!(config.page_size, MAX_PAGE_SIZE);
        assert!(config.validate().is_ok());
    }
}
