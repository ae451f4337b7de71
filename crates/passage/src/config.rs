//! SDK configuration.

use std::time::Duration;

use passage_api::{ApiConfig, DEFAULT_API_BASE_URL};
use passage_auth::{AuthConfig, AuthStrategy, DEFAULT_AUTH_BASE_URL};
use passage_core::AppId;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Configuration for a [`Passage`](crate::Passage) client.
#[derive(Clone, Deserialize)]
pub struct PassageConfig {
    /// Passage app ID.
    pub app_id: String,

    /// API key for management operations.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Where request authentication looks for the session token.
    #[serde(default)]
    pub auth_strategy: AuthStrategy,

    /// Base URL of the management API.
    #[serde(default = "PassageConfig::default_api_base_url")]
    pub api_base_url: String,

    /// Base URL of the authentication service serving the JWKS.
    #[serde(default = "PassageConfig::default_auth_base_url")]
    pub auth_base_url: String,

    /// Management request timeout in seconds.
    #[serde(default = "PassageConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// JWKS fetch timeout in seconds.
    #[serde(default = "PassageConfig::default_jwks_timeout")]
    pub jwks_timeout_seconds: u64,

    /// Clock skew tolerated on `exp` and `nbf`, in seconds.
    #[serde(default)]
    pub leeway_seconds: u64,

    /// Background JWKS refresh interval in seconds. Unset disables it.
    #[serde(default)]
    pub jwks_refresh_seconds: Option<u64>,
}

impl PassageConfig {
    fn default_api_base_url() -> String {
        DEFAULT_API_BASE_URL.to_string()
    }

    fn default_auth_base_url() -> String {
        DEFAULT_AUTH_BASE_URL.to_string()
    }

    const fn default_request_timeout() -> u64 {
        30
    }

    const fn default_jwks_timeout() -> u64 {
        10
    }

    /// Create a configuration for `app_id` with default settings.
    #[must_use]
    pub fn new(app_id: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            app_id: app_id.into(),
            api_key,
            auth_strategy: AuthStrategy::default(),
            api_base_url: Self::default_api_base_url(),
            auth_base_url: Self::default_auth_base_url(),
            request_timeout_seconds: Self::default_request_timeout(),
            jwks_timeout_seconds: Self::default_jwks_timeout(),
            leeway_seconds: 0,
            jwks_refresh_seconds: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Reads `PASSAGE_APP_ID` (required), `PASSAGE_API_KEY`,
    /// `PASSAGE_AUTH_STRATEGY`, `PASSAGE_API_URL` and `PASSAGE_AUTH_URL`.
    ///
    /// # Errors
    ///
    /// Returns `Config` if `PASSAGE_APP_ID` is unset or the strategy is unknown.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let app_id = lookup("PASSAGE_APP_ID")
            .ok_or_else(|| Error::Config("PASSAGE_APP_ID is not set".to_string()))?;
        let mut config = Self::new(app_id, lookup("PASSAGE_API_KEY"));

        if let Some(strategy) = lookup("PASSAGE_AUTH_STRATEGY") {
            config.auth_strategy = strategy
                .parse()
                .map_err(|e| Error::Config(format!("PASSAGE_AUTH_STRATEGY: {e}")))?;
        }
        if let Some(url) = lookup("PASSAGE_API_URL") {
            config.api_base_url = url;
        }
        if let Some(url) = lookup("PASSAGE_AUTH_URL") {
            config.auth_base_url = url;
        }
        Ok(config)
    }

    /// Parse the configured app ID.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the app ID is empty or malformed.
    pub fn parsed_app_id(&self) -> Result<AppId> {
        if self.app_id.is_empty() {
            return Err(Error::Config("a Passage app ID is required".to_string()));
        }
        self.app_id
            .parse()
            .map_err(|e| Error::Config(format!("invalid app ID {:?}: {e}", self.app_id)))
    }

    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Token validation settings for `app_id`.
    #[must_use]
    pub fn auth_config(&self, app_id: AppId) -> AuthConfig {
        let mut config = AuthConfig::new(app_id);
        config.auth_base_url.clone_from(&self.auth_base_url);
        config.jwks_timeout_seconds = self.jwks_timeout_seconds;
        config.leeway_seconds = self.leeway_seconds;
        config.jwks_refresh_seconds = self.jwks_refresh_seconds;
        config.strategy = self.auth_strategy;
        config
    }

    /// Management API settings.
    #[must_use]
    pub fn api_config(&self) -> ApiConfig {
        let mut config = ApiConfig::new(self.api_key.clone());
        config.base_url.clone_from(&self.api_base_url);
        config.request_timeout_seconds = self.request_timeout_seconds;
        config
    }
}

impl std::fmt::Debug for PassageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassageConfig")
            .field("app_id", &self.app_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("auth_strategy", &self.auth_strategy)
            .field("api_base_url", &self.api_base_url)
            .field("auth_base_url", &self.auth_base_url)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("jwks_timeout_seconds", &self.jwks_timeout_seconds)
            .field("leeway_seconds", &self.leeway_seconds)
            .field("jwks_refresh_seconds", &self.jwks_refresh_seconds)
            .finish()
    }
}
