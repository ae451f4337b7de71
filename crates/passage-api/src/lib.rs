//! Typed client for the Passage management API.
//!
//! Management operations require an API key, sent as a bearer token together
//! with a `Passage-Version` header on every request.
//!
//! Non-success responses become [`ApiError::Passage`] when the body is a
//! Passage error document (`{"code": ..., "error": ...}`) and
//! [`ApiError::UnexpectedStatus`] otherwise.
//!
//! # Example
//!
//! ```no_run
//! use passage_api::{ApiClient, ApiConfig, Users};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::new(&ApiConfig::new(Some("api-key".to_string())))?;
//! let users = Users::new(client, "KZ520QJSiFRLvbBvraaAgYuf".parse()?);
//!
//! let user = users.get_by_identifier("user@example.com").await?;
//! println!("{} is {:?}", user.id, user.status);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::time::Duration;

pub mod apps;
pub mod client;
pub mod error;
pub mod magic_links;
pub mod types;
pub mod users;

pub use apps::Apps;
pub use client::{ApiClient, PASSAGE_VERSION, PASSAGE_VERSION_HEADER};
pub use error::{ApiError, ErrorKind, PassageError, Result};
pub use magic_links::MagicLinks;
pub use types::{
    AppInfo, CreateMagicLinkArgs, CreateUserArgs, MagicLink, MagicLinkChannel, MagicLinkType,
    UpdateUserArgs, User, UserEvent, UserStatus, UserSummary, WebAuthnDevice,
};
pub use users::Users;

/// Default base URL of the management API.
pub const DEFAULT_API_BASE_URL: &str = "https://api.passage.id/v1";

/// Management API client configuration.
#[derive(Clone)]
pub struct ApiConfig {
    /// Base URL of the API (e.g., `https://api.passage.id/v1`).
    pub base_url: String,
    /// API key. Management calls fail with `MissingApiKey` without one.
    pub api_key: Option<String>,
    /// Total timeout for a request, in seconds.
    pub request_timeout_seconds: u64,
    /// Timeout for establishing a connection, in seconds.
    pub connect_timeout_seconds: u64,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("connect_timeout_seconds", &self.connect_timeout_seconds)
            .finish()
    }
}

impl ApiConfig {
    /// Create a configuration with default URL and timeouts.
    #[must_use]
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key,
            request_timeout_seconds: 30,
            connect_timeout_seconds: 5,
        }
    }

    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Get the connect timeout as a `Duration`.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ApiConfig::new(None);
        assert_eq!(config.base_url, "https://api.passage.id/v1");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn version_header_names_sdk() {
        assert!(PASSAGE_VERSION.starts_with("passage-rust "));
    }

    #[test]
    fn debug_redacts_key() {
        let debug = format!("{:?}", ApiConfig::new(Some("secret".to_string())));
        assert!(!debug.contains("secret"));
    }
}
