//! JWT authentication for Passage.
//!
//! This crate validates Passage session tokens locally, including:
//!
//! - JWKS (JSON Web Key Set) fetching and caching, with one refresh on an
//!   unknown `kid` to follow key rotation
//! - RSA, ECDSA and Ed25519 signature validation, symmetric algorithms rejected
//! - Expiry, not-before and audience checks
//! - Token extraction from request headers and cookies
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐
//! │   Application    │────▶│  TokenValidator  │
//! │   (HTTP server)  │     │  (trait)         │
//! └──────────────────┘     └────────┬─────────┘
//!                                   │
//!                          ┌────────▼─────────┐
//!                          │  JwksValidator   │
//!                          │  (impl)          │
//!                          └────────┬─────────┘
//!                                   │
//!                          ┌────────▼─────────┐
//!                          │  JwksCache       │
//!                          │  (key cache)     │
//!                          └────────┬─────────┘
//!                                   │ HTTPS
//!                          ┌────────▼─────────┐
//!                          │   Passage        │
//!                          │   JWKS endpoint  │
//!                          └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use passage_auth::{AuthConfig, JwksValidator, TokenValidator};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AuthConfig::new("KZ520QJSiFRLvbBvraaAgYuf".parse()?);
//!
//! // Fetches the key set before returning.
//! let validator = JwksValidator::connect(&config).await?;
//!
//! // In a request handler:
//! let token = "eyJhbGciOiJSUzI1NiIsImtpZCI6...";
//! let claims = validator.validate(token, config.audience()).await?;
//!
//! println!("User ID: {}", claims.user_id);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::time::Duration;

use passage_core::AppId;

pub mod error;
pub mod jwks;
pub mod jwt;
pub mod request;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use error::{AuthError, Result};
pub use jwks::{JwksCache, SigningKey, SigningKeySet};
pub use jwt::{JwksValidator, TokenValidator, ValidatedClaims};
pub use request::{authenticate_request, token_from_headers, AuthStrategy, AUTH_COOKIE_NAME};

#[cfg(any(test, feature = "test-utils"))]
pub use jwt::MockTokenValidator;

/// Default base URL of the Passage authentication service.
pub const DEFAULT_AUTH_BASE_URL: &str = "https://auth.passage.id";

/// Configuration for validating Passage tokens.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// The Passage app tokens must be issued for.
    pub app_id: AppId,
    /// Base URL of the authentication service (e.g., `https://auth.passage.id`).
    pub auth_base_url: String,
    /// Timeout for a JWKS fetch, in seconds.
    pub jwks_timeout_seconds: u64,
    /// Clock skew tolerated on `exp` and `nbf`, in seconds.
    pub leeway_seconds: u64,
    /// Expected `iss` claim, if it should be checked.
    pub issuer: Option<String>,
    /// How often to refresh the JWKS in the background, in seconds.
    ///
    /// `None` refreshes only when a token names an unknown key.
    pub jwks_refresh_seconds: Option<u64>,
    /// Where request authentication looks for the token.
    pub strategy: AuthStrategy,
}

impl AuthConfig {
    /// Create a configuration for `app_id` with default settings.
    #[must_use]
    pub fn new(app_id: AppId) -> Self {
        Self {
            app_id,
            auth_base_url: DEFAULT_AUTH_BASE_URL.to_string(),
            jwks_timeout_seconds: 10,
            leeway_seconds: 0,
            issuer: None,
            jwks_refresh_seconds: None,
            strategy: AuthStrategy::default(),
        }
    }

    /// Get the JWKS endpoint URL.
    #[must_use]
    pub fn jwks_url(&self) -> String {
        format!(
            "{}/v1/apps/{}/.well-known/jwks.json",
            self.auth_base_url.trim_end_matches('/'),
            self.app_id
        )
    }

    /// The audience tokens must carry.
    #[must_use]
    pub fn audience(&self) -> &str {
        self.app_id.as_str()
    }

    /// Get the JWKS fetch timeout as a `Duration`.
    #[must_use]
    pub const fn jwks_timeout(&self) -> Duration {
        Duration::from_secs(self.jwks_timeout_seconds)
    }

    /// Get the background refresh interval, if any.
    #[must_use]
    pub fn jwks_refresh_interval(&self) -> Option<Duration> {
        self.jwks_refresh_seconds.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig::new("KZ520QJSiFRLvbBvraaAgYuf".parse().unwrap())
    }

    #[test]
    fn default_config() {
        let config = config();
        assert_eq!(config.auth_base_url, "https://auth.passage.id");
        assert_eq!(config.jwks_timeout(), Duration::from_secs(10));
        assert_eq!(config.leeway_seconds, 0);
        assert!(config.issuer.is_none());
        assert!(config.jwks_refresh_interval().is_none());
        assert_eq!(config.strategy, AuthStrategy::HeaderThenCookie);
    }

    #[test]
    fn config_urls() {
        let mut config = config();
        assert_eq!(
            config.jwks_url(),
            "https://auth.passage.id/v1/apps/KZ520QJSiFRLvbBvraaAgYuf/.well-known/jwks.json"
        );
        assert_eq!(config.audience(), "KZ520QJSiFRLvbBvraaAgYuf");

        config.auth_base_url = "http://127.0.0.1:9000/".to_string();
        assert_eq!(
            config.jwks_url(),
            "http://127.0.0.1:9000/v1/apps/KZ520QJSiFRLvbBvraaAgYuf/.well-known/jwks.json"
        );
    }
}
