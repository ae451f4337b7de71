//! JWT validation and claims extraction.
//!
//! This module provides the core JWT validation logic: key resolution through
//! the JWKS cache, algorithm and signature verification, time-based claims,
//! audience, and subject extraction.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde::Deserialize;

use passage_core::{IdError, UserId};

use crate::error::{AuthError, Result};
use crate::jwks::JwksCache;
use crate::AuthConfig;

/// Validated claims extracted from a JWT.
#[derive(Debug, Clone)]
pub struct ValidatedClaims {
    /// The Passage user ID from the `sub` claim.
    pub user_id: UserId,
    /// Every audience the token was issued for.
    pub audience: Vec<String>,
    /// When the token expires.
    pub expires_at: DateTime<Utc>,
    /// When the token becomes valid, if it says.
    pub not_before: Option<DateTime<Utc>>,
    /// When the token was issued, if it says.
    pub issued_at: Option<DateTime<Utc>>,
}

/// Trait for validating JWTs.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    /// Validate a JWT issued for `expected_audience` and extract its claims.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is invalid, expired, issued for another
    /// audience, or cannot be validated.
    async fn validate(&self, token: &str, expected_audience: &str) -> Result<ValidatedClaims>;
}

/// Claims as they appear in the token, before validation.
#[derive(Debug, Deserialize)]
struct RawClaims {
    /// Checked for type here rather than by serde.
    #[serde(default)]
    sub: Option<serde_json::Value>,
    #[serde(default)]
    aud: Option<serde_json::Value>,
    /// Presence and expiry are enforced by jsonwebtoken.
    #[serde(default)]
    exp: Option<i64>,
    #[serde(default)]
    nbf: Option<i64>,
    #[serde(default)]
    iat: Option<i64>,
}

/// Every audience named by an `aud` claim. A claim that is neither a string
/// nor an array of strings names none.
fn audiences(aud: Option<serde_json::Value>) -> Vec<String> {
    match aud {
        Some(serde_json::Value::String(s)) => vec![s],
        Some(serde_json::Value::Array(values)) => values
            .into_iter()
            .map(|v| match v {
                serde_json::Value::String(s) => Some(s),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

const fn is_symmetric(alg: Algorithm) -> bool {
    matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
}

fn timestamp(secs: i64, claim: &str) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| AuthError::MalformedToken(format!("invalid {claim} timestamp")))
}

/// JWKS-based JWT validator.
///
/// Resolves signing keys from a [`JwksCache`] and accepts only asymmetric
/// algorithms that match the resolved key. Holds no per-token state.
///
/// The `sub` claim must be a valid [`UserId`]; any other string is reported
/// as `MalformedToken`.
#[derive(Debug, Clone)]
pub struct JwksValidator {
    cache: Arc<JwksCache>,
    jwks_url: String,
    leeway_seconds: u64,
    issuer: Option<String>,
}

impl JwksValidator {
    /// Create a validator over an existing cache.
    ///
    /// The JWKS URL from `config` is registered but not fetched; use
    /// [`JwksValidator::connect`] to fail fast on an unreachable endpoint.
    ///
    /// # Errors
    ///
    /// Returns `SourceUnreachable` if the JWKS URL cannot be parsed.
    pub fn new(config: &AuthConfig, cache: Arc<JwksCache>) -> Result<Self> {
        let jwks_url = config.jwks_url();
        cache.register(&jwks_url)?;

        Ok(Self {
            cache,
            jwks_url,
            leeway_seconds: config.leeway_seconds,
            issuer: config.issuer.clone(),
        })
    }

    /// Create a validator with its own cache and fetch the key set eagerly.
    ///
    /// # Errors
    ///
    /// Returns `FetchFailed` if the initial JWKS fetch fails; no validator is
    /// returned in that case.
    pub async fn connect(config: &AuthConfig) -> Result<Self> {
        let cache = Arc::new(JwksCache::new(config.jwks_timeout())?);
        let validator = Self::new(config, cache)?;
        validator.cache.refresh(&validator.jwks_url).await?;
        Ok(validator)
    }

    /// The cache backing this validator.
    #[must_use]
    pub const fn cache(&self) -> &Arc<JwksCache> {
        &self.cache
    }

    /// The JWKS URL keys are resolved from.
    #[must_use]
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    fn validation(&self, alg: Algorithm) -> Validation {
        let mut validation = Validation::new(alg);
        validation.leeway = self.leeway_seconds;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        // Audience is checked after decoding since it can be string or array.
        validation.validate_aud = false;
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }
        validation
    }
}

#[async_trait]
impl TokenValidator for JwksValidator {
    async fn validate(&self, token: &str, expected_audience: &str) -> Result<ValidatedClaims> {
        if token.trim().is_empty() {
            return Err(AuthError::EmptyToken);
        }

        let header = decode_header(token).map_err(|e| AuthError::MalformedToken(e.to_string()))?;
        let kid = header.kid.ok_or(AuthError::MalformedHeader)?;

        let key = self.cache.resolve_key(&self.jwks_url, &kid).await?;

        if is_symmetric(header.alg) || !key.accepts(header.alg) {
            tracing::debug!(kid = %kid, alg = ?header.alg, "Rejected token algorithm");
            return Err(AuthError::InvalidSignature);
        }

        let token_data = decode::<RawClaims>(token, key.decoding_key(), &self.validation(header.alg))
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                ErrorKind::ImmatureSignature => AuthError::NotYetValid,
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidEcdsaKey
                | ErrorKind::InvalidRsaKey(_)
                | ErrorKind::InvalidKeyFormat => AuthError::InvalidSignature,
                ErrorKind::InvalidIssuer => AuthError::IssuerMismatch,
                ErrorKind::MissingRequiredClaim(claim) => AuthError::MissingClaim(claim.clone()),
                _ => AuthError::MalformedToken(e.to_string()),
            })?;

        let claims = token_data.claims;

        let audience = audiences(claims.aud);
        if !audience.iter().any(|aud| aud == expected_audience) {
            return Err(AuthError::AudienceMismatch);
        }
        let exp = claims.exp.ok_or_else(|| AuthError::MissingClaim("exp".to_string()))?;

        let user_id = match claims.sub {
            Some(serde_json::Value::String(sub)) => UserId::from_str(&sub).map_err(|e| match e {
                IdError::Empty => AuthError::MissingSubject,
                other => AuthError::MalformedToken(format!("invalid sub: {other}")),
            })?,
            _ => return Err(AuthError::MissingSubject),
        };

        Ok(ValidatedClaims {
            user_id,
            audience,
            expires_at: timestamp(exp, "exp")?,
            not_before: claims.nbf.map(|nbf| timestamp(nbf, "nbf")).transpose()?,
            issued_at: claims.iat.map(|iat| timestamp(iat, "iat")).transpose()?,
        })
    }
}

/// A mock token validator for testing.
///
/// Accepts tokens in the format `test-token:<user_id>` or
/// `test-token:<user_id>:<audience>`. A token naming an audience must name
/// the expected one.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default)]
pub struct MockTokenValidator;

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl TokenValidator for MockTokenValidator {
    async fn validate(&self, token: &str, expected_audience: &str) -> Result<ValidatedClaims> {
        if token.is_empty() {
            return Err(AuthError::EmptyToken);
        }

        let rest = token.strip_prefix("test-token:").ok_or_else(|| {
            AuthError::MalformedToken("expected test-token:<user_id>[:<audience>]".to_string())
        })?;

        let (user, audience) = match rest.split_once(':') {
            Some((user, audience)) => (user, audience),
            None => (rest, expected_audience),
        };
        if audience != expected_audience {
            return Err(AuthError::AudienceMismatch);
        }

        let user_id = UserId::from_str(user).map_err(|_| AuthError::MissingSubject)?;

        Ok(ValidatedClaims {
            user_id,
            audience: vec![audience.to_string()],
            expires_at: Utc::now() + chrono::Duration::hours(1),
            not_before: None,
            issued_at: Some(Utc::now()),
        })
    }
}
