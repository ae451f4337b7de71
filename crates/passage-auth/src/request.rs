//! Token extraction from incoming HTTP requests.
//!
//! Passage front-ends send the session token either as a bearer token or in
//! the `psg_auth_token` cookie. [`AuthStrategy`] selects where to look.

use std::fmt;
use std::str::FromStr;

use reqwest::header::{HeaderMap, AUTHORIZATION, COOKIE};
use serde::Deserialize;

use crate::error::{AuthError, Result};
use crate::jwt::{TokenValidator, ValidatedClaims};

/// Name of the cookie Passage Elements store the session token in.
pub const AUTH_COOKIE_NAME: &str = "psg_auth_token";

/// Where to look for the session token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStrategy {
    /// `Authorization: Bearer <token>` only.
    Header,
    /// The `psg_auth_token` cookie only.
    Cookie,
    /// The header first, then the cookie.
    #[default]
    HeaderThenCookie,
}

impl fmt::Display for AuthStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Header => "header",
            Self::Cookie => "cookie",
            Self::HeaderThenCookie => "header_then_cookie",
        })
    }
}

impl FromStr for AuthStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "header" => Ok(Self::Header),
            "cookie" => Ok(Self::Cookie),
            "header_then_cookie" => Ok(Self::HeaderThenCookie),
            other => Err(format!(
                "unknown auth strategy {other:?}, expected header, cookie or header_then_cookie"
            )),
        }
    }
}

/// Extract the bearer token from the `Authorization` header.
///
/// The header must be exactly two whitespace-separated fields with the
/// `Bearer` scheme.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let mut fields = value.split_whitespace();
    match (fields.next(), fields.next(), fields.next()) {
        (Some("Bearer"), Some(token), None) => Some(token),
        _ => None,
    }
}

/// Extract the session token from the `psg_auth_token` cookie.
#[must_use]
pub fn cookie_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == AUTH_COOKIE_NAME)
        .map(|(_, token)| token)
}

/// Extract the session token according to `strategy`.
///
/// # Errors
///
/// Returns `MissingToken` if no token is present where the strategy looks.
pub fn token_from_headers(headers: &HeaderMap, strategy: AuthStrategy) -> Result<&str> {
    let token = match strategy {
        AuthStrategy::Header => bearer_token(headers),
        AuthStrategy::Cookie => cookie_token(headers),
        AuthStrategy::HeaderThenCookie => bearer_token(headers).or_else(|| cookie_token(headers)),
    };

    token.ok_or_else(|| {
        AuthError::MissingToken(match strategy {
            AuthStrategy::Header => "expected \"Authorization: Bearer\" header".to_string(),
            AuthStrategy::Cookie => format!("expected {AUTH_COOKIE_NAME:?} cookie"),
            AuthStrategy::HeaderThenCookie => {
                format!("expected \"Authorization: Bearer\" header or {AUTH_COOKIE_NAME:?} cookie")
            }
        })
    })
}

/// Extract the session token from `headers` and validate it.
///
/// # Errors
///
/// Returns `MissingToken` if no token is present, or any validation error.
pub async fn authenticate_request<V>(
    validator: &V,
    headers: &HeaderMap,
    strategy: AuthStrategy,
    expected_audience: &str,
) -> Result<ValidatedClaims>
where
    V: TokenValidator + ?Sized,
{
    let token = token_from_headers(headers, strategy)?;
    validator.validate(token, expected_audience).await
}
