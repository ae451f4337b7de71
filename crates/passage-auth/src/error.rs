//! Authentication error types.

use thiserror::Error;

/// A result type using `AuthError`.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur while fetching keys or validating a token.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The token string is empty.
    #[error("token is empty")]
    EmptyToken,

    /// No token was found in the request.
    #[error("missing authentication token: {0}")]
    MissingToken(String),

    /// The token is not a well-formed compact JWT.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// The token header does not carry a `kid`.
    #[error("malformed header: missing kid")]
    MalformedHeader,

    /// The key ID is not in the key set, even after a refresh.
    #[error("unknown key ID: {0}")]
    UnknownKeyId(String),

    /// The signature does not verify, or the declared algorithm is not acceptable.
    #[error("invalid signature")]
    InvalidSignature,

    /// The token `exp` is in the past.
    #[error("token expired")]
    Expired,

    /// The token `nbf` is in the future.
    #[error("token not yet valid")]
    NotYetValid,

    /// The `aud` claim does not contain the expected application.
    #[error("audience mismatch")]
    AudienceMismatch,

    /// The `iss` claim does not match the configured issuer.
    #[error("issuer mismatch")]
    IssuerMismatch,

    /// The `sub` claim is absent or not a string.
    #[error("missing subject")]
    MissingSubject,

    /// A required claim is missing from the token.
    #[error("missing required claim: {0}")]
    MissingClaim(String),

    /// The JWKS source could not be registered.
    #[error("JWKS source unreachable: {0}")]
    SourceUnreachable(String),

    /// Failed to fetch or parse the JWKS document.
    #[error("JWKS fetch failed: {0}")]
    FetchFailed(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Returns `true` if the failure came from talking to the JWKS endpoint
    /// rather than from the token itself.
    #[must_use]
    pub const fn is_fetch_failure(&self) -> bool {
        matches!(self, Self::FetchFailed(_) | Self::SourceUnreachable(_))
    }

    /// Returns the HTTP status code a server should answer with for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::EmptyToken
            | Self::MissingToken(_)
            | Self::MalformedToken(_)
            | Self::MalformedHeader
            | Self::UnknownKeyId(_)
            | Self::InvalidSignature
            | Self::Expired
            | Self::NotYetValid
            | Self::AudienceMismatch
            | Self::IssuerMismatch
            | Self::MissingSubject
            | Self::MissingClaim(_) => 401,
            Self::SourceUnreachable(_) | Self::FetchFailed(_) => 503,
            Self::Internal(_) => 500,
        }
    }
}
