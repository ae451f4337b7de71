//! SDK error type.

use passage_api::ApiError;
use passage_auth::AuthError;
use thiserror::Error;

/// A result type using the SDK `Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the Passage SDK.
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration is incomplete or invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Token validation or key retrieval failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A management API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl Error {
    /// Returns the auth error, if this is one.
    #[must_use]
    pub const fn as_auth(&self) -> Option<&AuthError> {
        match self {
            Self::Auth(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the API error, if this is one.
    #[must_use]
    pub const fn as_api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }
}
