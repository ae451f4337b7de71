//! Management API error types.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

/// A result type using `ApiError`.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Longest response body kept in `UnexpectedStatus`.
const MAX_ERROR_BODY: usize = 512;

/// An error reported by the Passage API itself.
///
/// Carries the HTTP status together with Passage's machine-readable code and
/// human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassageError {
    /// Human-readable message.
    pub message: String,
    /// Machine-readable error code (e.g., `user_not_found`).
    pub error_code: String,
    /// HTTP status code of the response.
    pub status_code: u16,
}

/// Broad category of a [`PassageError`], derived from its status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 400: the request was rejected as invalid.
    BadRequest,
    /// 401: the API key is missing or invalid.
    Unauthorized,
    /// 403: the API key may not perform this operation.
    Forbidden,
    /// 404: the resource does not exist.
    NotFound,
    /// 409: the request conflicts with existing state.
    Conflict,
    /// 5xx: the service failed.
    Server,
    /// Any other status.
    Other,
}

impl PassageError {
    /// Categorize this error by its status code.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self.status_code {
            400 => ErrorKind::BadRequest,
            401 => ErrorKind::Unauthorized,
            403 => ErrorKind::Forbidden,
            404 => ErrorKind::NotFound,
            409 => ErrorKind::Conflict,
            500..=599 => ErrorKind::Server,
            _ => ErrorKind::Other,
        }
    }
}

impl fmt::Display for PassageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(3);
        if !self.message.is_empty() {
            parts.push(format!("message: {}", self.message));
        }
        if !self.error_code.is_empty() {
            parts.push(format!("errorCode: {}", self.error_code));
        }
        if self.status_code != 0 {
            parts.push(format!("statusCode: {}", self.status_code));
        }
        write!(f, "PassageError - {}", parts.join(", "))
    }
}

impl std::error::Error for PassageError {}

/// Error body returned by the Passage API.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub code: String,
    pub error: String,
}

/// Errors that can occur calling the management API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or the response could not be read.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a Passage error.
    #[error(transparent)]
    Passage(#[from] PassageError),

    /// The API answered with a status and body of no known shape.
    #[error("unexpected response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// A success response did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// No API key is configured.
    #[error("a Passage API key is required for management operations")]
    MissingApiKey,

    /// The client configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ApiError {
    /// The HTTP status of the response that caused this error, if any.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Passage(err) => Some(err.status_code),
            Self::UnexpectedStatus { status, .. } => Some(*status),
            Self::Transport(err) => err.status().map(|s| s.as_u16()),
            Self::Decode(_) | Self::MissingApiKey | Self::InvalidConfig(_) => None,
        }
    }

    /// Returns `true` if the API reported the resource as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Passage(err) if err.kind() == ErrorKind::NotFound)
    }

    /// Build the error for a non-2xx response body.
    pub(crate) fn from_body(status: u16, body: &[u8]) -> Self {
        match serde_json::from_slice::<ErrorBody>(body) {
            Ok(err) => Self::Passage(PassageError {
                message: err.error,
                error_code: err.code,
                status_code: status,
            }),
            Err(_) => {
                let mut body = String::from_utf8_lossy(body).into_owned();
                if body.len() > MAX_ERROR_BODY {
                    let mut end = MAX_ERROR_BODY;
                    while !body.is_char_boundary(end) {
                        end -= 1;
                    }
                    body.truncate(end);
                }
                Self::UnexpectedStatus { status, body }
            }
        }
    }
}
