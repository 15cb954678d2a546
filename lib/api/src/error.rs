//! Error types for the backend API client.

use std::fmt;

/// Errors from backend REST calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend rejected the bearer credential (HTTP 401).
    Unauthorized,
    /// The requested resource does not exist (HTTP 404).
    NotFound { resource: String },
    /// Any other non-2xx response.
    RequestFailed { status: u16, body: String },
    /// The backend could not be reached.
    Network { details: String },
    /// The response body was not the expected shape.
    Decode { details: String },
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthorized => {
                write!(f, "backend rejected the bearer credential")
            }
            Self::NotFound { resource } => {
                write!(f, "not found: {resource}")
            }
            Self::RequestFailed { status, body } => {
                write!(f, "backend returned HTTP {status}: {body}")
            }
            Self::Network { details } => {
                write!(f, "could not reach the backend: {details}")
            }
            Self::Decode { details } => {
                write!(f, "backend returned an unexpected body: {details}")
            }
        }
    }
}

impl std::error::Error for BackendError {}
