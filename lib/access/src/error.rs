//! Error types for the access crate.
//!
//! - `AuthError`: authentication failures surfaced to the UI layer
//! - `RoleEndpointError`: transport-level failures of the role endpoint
//! - `RoleFetchError`: a role resolution attempt that was terminal for
//!   that call (the resolver degrades to the cached fallback instead of
//!   propagating this)

use std::fmt;

/// Errors from authentication operations.
///
/// Reasons map one-to-one to provider failure modes so the UI can show a
/// specific message. A failed operation never changes session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The supplied email address is not valid.
    InvalidEmail { email: String },
    /// The supplied password does not meet the provider's requirements.
    WeakPassword,
    /// An account already exists for this email address.
    EmailInUse { email: String },
    /// Unknown email or wrong password.
    InvalidCredentials,
    /// The account has been disabled by an administrator.
    UserDisabled,
    /// The interactive provider sign-in was abandoned before completing.
    SignInCancelled,
    /// The provider rejected the request for a reason we do not map.
    Provider { reason: String },
    /// The provider could not be reached.
    Network { details: String },
    /// A credential was requested while no identity is live.
    NotSignedIn,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEmail { email } => {
                write!(f, "invalid email address: {email}")
            }
            Self::WeakPassword => {
                write!(f, "password does not meet requirements")
            }
            Self::EmailInUse { email } => {
                write!(f, "an account already exists for {email}")
            }
            Self::InvalidCredentials => {
                write!(f, "invalid email or password")
            }
            Self::UserDisabled => {
                write!(f, "this account has been disabled")
            }
            Self::SignInCancelled => {
                write!(f, "sign-in was cancelled before completing")
            }
            Self::Provider { reason } => {
                write!(f, "identity provider error: {reason}")
            }
            Self::Network { details } => {
                write!(f, "could not reach the identity provider: {details}")
            }
            Self::NotSignedIn => {
                write!(f, "no identity is signed in")
            }
        }
    }
}

impl std::error::Error for AuthError {}

/// Transport-level failures of the backend role endpoint.
///
/// `Unauthorized` is distinguished because it drives the retry-once-with-
/// fresh-token policy in the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleEndpointError {
    /// The backend rejected the bearer credential (HTTP 401).
    Unauthorized,
    /// Any other non-2xx response.
    Http { status: u16 },
    /// The backend could not be reached.
    Network { details: String },
    /// The response body was not the expected shape.
    Malformed { details: String },
}

impl fmt::Display for RoleEndpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthorized => {
                write!(f, "role endpoint rejected the bearer credential")
            }
            Self::Http { status } => {
                write!(f, "role endpoint returned HTTP {status}")
            }
            Self::Network { details } => {
                write!(f, "could not reach the role endpoint: {details}")
            }
            Self::Malformed { details } => {
                write!(f, "role endpoint returned an unexpected body: {details}")
            }
        }
    }
}

impl std::error::Error for RoleEndpointError {}

/// A terminal failure of one role resolution attempt.
///
/// The resolver recovers from this by degrading to the cached fallback; it
/// is logged for diagnostics rather than propagated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleFetchError {
    /// Could not obtain a bearer credential.
    Token(AuthError),
    /// The endpoint call (including its single retry) failed.
    Endpoint(RoleEndpointError),
}

impl fmt::Display for RoleFetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(err) => write!(f, "failed to obtain bearer credential: {err}"),
            Self::Endpoint(err) => write!(f, "role fetch failed: {err}"),
        }
    }
}

impl std::error::Error for RoleFetchError {}

impl From<AuthError> for RoleFetchError {
    fn from(err: AuthError) -> Self {
        Self::Token(err)
    }
}

impl From<RoleEndpointError> for RoleFetchError {
    fn from(err: RoleEndpointError) -> Self {
        Self::Endpoint(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_error_invalid_email_display() {
        let err = AuthError::InvalidEmail {
            email: "not-an-email".to_string(),
        };
        assert!(err.to_string().contains("invalid email"));
        assert!(err.to_string().contains("not-an-email"));
    }

    #[test]
    fn auth_error_email_in_use_display() {
        let err = AuthError::EmailInUse {
            email: "alice@example.com".to_string(),
        };
        assert!(err.to_string().contains("alice@example.com"));
    }

    #[test]
    fn auth_error_network_display() {
        let err = AuthError::Network {
            details: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn role_endpoint_error_http_display() {
        let err = RoleEndpointError::Http { status: 503 };
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn role_fetch_error_wraps_token_failure() {
        let err = RoleFetchError::from(AuthError::NotSignedIn);
        assert!(err.to_string().contains("bearer credential"));
    }

    #[test]
    fn role_fetch_error_wraps_endpoint_failure() {
        let err = RoleFetchError::from(RoleEndpointError::Unauthorized);
        assert!(err.to_string().contains("role fetch failed"));
    }
}
