//! Identity provider abstraction.
//!
//! The external identity provider is a black box behind this trait. The
//! production implementation lives in `hillcrest-idp`; tests script the
//! trait directly.

use crate::error::AuthError;
use crate::identity::Identity;
use async_trait::async_trait;
use chrono::Duration;

/// Credentials minted by the provider when a session is established or
/// refreshed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderTokens {
    /// Short-lived bearer credential for backend calls.
    pub id_token: String,
    /// Long-lived credential used to re-derive the bearer token.
    pub refresh_token: String,
    /// How long the bearer token stays usable.
    pub expires_in: Duration,
}

impl ProviderTokens {
    /// Creates a token set.
    #[must_use]
    pub fn new(id_token: String, refresh_token: String, expires_in: Duration) -> Self {
        Self {
            id_token,
            refresh_token,
            expires_in,
        }
    }
}

/// A live provider session: the principal plus its credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSession {
    /// The signed-in principal.
    pub identity: Identity,
    /// Credentials for the session.
    pub tokens: ProviderTokens,
}

/// Operations the external identity provider supports.
///
/// Errors carry a specific [`AuthError`] reason for UI messaging. A failed
/// call never changes any local state; the [`SessionStore`](crate::SessionStore)
/// alone decides what becomes of a successful result.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Creates a new account and signs it in.
    async fn sign_up(&self, email: &str, password: &str) -> Result<ProviderSession, AuthError>;

    /// Signs in an existing account.
    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderSession, AuthError>;

    /// Signs in with a Google OAuth credential obtained from the
    /// interactive sign-in flow.
    async fn sign_in_with_google(&self, credential: &str) -> Result<ProviderSession, AuthError>;

    /// Re-derives a fresh bearer token from the refresh credential.
    async fn refresh(&self, refresh_token: &str) -> Result<ProviderTokens, AuthError>;

    /// Restores a session from a persisted refresh credential at startup.
    async fn restore(&self, refresh_token: &str) -> Result<ProviderSession, AuthError>;

    /// Updates the signed-in account's profile.
    ///
    /// Fields set to `None` are left unchanged. Returns the updated identity.
    async fn update_profile(
        &self,
        id_token: &str,
        display_name: Option<&str>,
        photo_url: Option<&str>,
    ) -> Result<Identity, AuthError>;

    /// Invalidates the refresh credential with the provider.
    ///
    /// Best-effort: the caller signs out locally whether or not this
    /// succeeds.
    async fn revoke(&self, refresh_token: &str) -> Result<(), AuthError>;
}
