//! Role resolver: maps a live identity to an authorization role.
//!
//! One backend call, one retry with a forced token refresh if the backend
//! rejects the bearer credential, then degrade to the cached fallback. The
//! resolver never leaves the caller without an answer: an authenticated
//! identity always resolves to at least `Stale(User)`.

use crate::cache::RoleCache;
use crate::error::{RoleEndpointError, RoleFetchError};
use crate::role::{Role, RoleResolution};
use crate::store::SessionStore;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// The backend endpoint that reports the role for a bearer credential.
///
/// Implemented by the backend API client; tests script it directly.
#[async_trait]
pub trait RoleEndpoint: Send + Sync {
    /// Fetches the raw role tag for the given bearer credential.
    async fn fetch_role(&self, bearer: &str) -> Result<String, RoleEndpointError>;
}

/// Resolves the authorization role for the session's live identity.
pub struct RoleResolver {
    store: Arc<SessionStore>,
    endpoint: Arc<dyn RoleEndpoint>,
    cache: Arc<dyn RoleCache>,
}

impl RoleResolver {
    /// Creates a resolver over the given session and endpoint.
    ///
    /// The cache should be the same instance the session store clears on
    /// sign-out.
    #[must_use]
    pub fn new(
        store: Arc<SessionStore>,
        endpoint: Arc<dyn RoleEndpoint>,
        cache: Arc<dyn RoleCache>,
    ) -> Self {
        Self {
            store,
            endpoint,
            cache,
        }
    }

    /// Resolves the current role.
    pub async fn resolve(&self) -> RoleResolution {
        self.resolve_with(false).await
    }

    /// Resolves the current role, optionally forcing a fresh bearer token
    /// for the first attempt.
    #[instrument(skip(self))]
    pub async fn resolve_with(&self, force_fresh_token: bool) -> RoleResolution {
        let Some(identity) = self.store.identity() else {
            return RoleResolution::Unresolved;
        };
        let generation = self.store.generation();

        match self.attempt(force_fresh_token).await {
            Ok(raw) => {
                let role = Role::from_wire(&raw);
                debug!(role = %role, "role resolved");
                // A resolution that outlived its session must not write the
                // fallback back into existence.
                if self.store.generation() == generation {
                    self.cache.store(identity.uid(), role);
                }
                RoleResolution::Fresh(role)
            }
            Err(err) => {
                warn!(error = %err, "role fetch failed; degrading to cached fallback");
                let fallback = self
                    .cache
                    .load(identity.uid())
                    .unwrap_or(Role::User);
                RoleResolution::Stale(fallback)
            }
        }
    }

    /// One fetch, with exactly one retry on a rejected bearer credential.
    async fn attempt(&self, force_fresh_token: bool) -> Result<String, RoleFetchError> {
        let token = self.store.get_token(force_fresh_token).await?;
        match self.endpoint.fetch_role(&token).await {
            Ok(raw) => Ok(raw),
            Err(RoleEndpointError::Unauthorized) => {
                debug!("bearer credential rejected; retrying once with forced refresh");
                let token = self.store.get_token(true).await?;
                Ok(self.endpoint.fetch_role(&token).await?)
            }
            Err(err) => Err(err.into()),
        }
    }
}
