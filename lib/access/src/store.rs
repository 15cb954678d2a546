//! Session store: owns the authentication lifecycle.
//!
//! The store is the single owner of the current [`Identity`]. It wraps the
//! external identity provider, caches the short-lived bearer token, and
//! notifies subscribers on every identity transition through a watch
//! channel. Sign-out clears all local state (identity, token cache, cached
//! role fallback) before subscribers observe the transition, so a guard
//! re-evaluating concurrently never sees a half-cleared session.

use crate::cache::RoleCache;
use crate::error::AuthError;
use crate::identity::Identity;
use crate::provider::{IdentityProvider, ProviderSession};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, watch};
use tracing::{debug, warn};

/// Refresh slightly before the provider-reported expiry so a token handed
/// out is never already dead when the backend sees it.
fn token_expiry_leeway() -> Duration {
    Duration::seconds(60)
}

/// Where the session currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Startup: persisted credentials are still being settled.
    Resolving,
    /// No identity is live.
    SignedOut,
    /// An identity is live.
    SignedIn(Identity),
}

impl SessionState {
    /// Returns the live identity, if any.
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::SignedIn(identity) => Some(identity),
            Self::Resolving | Self::SignedOut => None,
        }
    }

    /// Returns true while persisted credentials are being settled.
    #[must_use]
    pub fn is_resolving(&self) -> bool {
        matches!(self, Self::Resolving)
    }
}

#[derive(Debug)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct SessionInner {
    refresh_token: Option<String>,
    cached_token: Option<CachedToken>,
}

/// Owns the authentication lifecycle.
///
/// All other components receive the identity by snapshot via
/// [`SessionStore::identity`] or by subscription via
/// [`SessionStore::subscribe`]; none of them mutate it.
pub struct SessionStore {
    provider: Arc<dyn IdentityProvider>,
    role_cache: Arc<dyn RoleCache>,
    state_tx: watch::Sender<SessionState>,
    inner: Mutex<SessionInner>,
    /// Bumped on every identity transition. Lets in-flight work detect that
    /// the session it started under no longer exists.
    generation: AtomicU64,
}

impl SessionStore {
    /// Creates a store in the `Resolving` state.
    ///
    /// Call [`SessionStore::restore`] to settle persisted credentials before
    /// relying on guard decisions.
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>, role_cache: Arc<dyn RoleCache>) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Resolving);
        Self {
            provider,
            role_cache,
            state_tx,
            inner: Mutex::new(SessionInner::default()),
            generation: AtomicU64::new(0),
        }
    }

    /// Settles the startup state from a persisted refresh credential.
    ///
    /// `None`, or a credential the provider rejects, settles to `SignedOut`.
    /// The rejection is logged, not surfaced: a stale persisted credential
    /// is an expected condition, not a caller error.
    pub async fn restore(&self, persisted_refresh_token: Option<String>) {
        match persisted_refresh_token {
            None => self.transition_signed_out().await,
            Some(refresh_token) => match self.provider.restore(&refresh_token).await {
                Ok(session) => self.install(session).await,
                Err(err) => {
                    debug!(error = %err, "persisted session did not restore");
                    self.transition_signed_out().await;
                }
            },
        }
    }

    /// Creates a new account and signs it in.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let session = self.provider.sign_up(email, password).await?;
        let identity = session.identity.clone();
        self.install(session).await;
        Ok(identity)
    }

    /// Signs in an existing account.
    ///
    /// On failure the session is exactly what it was before the attempt.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let session = self.provider.sign_in(email, password).await?;
        let identity = session.identity.clone();
        self.install(session).await;
        Ok(identity)
    }

    /// Signs in with a Google credential from the interactive OAuth flow.
    pub async fn sign_in_with_google(&self, credential: &str) -> Result<Identity, AuthError> {
        let session = self.provider.sign_in_with_google(credential).await?;
        let identity = session.identity.clone();
        self.install(session).await;
        Ok(identity)
    }

    /// Destroys the live identity.
    ///
    /// Local state (identity, token cache, cached role fallback) always
    /// clears, and subscribers observe `SignedOut`, even when the provider
    /// revocation call fails.
    pub async fn sign_out(&self) {
        let refresh_token = {
            let mut inner = self.inner.lock().await;
            inner.cached_token = None;
            inner.refresh_token.take()
        };
        self.role_cache.clear();
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.state_tx.send_replace(SessionState::SignedOut);

        if let Some(refresh_token) = refresh_token
            && let Err(err) = self.provider.revoke(&refresh_token).await
        {
            warn!(error = %err, "provider revocation failed; local session already cleared");
        }
    }

    /// Returns a bearer credential for the live identity.
    ///
    /// Without `force_refresh`, a still-usable cached token is returned and
    /// no provider round-trip happens. `force_refresh` re-derives from the
    /// provider unconditionally; callers use it to recover from a stale-token
    /// 401.
    pub async fn get_token(&self, force_refresh: bool) -> Result<String, AuthError> {
        let mut inner = self.inner.lock().await;
        let Some(refresh_token) = inner.refresh_token.clone() else {
            return Err(AuthError::NotSignedIn);
        };

        if !force_refresh
            && let Some(cached) = &inner.cached_token
            && cached.expires_at - token_expiry_leeway() > Utc::now()
        {
            return Ok(cached.value.clone());
        }

        let tokens = self.provider.refresh(&refresh_token).await?;
        inner.refresh_token = Some(tokens.refresh_token.clone());
        inner.cached_token = Some(CachedToken {
            value: tokens.id_token.clone(),
            expires_at: Utc::now() + tokens.expires_in,
        });
        Ok(tokens.id_token)
    }

    /// Updates the live account's profile and notifies subscribers.
    pub async fn update_profile(
        &self,
        display_name: Option<&str>,
        photo_url: Option<&str>,
    ) -> Result<Identity, AuthError> {
        let token = self.get_token(false).await?;
        let updated = self
            .provider
            .update_profile(&token, display_name, photo_url)
            .await?;
        // Same principal, so the generation does not move.
        self.state_tx
            .send_replace(SessionState::SignedIn(updated.clone()));
        Ok(updated)
    }

    /// Returns a snapshot of the live identity, if any.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.state_tx.borrow().identity().cloned()
    }

    /// Returns a snapshot of the session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state_tx.borrow().clone()
    }

    /// Returns true while startup credentials are still being settled.
    #[must_use]
    pub fn is_resolving(&self) -> bool {
        self.state_tx.borrow().is_resolving()
    }

    /// Subscribes to identity transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Returns the current session generation.
    ///
    /// The value moves on every identity transition; compare before and
    /// after an await to detect that a result belongs to a dead session.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Returns the role cache this store clears on sign-out.
    #[must_use]
    pub fn role_cache(&self) -> &Arc<dyn RoleCache> {
        &self.role_cache
    }

    /// The long-lived credential of the live session, for callers that
    /// persist sessions across restarts. `None` when signed out.
    pub async fn refresh_token(&self) -> Option<String> {
        self.inner.lock().await.refresh_token.clone()
    }

    async fn install(&self, session: ProviderSession) {
        {
            let mut inner = self.inner.lock().await;
            inner.cached_token = Some(CachedToken {
                value: session.tokens.id_token,
                expires_at: Utc::now() + session.tokens.expires_in,
            });
            inner.refresh_token = Some(session.tokens.refresh_token);
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.state_tx
            .send_replace(SessionState::SignedIn(session.identity));
    }

    async fn transition_signed_out(&self) {
        {
            let mut inner = self.inner.lock().await;
            inner.cached_token = None;
            inner.refresh_token = None;
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.state_tx.send_replace(SessionState::SignedOut);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryRoleCache;
    use crate::provider::ProviderTokens;
    use crate::role::Role;
    use async_trait::async_trait;
    use hillcrest_core::ProviderUid;
    use std::sync::atomic::AtomicUsize;

    struct FakeProvider {
        token_ttl: Duration,
        fail_sign_in: bool,
        fail_revoke: bool,
        refresh_calls: AtomicUsize,
    }

    impl FakeProvider {
        fn new() -> Self {
            Self {
                token_ttl: Duration::hours(1),
                fail_sign_in: false,
                fail_revoke: false,
                refresh_calls: AtomicUsize::new(0),
            }
        }

        fn with_token_ttl(mut self, ttl: Duration) -> Self {
            self.token_ttl = ttl;
            self
        }

        fn session(&self, token: &str) -> ProviderSession {
            ProviderSession {
                identity: Identity::new("uid_1".into(), "alice@example.com".to_string()),
                tokens: ProviderTokens::new(
                    token.to_string(),
                    "refresh_1".to_string(),
                    self.token_ttl,
                ),
            }
        }
    }

    #[async_trait]
    impl IdentityProvider for FakeProvider {
        async fn sign_up(&self, _: &str, _: &str) -> Result<ProviderSession, AuthError> {
            Ok(self.session("token_signup"))
        }

        async fn sign_in(&self, _: &str, _: &str) -> Result<ProviderSession, AuthError> {
            if self.fail_sign_in {
                return Err(AuthError::InvalidCredentials);
            }
            Ok(self.session("token_signin"))
        }

        async fn sign_in_with_google(&self, _: &str) -> Result<ProviderSession, AuthError> {
            Ok(self.session("token_google"))
        }

        async fn refresh(&self, _: &str) -> Result<ProviderTokens, AuthError> {
            let n = self.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(ProviderTokens::new(
                format!("token_refreshed_{n}"),
                "refresh_2".to_string(),
                Duration::hours(1),
            ))
        }

        async fn restore(&self, _: &str) -> Result<ProviderSession, AuthError> {
            Ok(self.session("token_restored"))
        }

        async fn update_profile(
            &self,
            _: &str,
            display_name: Option<&str>,
            photo_url: Option<&str>,
        ) -> Result<Identity, AuthError> {
            Ok(
                Identity::new(ProviderUid::from("uid_1"), "alice@example.com".to_string())
                    .with_display_name(display_name.map(str::to_string))
                    .with_photo_url(photo_url.map(str::to_string)),
            )
        }

        async fn revoke(&self, _: &str) -> Result<(), AuthError> {
            if self.fail_revoke {
                return Err(AuthError::Network {
                    details: "connection reset".to_string(),
                });
            }
            Ok(())
        }
    }

    fn store_with(provider: FakeProvider) -> (Arc<SessionStore>, Arc<FakeProvider>) {
        let provider = Arc::new(provider);
        let store = Arc::new(SessionStore::new(
            provider.clone(),
            Arc::new(MemoryRoleCache::new()),
        ));
        (store, provider)
    }

    #[tokio::test]
    async fn new_store_is_resolving() {
        let (store, _) = store_with(FakeProvider::new());
        assert!(store.is_resolving());
        assert!(store.identity().is_none());
    }

    #[tokio::test]
    async fn restore_without_credential_settles_signed_out() {
        let (store, _) = store_with(FakeProvider::new());
        store.restore(None).await;
        assert!(!store.is_resolving());
        assert_eq!(store.state(), SessionState::SignedOut);
    }

    #[tokio::test]
    async fn restore_with_credential_settles_signed_in() {
        let (store, _) = store_with(FakeProvider::new());
        store.restore(Some("refresh_1".to_string())).await;
        let identity = store.identity().expect("identity restored");
        assert_eq!(identity.email(), "alice@example.com");
    }

    #[tokio::test]
    async fn sign_in_success_notifies_subscribers() {
        let (store, _) = store_with(FakeProvider::new());
        store.restore(None).await;
        let mut rx = store.subscribe();

        store.sign_in("alice@example.com", "pw").await.expect("sign in");

        rx.changed().await.expect("transition observed");
        assert!(matches!(&*rx.borrow(), SessionState::SignedIn(_)));
    }

    #[tokio::test]
    async fn failed_sign_in_leaves_state_untouched() {
        let mut provider = FakeProvider::new();
        provider.fail_sign_in = true;
        let (store, _) = store_with(provider);
        store.restore(None).await;
        let generation = store.generation();

        let err = store
            .sign_in("alice@example.com", "wrong")
            .await
            .expect_err("sign in fails");

        assert_eq!(err, AuthError::InvalidCredentials);
        assert_eq!(store.state(), SessionState::SignedOut);
        assert_eq!(store.generation(), generation);
    }

    #[tokio::test]
    async fn get_token_uses_cache_without_force() {
        let (store, provider) = store_with(FakeProvider::new());
        store.sign_in("alice@example.com", "pw").await.expect("sign in");

        let first = store.get_token(false).await.expect("token");
        let second = store.get_token(false).await.expect("token");

        assert_eq!(first, second);
        assert_eq!(provider.refresh_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn get_token_force_refresh_bypasses_cache() {
        let (store, provider) = store_with(FakeProvider::new());
        store.sign_in("alice@example.com", "pw").await.expect("sign in");

        let cached = store.get_token(false).await.expect("token");
        let forced = store.get_token(true).await.expect("token");

        assert_ne!(cached, forced);
        assert_eq!(provider.refresh_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_cached_token_triggers_refresh() {
        let (store, provider) =
            store_with(FakeProvider::new().with_token_ttl(Duration::seconds(0)));
        store.sign_in("alice@example.com", "pw").await.expect("sign in");

        let token = store.get_token(false).await.expect("token");

        assert!(token.starts_with("token_refreshed_"));
        assert_eq!(provider.refresh_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn get_token_while_signed_out_is_an_error() {
        let (store, _) = store_with(FakeProvider::new());
        store.restore(None).await;

        let err = store.get_token(false).await.expect_err("no session");
        assert_eq!(err, AuthError::NotSignedIn);
    }

    #[tokio::test]
    async fn sign_out_clears_identity_tokens_and_role_cache() {
        let provider = Arc::new(FakeProvider::new());
        let cache = Arc::new(MemoryRoleCache::new());
        let store = SessionStore::new(provider, cache.clone());
        store.sign_in("alice@example.com", "pw").await.expect("sign in");
        cache.store(&ProviderUid::from("uid_1"), Role::Member);
        let generation = store.generation();

        store.sign_out().await;

        assert!(store.identity().is_none());
        assert_eq!(cache.load(&ProviderUid::from("uid_1")), None);
        assert!(store.generation() > generation);
        assert_eq!(
            store.get_token(false).await.expect_err("cleared"),
            AuthError::NotSignedIn
        );
    }

    #[tokio::test]
    async fn sign_out_succeeds_locally_when_revocation_fails() {
        let mut provider = FakeProvider::new();
        provider.fail_revoke = true;
        let (store, _) = store_with(provider);
        store.sign_in("alice@example.com", "pw").await.expect("sign in");

        store.sign_out().await;

        assert_eq!(store.state(), SessionState::SignedOut);
    }

    #[tokio::test]
    async fn update_profile_replaces_identity_snapshot() {
        let (store, _) = store_with(FakeProvider::new());
        store.sign_up("alice@example.com", "pw").await.expect("sign up");
        let generation = store.generation();

        let updated = store
            .update_profile(Some("Alice"), None)
            .await
            .expect("profile update");

        assert_eq!(updated.display_name(), Some("Alice"));
        assert_eq!(
            store.identity().expect("live").display_name(),
            Some("Alice")
        );
        // Profile edits keep the same principal.
        assert_eq!(store.generation(), generation);
    }
}
