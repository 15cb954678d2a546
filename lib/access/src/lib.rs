//! Session and access control for the hillcrest client.
//!
//! This crate provides:
//! - Session lifecycle (`SessionStore`, `SessionState`, `Identity`) wrapping
//!   an external identity provider behind the `IdentityProvider` trait
//! - Role resolution (`Role`, `RoleResolver`, `RoleResolution`) with a
//!   single-retry-on-stale-token policy and a degrade-to-cache fallback
//! - The cached role fallback (`RoleCache` and its implementations)
//!
//! # Access Control Model
//!
//! Roles form a closed set: `user` (registered visitor), `member` (tenant
//! with an accepted agreement) and `admin` (building management). The role
//! is not embedded in the identity token; it is fetched out-of-band from the
//! backend once an identity is live, and an identity without a resolved role
//! is never treated as authorized for a role-gated route.
//!
//! # Example
//!
//! ```no_run
//! use hillcrest_access::{MemoryRoleCache, RoleResolver, SessionStore};
//! use std::sync::Arc;
//!
//! # async fn example(
//! #     provider: Arc<dyn hillcrest_access::IdentityProvider>,
//! #     endpoint: Arc<dyn hillcrest_access::RoleEndpoint>,
//! # ) {
//! let cache = Arc::new(MemoryRoleCache::new());
//! let store = Arc::new(SessionStore::new(provider, cache.clone()));
//! store.restore(None).await;
//!
//! store.sign_in("alice@example.com", "secret").await.unwrap();
//! let resolver = RoleResolver::new(store.clone(), endpoint, cache);
//! let resolution = resolver.resolve().await;
//! println!("signed in as {:?}", resolution.role());
//! # }
//! ```

pub mod cache;
pub mod error;
pub mod identity;
pub mod provider;
pub mod resolver;
pub mod role;
pub mod store;

// Re-export main types at crate root
pub use cache::{FileRoleCache, MemoryRoleCache, RoleCache};
pub use error::{AuthError, RoleEndpointError, RoleFetchError};
pub use identity::Identity;
pub use provider::{IdentityProvider, ProviderSession, ProviderTokens};
pub use resolver::{RoleEndpoint, RoleResolver};
pub use role::{Role, RoleResolution};
pub use store::{SessionState, SessionStore};
