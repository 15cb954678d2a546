//! The route guard.
//!
//! Evaluates one navigation against the live session and, when the route
//! demands specific roles, the role resolver. The guard never reads the
//! role cache itself: whatever the resolver answers for this evaluation,
//! fresh or degraded, is the authorization input.

use crate::dashboard::default_landing_path;
use crate::requirement::RouteRequirement;
use hillcrest_access::{RoleResolver, SessionState, SessionStore};
use std::sync::Arc;
use tracing::{debug, instrument};

/// What the shell should do with a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// The session is still restoring; hold the navigation.
    Loading,
    /// Let the route render.
    Render,
    /// No identity; go to login, remembering where we came from.
    RedirectToLogin { from: String },
    /// Signed in but the role does not fit; go to the role's own landing
    /// page instead of bouncing to login.
    Redirect { to: String },
}

/// Gatekeeper for guarded routes.
pub struct RouteGuard {
    store: Arc<SessionStore>,
    resolver: Arc<RoleResolver>,
}

impl RouteGuard {
    #[must_use]
    pub fn new(store: Arc<SessionStore>, resolver: Arc<RoleResolver>) -> Self {
        Self { store, resolver }
    }

    /// Decides one navigation.
    ///
    /// Routes that take any authenticated identity render without a role
    /// check. For role-gated routes, an identity that disappears while the
    /// role is being resolved (the generation moves) sends the navigation
    /// to login rather than rendering against a dead session.
    #[instrument(skip(self), fields(path = %path))]
    pub async fn decide(&self, path: &str, requirement: RouteRequirement) -> RouteDecision {
        match self.store.state() {
            SessionState::Resolving => return RouteDecision::Loading,
            SessionState::SignedOut => {
                return RouteDecision::RedirectToLogin {
                    from: path.to_string(),
                };
            }
            SessionState::SignedIn(_) => {}
        }

        if requirement.is_any_authenticated() {
            return RouteDecision::Render;
        }

        let generation = self.store.generation();
        let resolution = self.resolver.resolve().await;
        if self.store.generation() != generation {
            debug!("session changed during role resolution");
            return RouteDecision::RedirectToLogin {
                from: path.to_string(),
            };
        }

        match resolution.role() {
            Some(role) if requirement.allows(role) => RouteDecision::Render,
            Some(role) => RouteDecision::Redirect {
                to: default_landing_path(role).to_string(),
            },
            None => RouteDecision::RedirectToLogin {
                from: path.to_string(),
            },
        }
    }
}
