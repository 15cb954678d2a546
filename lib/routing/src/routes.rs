//! The application route table.

use crate::requirement::RouteRequirement;
use hillcrest_access::Role;

/// Roles allowed on the shared non-admin dashboard pages.
pub const USER_OR_MEMBER: &[Role] = &[Role::User, Role::Member];

/// Roles allowed on the payment pages.
pub const MEMBER_ONLY: &[Role] = &[Role::Member];

/// Roles allowed on the management pages.
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// One route in the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub path: &'static str,
    /// `None` means the route is public.
    pub requirement: Option<RouteRequirement>,
}

/// The full route table.
pub const ROUTES: &[Route] = &[
    Route {
        path: "/",
        requirement: None,
    },
    Route {
        path: "/apartments",
        requirement: None,
    },
    Route {
        path: "/login",
        requirement: None,
    },
    Route {
        path: "/register",
        requirement: None,
    },
    Route {
        path: "/dashboard",
        requirement: Some(RouteRequirement::ANY_AUTHENTICATED),
    },
    Route {
        path: "/dashboard/my-profile",
        requirement: Some(RouteRequirement::roles(USER_OR_MEMBER)),
    },
    Route {
        path: "/dashboard/announcements",
        requirement: Some(RouteRequirement::roles(USER_OR_MEMBER)),
    },
    Route {
        path: "/dashboard/make-payment",
        requirement: Some(RouteRequirement::roles(MEMBER_ONLY)),
    },
    Route {
        path: "/dashboard/payment-history",
        requirement: Some(RouteRequirement::roles(MEMBER_ONLY)),
    },
    Route {
        path: "/dashboard/admin-profile",
        requirement: Some(RouteRequirement::roles(ADMIN_ONLY)),
    },
    Route {
        path: "/dashboard/agreement-requests",
        requirement: Some(RouteRequirement::roles(ADMIN_ONLY)),
    },
    Route {
        path: "/dashboard/manage-members",
        requirement: Some(RouteRequirement::roles(ADMIN_ONLY)),
    },
    Route {
        path: "/dashboard/make-announcement",
        requirement: Some(RouteRequirement::roles(ADMIN_ONLY)),
    },
    Route {
        path: "/dashboard/manage-coupons",
        requirement: Some(RouteRequirement::roles(ADMIN_ONLY)),
    },
];

/// Looks up the requirement for an exact path. `None` for unknown paths as
/// well as public ones; unknown paths fall through to the not-found page.
#[must_use]
pub fn requirement_for(path: &str) -> Option<RouteRequirement> {
    ROUTES
        .iter()
        .find(|route| route.path == path)
        .and_then(|route| route.requirement)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_pages_have_no_requirement() {
        assert_eq!(requirement_for("/"), None);
        assert_eq!(requirement_for("/apartments"), None);
        assert_eq!(requirement_for("/login"), None);
    }

    #[test]
    fn dashboard_root_takes_any_authenticated_identity() {
        let requirement = requirement_for("/dashboard").expect("guarded");
        assert!(requirement.is_any_authenticated());
    }

    #[test]
    fn payment_pages_are_member_only() {
        for path in ["/dashboard/make-payment", "/dashboard/payment-history"] {
            let requirement = requirement_for(path).expect("guarded");
            assert!(requirement.allows(Role::Member));
            assert!(!requirement.allows(Role::User));
            assert!(!requirement.allows(Role::Admin));
        }
    }

    #[test]
    fn management_pages_are_admin_only() {
        for path in [
            "/dashboard/admin-profile",
            "/dashboard/agreement-requests",
            "/dashboard/manage-members",
            "/dashboard/make-announcement",
            "/dashboard/manage-coupons",
        ] {
            let requirement = requirement_for(path).expect("guarded");
            assert!(requirement.allows(Role::Admin));
            assert!(!requirement.allows(Role::Member));
        }
    }

    #[test]
    fn shared_pages_take_users_and_members_but_not_admins() {
        for path in ["/dashboard/my-profile", "/dashboard/announcements"] {
            let requirement = requirement_for(path).expect("guarded");
            assert!(requirement.allows(Role::User));
            assert!(requirement.allows(Role::Member));
            assert!(!requirement.allows(Role::Admin));
        }
    }
}
