//! Access requirements attached to routes.

use hillcrest_access::Role;

/// What a route demands of the signed-in identity.
///
/// An empty role list means any authenticated identity may enter; the
/// guard will not run a role check for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteRequirement {
    roles: &'static [Role],
}

impl RouteRequirement {
    /// Any authenticated identity.
    pub const ANY_AUTHENTICATED: Self = Self { roles: &[] };

    /// Only the listed roles.
    #[must_use]
    pub const fn roles(roles: &'static [Role]) -> Self {
        Self { roles }
    }

    /// Whether any authenticated identity is enough.
    #[must_use]
    pub fn is_any_authenticated(&self) -> bool {
        self.roles.is_empty()
    }

    /// Whether the given role satisfies this requirement.
    #[must_use]
    pub fn allows(&self, role: Role) -> bool {
        self.roles.is_empty() || self.roles.contains(&role)
    }
}
