//! Authorization role types.
//!
//! The backend stores roles as free-form strings. This module pins them to a
//! closed enumeration at the network boundary: anything the backend returns
//! that is not a known tag collapses to `User`, so the rest of the client
//! never handles raw strings.

use serde::{Deserialize, Serialize};

/// Authorization role resolved from the backend.
///
/// The building has three levels of access:
/// - `User`: a registered visitor browsing apartments
/// - `Member`: a tenant with an accepted agreement (payments unlocked)
/// - `Admin`: building management
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Registered visitor.
    User,
    /// Tenant with an accepted agreement.
    Member,
    /// Building management.
    Admin,
}

impl Role {
    /// Normalizes a raw role string from the backend.
    ///
    /// Unknown or unexpected tags collapse to `User`, the most restrictive
    /// non-null role.
    #[must_use]
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "admin" => Self::Admin,
            "member" => Self::Member,
            _ => Self::User,
        }
    }

    /// Returns the wire tag for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Member => "member",
            Self::Admin => "admin",
        }
    }

    /// Returns true if this role has admin privileges.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one role resolution.
///
/// `Fresh` came from the backend on this call. `Stale` is the degraded
/// fallback (last cached value, or `User` when no cache exists) used when
/// the endpoint could not be reached. `Unresolved` means no identity was
/// live, so no network call was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleResolution {
    /// Freshly fetched from the backend.
    Fresh(Role),
    /// Degraded fallback after a terminal fetch failure.
    Stale(Role),
    /// No live identity; nothing was fetched.
    Unresolved,
}

impl RoleResolution {
    /// Returns the resolved role, if any.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        match self {
            Self::Fresh(role) | Self::Stale(role) => Some(*role),
            Self::Unresolved => None,
        }
    }

    /// Returns true if the role came from the backend on this call.
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh(_))
    }
}
