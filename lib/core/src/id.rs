//! Strongly-typed ID types for domain entities.
//!
//! Every entity this client touches is identified by an opaque string issued
//! by an external system: the identity provider mints user UIDs, the backend
//! mints record ids. The wrappers here keep those strings from being mixed
//! up with each other (or with arbitrary text) at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate a strongly-typed wrapper around an externally-issued
/// opaque id string.
macro_rules! define_opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an ID from the externally-issued string.
            #[must_use]
            pub fn new(id: String) -> Self {
                Self(id)
            }

            /// Returns the ID as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

define_opaque_id!(
    /// Unique identifier for a signed-in principal, issued by the identity
    /// provider.
    ProviderUid
);

define_opaque_id!(
    /// Unique identifier for an apartment record.
    ApartmentId
);

define_opaque_id!(
    /// Unique identifier for a rental agreement record.
    AgreementId
);

define_opaque_id!(
    /// Unique identifier for a payment record.
    PaymentId
);

define_opaque_id!(
    /// Unique identifier for an announcement record.
    AnnouncementId
);
