//! Identity domain type.
//!
//! An `Identity` is the signed-in principal as issued by the external
//! identity provider. It is owned exclusively by the
//! [`SessionStore`](crate::SessionStore); every other component receives a
//! snapshot and never mutates it. Bearer credentials are deliberately not
//! part of this type: they are short-lived and re-derived from the provider
//! on demand.

use hillcrest_core::ProviderUid;
use serde::{Deserialize, Serialize};

/// Represents the signed-in principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Provider-issued unique identifier.
    uid: ProviderUid,
    /// The account's email address.
    email: String,
    /// Display name, if the profile has one.
    display_name: Option<String>,
    /// Profile photo URL, if the profile has one.
    photo_url: Option<String>,
}

impl Identity {
    /// Creates an identity with the required provider fields.
    #[must_use]
    pub fn new(uid: ProviderUid, email: String) -> Self {
        Self {
            uid,
            email,
            display_name: None,
            photo_url: None,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, display_name: Option<String>) -> Self {
        self.display_name = display_name;
        self
    }

    /// Sets the photo URL.
    #[must_use]
    pub fn with_photo_url(mut self, photo_url: Option<String>) -> Self {
        self.photo_url = photo_url;
        self
    }

    /// Returns the provider-issued UID.
    #[must_use]
    pub fn uid(&self) -> &ProviderUid {
        &self.uid
    }

    /// Returns the account's email address.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the display name, if set.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Returns the profile photo URL, if set.
    #[must_use]
    pub fn photo_url(&self) -> Option<&str> {
        self.photo_url.as_deref()
    }
}
