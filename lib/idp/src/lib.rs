//! Identity provider integration for Hillcrest.
//!
//! Implements the [`IdentityProvider`](hillcrest_access::IdentityProvider)
//! trait over the hosted identity REST contract, and drives the interactive
//! Google OAuth sign-in flow whose access token feeds federated sign-in.

pub mod config;
pub mod google;
pub mod rest;

pub use config::{GoogleOAuthConfig, IdpConfig};
pub use google::{CallbackParams, GoogleSignInFlow, PendingSignIn};
pub use rest::RestIdentityProvider;
