//! Identity provider configuration.
//!
//! Fields with defaults can be omitted when loading from environment
//! variables; only the API key is required for the email/password flows.

use serde::{Deserialize, Serialize};

/// Configuration for the identity provider REST client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdpConfig {
    /// The provider API key appended to every REST call.
    api_key: String,
    /// Base URL for account operations.
    /// Default: "https://identitytoolkit.googleapis.com"
    #[serde(default = "default_accounts_url")]
    accounts_url: String,
    /// Base URL for token refresh.
    /// Default: "https://securetoken.googleapis.com"
    #[serde(default = "default_token_url")]
    token_url: String,
    /// Credential revocation endpoint.
    /// Default: "https://oauth2.googleapis.com/revoke"
    #[serde(default = "default_revoke_url")]
    revoke_url: String,
    /// Google OAuth settings for the interactive sign-in flow, when enabled.
    #[serde(default)]
    google: Option<GoogleOAuthConfig>,
}

fn default_accounts_url() -> String {
    "https://identitytoolkit.googleapis.com".to_string()
}

fn default_token_url() -> String {
    "https://securetoken.googleapis.com".to_string()
}

fn default_revoke_url() -> String {
    "https://oauth2.googleapis.com/revoke".to_string()
}

impl IdpConfig {
    /// Creates a configuration with defaults for the endpoint URLs.
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            accounts_url: default_accounts_url(),
            token_url: default_token_url(),
            revoke_url: default_revoke_url(),
            google: None,
        }
    }

    /// Enables the interactive Google sign-in flow.
    #[must_use]
    pub fn with_google(mut self, google: GoogleOAuthConfig) -> Self {
        self.google = Some(google);
        self
    }

    /// Returns the provider API key.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Returns the base URL for account operations.
    #[must_use]
    pub fn accounts_url(&self) -> &str {
        &self.accounts_url
    }

    /// Returns the base URL for token refresh.
    #[must_use]
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Returns the credential revocation endpoint.
    #[must_use]
    pub fn revoke_url(&self) -> &str {
        &self.revoke_url
    }

    /// Returns the Google OAuth settings, if configured.
    #[must_use]
    pub fn google(&self) -> Option<&GoogleOAuthConfig> {
        self.google.as_ref()
    }
}

/// Settings for the interactive Google sign-in flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleOAuthConfig {
    /// The OAuth2 client ID registered with Google.
    pub client_id: String,
    /// The OAuth2 client secret.
    pub client_secret: String,
    /// The redirect URI for the OAuth2 callback.
    pub redirect_url: String,
}
