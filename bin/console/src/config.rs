//! Console configuration.
//!
//! Loaded via the `config` crate from environment variables with `__` as
//! the section separator, e.g. `IDP__API_KEY` for the identity provider
//! key and `GOOGLE__CLIENT_ID` inside `IDP__GOOGLE__CLIENT_ID`.

use hillcrest_idp::IdpConfig;
use serde::Deserialize;
use std::path::PathBuf;

/// Top-level console configuration.
#[derive(Debug, Deserialize)]
pub struct ConsoleConfig {
    /// Base URL of the building-management backend.
    pub api_base_url: String,

    /// Identity provider settings.
    pub idp: IdpConfig,

    /// Local state files (session and role cache).
    #[serde(default)]
    pub state: StateConfig,
}

/// Where the console keeps its local state between runs.
#[derive(Debug, Clone, Deserialize)]
pub struct StateConfig {
    /// File holding the persisted refresh credential.
    #[serde(default = "default_session_path")]
    pub session_path: PathBuf,

    /// File holding the last known role, the degraded-mode fallback.
    #[serde(default = "default_role_cache_path")]
    pub role_cache_path: PathBuf,
}

fn default_session_path() -> PathBuf {
    PathBuf::from(".hillcrest/session.json")
}

fn default_role_cache_path() -> PathBuf {
    PathBuf::from(".hillcrest/role-cache.json")
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            session_path: default_session_path(),
            role_cache_path: default_role_cache_path(),
        }
    }
}

impl ConsoleConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
