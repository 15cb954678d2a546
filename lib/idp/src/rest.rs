//! REST implementation of the identity provider.
//!
//! Talks to the Google Identity Toolkit wire contract: account creation and
//! password sign-in against `accounts:*` endpoints, bearer-token refresh
//! against the secure-token endpoint, and best-effort credential revocation.
//! Provider failure codes are mapped to [`AuthError`] reasons here so the
//! rest of the client never sees raw wire strings.

use crate::config::IdpConfig;
use async_trait::async_trait;
use chrono::Duration;
use hillcrest_access::{AuthError, Identity, IdentityProvider, ProviderSession, ProviderTokens};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Identity provider client over the REST wire contract.
#[derive(Debug, Clone)]
pub struct RestIdentityProvider {
    http: reqwest::Client,
    config: IdpConfig,
}

impl RestIdentityProvider {
    /// Creates a provider client from configuration.
    #[must_use]
    pub fn new(config: IdpConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn accounts_endpoint(&self, operation: &str) -> String {
        format!(
            "{}/v1/accounts:{}?key={}",
            self.config.accounts_url(),
            operation,
            self.config.api_key()
        )
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        url: String,
        body: &B,
        email: &str,
    ) -> Result<T, AuthError> {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| AuthError::Network {
                details: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            return response.json().await.map_err(|e| AuthError::Provider {
                reason: format!("malformed provider response: {e}"),
            });
        }

        match response.json::<WireFailure>().await {
            Ok(failure) => Err(map_error_message(&failure.error.message, email)),
            Err(_) => Err(AuthError::Provider {
                reason: format!("provider returned HTTP {status}"),
            }),
        }
    }

    fn session_from(response: SessionResponse, email_hint: &str) -> ProviderSession {
        let email = response
            .email
            .unwrap_or_else(|| email_hint.to_string());
        let identity = Identity::new(response.local_id.into(), email)
            .with_display_name(response.display_name)
            .with_photo_url(response.photo_url);
        ProviderSession {
            identity,
            tokens: ProviderTokens::new(
                response.id_token,
                response.refresh_token,
                parse_expires(&response.expires_in),
            ),
        }
    }
}

#[async_trait]
impl IdentityProvider for RestIdentityProvider {
    #[instrument(skip(self, password))]
    async fn sign_up(&self, email: &str, password: &str) -> Result<ProviderSession, AuthError> {
        let response: SessionResponse = self
            .post(
                self.accounts_endpoint("signUp"),
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
                email,
            )
            .await?;
        debug!("account created");
        Ok(Self::session_from(response, email))
    }

    #[instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderSession, AuthError> {
        let response: SessionResponse = self
            .post(
                self.accounts_endpoint("signInWithPassword"),
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
                email,
            )
            .await?;
        Ok(Self::session_from(response, email))
    }

    #[instrument(skip(self, credential))]
    async fn sign_in_with_google(&self, credential: &str) -> Result<ProviderSession, AuthError> {
        let response: SessionResponse = self
            .post(
                self.accounts_endpoint("signInWithIdp"),
                &IdpSignInRequest {
                    post_body: format!("access_token={credential}&providerId=google.com"),
                    request_uri: "http://localhost",
                    return_secure_token: true,
                },
                "",
            )
            .await?;
        Ok(Self::session_from(response, ""))
    }

    #[instrument(skip(self, refresh_token))]
    async fn refresh(&self, refresh_token: &str) -> Result<ProviderTokens, AuthError> {
        let url = format!(
            "{}/v1/token?key={}",
            self.config.token_url(),
            self.config.api_key()
        );
        let response = self
            .http
            .post(url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(|e| AuthError::Network {
                details: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return match response.json::<WireFailure>().await {
                Ok(failure) => Err(map_error_message(&failure.error.message, "")),
                Err(_) => Err(AuthError::Provider {
                    reason: format!("token refresh returned HTTP {status}"),
                }),
            };
        }

        let refreshed: RefreshResponse =
            response.json().await.map_err(|e| AuthError::Provider {
                reason: format!("malformed refresh response: {e}"),
            })?;
        Ok(ProviderTokens::new(
            refreshed.id_token,
            refreshed.refresh_token,
            parse_expires(&refreshed.expires_in),
        ))
    }

    async fn restore(&self, refresh_token: &str) -> Result<ProviderSession, AuthError> {
        let tokens = self.refresh(refresh_token).await?;
        let lookup: LookupResponse = self
            .post(
                self.accounts_endpoint("lookup"),
                &LookupRequest {
                    id_token: &tokens.id_token,
                },
                "",
            )
            .await?;
        let account = lookup
            .users
            .into_iter()
            .next()
            .ok_or_else(|| AuthError::Provider {
                reason: "account lookup returned no users".to_string(),
            })?;

        let identity = Identity::new(account.local_id.into(), account.email.unwrap_or_default())
            .with_display_name(account.display_name)
            .with_photo_url(account.photo_url);
        Ok(ProviderSession { identity, tokens })
    }

    #[instrument(skip(self, id_token))]
    async fn update_profile(
        &self,
        id_token: &str,
        display_name: Option<&str>,
        photo_url: Option<&str>,
    ) -> Result<Identity, AuthError> {
        let account: AccountInfo = self
            .post(
                self.accounts_endpoint("update"),
                &UpdateRequest {
                    id_token,
                    display_name,
                    photo_url,
                    return_secure_token: false,
                },
                "",
            )
            .await?;
        Ok(
            Identity::new(account.local_id.into(), account.email.unwrap_or_default())
                .with_display_name(account.display_name)
                .with_photo_url(account.photo_url),
        )
    }

    async fn revoke(&self, refresh_token: &str) -> Result<(), AuthError> {
        let response = self
            .http
            .post(self.config.revoke_url())
            .form(&[("token", refresh_token)])
            .send()
            .await
            .map_err(|e| AuthError::Network {
                details: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Provider {
                reason: format!("revocation returned HTTP {status}"),
            });
        }
        Ok(())
    }
}

/// Maps a provider failure code to an [`AuthError`] reason.
///
/// Codes sometimes arrive with a human-readable suffix
/// (`"WEAK_PASSWORD : Password should be at least 6 characters"`), so only
/// the first token is matched.
fn map_error_message(message: &str, email: &str) -> AuthError {
    let code = message.split_whitespace().next().unwrap_or("");
    match code {
        "EMAIL_EXISTS" => AuthError::EmailInUse {
            email: email.to_string(),
        },
        "INVALID_EMAIL" | "MISSING_EMAIL" => AuthError::InvalidEmail {
            email: email.to_string(),
        },
        "WEAK_PASSWORD" | "MISSING_PASSWORD" => AuthError::WeakPassword,
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            AuthError::InvalidCredentials
        }
        "USER_DISABLED" => AuthError::UserDisabled,
        other => AuthError::Provider {
            reason: other.to_string(),
        },
    }
}

fn parse_expires(raw: &str) -> Duration {
    Duration::seconds(raw.parse().unwrap_or(3600))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IdpSignInRequest<'a> {
    post_body: String,
    request_uri: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRequest<'a> {
    id_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    photo_url: Option<&'a str>,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    photo_url: Option<String>,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

/// The token endpoint answers in snake_case, unlike the account endpoints.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupResponse {
    #[serde(default)]
    users: Vec<AccountInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountInfo {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    photo_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireFailure {
    error: WireError,
}

#[derive(Debug, Deserialize)]
struct WireError {
    message: String,
}
