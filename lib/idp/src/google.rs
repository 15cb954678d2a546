//! Interactive Google sign-in flow.
//!
//! Runs the OAuth authorization-code exchange with PKCE. `begin` produces
//! the URL to open in a browser plus the state the caller must hold on to;
//! `complete` validates the callback and exchanges the code for an access
//! token, which then signs in through the identity provider's federated
//! sign-in endpoint.

use crate::config::GoogleOAuthConfig;
use hillcrest_access::AuthError;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl, basic::BasicClient,
};
use tracing::instrument;
use url::Url;

/// Google OAuth authorization URL.
const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Google OAuth token URL.
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Scopes requested for sign-in.
const SIGN_IN_SCOPES: &[&str] = &["openid", "email", "profile"];

/// State the caller holds between `begin` and `complete`.
///
/// Contains the CSRF token and the PKCE verifier, both single-use.
#[derive(Debug)]
pub struct PendingSignIn {
    csrf_token: String,
    pkce_verifier: String,
}

/// Parameters received on the OAuth redirect callback.
#[derive(Debug, Clone, Default)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

impl CallbackParams {
    /// Extracts callback parameters from a redirect URL.
    #[must_use]
    pub fn from_url(url: &Url) -> Self {
        let mut params = Self::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => params.code = Some(value.into_owned()),
                "state" => params.state = Some(value.into_owned()),
                "error" => params.error = Some(value.into_owned()),
                _ => {}
            }
        }
        params
    }
}

/// Drives the interactive Google OAuth flow.
#[derive(Clone)]
pub struct GoogleSignInFlow {
    config: GoogleOAuthConfig,
}

impl GoogleSignInFlow {
    /// Creates a flow from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured redirect URL is not a valid URL.
    pub fn new(config: GoogleOAuthConfig) -> Result<Self, AuthError> {
        let _ = RedirectUrl::new(config.redirect_url.clone()).map_err(|e| {
            AuthError::Provider {
                reason: format!("invalid redirect URL: {e}"),
            }
        })?;
        Ok(Self { config })
    }

    /// Starts the flow.
    ///
    /// Returns the authorization URL to open in a browser and the state to
    /// carry into [`complete`](Self::complete).
    #[must_use]
    pub fn begin(&self) -> (Url, PendingSignIn) {
        let client = BasicClient::new(ClientId::new(self.config.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.config.client_secret.clone()))
            .set_auth_uri(AuthUrl::new(GOOGLE_AUTH_URL.to_string()).expect("valid auth URL"))
            .set_redirect_uri(
                RedirectUrl::new(self.config.redirect_url.clone())
                    .expect("valid redirect URL"),
            );

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut auth_request = client
            .authorize_url(CsrfToken::new_random)
            .set_pkce_challenge(pkce_challenge);
        for scope in SIGN_IN_SCOPES {
            auth_request = auth_request.add_scope(Scope::new((*scope).to_string()));
        }

        let (authorize_url, csrf_token) = auth_request.url();

        (
            authorize_url,
            PendingSignIn {
                csrf_token: csrf_token.secret().clone(),
                pkce_verifier: pkce_verifier.secret().clone(),
            },
        )
    }

    /// Finishes the flow.
    ///
    /// Validates the callback against the pending state and exchanges the
    /// authorization code for an access token usable with the federated
    /// sign-in endpoint.
    #[instrument(skip_all)]
    pub async fn complete(
        &self,
        params: CallbackParams,
        pending: PendingSignIn,
    ) -> Result<String, AuthError> {
        if let Some(error) = params.error {
            return if error == "access_denied" {
                Err(AuthError::SignInCancelled)
            } else {
                Err(AuthError::Provider {
                    reason: format!("authorization failed: {error}"),
                })
            };
        }

        let state = params.state.ok_or_else(|| AuthError::Provider {
            reason: "callback is missing the state parameter".to_string(),
        })?;
        if state != pending.csrf_token {
            return Err(AuthError::Provider {
                reason: "callback state does not match the issued token".to_string(),
            });
        }
        let code = params.code.ok_or_else(|| AuthError::Provider {
            reason: "callback is missing the authorization code".to_string(),
        })?;

        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AuthError::Network {
                details: e.to_string(),
            })?;

        let client = BasicClient::new(ClientId::new(self.config.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.config.client_secret.clone()))
            .set_token_uri(TokenUrl::new(GOOGLE_TOKEN_URL.to_string()).expect("valid token URL"))
            .set_redirect_uri(
                RedirectUrl::new(self.config.redirect_url.clone())
                    .expect("valid redirect URL"),
            );

        let token = client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(PkceCodeVerifier::new(pending.pkce_verifier))
            .request_async(&http_client)
            .await
            .map_err(|e| AuthError::Provider {
                reason: format!("code exchange failed: {e}"),
            })?;

        Ok(token.access_token().secret().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow() -> GoogleSignInFlow {
        GoogleSignInFlow::new(GoogleOAuthConfig {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            redirect_url: "http://localhost:8080/callback".to_string(),
        })
        .expect("valid config")
    }

    #[test]
    fn begin_produces_pkce_authorize_url() {
        let (url, _pending) = flow().begin();
        assert_eq!(url.host_str(), Some("accounts.google.com"));
        let query: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(query.iter().any(|(k, _)| k == "code_challenge"));
        assert!(
            query
                .iter()
                .any(|(k, v)| k == "scope" && v.contains("email"))
        );
        assert!(
            query
                .iter()
                .any(|(k, v)| k == "redirect_uri" && v == "http://localhost:8080/callback")
        );
    }

    #[test]
    fn malformed_redirect_url_is_rejected() {
        let result = GoogleSignInFlow::new(GoogleOAuthConfig {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            redirect_url: "not a url".to_string(),
        });
        assert!(matches!(result, Err(AuthError::Provider { .. })));
    }

    #[test]
    fn callback_params_parse_from_url() {
        let url = Url::parse("http://localhost:8080/callback?code=abc&state=xyz").expect("url");
        let params = CallbackParams::from_url(&url);
        assert_eq!(params.code.as_deref(), Some("abc"));
        assert_eq!(params.state.as_deref(), Some("xyz"));
        assert!(params.error.is_none());
    }

    #[tokio::test]
    async fn denied_callback_maps_to_cancelled() {
        let (_, pending) = flow().begin();
        let params = CallbackParams {
            error: Some("access_denied".to_string()),
            ..CallbackParams::default()
        };
        let err = flow()
            .complete(params, pending)
            .await
            .expect_err("should fail");
        assert_eq!(err, AuthError::SignInCancelled);
    }

    #[tokio::test]
    async fn mismatched_state_is_rejected() {
        let (_, pending) = flow().begin();
        let params = CallbackParams {
            code: Some("abc".to_string()),
            state: Some("not-the-issued-state".to_string()),
            error: None,
        };
        let err = flow()
            .complete(params, pending)
            .await
            .expect_err("should fail");
        assert!(matches!(err, AuthError::Provider { .. }));
    }
}
