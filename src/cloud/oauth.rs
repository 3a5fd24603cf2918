//! Google OAuth 2.0 authorization-code flow with PKCE (S256).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::AuthorizedSession;

/// Errors from the authorization provider.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("OAuth client is not configured: {0}")]
    NotConfigured(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("OAuth error {error}: {description}")]
    OAuth { error: String, description: String },

    #[error("Unknown or expired login state")]
    UnknownState,
}

/// PKCE helpers (RFC 7636).
pub mod pkce {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use sha2::{Digest, Sha256};
    use uuid::Uuid;

    /// 32 random bytes, base64url encoded (43 characters).
    pub fn generate_code_verifier() -> String {
        let mut bytes = [0u8; 32];
        bytes[..16].copy_from_slice(Uuid::new_v4().as_bytes());
        bytes[16..].copy_from_slice(Uuid::new_v4().as_bytes());
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// `BASE64URL(SHA256(verifier))`.
    pub fn generate_code_challenge(verifier: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }

    /// Random CSRF state value.
    pub fn generate_state() -> String {
        URL_SAFE_NO_PAD.encode(Uuid::new_v4().as_bytes())
    }
}

/// OAuth client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    /// OAuth client ID (env: GOOGLE_OAUTH_CLIENT_ID)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// OAuth client secret (env: GOOGLE_OAUTH_CLIENT_SECRET)
    #[serde(default, skip_serializing)]
    pub client_secret: Option<String>,
    /// Callback URL registered with the provider
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    /// Local route that starts the login flow; unauthorized export requests
    /// are redirected here.
    #[serde(default = "default_login_path")]
    pub login_path: String,
    /// Seconds a started login stays valid before its callback is refused
    #[serde(default = "default_login_timeout_secs")]
    pub login_timeout_secs: u64,
}

fn default_redirect_uri() -> String {
    "http://127.0.0.1:5000/oauth2callback".to_string()
}
fn default_auth_url() -> String {
    "https://accounts.google.com/o/oauth2/v2/auth".to_string()
}
fn default_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}
fn default_scopes() -> Vec<String> {
    vec!["https://www.googleapis.com/auth/drive".to_string()]
}
fn default_login_path() -> String {
    "/authorize".to_string()
}
fn default_login_timeout_secs() -> u64 {
    600
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            redirect_uri: default_redirect_uri(),
            auth_url: default_auth_url(),
            token_url: default_token_url(),
            scopes: default_scopes(),
            login_path: default_login_path(),
            login_timeout_secs: default_login_timeout_secs(),
        }
    }
}

impl OAuthConfig {
    /// Apply GOOGLE_OAUTH_CLIENT_ID / GOOGLE_OAUTH_CLIENT_SECRET when set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(id) = std::env::var("GOOGLE_OAUTH_CLIENT_ID")
            .ok()
            .filter(|s| !s.is_empty())
        {
            self.client_id = Some(id);
        }
        if let Some(secret) = std::env::var("GOOGLE_OAUTH_CLIENT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
        {
            self.client_secret = Some(secret);
        }
        self
    }
}

/// Produces authorized sessions for the storage provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// URL of the provider's consent page for this login attempt.
    fn authorization_url(&self, state: &str, code_verifier: &str) -> Result<String, AuthError>;

    /// Trade the callback code for a session.
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<AuthorizedSession, AuthError>;
}

/// Google token endpoint response.
#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Google OAuth provider.
pub struct GoogleOAuth {
    config: OAuthConfig,
    client: reqwest::Client,
}

impl GoogleOAuth {
    pub fn new(config: OAuthConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn client_id(&self) -> Result<&str, AuthError> {
        self.config
            .client_id
            .as_deref()
            .ok_or_else(|| AuthError::NotConfigured("missing client_id".to_string()))
    }

    fn client_secret(&self) -> Result<&str, AuthError> {
        self.config
            .client_secret
            .as_deref()
            .ok_or_else(|| AuthError::NotConfigured("missing client_secret".to_string()))
    }
}

#[async_trait]
impl AuthProvider for GoogleOAuth {
    fn authorization_url(&self, state: &str, code_verifier: &str) -> Result<String, AuthError> {
        let challenge = pkce::generate_code_challenge(code_verifier);
        let scopes = self.config.scopes.join(" ");

        let url = url::Url::parse_with_params(
            &self.config.auth_url,
            &[
                ("client_id", self.client_id()?),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", scopes.as_str()),
                ("state", state),
                ("code_challenge", challenge.as_str()),
                ("code_challenge_method", "S256"),
                ("access_type", "offline"),
                ("include_granted_scopes", "true"),
            ],
        )?;

        Ok(url.into())
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<AuthorizedSession, AuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.client_id()?),
            ("client_secret", self.client_secret()?),
            ("code", code),
            ("code_verifier", code_verifier),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        debug!("Exchanging authorization code at {}", self.config.token_url);
        let response = self
            .client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(AuthError::OAuth {
                error: status.to_string(),
                description: error_body,
            });
        }

        let token: GoogleTokenResponse = response.json().await?;
        info!("Obtained Google access token");

        Ok(match token.expires_in {
            Some(secs) => AuthorizedSession::expiring_in(token.access_token, secs),
            None => AuthorizedSession::new(token.access_token),
        })
    }
}
