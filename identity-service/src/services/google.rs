//! Google OAuth 2.0 authorization-code exchange.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::config::GoogleOAuthConfig;
use crate::models::ExternalIdentity;
use crate::services::ServiceError;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Third-party identity provider producing verified identity assertions.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL the browser is sent to, carrying our opaque `state`.
    fn authorization_url(&self, state: &str) -> String;

    /// Redeem an authorization code for a verified identity.
    async fn exchange(&self, code: &str) -> Result<ExternalIdentity, ServiceError>;
}

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    name: Option<String>,
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
}

impl From<GoogleUserInfo> for ExternalIdentity {
    fn from(info: GoogleUserInfo) -> Self {
        let emails = info
            .email
            .filter(|_| info.email_verified)
            .into_iter()
            .collect();
        ExternalIdentity {
            subject: info.sub,
            display_name: info.name,
            emails,
        }
    }
}

#[derive(Clone)]
pub struct GoogleProvider {
    http: reqwest::Client,
    config: GoogleOAuthConfig,
}

impl GoogleProvider {
    pub fn new(config: GoogleOAuthConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope=openid%20email%20profile&state={}&prompt=select_account",
            AUTHORIZE_URL,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode(state),
        )
    }

    async fn exchange(&self, code: &str) -> Result<ExternalIdentity, ServiceError> {
        let response = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.expose_secret().as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| ServiceError::Provider(format!("Failed to contact Google: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(%status, error = %error_text, "Google token exchange failed");
            return Err(ServiceError::Provider(
                "Google token exchange failed".to_string(),
            ));
        }

        let tokens: GoogleTokenResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Provider(format!("Failed to parse Google response: {}", e)))?;

        let info: GoogleUserInfo = self
            .http
            .get(USERINFO_URL)
            .bearer_auth(&tokens.access_token)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ServiceError::Provider(format!("Google userinfo request failed: {}", e)))?
            .json()
            .await
            .map_err(|e| ServiceError::Provider(format!("Failed to parse Google userinfo: {}", e)))?;

        Ok(info.into())
    }
}
