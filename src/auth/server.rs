use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::token::SessionTokens;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// Client for the auth server's token endpoints.
///
/// The refresh exchange trades a refresh token for a fresh access/refresh
/// pair. The backend rotates both tokens on every use, so implementations
/// must treat a response missing either value as a failure, never as a
/// partial success.
#[async_trait]
pub trait AuthServerClient: Send + Sync {
    /// Exchange a refresh token for a new token pair.
    async fn refresh(&self, refresh_token: &str) -> Result<SessionTokens>;
}

/// Wire shape of a token response from the auth server.
///
/// Fields are optional so that an incomplete body surfaces as a refresh
/// failure rather than a decode error.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

impl TokenResponse {
    /// Enforce the strict rotation contract: both tokens present and
    /// non-empty.
    fn into_tokens(self) -> Result<SessionTokens> {
        match (self.access_token, self.refresh_token) {
            (Some(access), Some(refresh)) if !access.is_empty() && !refresh.is_empty() => {
                Ok(SessionTokens::new(access, refresh))
            }
            _ => Err(ClientError::refresh_failed(
                "auth server response is missing a token",
            )),
        }
    }
}

/// Request body for the refresh exchange
#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Request body for the login exchange
#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// HTTP implementation of [`AuthServerClient`] backed by reqwest.
pub struct HttpAuthServer {
    client: Client,
    refresh_url: String,
    login_url: String,
    logout_url: String,
}

impl HttpAuthServer {
    /// Create an auth server client from the shared configuration.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            refresh_url: config.refresh_url(),
            login_url: config.login_url(),
            logout_url: config.logout_url(),
        })
    }

    /// Create a client with a pre-built reqwest client (for testing).
    pub fn with_client(client: Client, config: &ClientConfig) -> Self {
        Self {
            client,
            refresh_url: config.refresh_url(),
            login_url: config.login_url(),
            logout_url: config.logout_url(),
        }
    }

    /// Perform the password login exchange, returning the initial token
    /// pair.
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionTokens> {
        let response = self
            .client
            .post(&self.login_url)
            .json(&LoginRequest { email, password })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::refresh_failed(format!(
                "login rejected: HTTP {}: {}",
                status, body
            )));
        }

        let token_response = response.json::<TokenResponse>().await?;
        token_response.into_tokens()
    }

    /// Notify the backend that the session is over. Best effort: a failure
    /// here does not keep the local session alive.
    pub async fn logout(&self, access_token: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.logout_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "Logout request rejected by server");
        }
        Ok(())
    }
}

#[async_trait]
impl AuthServerClient for HttpAuthServer {
    async fn refresh(&self, refresh_token: &str) -> Result<SessionTokens> {
        debug!("Requesting token refresh from auth server");

        let response = self
            .client
            .post(&self.refresh_url)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await
            .map_err(|e| ClientError::refresh_failed(format!("refresh request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::refresh_failed(format!(
                "auth server returned HTTP {}: {}",
                status, body
            )));
        }

        let token_response = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| ClientError::refresh_failed(format!("malformed refresh body: {}", e)))?;

        let tokens = token_response.into_tokens()?;
        debug!("Token refresh exchange succeeded");
        Ok(tokens)
    }
}
