//! Client-credentials token source for Microsoft Graph.
//!
//! The admin API calls Graph as itself (application permissions), so it uses
//! the OAuth2 client-credentials grant and caches the token until shortly
//! before it expires.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::time::Duration as StdDuration;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::AuthError;
use crate::secure::SecureString;

/// HTTP request timeout.
const HTTP_TIMEOUT: StdDuration = StdDuration::from_secs(30);
/// HTTP connection timeout.
const HTTP_CONNECT_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// Default refresh margin before token expiry, in seconds.
const DEFAULT_REFRESH_BEFORE_EXPIRY_SECONDS: i64 = 300;

/// Upper bound applied to token lifetimes reported by the token endpoint.
const MAX_TOKEN_LIFETIME_SECONDS: u64 = 86_400;

/// Cached access token with its expiry.
struct CachedToken {
    access_token: SecureString,
    expires_at: DateTime<Utc>,
}

/// Client-credentials token provider.
pub struct ClientCredentials {
    token_url: String,
    client_id: String,
    client_secret: SecureString,
    scope: String,
    refresh_before: Duration,
    http_client: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl ClientCredentials {
    /// Create a token provider for the given token endpoint and app registration.
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: SecureString,
        scope: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let http_client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AuthError::TokenRequestFailed(e.to_string()))?;

        Ok(Self {
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret,
            scope: scope.into(),
            refresh_before: Duration::seconds(DEFAULT_REFRESH_BEFORE_EXPIRY_SECONDS),
            http_client,
            cached: Mutex::new(None),
        })
    }

    /// Create a token provider from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, AuthError> {
        let refresh_before = config
            .token
            .refresh_before_expiry_seconds
            .min(MAX_TOKEN_LIFETIME_SECONDS) as i64;

        Ok(Self::new(
            config.token_url(),
            config.b2c.client_id.clone(),
            config.b2c.client_secret.clone(),
            config.api.graph_scope.clone(),
        )?
        .with_refresh_before(Duration::seconds(refresh_before)))
    }

    /// Refresh this long before the token actually expires.
    pub fn with_refresh_before(mut self, refresh_before: Duration) -> Self {
        self.refresh_before = refresh_before;
        self
    }

    /// Get a valid access token, requesting a new one when the cached token is near expiry.
    pub async fn access_token(&self) -> Result<SecureString, AuthError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if Utc::now() + self.refresh_before < token.expires_at {
                return Ok(token.access_token.clone());
            }
            debug!("Graph token near expiry, requesting a new one");
        }

        let token = self.request_token().await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);

        Ok(access_token)
    }

    async fn request_token(&self) -> Result<CachedToken, AuthError> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "client_credentials"),
            ("scope", self.scope.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::TokenRequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            // Log error details for debugging (doesn't expose to caller)
            let error_body = response.text().await.unwrap_or_default();
            error!("Token request failed: HTTP {} - {}", status, error_body);
            return Err(AuthError::TokenRequestFailed(format!(
                "HTTP {}",
                status.as_u16()
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::TokenRequestFailed(e.to_string()))?;

        let expires_in = token_response.expires_in.min(MAX_TOKEN_LIFETIME_SECONDS) as i64;
        let expires_at = Utc::now() + Duration::seconds(expires_in);
        info!("Acquired Graph token, expires at {}", expires_at);

        Ok(CachedToken {
            access_token: SecureString::new(token_response.access_token),
            expires_at,
        })
    }
}

/// Token response from the Microsoft identity platform.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}
