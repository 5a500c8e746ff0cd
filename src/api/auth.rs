//! Bearer token validation and the Admin role gate.
//!
//! Tokens are B2C access tokens signed with keys published in the policy's
//! OpenID metadata. Roles come from the `extension_Role` claim.

use std::collections::HashMap;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::AppState;
use crate::b2c::{Principal, Role};
use crate::config::Config;
use crate::error::AuthError;

/// HTTP request timeout for metadata and key fetches.
const HTTP_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// Cached signing keys are refetched after this many minutes.
const KEY_CACHE_TTL_MINUTES: i64 = 60;

/// Minimum spacing between key fetches triggered by an unknown `kid`.
const ON_DEMAND_REFRESH_COOLDOWN_SECONDS: i64 = 60;

/// Validates a bearer token and returns its claims.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate(&self, token: &str) -> Result<Value, AuthError>;
}

#[derive(Debug, Deserialize)]
struct OpenIdMetadata {
    issuer: String,
    jwks_uri: String,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    n: Option<String>,
    e: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<Jwk>,
}

/// Issuer and RSA keys from the last metadata fetch.
struct KeyCache {
    issuer: String,
    keys: HashMap<String, DecodingKey>,
    fetched_at: DateTime<Utc>,
}

impl KeyCache {
    fn is_fresh(&self) -> bool {
        Utc::now() - self.fetched_at < Duration::minutes(KEY_CACHE_TTL_MINUTES)
    }

    fn recently_fetched(&self) -> bool {
        Utc::now() - self.fetched_at < Duration::seconds(ON_DEMAND_REFRESH_COOLDOWN_SECONDS)
    }
}

/// RS256 validator backed by the B2C policy's JWKS.
pub struct JwksValidator {
    metadata_url: String,
    audience: String,
    http_client: reqwest::Client,
    cache: RwLock<Option<KeyCache>>,
}

impl JwksValidator {
    pub fn new(
        metadata_url: impl Into<String>,
        audience: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let http_client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| AuthError::MetadataUnavailable(e.to_string()))?;

        Ok(Self {
            metadata_url: metadata_url.into(),
            audience: audience.into(),
            http_client,
            cache: RwLock::new(None),
        })
    }

    /// Validator for the configured sign-up/sign-in policy; the audience is the API's client id.
    pub fn from_config(config: &Config) -> Result<Self, AuthError> {
        Self::new(config.openid_metadata_url(), config.b2c.client_id.clone())
    }

    async fn fetch_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, AuthError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| AuthError::MetadataUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::MetadataUnavailable(format!(
                "HTTP {} from {}",
                response.status().as_u16(),
                url
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::MetadataUnavailable(e.to_string()))
    }

    /// Fetch metadata and signing keys, replacing the cache.
    async fn refresh(&self) -> Result<(), AuthError> {
        let metadata: OpenIdMetadata = self.fetch_json(&self.metadata_url).await?;
        let jwks: JwksResponse = self.fetch_json(&metadata.jwks_uri).await?;

        let mut keys = HashMap::new();
        for jwk in jwks.keys {
            if jwk.kty != "RSA" {
                continue;
            }
            let (Some(n), Some(e)) = (jwk.n.as_deref(), jwk.e.as_deref()) else {
                continue;
            };
            match DecodingKey::from_rsa_components(n, e) {
                Ok(key) => {
                    keys.insert(jwk.kid, key);
                }
                Err(err) => warn!("Skipping invalid RSA key {}: {}", jwk.kid, err),
            }
        }

        if keys.is_empty() {
            return Err(AuthError::MetadataUnavailable(
                "No valid RSA keys found in JWKS".into(),
            ));
        }

        info!("Loaded {} signing keys for issuer {}", keys.len(), metadata.issuer);
        *self.cache.write().await = Some(KeyCache {
            issuer: metadata.issuer,
            keys,
            fetched_at: Utc::now(),
        });
        Ok(())
    }

    /// Look up the key for `kid` with the expected issuer, refreshing the cache if needed.
    async fn key_for(&self, kid: &str) -> Result<(DecodingKey, String), AuthError> {
        let should_refresh = {
            let cache = self.cache.read().await;
            match cache.as_ref() {
                Some(c) if c.is_fresh() => {
                    if let Some(key) = c.keys.get(kid) {
                        return Ok((key.clone(), c.issuer.clone()));
                    }
                    !c.recently_fetched()
                }
                _ => true,
            }
        };

        if should_refresh {
            debug!("Refreshing signing keys (kid {})", kid);
            self.refresh().await?;
        }

        let cache = self.cache.read().await;
        cache
            .as_ref()
            .and_then(|c| c.keys.get(kid).map(|key| (key.clone(), c.issuer.clone())))
            .ok_or_else(|| AuthError::UnknownKeyId(kid.to_string()))
    }
}

#[async_trait]
impl TokenValidator for JwksValidator {
    async fn validate(&self, token: &str) -> Result<Value, AuthError> {
        let header = decode_header(token)
            .map_err(|e| AuthError::InvalidToken(format!("Invalid JWT header: {}", e)))?;

        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidToken("Missing kid in JWT header".into()))?;

        let (key, issuer) = self.key_for(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.audience.as_str()]);
        validation.set_issuer(&[issuer.as_str()]);

        decode::<Value>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("Bearer") && !token.is_empty()).then_some(token)
}

/// Extractor that requires a valid token carrying the `Admin` role.
pub struct RequireAdmin(pub Principal);

/// Why an admin-only request was refused.
#[derive(Debug)]
pub enum AuthRejection {
    /// Missing or invalid token.
    Unauthorized,
    /// Valid token without the Admin role.
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden => StatusCode::FORBIDDEN.into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = match bearer_token(&parts.headers) {
            Some(token) => state.validator.validate(token).await,
            None => Err(AuthError::MissingToken),
        }
        .map_err(|e| {
            debug!("Rejected request: {}", e);
            AuthRejection::Unauthorized
        })?;

        let principal = Principal::from_claims(&claims);
        if !principal.has_role(Role::Admin) {
            debug!("Caller {:?} lacks the Admin role", principal.subject);
            return Err(AuthRejection::Forbidden);
        }

        Ok(Self(principal))
    }
}
