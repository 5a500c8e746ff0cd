//! Microsoft Graph API client for B2C directory users.
//!
//! Implements `DirectoryService` against `{graph_base_url}/users`.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

use super::directory::{DirectoryService, PageRequest};
use super::token::ClientCredentials;
use crate::b2c::{FieldSelection, UserPage, UserRecord};
use crate::error::DirectoryError;

/// HTTP request timeout.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
/// HTTP connection timeout.
const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Microsoft Graph directory client.
pub struct GraphDirectory {
    base_url: String,
    credentials: ClientCredentials,
    http_client: Client,
}

impl GraphDirectory {
    /// Create a new Graph client rooted at `base_url` (e.g. `https://graph.microsoft.com/v1.0`).
    pub fn new(
        base_url: impl Into<String>,
        credentials: ClientCredentials,
    ) -> Result<Self, DirectoryError> {
        let http_client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .build()
            .map_err(DirectoryError::Network)?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            http_client,
        })
    }

    fn users_url(&self) -> String {
        format!("{}/users", self.base_url)
    }

    fn user_url(&self, id: &str) -> String {
        format!("{}/users/{}", self.base_url, urlencoding::encode(id))
    }

    fn with_select(url: &str, selection: &FieldSelection) -> Result<Url, DirectoryError> {
        let mut url = Url::parse(url)
            .map_err(|e| DirectoryError::RequestFailed(format!("Invalid URL {}: {}", url, e)))?;
        url.query_pairs_mut()
            .append_pair("$select", &selection.to_query());
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        id: Option<&str>,
    ) -> Result<T, DirectoryError> {
        debug!("GET {}", url);

        let token = self.credentials.access_token().await?;
        let response = self
            .http_client
            .get(url)
            .bearer_auth(token.as_str())
            .send()
            .await?;

        let response = check_status(response, "GET", id).await?;
        response
            .json()
            .await
            .map_err(|e| DirectoryError::ParseFailed(e.to_string()))
    }
}

/// Map a Graph response status onto `DirectoryError`.
async fn check_status(
    response: Response,
    operation: &str,
    id: Option<&str>,
) -> Result<Response, DirectoryError> {
    let status = response.status();
    match status.as_u16() {
        200..=299 => Ok(response),
        400 => {
            let body = response.text().await.unwrap_or_default();
            error!("Graph {} rejected: HTTP 400 - {}", operation, body);
            Err(DirectoryError::BadRequest)
        }
        401 => Err(DirectoryError::Unauthorized),
        403 => Err(DirectoryError::Forbidden),
        404 => Err(DirectoryError::NotFound(id.unwrap_or_default().to_string())),
        429 => Err(DirectoryError::RateLimited),
        _ => {
            let body = response.text().await.unwrap_or_default();
            error!("Graph {} failed: HTTP {} - {}", operation, status, body);
            // Don't expose raw API error details
            Err(DirectoryError::RequestFailed(format!(
                "HTTP {}",
                status.as_u16()
            )))
        }
    }
}

#[async_trait]
impl DirectoryService for GraphDirectory {
    async fn list_users_page(&self, request: &PageRequest) -> Result<UserPage, DirectoryError> {
        let url = match request {
            PageRequest::First(selection) => Self::with_select(&self.users_url(), selection)?,
            PageRequest::Next(link) => Url::parse(link).map_err(|e| {
                DirectoryError::ParseFailed(format!("Invalid next link {}: {}", link, e))
            })?,
        };

        self.get_json(url, None).await
    }

    async fn get_user(
        &self,
        id: &str,
        selection: &FieldSelection,
    ) -> Result<UserRecord, DirectoryError> {
        let url = Self::with_select(&self.user_url(id), selection)?;
        self.get_json(url, Some(id)).await
    }

    async fn create_user(&self, user: &UserRecord) -> Result<UserRecord, DirectoryError> {
        debug!("POST {}", self.users_url());

        let token = self.credentials.access_token().await?;
        let response = self
            .http_client
            .post(self.users_url())
            .bearer_auth(token.as_str())
            .json(user)
            .send()
            .await?;

        let response = check_status(response, "create user", None).await?;
        response
            .json()
            .await
            .map_err(|e| DirectoryError::ParseFailed(e.to_string()))
    }

    async fn update_user(&self, id: &str, patch: &UserRecord) -> Result<(), DirectoryError> {
        debug!("PATCH {}", self.user_url(id));

        let token = self.credentials.access_token().await?;
        let response = self
            .http_client
            .patch(self.user_url(id))
            .bearer_auth(token.as_str())
            .json(patch)
            .send()
            .await?;

        check_status(response, "update user", Some(id)).await?;
        Ok(())
    }

    async fn delete_user(&self, id: &str) -> Result<(), DirectoryError> {
        debug!("DELETE {}", self.user_url(id));

        let token = self.credentials.access_token().await?;
        let response = self
            .http_client
            .delete(self.user_url(id))
            .bearer_auth(token.as_str())
            .send()
            .await?;

        check_status(response, "delete user", Some(id)).await?;
        Ok(())
    }
}
