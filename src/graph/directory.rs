//! Directory service abstraction over user entities.

use async_trait::async_trait;

use crate::b2c::{FieldSelection, UserPage, UserRecord};
use crate::error::DirectoryError;

/// Which page of a user listing to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    /// First page, with the fields to select.
    First(FieldSelection),
    /// Continuation link returned by the previous page.
    Next(String),
}

/// Request/response access to directory users keyed by opaque id.
///
/// Each call is a single round trip; implementations do not retry.
#[async_trait]
pub trait DirectoryService: Send + Sync {
    async fn list_users_page(&self, request: &PageRequest) -> Result<UserPage, DirectoryError>;

    async fn get_user(
        &self,
        id: &str,
        selection: &FieldSelection,
    ) -> Result<UserRecord, DirectoryError>;

    /// Create a user and return the entity as echoed by the directory.
    async fn create_user(&self, user: &UserRecord) -> Result<UserRecord, DirectoryError>;

    /// Partial update: only fields set on `patch` are changed.
    async fn update_user(&self, id: &str, patch: &UserRecord) -> Result<(), DirectoryError>;

    async fn delete_user(&self, id: &str) -> Result<(), DirectoryError>;
}
