//! HTTP mapping of user operation failures.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::{DirectoryError, FieldError, ParseRoleError, UserError};

/// Error returned by admin API handlers.
#[derive(Debug)]
pub enum ApiError {
    User(UserError),
    InvalidRole(ParseRoleError),
    /// Request body that could not be read as the expected model.
    InvalidBody(JsonRejection),
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        Self::User(err)
    }
}

impl From<ParseRoleError> for ApiError {
    fn from(err: ParseRoleError) -> Self {
        Self::InvalidRole(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody(rejection)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRole(_) | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::User(UserError::Validation(_)) => StatusCode::BAD_REQUEST,
            Self::User(UserError::DirectoryRejected(_)) => StatusCode::BAD_REQUEST,
            Self::User(UserError::Configuration(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::User(UserError::InvalidArgument(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::User(UserError::Directory(DirectoryError::NotFound(_))) => StatusCode::NOT_FOUND,
            Self::User(UserError::Directory(DirectoryError::RateLimited)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::User(UserError::Directory(_)) => StatusCode::BAD_GATEWAY,
        }
    }

    fn user_message(&self) -> String {
        match self {
            Self::User(e) => e.user_message().to_string(),
            Self::InvalidRole(e) => e.to_string(),
            Self::InvalidBody(_) => "One or more validation errors occurred.".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::InvalidRole(e) => json!({ "error": e.to_string() }),
            Self::User(UserError::Validation(v)) => json!({
                "error": self.user_message(),
                "fields": v.errors,
            }),
            Self::InvalidBody(rejection) => {
                let field = FieldError {
                    field: "body",
                    message: rejection.body_text(),
                };
                json!({ "error": self.user_message(), "fields": [field] })
            }
            Self::User(_) => json!({ "error": self.user_message() }),
        };

        (status, Json(body)).into_response()
    }
}
