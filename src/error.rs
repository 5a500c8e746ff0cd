//! Error types for the b2c-admin service.
//!
//! Uses `thiserror` for library-style errors with automatic `Display` and `Error` implementations.

use thiserror::Error;

/// Top-level application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Directory client error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Custom attribute naming errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AttributeError {
    #[error("Invalid argument `{0}`: attribute name cannot be empty")]
    InvalidArgument(&'static str),
}

/// Unrecognized role name or index.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown role: {0}")]
pub struct ParseRoleError(pub String);

/// A single failed field check on an inbound model.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Request model validation failure, carrying every failed field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Validation failed for {} field(s)", .errors.len())]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    /// Returns true if the given field has at least one error.
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

/// Code of the model-level check that the password confirmation matches.
pub const PASSWORD_MISMATCH: &str = "password_mismatch";

/// Request model fields and their JSON names, in report order.
/// Model-level errors are reported by `validator` under `__all__`.
const REQUEST_FIELDS: [(&str, &str); 6] = [
    ("first_name", "firstName"),
    ("last_name", "lastName"),
    ("display_name", "displayName"),
    ("email", "email"),
    ("password", "password"),
    ("__all__", "confirmPassword"),
];

impl From<validator::ValidationErrors> for ValidationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let by_field = errors.field_errors();

        let errors = REQUEST_FIELDS
            .iter()
            .filter_map(|(name, field)| by_field.get(*name).map(|errs| (*field, *errs)))
            .flat_map(|(field, errs)| {
                errs.iter()
                    .filter(move |e| field != "confirmPassword" || e.code == PASSWORD_MISMATCH)
                    .map(move |e| FieldError {
                        field,
                        message: e
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string()),
                    })
            })
            .collect();

        Self { errors }
    }
}

/// Token acquisition and validation errors.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Token request failed: {0}")]
    TokenRequestFailed(String),

    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Signing key not found: {0}")]
    UnknownKeyId(String),

    #[error("OpenID metadata unavailable: {0}")]
    MetadataUnavailable(String),
}

/// Errors returned by the directory service (Microsoft Graph).
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Directory rejected the request (400)")]
    BadRequest,

    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Unauthorized (401): Token may be expired")]
    Unauthorized,

    #[error("Forbidden (403): Insufficient permissions")]
    Forbidden,

    #[error("Rate limited (429): Too many requests")]
    RateLimited,

    #[error("Graph API request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse API response: {0}")]
    ParseFailed(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Could not acquire Graph token: {0}")]
    Token(#[from] AuthError),
}

/// Errors surfaced by user operations.
#[derive(Error, Debug)]
pub enum UserError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    InvalidArgument(#[from] AttributeError),

    #[error("Directory rejected request: {0}")]
    DirectoryRejected(String),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl UserError {
    /// Map a directory failure on a write path, where a 400 means the tenant refused the payload.
    pub fn from_write(err: DirectoryError) -> Self {
        match err {
            DirectoryError::BadRequest => Self::DirectoryRejected(err.to_string()),
            other => Self::Directory(other),
        }
    }

    /// Returns a user-friendly message for API responses.
    pub fn user_message(&self) -> &str {
        match self {
            Self::Configuration(_) => "The service is not configured correctly.",
            Self::Validation(_) => "One or more validation errors occurred.",
            Self::InvalidArgument(_) => "Invalid custom attribute name.",
            Self::DirectoryRejected(_) => {
                "The directory rejected the request. Check the submitted values."
            }
            Self::Directory(DirectoryError::NotFound(_)) => "User not found.",
            Self::Directory(DirectoryError::RateLimited) => {
                "Too many requests. Please wait a moment."
            }
            Self::Directory(_) => "The directory service is unavailable.",
        }
    }
}

impl AppError {
    /// Returns a user-friendly message for display on the console.
    pub fn user_message(&self) -> &str {
        match self {
            Self::Config(_) => "Configuration error. Please check settings.",
            Self::Auth(AuthError::TokenRequestFailed(_)) => {
                "Could not sign in to Microsoft Graph. Check the client credentials."
            }
            Self::Auth(_) => "Authentication failed.",
            Self::Directory(_) => "Could not create the Microsoft Graph client.",
            Self::Io(_) => "IO error. Check the bind address.",
        }
    }
}
