//! Azure AD B2C domain types.
//!
//! This module provides:
//! - Custom extension attribute naming (`extension_<appId>_<Name>`)
//! - User records and the API-facing create/update models
//! - Mapping of the `extension_Role` token claim onto roles

pub mod attribute;
pub mod claims;
pub mod models;

pub use attribute::{CustomAttributes, ROLE_ATTRIBUTE};
pub use claims::Principal;
pub use models::{
    FieldSelection, ObjectIdentity, PasswordProfile, Role, UserApiModel, UserPage, UserRecord,
    UserUpdateApiModel,
};
