//! Fully qualified names for custom directory extension attributes.
//!
//! B2C stores custom user attributes as directory extensions owned by the
//! tenant's `b2c-extensions-app`. Graph addresses them as
//! `extension_<appIdWithoutHyphens>_<AttributeName>`.

use crate::error::AttributeError;

/// Logical name of the custom role attribute.
pub const ROLE_ATTRIBUTE: &str = "Role";

/// Build the fully qualified name of a custom attribute.
///
/// Hyphens are stripped from `extension_app_id` since the schema name format
/// forbids them. An empty id still yields `extension__<name>`; the directory is
/// left to reject that.
pub fn full_attribute_name(
    attribute_name: &str,
    extension_app_id: &str,
) -> Result<String, AttributeError> {
    if attribute_name.trim().is_empty() {
        return Err(AttributeError::InvalidArgument("attribute_name"));
    }

    Ok(format!(
        "extension_{}_{}",
        strip_hyphens(extension_app_id),
        attribute_name
    ))
}

fn strip_hyphens(id: &str) -> String {
    id.chars().filter(|c| *c != '-').collect()
}

/// Custom attribute namer bound to one tenant's extension app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomAttributes {
    /// Extension app id as configured, hyphens included.
    extension_app_id: String,
}

impl CustomAttributes {
    pub fn new(extension_app_id: &str) -> Self {
        Self {
            extension_app_id: extension_app_id.to_string(),
        }
    }

    /// Fully qualified name for `attribute_name`.
    pub fn full_name(&self, attribute_name: &str) -> Result<String, AttributeError> {
        full_attribute_name(attribute_name, &self.extension_app_id)
    }

    /// Fully qualified name of the `Role` attribute.
    pub fn role(&self) -> String {
        format!(
            "extension_{}_{}",
            strip_hyphens(&self.extension_app_id),
            ROLE_ATTRIBUTE
        )
    }

    /// True when the extension app id is configured.
    pub fn is_configured(&self) -> bool {
        !self.extension_app_id.trim().is_empty()
    }
}
