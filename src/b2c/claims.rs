//! Mapping of B2C token claims onto an authenticated principal.
//!
//! B2C emits the custom `Role` attribute in issued tokens as the
//! `extension_Role` claim. Each value becomes an application role.

use serde_json::Value;
use tracing::debug;

use super::models::Role;

/// Claim carrying the custom role attribute in B2C tokens.
pub const ROLE_CLAIM: &str = "extension_Role";

/// Authenticated caller derived from validated token claims.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Principal {
    /// `sub`, falling back to `oid`.
    pub subject: Option<String>,
    /// `name` claim.
    pub name: Option<String>,
    pub roles: Vec<Role>,
}

impl Principal {
    /// Build a principal from a validated claim set.
    pub fn from_claims(claims: &Value) -> Self {
        let text = |key: &str| claims.get(key).and_then(Value::as_str).map(str::to_string);

        Self {
            subject: text("sub").or_else(|| text("oid")),
            name: text("name"),
            roles: role_claims(claims),
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Roles named by the `extension_Role` claim, which may be a string or an array.
fn role_claims(claims: &Value) -> Vec<Role> {
    let values: Vec<&str> = match claims.get(ROLE_CLAIM) {
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };

    let mut roles = Vec::new();
    for value in values {
        match value.parse::<Role>() {
            Ok(role) if !roles.contains(&role) => roles.push(role),
            Ok(_) => {}
            Err(e) => debug!("Ignoring role claim: {}", e),
        }
    }
    roles
}
