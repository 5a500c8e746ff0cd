//! B2C user data models.
//!
//! `UserRecord` mirrors the Microsoft Graph user entity; custom extension
//! attributes ride alongside the regular fields under their fully qualified
//! names. `UserApiModel` and `UserUpdateApiModel` are the admin API inputs.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use validator::Validate;

use super::attribute::CustomAttributes;
use crate::error::{ParseRoleError, PASSWORD_MISMATCH};
use crate::secure::SecureString;

/// Application role stored in the custom `Role` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    #[default]
    User,
    Seller,
    Admin,
}

/// Wire names for each role. Order defines the numeric index.
const ROLE_NAMES: [(Role, &str); 3] = [
    (Role::User, "User"),
    (Role::Seller, "Seller"),
    (Role::Admin, "Admin"),
];

impl Role {
    /// Stable string form used in the directory, in claims and in JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Seller => "Seller",
            Self::Admin => "Admin",
        }
    }

    /// Role for a numeric index (0 = User, 1 = Seller, 2 = Admin).
    pub fn from_index(index: u64) -> Option<Self> {
        ROLE_NAMES
            .get(usize::try_from(index).ok()?)
            .map(|(role, _)| *role)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseRoleError;

    /// Accepts a case-insensitive role name or its numeric index.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if let Ok(index) = s.parse::<u64>() {
            return Self::from_index(index).ok_or_else(|| ParseRoleError(s.to_string()));
        }

        ROLE_NAMES
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(s))
            .map(|(role, _)| *role)
            .ok_or_else(|| ParseRoleError(s.to_string()))
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RoleRepr {
            Name(String),
            Index(u64),
        }

        match RoleRepr::deserialize(deserializer)? {
            RoleRepr::Name(name) => name.parse().map_err(de::Error::custom),
            RoleRepr::Index(index) => Self::from_index(index)
                .ok_or_else(|| de::Error::custom(ParseRoleError(index.to_string()))),
        }
    }
}

/// Sign-in identity attached to a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectIdentity {
    #[serde(default)]
    pub sign_in_type: String,

    #[serde(default)]
    pub issuer: String,

    #[serde(default)]
    pub issuer_assigned_id: Option<String>,
}

impl ObjectIdentity {
    /// Local account identity signing in with an email address.
    pub fn email_address(issuer: &str, email: &str) -> Self {
        Self {
            sign_in_type: "emailAddress".to_string(),
            issuer: issuer.to_string(),
            issuer_assigned_id: Some(email.to_string()),
        }
    }
}

/// Password settings sent on create and password reset.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_change_password_next_sign_in: Option<bool>,
}

impl fmt::Debug for PasswordProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordProfile")
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field(
                "force_change_password_next_sign_in",
                &self.force_change_password_next_sign_in,
            )
            .finish()
    }
}

/// Directory user entity.
///
/// Every field is optional so the same type doubles as a PATCH payload.
/// Custom attributes serialize flat onto the entity under their
/// `extension_*` keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawUserRecord")]
pub struct UserRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub identities: Option<Vec<ObjectIdentity>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_profile: Option<PasswordProfile>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_policies: Option<String>,

    #[serde(flatten)]
    pub custom_attributes: BTreeMap<String, String>,
}

/// Wire shape of a Graph user, before extension attributes are picked out.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUserRecord {
    id: Option<String>,
    given_name: Option<String>,
    surname: Option<String>,
    display_name: Option<String>,
    identities: Option<Vec<ObjectIdentity>>,
    password_profile: Option<PasswordProfile>,
    password_policies: Option<String>,
    #[serde(flatten)]
    extra: serde_json::Map<String, Value>,
}

impl From<RawUserRecord> for UserRecord {
    fn from(raw: RawUserRecord) -> Self {
        let custom_attributes = raw
            .extra
            .into_iter()
            .filter(|(key, _)| key.starts_with("extension_"))
            .filter_map(|(key, value)| match value {
                Value::String(s) => Some((key, s)),
                Value::Number(n) => Some((key, n.to_string())),
                Value::Bool(b) => Some((key, b.to_string())),
                _ => None,
            })
            .collect();

        Self {
            id: raw.id,
            given_name: raw.given_name,
            surname: raw.surname,
            display_name: raw.display_name,
            identities: raw.identities,
            password_profile: raw.password_profile,
            password_policies: raw.password_policies,
            custom_attributes,
        }
    }
}

impl UserRecord {
    /// Value of a custom attribute by its fully qualified name.
    pub fn custom_attribute(&self, full_name: &str) -> Option<&str> {
        self.custom_attributes.get(full_name).map(String::as_str)
    }

    /// Set a custom attribute by its fully qualified name.
    pub fn set_custom_attribute(&mut self, full_name: String, value: impl Into<String>) {
        self.custom_attributes.insert(full_name, value.into());
    }

    /// Role stored in the custom `Role` attribute, if present and recognized.
    pub fn role(&self, attributes: &CustomAttributes) -> Option<Role> {
        self.custom_attribute(&attributes.role())?.parse().ok()
    }

    /// The email address of the first `emailAddress` identity.
    pub fn email(&self) -> Option<&str> {
        self.identities
            .as_deref()?
            .iter()
            .find(|identity| identity.sign_in_type == "emailAddress")
            .and_then(|identity| identity.issuer_assigned_id.as_deref())
    }
}

/// One page of a user listing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UserPage {
    #[serde(rename = "value", default)]
    pub users: Vec<UserRecord>,

    #[serde(rename = "@odata.nextLink", default)]
    pub next_link: Option<String>,
}

/// Fields always requested for user reads.
const BASE_USER_FIELDS: [&str; 5] = ["id", "givenName", "surname", "displayName", "identities"];

/// A `$select` field set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelection {
    fields: Vec<String>,
}

impl FieldSelection {
    /// Standard user projection plus the custom `Role` attribute.
    pub fn user(attributes: &CustomAttributes) -> Self {
        let mut fields: Vec<String> = BASE_USER_FIELDS.iter().map(|f| f.to_string()).collect();
        fields.push(attributes.role());
        Self { fields }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Comma-separated value for the `$select` query parameter.
    pub fn to_query(&self) -> String {
        self.fields.join(",")
    }
}

/// Create-user request body.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "passwords_match", skip_on_field_errors = false))]
pub struct UserApiModel {
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "The FirstName field is required."))]
    pub first_name: String,

    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "The LastName field is required."))]
    pub last_name: String,

    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "The DisplayName field is required."))]
    pub display_name: String,

    #[serde(default)]
    #[validate(custom(function = "email_address"))]
    pub email: String,

    #[serde(default)]
    pub role: Role,

    #[serde(default)]
    #[validate(custom(function = "password_present", message = "The Password field is required."))]
    pub password: SecureString,

    #[serde(default)]
    pub confirm_password: Option<SecureString>,
}

/// Update-user request body.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdateApiModel {
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "The FirstName field is required."))]
    pub first_name: String,

    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "The LastName field is required."))]
    pub last_name: String,

    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "The DisplayName field is required."))]
    pub display_name: String,

    #[serde(default)]
    #[validate(custom(function = "email_address"))]
    pub email: String,

    #[serde(default)]
    pub role: Role,
}

fn not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("required"));
    }
    Ok(())
}

fn password_present(password: &SecureString) -> Result<(), validator::ValidationError> {
    not_blank(password.as_str())
}

/// Required, then exactly one `@` that is neither leading nor trailing.
fn email_address(email: &str) -> Result<(), validator::ValidationError> {
    if email.trim().is_empty() {
        let mut err = validator::ValidationError::new("required");
        err.message = Some("The Email field is required.".into());
        return Err(err);
    }

    if !is_valid_email(email) {
        let mut err = validator::ValidationError::new("email");
        err.message = Some("The Email field is not a valid e-mail address.".into());
        return Err(err);
    }

    Ok(())
}

fn is_valid_email(email: &str) -> bool {
    email.matches('@').count() == 1
        && !email.starts_with('@')
        && !email.ends_with('@')
        && !email.contains(['\r', '\n'])
}

/// A confirmation, when sent, must repeat the password.
fn passwords_match(model: &UserApiModel) -> Result<(), validator::ValidationError> {
    match &model.confirm_password {
        Some(confirm) if confirm.as_str() != model.password.as_str() => {
            let mut err = validator::ValidationError::new(PASSWORD_MISMATCH);
            err.message = Some("'ConfirmPassword' and 'Password' do not match.".into());
            Err(err)
        }
        _ => Ok(()),
    }
}
