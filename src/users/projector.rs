//! User projector: shapes CRUD requests against the directory.

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use validator::Validate;

use crate::b2c::{
    CustomAttributes, FieldSelection, ObjectIdentity, PasswordProfile, Role, UserApiModel,
    UserRecord, UserUpdateApiModel, ROLE_ATTRIBUTE,
};
use crate::config::B2cConfig;
use crate::error::{DirectoryError, FieldError, UserError, ValidationError};
use crate::graph::{DirectoryService, PageRequest};
use crate::secure::SecureString;

/// Password policy applied to newly created users.
const CREATE_PASSWORD_POLICIES: &str = "DisablePasswordExpiration";

/// Password policy applied on administrative password resets.
const RESET_PASSWORD_POLICIES: &str = "DisablePasswordExpiration,DisableStrongPassword";

/// Tenant settings the projector needs.
#[derive(Debug, Clone, Default)]
pub struct B2cSettings {
    /// Issuer for local account identities.
    pub domain: String,
    /// Client id of the `b2c-extensions-app`; may be empty.
    pub extension_app_client_id: String,
}

impl From<&B2cConfig> for B2cSettings {
    fn from(config: &B2cConfig) -> Self {
        Self {
            domain: config.domain.clone(),
            extension_app_client_id: config.extension_app_client_id.clone(),
        }
    }
}

/// Translates admin API models to directory requests and back.
pub struct UserProjector {
    directory: Arc<dyn DirectoryService>,
    settings: B2cSettings,
    attributes: CustomAttributes,
}

impl UserProjector {
    pub fn new(directory: Arc<dyn DirectoryService>, settings: B2cSettings) -> Self {
        let attributes = CustomAttributes::new(&settings.extension_app_client_id);
        Self {
            directory,
            settings,
            attributes,
        }
    }

    /// Fully qualified name of the role attribute.
    fn role_attribute(&self) -> Result<String, UserError> {
        let name = self.attributes.full_name(ROLE_ATTRIBUTE)?;
        debug!("Using custom attribute '{}' for {}", name, ROLE_ATTRIBUTE);
        Ok(name)
    }

    fn selection(&self) -> FieldSelection {
        FieldSelection::user(&self.attributes)
    }

    /// Patch carrying only the role attribute.
    fn role_patch(&self, role: Role) -> Result<UserRecord, UserError> {
        let mut patch = UserRecord::default();
        patch.set_custom_attribute(self.role_attribute()?, role.as_str());
        Ok(patch)
    }

    /// List every user, following continuation links until the directory runs out.
    pub async fn list_users(&self) -> Result<Vec<UserRecord>, UserError> {
        info!("Getting list of users...");

        let mut users = Vec::new();
        let mut request = PageRequest::First(self.selection());

        loop {
            let page = self.directory.list_users_page(&request).await?;
            users.extend(page.users);

            match page.next_link {
                Some(link) => {
                    debug!("Reading next page of users...");
                    request = PageRequest::Next(link);
                }
                None => break,
            }
        }

        info!("Found {} users", users.len());
        Ok(users)
    }

    pub async fn get_user(&self, id: &str) -> Result<UserRecord, UserError> {
        Ok(self.directory.get_user(id, &self.selection()).await?)
    }

    /// Create a user with the custom role attribute, then return the re-fetched entity.
    pub async fn create_user(&self, model: &UserApiModel) -> Result<UserRecord, UserError> {
        model.validate().map_err(ValidationError::from)?;

        if !self.attributes.is_configured() {
            return Err(UserError::Configuration(
                "B2C extension app client id is missing. Get it from the App Registrations \
                 blade in the Azure portal: the registration named 'b2c-extensions-app'."
                    .to_string(),
            ));
        }

        let mut user = UserRecord {
            given_name: Some(model.first_name.clone()),
            surname: Some(model.last_name.clone()),
            display_name: Some(model.display_name.clone()),
            identities: Some(vec![ObjectIdentity::email_address(
                &self.settings.domain,
                &model.email,
            )]),
            password_profile: Some(PasswordProfile {
                password: Some(model.password.as_str().to_string()),
                force_change_password_next_sign_in: None,
            }),
            password_policies: Some(CREATE_PASSWORD_POLICIES.to_string()),
            ..Default::default()
        };
        user.set_custom_attribute(self.role_attribute()?, model.role.as_str());

        let created = self.directory.create_user(&user).await.map_err(|e| {
            if matches!(e, DirectoryError::BadRequest) {
                error!("Have you created the custom attributes in your tenant?");
            }
            error!("Failed to create user: {}", e);
            UserError::from_write(e)
        })?;

        let id = created.id.ok_or_else(|| {
            UserError::Directory(DirectoryError::ParseFailed(
                "Created user has no id".to_string(),
            ))
        })?;

        info!("Created the new user. Now get the created user with object ID '{}'...", id);

        let user = self
            .directory
            .get_user(&id, &self.selection())
            .await
            .map_err(|e| {
                warn!("User '{}' was created but could not be read back: {}", id, e);
                UserError::Directory(e)
            })?;

        debug!(
            "DisplayName: {:?}, Role: {:?}",
            user.display_name,
            user.role(&self.attributes)
        );
        Ok(user)
    }

    /// Update names and role, then return the re-fetched entity.
    pub async fn update_user(
        &self,
        id: &str,
        model: &UserUpdateApiModel,
    ) -> Result<UserRecord, UserError> {
        model.validate().map_err(ValidationError::from)?;

        let mut patch = self.role_patch(model.role)?;
        patch.given_name = Some(model.first_name.clone());
        patch.surname = Some(model.last_name.clone());
        patch.display_name = Some(model.display_name.clone());

        self.patch_and_reload(id, &patch).await
    }

    /// Change only the role attribute, then return the re-fetched entity.
    pub async fn set_user_role(&self, id: &str, role: Role) -> Result<UserRecord, UserError> {
        let patch = self.role_patch(role)?;
        self.patch_and_reload(id, &patch).await
    }

    async fn patch_and_reload(&self, id: &str, patch: &UserRecord) -> Result<UserRecord, UserError> {
        self.directory
            .update_user(id, patch)
            .await
            .map_err(|e| {
                error!("Failed to update user '{}': {}", id, e);
                UserError::from_write(e)
            })?;

        self.get_user(id).await
    }

    /// Delete a user. A user that is already gone counts as deleted.
    pub async fn delete_user(&self, id: &str) -> Result<(), UserError> {
        info!("Looking for user with object ID '{}'...", id);

        match self.directory.delete_user(id).await {
            Ok(()) => {
                info!("User with object ID '{}' successfully deleted.", id);
                Ok(())
            }
            Err(DirectoryError::NotFound(_)) => {
                info!("User with object ID '{}' does not exist; nothing to delete.", id);
                Ok(())
            }
            Err(e) => {
                error!("Failed to delete user '{}': {}", id, e);
                Err(UserError::Directory(e))
            }
        }
    }

    /// Reset a user's password without forcing a change at next sign-in.
    pub async fn set_password(&self, id: &str, password: &SecureString) -> Result<(), UserError> {
        if password.is_empty() {
            return Err(ValidationError {
                errors: vec![FieldError {
                    field: "password",
                    message: "The Password field is required.".to_string(),
                }],
            }
            .into());
        }

        info!("Looking for user with object ID '{}'...", id);

        let patch = UserRecord {
            password_policies: Some(RESET_PASSWORD_POLICIES.to_string()),
            password_profile: Some(PasswordProfile {
                password: Some(password.as_str().to_string()),
                force_change_password_next_sign_in: Some(false),
            }),
            ..Default::default()
        };

        self.directory.update_user(id, &patch).await.map_err(|e| {
            error!("Failed to set password for user '{}': {}", id, e);
            UserError::from_write(e)
        })?;

        info!("User with object ID '{}' successfully updated.", id);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use crate::b2c::UserPage;

    pub(crate) const EXTENSION_APP_ID: &str = "aaaa-bbbb-cccc-dddd";
    pub(crate) const ROLE_KEY: &str = "extension_aaaabbbbccccdddd_Role";

    /// In-memory directory that records every call.
    #[derive(Default)]
    pub(crate) struct FakeDirectory {
        pub users: Mutex<BTreeMap<String, UserRecord>>,
        pub pages: Vec<Vec<UserRecord>>,
        pub calls: Mutex<Vec<String>>,
        pub patches: Mutex<Vec<UserRecord>>,
        pub reject_writes: bool,
        pub fail_reads: bool,
        pub fail_deletes: bool,
    }

    impl FakeDirectory {
        pub fn with_user(self, id: &str, user: UserRecord) -> Self {
            self.users.lock().unwrap().insert(id.to_string(), user);
            self
        }

        fn call(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn page(&self, index: usize) -> UserPage {
            UserPage {
                users: self.pages.get(index).cloned().unwrap_or_default(),
                next_link: (index + 1 < self.pages.len()).then(|| format!("page:{}", index + 1)),
            }
        }
    }

    #[async_trait]
    impl DirectoryService for FakeDirectory {
        async fn list_users_page(&self, request: &PageRequest) -> Result<UserPage, DirectoryError> {
            match request {
                PageRequest::First(_) => {
                    self.call("list:0".into());
                    Ok(self.page(0))
                }
                PageRequest::Next(link) => {
                    self.call(format!("list:{}", link));
                    let index = link
                        .strip_prefix("page:")
                        .and_then(|n| n.parse().ok())
                        .ok_or_else(|| DirectoryError::ParseFailed(link.clone()))?;
                    Ok(self.page(index))
                }
            }
        }

        async fn get_user(
            &self,
            id: &str,
            selection: &FieldSelection,
        ) -> Result<UserRecord, DirectoryError> {
            self.call(format!("get:{}", id));
            if self.fail_reads {
                return Err(DirectoryError::RequestFailed("HTTP 503".into()));
            }

            let mut user = self
                .users
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .ok_or_else(|| DirectoryError::NotFound(id.to_string()))?;

            // Only selected fields come back, never password data
            user.password_profile = None;
            user.password_policies = None;
            user.custom_attributes
                .retain(|key, _| selection.fields().contains(key));
            Ok(user)
        }

        async fn create_user(&self, user: &UserRecord) -> Result<UserRecord, DirectoryError> {
            self.call("create".into());
            if self.reject_writes {
                return Err(DirectoryError::BadRequest);
            }

            let mut users = self.users.lock().unwrap();
            let id = format!("user-{}", users.len() + 1);
            let mut created = user.clone();
            created.id = Some(id.clone());
            users.insert(id, created.clone());
            Ok(created)
        }

        async fn update_user(&self, id: &str, patch: &UserRecord) -> Result<(), DirectoryError> {
            self.call(format!("update:{}", id));
            self.patches.lock().unwrap().push(patch.clone());
            if self.reject_writes {
                return Err(DirectoryError::BadRequest);
            }

            let mut users = self.users.lock().unwrap();
            let user = users
                .get_mut(id)
                .ok_or_else(|| DirectoryError::NotFound(id.to_string()))?;

            if patch.given_name.is_some() {
                user.given_name = patch.given_name.clone();
            }
            if patch.surname.is_some() {
                user.surname = patch.surname.clone();
            }
            if patch.display_name.is_some() {
                user.display_name = patch.display_name.clone();
            }
            if patch.password_profile.is_some() {
                user.password_profile = patch.password_profile.clone();
            }
            if patch.password_policies.is_some() {
                user.password_policies = patch.password_policies.clone();
            }
            for (key, value) in &patch.custom_attributes {
                user.custom_attributes.insert(key.clone(), value.clone());
            }
            Ok(())
        }

        async fn delete_user(&self, id: &str) -> Result<(), DirectoryError> {
            self.call(format!("delete:{}", id));
            if self.fail_deletes {
                return Err(DirectoryError::RequestFailed("HTTP 500".into()));
            }
            self.users
                .lock()
                .unwrap()
                .remove(id)
                .map(|_| ())
                .ok_or_else(|| DirectoryError::NotFound(id.to_string()))
        }
    }

    pub(crate) fn settings() -> B2cSettings {
        B2cSettings {
            domain: "contoso.onmicrosoft.com".into(),
            extension_app_client_id: EXTENSION_APP_ID.into(),
        }
    }

    fn projector(directory: &Arc<FakeDirectory>) -> UserProjector {
        UserProjector::new(directory.clone(), settings())
    }

    pub(crate) fn existing_user() -> UserRecord {
        let mut user = UserRecord {
            given_name: Some("Ada".into()),
            surname: Some("Lovelace".into()),
            display_name: Some("Ada Lovelace".into()),
            identities: Some(vec![ObjectIdentity::email_address(
                "contoso.onmicrosoft.com",
                "ada@example.com",
            )]),
            ..Default::default()
        };
        user.set_custom_attribute(ROLE_KEY.into(), "User");
        user
    }

    fn new_user(email: &str, role: Role) -> UserApiModel {
        UserApiModel {
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            display_name: "Grace Hopper".into(),
            email: email.into(),
            role,
            password: SecureString::new("Passw0rd!".into()),
            confirm_password: None,
        }
    }

    fn named(id: &str) -> UserRecord {
        UserRecord {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_list_concatenates_pages() {
        let directory = Arc::new(FakeDirectory {
            pages: vec![vec![named("u1"), named("u2")], vec![named("u3")], vec![]],
            ..Default::default()
        });

        let users = projector(&directory).list_users().await.unwrap();
        let ids: Vec<_> = users.iter().filter_map(|u| u.id.as_deref()).collect();

        assert_eq!(ids, vec!["u1", "u2", "u3"]);
        assert_eq!(directory.calls(), vec!["list:0", "list:page:1", "list:page:2"]);
    }

    #[tokio::test]
    async fn test_list_propagates_errors() {
        struct Broken;

        #[async_trait]
        impl DirectoryService for Broken {
            async fn list_users_page(&self, _: &PageRequest) -> Result<UserPage, DirectoryError> {
                Err(DirectoryError::Unauthorized)
            }
            async fn get_user(&self, id: &str, _: &FieldSelection) -> Result<UserRecord, DirectoryError> {
                Err(DirectoryError::NotFound(id.into()))
            }
            async fn create_user(&self, _: &UserRecord) -> Result<UserRecord, DirectoryError> {
                Err(DirectoryError::Forbidden)
            }
            async fn update_user(&self, _: &str, _: &UserRecord) -> Result<(), DirectoryError> {
                Err(DirectoryError::Forbidden)
            }
            async fn delete_user(&self, _: &str) -> Result<(), DirectoryError> {
                Err(DirectoryError::Forbidden)
            }
        }

        let projector = UserProjector::new(Arc::new(Broken), settings());
        let err = projector.list_users().await.unwrap_err();
        assert!(matches!(err, UserError::Directory(DirectoryError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_create_builds_entity_with_role_attribute() {
        let directory = Arc::new(FakeDirectory::default());

        let created = projector(&directory)
            .create_user(&new_user("a@b.com", Role::Seller))
            .await
            .unwrap();

        let stored = directory.users.lock().unwrap()["user-1"].clone();
        let identities = stored.identities.clone().unwrap();
        assert_eq!(identities.len(), 1);
        assert_eq!(identities[0].sign_in_type, "emailAddress");
        assert_eq!(identities[0].issuer, "contoso.onmicrosoft.com");
        assert_eq!(identities[0].issuer_assigned_id.as_deref(), Some("a@b.com"));
        assert_eq!(stored.custom_attribute(ROLE_KEY), Some("Seller"));
        assert_eq!(
            stored.password_policies.as_deref(),
            Some("DisablePasswordExpiration")
        );
        assert_eq!(
            stored.password_profile.and_then(|p| p.password).as_deref(),
            Some("Passw0rd!")
        );

        // Canonical projection comes from the re-fetch, not the creation echo
        assert_eq!(directory.calls(), vec!["create", "get:user-1"]);
        assert!(created.password_profile.is_none());
        assert_eq!(created.custom_attribute(ROLE_KEY), Some("Seller"));
    }

    #[tokio::test]
    async fn test_create_then_get_round_trips_role() {
        let directory = Arc::new(FakeDirectory::default());
        let projector = projector(&directory);

        let created = projector
            .create_user(&new_user("a@b.com", Role::Admin))
            .await
            .unwrap();
        let id = created.id.unwrap();
        let read = projector.get_user(&id).await.unwrap();

        assert_eq!(read.custom_attribute(ROLE_KEY), Some(Role::Admin.as_str()));
    }

    #[tokio::test]
    async fn test_create_without_extension_app_is_configuration_error() {
        let directory = Arc::new(FakeDirectory::default());
        let projector = UserProjector::new(
            directory.clone(),
            B2cSettings {
                extension_app_client_id: String::new(),
                ..settings()
            },
        );

        let err = projector
            .create_user(&new_user("a@b.com", Role::User))
            .await
            .unwrap_err();

        assert!(matches!(err, UserError::Configuration(_)));
        assert!(directory.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_invalid_model_is_validation_error() {
        let directory = Arc::new(FakeDirectory::default());

        let err = projector(&directory)
            .create_user(&new_user("not-an-email", Role::User))
            .await
            .unwrap_err();

        match err {
            UserError::Validation(v) => assert!(v.has_field("email")),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(directory.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_rejected_by_directory() {
        let directory = Arc::new(FakeDirectory {
            reject_writes: true,
            ..Default::default()
        });

        let err = projector(&directory)
            .create_user(&new_user("a@b.com", Role::User))
            .await
            .unwrap_err();

        assert!(matches!(err, UserError::DirectoryRejected(_)));
        assert_eq!(directory.calls(), vec!["create"]);
    }

    #[tokio::test]
    async fn test_create_with_hyphen_only_extension_id_reaches_directory() {
        let directory = Arc::new(FakeDirectory::default());
        let projector = UserProjector::new(
            directory.clone(),
            B2cSettings {
                extension_app_client_id: "---".into(),
                ..settings()
            },
        );

        let created = projector
            .create_user(&new_user("a@b.com", Role::User))
            .await
            .unwrap();

        assert_eq!(created.custom_attribute("extension__Role"), Some("User"));
        assert_eq!(directory.calls(), vec!["create", "get:user-1"]);
    }

    #[tokio::test]
    async fn test_create_refetch_failure_leaves_user_in_place() {
        let directory = Arc::new(FakeDirectory {
            fail_reads: true,
            ..Default::default()
        });

        let err = projector(&directory)
            .create_user(&new_user("a@b.com", Role::User))
            .await
            .unwrap_err();

        assert!(matches!(err, UserError::Directory(DirectoryError::RequestFailed(_))));
        assert!(directory.users.lock().unwrap().contains_key("user-1"));
    }

    #[tokio::test]
    async fn test_update_maps_names_and_role() {
        let directory = Arc::new(FakeDirectory::default().with_user("u1", existing_user()));

        let updated = projector(&directory)
            .update_user(
                "u1",
                &UserUpdateApiModel {
                    first_name: "Augusta".into(),
                    last_name: "King".into(),
                    display_name: "Augusta Ada King".into(),
                    email: "ada@example.com".into(),
                    role: Role::Seller,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.given_name.as_deref(), Some("Augusta"));
        assert_eq!(updated.surname.as_deref(), Some("King"));
        assert_eq!(updated.display_name.as_deref(), Some("Augusta Ada King"));
        assert_eq!(updated.custom_attribute(ROLE_KEY), Some("Seller"));
        assert_eq!(directory.calls(), vec!["update:u1", "get:u1"]);
    }

    #[tokio::test]
    async fn test_update_with_same_names_changes_only_role() {
        let directory = Arc::new(FakeDirectory::default().with_user("u1", existing_user()));
        let projector = projector(&directory);

        let model = UserUpdateApiModel {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            display_name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            role: Role::Admin,
        };
        let first = projector.update_user("u1", &model).await.unwrap();
        let second = projector.update_user("u1", &model).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(second.given_name.as_deref(), Some("Ada"));
        assert_eq!(second.surname.as_deref(), Some("Lovelace"));
        assert_eq!(second.display_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(second.custom_attribute(ROLE_KEY), Some("Admin"));
    }

    #[tokio::test]
    async fn test_set_role_touches_only_role_attribute() {
        let directory = Arc::new(FakeDirectory::default().with_user("u1", existing_user()));

        let updated = projector(&directory)
            .set_user_role("u1", Role::Seller)
            .await
            .unwrap();

        let patches = directory.patches.lock().unwrap();
        let patch = &patches[0];
        assert!(patch.given_name.is_none());
        assert!(patch.surname.is_none());
        assert!(patch.display_name.is_none());
        assert_eq!(patch.custom_attributes.len(), 1);
        assert_eq!(patch.custom_attribute(ROLE_KEY), Some("Seller"));

        assert_eq!(updated.given_name.as_deref(), Some("Ada"));
        assert_eq!(updated.custom_attribute(ROLE_KEY), Some("Seller"));
    }

    #[tokio::test]
    async fn test_update_rejected_by_directory() {
        let directory = Arc::new(FakeDirectory {
            reject_writes: true,
            ..Default::default()
        }
        .with_user("u1", existing_user()));

        let err = projector(&directory)
            .update_user(
                "u1",
                &UserUpdateApiModel {
                    first_name: "Augusta".into(),
                    last_name: "King".into(),
                    display_name: "Augusta Ada King".into(),
                    email: "ada@example.com".into(),
                    role: Role::Seller,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, UserError::DirectoryRejected(_)));
        assert_eq!(directory.calls(), vec!["update:u1"]);
    }

    #[tokio::test]
    async fn test_set_role_rejected_by_directory() {
        let directory = Arc::new(FakeDirectory {
            reject_writes: true,
            ..Default::default()
        }
        .with_user("u1", existing_user()));

        let err = projector(&directory)
            .set_user_role("u1", Role::Admin)
            .await
            .unwrap_err();

        assert!(matches!(err, UserError::DirectoryRejected(_)));
        assert_eq!(directory.calls(), vec!["update:u1"]);
        assert_eq!(
            directory.users.lock().unwrap()["u1"].custom_attribute(ROLE_KEY),
            Some("User")
        );
    }

    #[tokio::test]
    async fn test_set_role_on_missing_user() {
        let directory = Arc::new(FakeDirectory::default());

        let err = projector(&directory)
            .set_user_role("ghost", Role::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::Directory(DirectoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_missing_user_propagates() {
        let directory = Arc::new(FakeDirectory::default());

        let err = projector(&directory).get_user("ghost").await.unwrap_err();
        assert!(matches!(err, UserError::Directory(DirectoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_existing_and_missing_user() {
        let directory = Arc::new(FakeDirectory::default().with_user("u1", existing_user()));
        let projector = projector(&directory);

        projector.delete_user("u1").await.unwrap();
        assert!(directory.users.lock().unwrap().is_empty());

        // Already gone is still success
        projector.delete_user("u1").await.unwrap();
        projector.delete_user("never-existed").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_other_failures_surface() {
        let directory = Arc::new(FakeDirectory {
            fail_deletes: true,
            ..Default::default()
        });

        let err = projector(&directory).delete_user("u1").await.unwrap_err();
        assert!(matches!(err, UserError::Directory(DirectoryError::RequestFailed(_))));
    }

    #[tokio::test]
    async fn test_set_password_patch() {
        let directory = Arc::new(FakeDirectory::default().with_user("u1", existing_user()));

        projector(&directory)
            .set_password("u1", &SecureString::new("N3w-secret".into()))
            .await
            .unwrap();

        let patches = directory.patches.lock().unwrap();
        let patch = &patches[0];
        assert_eq!(
            patch.password_policies.as_deref(),
            Some("DisablePasswordExpiration,DisableStrongPassword")
        );
        let profile = patch.password_profile.clone().unwrap();
        assert_eq!(profile.password.as_deref(), Some("N3w-secret"));
        assert_eq!(profile.force_change_password_next_sign_in, Some(false));
        assert!(patch.custom_attributes.is_empty());
        assert!(patch.given_name.is_none());
    }

    #[tokio::test]
    async fn test_set_password_errors() {
        let directory = Arc::new(FakeDirectory::default());
        let projector = projector(&directory);

        let err = projector
            .set_password("u1", &SecureString::default())
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::Validation(_)));
        assert!(directory.calls().is_empty());

        let err = projector
            .set_password("ghost", &SecureString::new("x".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::Directory(DirectoryError::NotFound(_))));
    }
}
