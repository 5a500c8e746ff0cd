//! Configuration loading and management.
//!
//! Loads configuration from embedded config.toml with environment variable overrides.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;

use crate::secure::SecureString;

/// Embedded configuration file content.
const CONFIG_TOML: &str = include_str!("../config.toml");

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub b2c: B2cConfig,
    pub api: ApiConfig,
    pub token: TokenConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Azure AD B2C tenant and app registration settings.
#[derive(Debug, Clone, Deserialize)]
pub struct B2cConfig {
    /// B2C login instance, e.g. `https://contoso.b2clogin.com`.
    pub instance: String,
    pub tenant_id: String,
    pub client_id: String,
    #[serde(default)]
    pub client_secret: SecureString,
    /// Verified domain used as the issuer of local account identities.
    pub domain: String,
    pub sign_up_sign_in_policy_id: String,
    /// Client id of the `b2c-extensions-app`. May be empty; user creation checks it.
    #[serde(default)]
    pub extension_app_client_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub graph_base_url: String,
    pub login_base_url: String,
    pub graph_scope: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    pub refresh_before_expiry_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    /// Load configuration from embedded config.toml with environment variable overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::parse_embedded()?;

        config.apply_env_overrides(|key| env::var(key).ok());

        // Validate required fields
        config.validate()?;

        Ok(config)
    }

    /// Parse the embedded config.toml without overrides or validation.
    fn parse_embedded() -> Result<Self> {
        toml::from_str(CONFIG_TOML).context("Failed to parse embedded config.toml")
    }

    /// Apply environment variable overrides through the given lookup.
    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let b2c = &mut self.b2c;

        if let Some(tenant_id) = lookup("AZURE_TENANT_ID") {
            b2c.tenant_id = tenant_id;
        }
        if let Some(client_id) = lookup("AZURE_CLIENT_ID") {
            b2c.client_id = client_id;
        }
        if let Some(secret) = lookup("AZURE_CLIENT_SECRET") {
            b2c.client_secret = SecureString::new(secret);
        }
        if let Some(instance) = lookup("B2C_INSTANCE") {
            b2c.instance = instance;
        }
        if let Some(domain) = lookup("B2C_DOMAIN") {
            b2c.domain = domain;
        }
        if let Some(policy) = lookup("B2C_SIGN_UP_SIGN_IN_POLICY_ID") {
            b2c.sign_up_sign_in_policy_id = policy;
        }
        if let Some(extension_app) = lookup("B2C_EXTENSION_APP_CLIENT_ID") {
            b2c.extension_app_client_id = extension_app;
        }
        if let Some(bind_address) = lookup("BIND_ADDRESS") {
            self.server.bind_address = bind_address;
        }
        if let Some(log_level) = lookup("RUST_LOG") {
            self.logging.level = log_level;
        }
    }

    /// Validate that required configuration is present.
    fn validate(&self) -> Result<()> {
        let b2c = &self.b2c;

        if b2c.tenant_id.is_empty() || b2c.tenant_id == "YOUR_TENANT_ID" {
            anyhow::bail!(
                "Azure AD B2C tenant not configured. Set AZURE_TENANT_ID environment variable \
                 or update config.toml"
            );
        }

        if b2c.client_id.is_empty() || b2c.client_id == "YOUR_CLIENT_ID" {
            anyhow::bail!(
                "Azure AD B2C client_id not configured. Set AZURE_CLIENT_ID environment variable \
                 or update config.toml"
            );
        }

        if b2c.client_secret.is_empty() {
            anyhow::bail!(
                "Client secret not configured. Set AZURE_CLIENT_SECRET environment variable"
            );
        }

        if b2c.domain.is_empty() || b2c.domain.starts_with("YOUR_TENANT") {
            anyhow::bail!(
                "B2C domain not configured. Set B2C_DOMAIN environment variable \
                 or update config.toml"
            );
        }

        if b2c.instance.is_empty() || b2c.instance.contains("YOUR_TENANT") {
            anyhow::bail!(
                "B2C instance not configured. Set B2C_INSTANCE environment variable \
                 or update config.toml"
            );
        }

        Ok(())
    }

    /// Get the OpenID Connect metadata URL for the sign-up/sign-in policy.
    pub fn openid_metadata_url(&self) -> String {
        format!(
            "{}/{}/{}/v2.0/.well-known/openid-configuration",
            self.b2c.instance.trim_end_matches('/'),
            self.b2c.domain,
            self.b2c.sign_up_sign_in_policy_id
        )
    }

    /// Get the client-credentials token URL for the tenant.
    pub fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.api.login_base_url.trim_end_matches('/'),
            self.b2c.tenant_id
        )
    }
}
