//! Provisioning configuration loading and validation

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use stackbridge_roles::{arm, DuplicatePolicy, ResolverContext};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Complete provisioning configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProvisionConfig {
    #[serde(default)]
    pub catalog: CatalogSection,

    #[serde(default)]
    pub token: TokenSection,

    #[serde(default)]
    pub stack: StackSection,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogSection {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenSection {
    #[serde(default = "default_token_env")]
    pub env_var: String,
    #[serde(default = "default_token_validity")]
    pub validity_secs: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StackSection {
    #[serde(default = "default_roles")]
    pub roles: Vec<String>,
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
    #[serde(default)]
    pub settle_delay_secs: u64,
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_version: default_api_version(),
            scope: default_scope(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for TokenSection {
    fn default() -> Self {
        Self {
            env_var: default_token_env(),
            validity_secs: default_token_validity(),
        }
    }
}

impl Default for StackSection {
    fn default() -> Self {
        Self {
            roles: default_roles(),
            duplicate_policy: DuplicatePolicy::default(),
            settle_delay_secs: 0,
        }
    }
}

// Default value functions
fn default_endpoint() -> String { arm::DEFAULT_ENDPOINT.to_string() }
fn default_api_version() -> String { arm::DEFAULT_API_VERSION.to_string() }
fn default_scope() -> String { stackbridge_roles::resolver::ROOT_SCOPE.to_string() }
fn default_request_timeout() -> u64 { 30 }
fn default_token_env() -> String { "STACKBRIDGE_ACCESS_TOKEN".to_string() }
fn default_token_validity() -> i64 { stackbridge_roles::resolver::DEFAULT_TOKEN_VALIDITY_SECS }
fn default_roles() -> Vec<String> {
    vec![
        "Key Vault Secrets Officer".to_string(),
        "Key Vault Secrets User".to_string(),
        "Key Vault Reader".to_string(),
    ]
}

impl ProvisionConfig {
    /// Load configuration from TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read configuration file {:?}", path.as_ref()))?;

        let config: ProvisionConfig = toml::from_str(&contents)
            .context("Failed to parse configuration file")?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !self.catalog.endpoint.starts_with("https://") && !self.catalog.endpoint.starts_with("http://") {
            anyhow::bail!("Catalog endpoint must be an http(s) URL");
        }

        if self.catalog.api_version.trim().is_empty() {
            anyhow::bail!("Catalog api_version must not be empty");
        }

        if !self.catalog.scope.starts_with('/') {
            anyhow::bail!("Catalog scope must start with '/'");
        }

        if self.catalog.request_timeout_secs == 0 {
            anyhow::bail!("Request timeout must be greater than zero");
        }

        if self.token.validity_secs <= 0 {
            anyhow::bail!("Token validity must be greater than zero");
        }

        if self.token.env_var.trim().is_empty() {
            anyhow::bail!("Token env_var must not be empty");
        }

        if self.stack.roles.iter().any(|role| role.trim().is_empty()) {
            anyhow::bail!("Role names must not be empty");
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog.request_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.stack.settle_delay_secs)
    }

    /// Resolver session state derived from this configuration
    pub fn resolver_context(&self) -> ResolverContext {
        ResolverContext {
            scope: self.catalog.scope.clone(),
            token_validity: chrono::Duration::seconds(self.token.validity_secs),
            clock: Arc::new(stackbridge_roles::SystemClock),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = ProvisionConfig::default();

        config.validate().unwrap();
        assert_eq!(config.catalog.endpoint, "https://management.azure.com");
        assert_eq!(config.catalog.scope, "/");
        assert_eq!(config.token.validity_secs, 3600);
        assert_eq!(config.stack.roles.len(), 3);
        assert_eq!(config.stack.duplicate_policy, DuplicatePolicy::First);
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[catalog]
scope = "/subscriptions/0000"

[stack]
roles = ["Owner"]
duplicate_policy = "reject"
settle_delay_secs = 5
"#
        )
        .unwrap();

        let config = ProvisionConfig::load(file.path()).unwrap();
        config.validate().unwrap();

        assert_eq!(config.catalog.scope, "/subscriptions/0000");
        assert_eq!(config.catalog.api_version, "2022-04-01");
        assert_eq!(config.stack.roles, vec!["Owner".to_string()]);
        assert_eq!(config.stack.duplicate_policy, DuplicatePolicy::Reject);
        assert_eq!(config.settle_delay(), Duration::from_secs(5));
        assert_eq!(config.token.env_var, "STACKBRIDGE_ACCESS_TOKEN");
    }

    #[test]
    fn test_load_missing_file() {
        assert!(ProvisionConfig::load("/nonexistent/stackbridge.toml").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ProvisionConfig::default();
        config.catalog.scope = "subscriptions/0000".to_string();
        assert!(config.validate().is_err());

        let mut config = ProvisionConfig::default();
        config.token.validity_secs = 0;
        assert!(config.validate().is_err());

        let mut config = ProvisionConfig::default();
        config.catalog.endpoint = "ftp://example".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_resolver_context() {
        let mut config = ProvisionConfig::default();
        config.token.validity_secs = 600;

        let context = config.resolver_context();
        assert_eq!(context.token_validity, chrono::Duration::minutes(10));
        assert_eq!(context.scope, "/");
    }
}
