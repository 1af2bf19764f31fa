//! Secret storage abstraction.
//!
//! Secrets are only ever read by name, through `Secret <name>` expressions
//! in resource arguments.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{Error, Result};

/// A secret value (can be a single string or key-value pairs).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SecretValue {
    /// A single secret string.
    String(String),
    /// A map of key-value pairs.
    Map(HashMap<String, String>),
}

/// Trait for secret storage backends.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Get a secret by name. Unknown names yield [`Error::NotFound`].
    async fn get(&self, name: &str) -> Result<SecretValue>;
}

/// Secret store backed by an in-process map.
#[derive(Debug, Clone, Default)]
pub struct MemorySecretStore {
    secrets: HashMap<String, SecretValue>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, SecretValue::String(value.into()));
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: SecretValue) {
        self.secrets.insert(name.into(), value);
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

impl From<HashMap<String, SecretValue>> for MemorySecretStore {
    fn from(secrets: HashMap<String, SecretValue>) -> Self {
        Self { secrets }
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get(&self, name: &str) -> Result<SecretValue> {
        self.secrets
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("secret '{}'", name)))
    }
}

/// Secret store reading process environment variables.
///
/// `db-password` with the default prefix is read from
/// `PROVISIONER_SECRET_DB_PASSWORD`.
#[derive(Debug, Clone)]
pub struct EnvSecretStore {
    prefix: String,
}

impl EnvSecretStore {
    pub const DEFAULT_PREFIX: &'static str = "PROVISIONER_SECRET_";

    pub fn new() -> Self {
        Self::with_prefix(Self::DEFAULT_PREFIX)
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Environment variable consulted for a secret name.
    pub fn variable_name(&self, name: &str) -> String {
        let key: String = name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}{}", self.prefix, key)
    }
}

impl Default for EnvSecretStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn get(&self, name: &str) -> Result<SecretValue> {
        let var = self.variable_name(name);
        std::env::var(&var)
            .map(SecretValue::String)
            .map_err(|_| Error::NotFound(format!("secret '{}' (env {})", name, var)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_lookup() {
        let store = MemorySecretStore::new().with_secret("db-password", "s3cr3t");

        let value = store.get("db-password").await.unwrap();
        assert_eq!(value, SecretValue::String("s3cr3t".into()));
        assert!(matches!(
            store.get("missing").await,
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_env_variable_name() {
        let store = EnvSecretStore::new();
        assert_eq!(
            store.variable_name("db-password"),
            "PROVISIONER_SECRET_DB_PASSWORD"
        );

        let store = EnvSecretStore::with_prefix("APP_");
        assert_eq!(store.variable_name("harbor.token"), "APP_HARBOR_TOKEN");
    }

    #[tokio::test]
    async fn test_env_store_reads_prefixed_variable() {
        let store = EnvSecretStore::with_prefix("PROVISIONER_TEST_ENV_STORE_");
        // SAFETY: the variable name is unique to this test.
        unsafe { std::env::set_var("PROVISIONER_TEST_ENV_STORE_HUB_TOKEN", "t0ken") };

        let value = store.get("hub-token").await.unwrap();
        assert_eq!(value, SecretValue::String("t0ken".into()));
        assert!(matches!(
            store.get("absent").await,
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_secret_value_from_yaml_shapes() {
        let plain: SecretValue = serde_json::from_str(r#""x""#).unwrap();
        assert_eq!(plain, SecretValue::String("x".into()));

        let map: SecretValue = serde_json::from_str(r#"{"user":"admin"}"#).unwrap();
        assert!(matches!(map, SecretValue::Map(m) if m["user"] == "admin"));
    }
}
