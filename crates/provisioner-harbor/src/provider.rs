//! Harbor provider boundary.

use async_trait::async_trait;
use derive_more::Display;
use provisioner_core::{Error, ResourceHandle, ResourceId, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

/// Harbor resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    #[display("harbor:project")]
    Project,
    #[display("harbor:registry")]
    Registry,
}

impl ResourceKind {
    /// Output holding Harbor's own numeric identifier.
    pub fn numeric_id_output(&self) -> &'static str {
        match self {
            ResourceKind::Project => "project_id",
            ResourceKind::Registry => "registry_id",
        }
    }

    /// Inputs Harbor refuses to create the resource without.
    pub fn required_inputs(&self) -> &'static [&'static str] {
        match self {
            ResourceKind::Project => &["name"],
            ResourceKind::Registry => &["name", "endpoint_url", "provider_name"],
        }
    }
}

/// Remote operations the Harbor resources need.
#[async_trait]
pub trait HarborProvider: Send + Sync {
    /// Name of this provider.
    fn name(&self) -> &'static str;

    /// Read an existing resource by its Harbor identifier.
    async fn get(
        &self,
        kind: ResourceKind,
        resource_name: &str,
        id: &str,
    ) -> Result<ResourceHandle>;

    /// Create a resource from provider inputs.
    async fn create(
        &self,
        kind: ResourceKind,
        resource_name: &str,
        inputs: Value,
    ) -> Result<ResourceHandle>;
}

/// A call made against [`InMemoryHarbor`].
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderCall {
    Get {
        kind: ResourceKind,
        resource_name: String,
        id: String,
    },
    Create {
        kind: ResourceKind,
        resource_name: String,
        inputs: Value,
    },
}

#[derive(Debug, Default)]
struct InMemoryState {
    resources: HashMap<(ResourceKind, String), ResourceHandle>,
    counters: HashMap<ResourceKind, i64>,
    calls: Vec<ProviderCall>,
}

/// Provider keeping resources in memory.
///
/// Used for previews and tests. Created resources get a generated `id`, a
/// sequential numeric Harbor id and echo their inputs as outputs.
#[derive(Debug, Default)]
pub struct InMemoryHarbor {
    state: Mutex<InMemoryState>,
}

impl InMemoryHarbor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make an existing resource available to [`HarborProvider::get`].
    pub async fn seed(&self, kind: ResourceKind, id: impl Into<String>, handle: ResourceHandle) {
        let mut state = self.state.lock().await;
        state.resources.insert((kind, id.into()), handle);
    }

    /// All calls made so far, in order.
    pub async fn calls(&self) -> Vec<ProviderCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn create_count(&self) -> usize {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter(|c| matches!(c, ProviderCall::Create { .. }))
            .count()
    }
}

#[async_trait]
impl HarborProvider for InMemoryHarbor {
    fn name(&self) -> &'static str {
        "in-memory"
    }

    async fn get(
        &self,
        kind: ResourceKind,
        resource_name: &str,
        id: &str,
    ) -> Result<ResourceHandle> {
        let mut state = self.state.lock().await;
        state.calls.push(ProviderCall::Get {
            kind,
            resource_name: resource_name.to_string(),
            id: id.to_string(),
        });

        let mut handle = state
            .resources
            .get(&(kind, id.to_string()))
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("{} with id {}", kind, id)))?;
        handle.resource_name = resource_name.to_string();
        Ok(handle)
    }

    async fn create(
        &self,
        kind: ResourceKind,
        resource_name: &str,
        inputs: Value,
    ) -> Result<ResourceHandle> {
        let mut state = self.state.lock().await;
        state.calls.push(ProviderCall::Create {
            kind,
            resource_name: resource_name.to_string(),
            inputs: inputs.clone(),
        });

        let mut outputs: Map<String, Value> = match inputs {
            Value::Object(map) => map,
            other => {
                return Err(Error::InvalidInput(format!(
                    "{} inputs must be an object, got {}",
                    kind, other
                )));
            }
        };

        for field in kind.required_inputs() {
            if outputs.get(*field).is_none_or(Value::is_null) {
                return Err(Error::Provider(format!(
                    "{} '{}': missing required input '{}'",
                    kind, resource_name, field
                )));
            }
        }

        let counter = state.counters.entry(kind).or_insert(0);
        *counter += 1;
        let numeric_id = *counter;

        let id = ResourceId::new().to_string();
        outputs.insert("id".to_string(), Value::from(id.clone()));
        outputs.insert(kind.numeric_id_output().to_string(), Value::from(numeric_id));

        let handle = ResourceHandle {
            kind: kind.to_string(),
            resource_name: resource_name.to_string(),
            outputs,
        };
        state.resources.insert((kind, id.clone()), handle.clone());
        debug!(%kind, resource = %resource_name, %id, "Created in-memory resource");

        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_then_get() {
        let harbor = InMemoryHarbor::new();

        let created = harbor
            .create(ResourceKind::Project, "t-s-e-images", json!({ "name": "images" }))
            .await
            .unwrap();
        assert_eq!(created.kind, "harbor:project");
        assert_eq!(created.outputs["name"], json!("images"));
        assert_eq!(created.outputs["project_id"], json!(1));

        let id = created.id().unwrap().to_string();
        let found = harbor
            .get(ResourceKind::Project, "t-s-e-images", &id)
            .await
            .unwrap();
        assert_eq!(found.outputs, created.outputs);

        assert_eq!(harbor.calls().await.len(), 2);
        assert_eq!(harbor.create_count().await, 1);
    }

    #[tokio::test]
    async fn test_get_unknown_id() {
        let harbor = InMemoryHarbor::new();
        let result = harbor.get(ResourceKind::Registry, "r", "nope").await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_missing_required_input() {
        let harbor = InMemoryHarbor::new();
        let result = harbor
            .create(ResourceKind::Registry, "r", json!({ "name": "hub" }))
            .await;
        assert!(matches!(result, Err(Error::Provider(_))));
    }

    #[tokio::test]
    async fn test_numeric_ids_are_per_kind() {
        let harbor = InMemoryHarbor::new();
        let registry = json!({ "name": "hub", "endpoint_url": "https://hub", "provider_name": "docker-hub" });

        harbor
            .create(ResourceKind::Project, "p", json!({ "name": "p" }))
            .await
            .unwrap();
        let first = harbor
            .create(ResourceKind::Registry, "a", registry.clone())
            .await
            .unwrap();
        let second = harbor
            .create(ResourceKind::Registry, "b", registry)
            .await
            .unwrap();

        assert_eq!(first.outputs["registry_id"], json!(1));
        assert_eq!(second.outputs["registry_id"], json!(2));
    }
}
