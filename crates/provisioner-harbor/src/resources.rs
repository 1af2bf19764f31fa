//! Harbor project and registry resources.

use async_trait::async_trait;
use provisioner_config::{ProjectArgs, RegistryArgs};
use provisioner_core::{BuildContext, Resource, ResourceArgs, ResourceHandle, Result};
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::info;

use crate::provider::{HarborProvider, ResourceKind};

/// Argument records that map onto a Harbor resource kind.
pub trait HarborArgs: ResourceArgs + Serialize + Sync + 'static {
    const KIND: ResourceKind;
}

impl HarborArgs for ProjectArgs {
    const KIND: ResourceKind = ResourceKind::Project;
}

impl HarborArgs for RegistryArgs {
    const KIND: ResourceKind = ResourceKind::Registry;
}

/// A Harbor resource bound to its logical name.
///
/// The provider resource name is always the context's default name for the
/// logical name, whatever `args.name` says.
pub struct HarborResource<A> {
    name: String,
    provider: Arc<dyn HarborProvider>,
    _args: PhantomData<fn() -> A>,
}

pub type Project = HarborResource<ProjectArgs>;
pub type Registry = HarborResource<RegistryArgs>;

impl<A: HarborArgs> HarborResource<A> {
    pub fn new(name: impl Into<String>, provider: Arc<dyn HarborProvider>) -> Self {
        Self {
            name: name.into(),
            provider,
            _args: PhantomData,
        }
    }
}

#[async_trait]
impl<A: HarborArgs> Resource for HarborResource<A> {
    type Args = A;

    fn name(&self) -> &str {
        &self.name
    }

    async fn find(&self, ctx: &BuildContext, id: Option<&str>) -> Result<Option<ResourceHandle>> {
        let Some(id) = id.filter(|id| !id.is_empty()) else {
            return Ok(None);
        };

        let resource_name = ctx.default_resource_name(&self.name);
        let handle = self.provider.get(A::KIND, &resource_name, id).await?;
        info!(kind = %A::KIND, resource = %self.name, %id, "Found existing resource");
        Ok(Some(handle))
    }

    async fn create(&self, ctx: &BuildContext, args: A) -> Result<ResourceHandle> {
        let resource_name = ctx.default_resource_name(&self.name);
        let inputs = serde_json::to_value(&args)?;
        let handle = self.provider.create(A::KIND, &resource_name, inputs).await?;
        info!(kind = %A::KIND, resource = %self.name, id = ?handle.id(), "Created resource");
        Ok(handle)
    }
}
