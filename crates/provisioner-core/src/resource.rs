//! Resource lifecycle.
//!
//! Each resource kind only knows how to look itself up and how to create
//! itself. [`build`] is the one place that decides which of the two runs and
//! registers the result in the [`BuildContext`].

use async_trait::async_trait;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::Result;
use crate::context::BuildContext;
use crate::handle::ResourceHandle;
use crate::resolver::ReferenceResolver;
use crate::walk::Walk;

/// Creation arguments of a resource kind.
pub trait ResourceArgs: Walk + Send {
    /// The `name` argument, filled with the context default when left unset.
    fn name_mut(&mut self) -> &mut Option<String>;
}

/// A resource kind.
#[async_trait]
pub trait Resource: Send + Sync {
    type Args: ResourceArgs;

    /// Logical name, used as the cache key.
    fn name(&self) -> &str;

    /// Look up an existing resource. `None` when there is nothing to look up
    /// or the provider does not know the identifier.
    async fn find(&self, ctx: &BuildContext, id: Option<&str>) -> Result<Option<ResourceHandle>>;

    /// Create the resource from already resolved arguments.
    async fn create(&self, ctx: &BuildContext, args: Self::Args) -> Result<ResourceHandle>;
}

/// What [`build`] did for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum BuildOutcome {
    /// Located by identifier and cached.
    #[display("found")]
    Found,
    /// Created from arguments and cached.
    #[display("created")]
    Created,
    /// Lookup succeeded but returned nothing.
    #[display("not found")]
    NotFound,
    /// Lookup failed; the entry was skipped.
    #[display("skipped")]
    Skipped,
    /// Neither identifier nor arguments were given.
    #[display("noop")]
    Noop,
}

impl BuildOutcome {
    pub fn is_cached(&self) -> bool {
        matches!(self, BuildOutcome::Found | BuildOutcome::Created)
    }
}

/// Find or create `resource` and register it in `ctx`.
///
/// An identifier always wins over arguments: an entry carrying both is only
/// ever looked up. Lookup errors are logged and swallowed; create errors are
/// returned and leave the cache untouched.
pub async fn build<R: Resource + ?Sized>(
    resource: &R,
    ctx: &mut BuildContext,
    resolver: &ReferenceResolver,
    id: Option<&str>,
    args: Option<R::Args>,
) -> Result<BuildOutcome> {
    let (handle, outcome) = if let Some(id) = id {
        match resource.find(ctx, Some(id)).await {
            Ok(Some(handle)) => (handle, BuildOutcome::Found),
            Ok(None) => return Ok(BuildOutcome::NotFound),
            Err(e) => {
                warn!(resource = %resource.name(), id = %id, error = %e, "Failed to find existing resource");
                return Ok(BuildOutcome::Skipped);
            }
        }
    } else if let Some(mut args) = args {
        let replaced = resolver.resolve(ctx, &mut args).await;
        if args.name_mut().as_deref().is_none_or(str::is_empty) {
            *args.name_mut() = Some(ctx.default_resource_name(resource.name()));
        }
        info!(resource = %resource.name(), references = replaced, "Creating resource");
        (resource.create(ctx, args).await?, BuildOutcome::Created)
    } else {
        return Ok(BuildOutcome::Noop);
    };

    ctx.add_to_cache(resource.name(), handle);
    Ok(outcome)
}
