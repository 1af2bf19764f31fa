//! Core resource-provisioning engine.
//!
//! This crate contains:
//! - The per-environment build context and its resource cache
//! - Resource handles and their output trees
//! - Reference resolution (`Resource <name>, <path>` and `Secret <name>`)
//! - The resource lifecycle trait and the shared find-or-create `build`
//! - The secret store abstraction

pub mod context;
pub mod error;
pub mod handle;
pub mod id;
pub mod resolver;
pub mod resource;
pub mod secret;
pub mod walk;

pub use context::BuildContext;
pub use error::{Error, Result};
pub use handle::ResourceHandle;
pub use id::ResourceId;
pub use resolver::{Reference, ReferenceResolver};
pub use resource::{BuildOutcome, Resource, ResourceArgs, build};
pub use secret::{EnvSecretStore, MemorySecretStore, SecretStore, SecretValue};
pub use walk::{Input, Walk};
