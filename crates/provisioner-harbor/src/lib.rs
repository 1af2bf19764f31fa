//! Harbor resources for the provisioner.
//!
//! Provides:
//! - The [`HarborProvider`] boundary used for remote reads and creates
//! - An in-memory provider for previews and tests
//! - Project and registry resources

pub mod provider;
pub mod resources;

pub use provider::{HarborProvider, InMemoryHarbor, ProviderCall, ResourceKind};
pub use resources::{HarborArgs, HarborResource, Project, Registry};
