//! Configuration for the provisioner.
//!
//! This crate handles:
//! - The team / service / environment tree
//! - Provider resource groups and their argument records (Harbor)
//! - Loading from YAML or KDL documents, plus validation

pub mod error;
pub mod harbor;
pub mod loader;
pub mod tree;

pub use error::{ConfigError, ConfigResult};
pub use harbor::{Harbor, ProjectArgs, RegistryArgs};
pub use loader::{Format, load_config, parse_config};
pub use tree::{Config, Environment, EnvironmentRef, ResourceEntry, Service, Team};
