//! Resource building and reconciliation.
//!
//! - [`ResourceBuilder`] drives the find-or-create lifecycle for the
//!   resources of one environment
//! - [`Reconciler`] creates a build context per environment and builds
//!   independent environments concurrently

pub mod builder;
pub mod error;
pub mod reconcile;

pub use builder::{BuildEvent, EntryReport, EnvironmentPath, ResourceBuilder};
pub use error::{ReconcileError, ReconcileResult};
pub use reconcile::{EnvironmentFilter, EnvironmentReport, Reconciler, RunReport};
