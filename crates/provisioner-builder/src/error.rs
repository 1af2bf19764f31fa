//! Reconciliation errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("{team}/{service}/{environment}: {source}")]
    Environment {
        team: String,
        service: String,
        environment: String,
        #[source]
        source: provisioner_core::Error,
    },
}

pub type ReconcileResult<T> = std::result::Result<T, ReconcileError>;
