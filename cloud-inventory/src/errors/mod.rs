//! Error types for the inventory sync binary.

use cloud_inventory_pipeline::SyncError;
use cloud_inventory_repository::RepositoryError;
use thiserror::Error;

/// Errors that can occur during initialization or a sync run.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A reconciliation run failed.
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Storage setup or access failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
