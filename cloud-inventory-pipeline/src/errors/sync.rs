use cloud_inventory_repository::RepositoryError;
use thiserror::Error;

use crate::errors::SourceError;

/// Errors that fail a whole reconciliation run. No tally is produced.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Subscription not found: {0}")]
    SubscriptionNotFound(String),

    #[error("Subscription is not active: {0}")]
    SubscriptionInactive(String),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
