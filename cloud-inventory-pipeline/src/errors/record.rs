use thiserror::Error;

use crate::errors::SourceError;

/// A problem with one remote record. The record is skipped and counted as an error.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("resource type [{resource_type}] not found - bypass resource [{resource_id}]")]
    UnknownType {
        resource_id: String,
        resource_type: String,
    },

    #[error("resource group [{group_id}] not found - bypass resource [{resource_id}]")]
    UnresolvedParent {
        resource_id: String,
        group_id: String,
    },

    #[error("fetch resource {resource_id} error: {source}")]
    Fetch {
        resource_id: String,
        source: SourceError,
    },

    /// The natural key is already owned by another subscription.
    #[error("conflicting record [{resource_id}]: {reason}")]
    Conflict { resource_id: String, reason: String },

    #[error("invalid record [{resource_id}]: {reason}")]
    InvalidRecord { resource_id: String, reason: String },
}

impl RecordError {
    pub fn invalid(resource_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            resource_id: resource_id.into(),
            reason: reason.into(),
        }
    }

    pub fn resource_id(&self) -> &str {
        match self {
            Self::UnknownType { resource_id, .. }
            | Self::UnresolvedParent { resource_id, .. }
            | Self::Fetch { resource_id, .. }
            | Self::Conflict { resource_id, .. }
            | Self::InvalidRecord { resource_id, .. } => resource_id,
        }
    }
}
