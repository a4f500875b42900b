use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Provider;

/// Entry of the resource type catalog.
///
/// `name` matches the remote type string case-insensitively, e.g.
/// `Microsoft.Compute/virtualMachines`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceType {
    pub id: Uuid,
    pub name: String,
    pub provider: Provider,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
