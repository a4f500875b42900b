use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{Provider, Snapshot};

/// An individual provider resource as stored locally.
///
/// Shares the resource group shape, plus its parent group, `sku` and `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub resource_id: String,
    pub name: String,
    pub location: Option<String>,
    pub provider: Provider,
    pub resource_type: String,
    pub subscription_id: String,
    pub company: Option<String>,
    /// Natural key of the owning resource group.
    pub resource_group_id: String,
    pub metas: Value,
    pub tags: BTreeMap<String, String>,
    pub sku: Option<Value>,
    pub kind: Option<String>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Snapshot for Resource {}
