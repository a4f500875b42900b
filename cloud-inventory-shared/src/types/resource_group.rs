use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{Provider, Snapshot};

/// A provider resource group as stored locally.
///
/// `resource_id` is the natural key, always lowercase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceGroup {
    pub resource_id: String,
    pub name: String,
    pub location: Option<String>,
    pub provider: Provider,
    /// Name of the resource type catalog entry.
    pub resource_type: String,
    pub subscription_id: String,
    pub company: Option<String>,
    /// Provider `properties` bag, always an object.
    pub metas: Value,
    /// Tag name to current value of the shared tag row.
    pub tags: BTreeMap<String, String>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Snapshot for ResourceGroup {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn group() -> ResourceGroup {
        ResourceGroup {
            resource_id: "/subscriptions/00000000-0000-0000-0000-000000000000/resourcegroups/my_rg"
                .to_string(),
            name: "MY_RG".to_string(),
            location: Some("francecentral".to_string()),
            provider: Provider::Azure,
            resource_type: "Microsoft.Resources/resourceGroups".to_string(),
            subscription_id: "00000000-0000-0000-0000-000000000000".to_string(),
            company: None,
            metas: json!({"provisioningState": "Succeeded"}),
            tags: BTreeMap::from([("env".to_string(), "prod".to_string())]),
            deleted: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_snapshot_excludes_timestamps() {
        let snapshot = group().snapshot().unwrap();
        assert!(snapshot.get("created_at").is_none());
        assert!(snapshot.get("updated_at").is_none());
        assert_eq!(snapshot["name"], json!("MY_RG"));
        assert_eq!(snapshot["tags"], json!({"env": "prod"}));
    }

    #[test]
    fn test_snapshot_ignores_timestamp_changes() {
        let first = group();
        let mut second = first.clone();
        second.updated_at = first.updated_at + chrono::Duration::seconds(60);
        assert_eq!(
            serde_json::to_string(&first.snapshot().unwrap()).unwrap(),
            serde_json::to_string(&second.snapshot().unwrap()).unwrap()
        );
    }
}
