use cloud_inventory_shared::{Provider, Resource};
use serde_json::Value;
use uuid::Uuid;

use crate::{RepositoryError, UpsertOutcome};

/// Fields written on every sighting of a resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceUpsert {
    /// Natural key, already lowercased.
    pub resource_id: String,
    pub name: String,
    pub location: Option<String>,
    pub provider: Provider,
    pub resource_type: String,
    pub subscription_id: String,
    /// Natural key of the owning group.
    pub resource_group_id: String,
    pub company: Option<String>,
    pub metas: Value,
    /// `None` leaves the stored value untouched.
    pub sku: Option<Value>,
    /// `None` leaves the stored value untouched.
    pub kind: Option<String>,
    pub tag_ids: Vec<Uuid>,
}

/// Storage for resources. Same visibility rules as resource groups.
#[async_trait::async_trait]
pub trait ResourceRepository: Send + Sync {
    async fn get_resource(&self, resource_id: &str) -> Result<Option<Resource>, RepositoryError>;

    async fn upsert_resource(
        &self,
        resource: &ResourceUpsert,
    ) -> Result<UpsertOutcome<Resource>, RepositoryError>;

    async fn list_resources(&self, subscription_id: &str)
    -> Result<Vec<Resource>, RepositoryError>;

    async fn list_all_resources(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<Resource>, RepositoryError>;

    /// Live resources owned by the given group.
    async fn list_resources_by_group(
        &self,
        resource_group_id: &str,
    ) -> Result<Vec<Resource>, RepositoryError>;

    async fn soft_delete_resources(&self, resource_ids: &[String])
    -> Result<u64, RepositoryError>;
}
