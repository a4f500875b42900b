use cloud_inventory_shared::{Provider, ResourceGroup};
use serde_json::Value;
use uuid::Uuid;

use crate::{RepositoryError, UpsertOutcome};

/// Fields written on every sighting of a resource group.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceGroupUpsert {
    /// Natural key, already lowercased.
    pub resource_id: String,
    pub name: String,
    pub location: Option<String>,
    pub provider: Provider,
    /// Canonical catalog name of the resolved type.
    pub resource_type: String,
    pub subscription_id: String,
    pub company: Option<String>,
    pub metas: Value,
    /// Replaces the group's tag set wholesale.
    pub tag_ids: Vec<Uuid>,
}

/// Storage for resource groups.
///
/// Default queries only see live groups; the `_all` variants include soft-deleted
/// ones for audit purposes.
#[async_trait::async_trait]
pub trait ResourceGroupRepository: Send + Sync {
    /// Live group by natural key.
    async fn get_resource_group(
        &self,
        resource_id: &str,
    ) -> Result<Option<ResourceGroup>, RepositoryError>;

    /// Live group within `subscription_id`, matched case-insensitively.
    async fn find_resource_group(
        &self,
        subscription_id: &str,
        resource_id: &str,
    ) -> Result<Option<ResourceGroup>, RepositoryError>;

    /// Atomically captures the live group (if any) and writes the new state.
    ///
    /// A soft-deleted group is revived by the write and reported as created.
    async fn upsert_resource_group(
        &self,
        group: &ResourceGroupUpsert,
    ) -> Result<UpsertOutcome<ResourceGroup>, RepositoryError>;

    async fn list_resource_groups(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<ResourceGroup>, RepositoryError>;

    async fn list_all_resource_groups(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<ResourceGroup>, RepositoryError>;

    /// Marks the given live groups deleted and returns how many were affected.
    async fn soft_delete_resource_groups(
        &self,
        resource_ids: &[String],
    ) -> Result<u64, RepositoryError>;
}
