use cloud_inventory_shared::{Provider, ResourceType};

use crate::{RepositoryError, UpsertOutcome};

/// Access to the resource type catalog.
///
/// Entries are keyed by `(lower(name), provider)` and are never deleted.
#[async_trait::async_trait]
pub trait TypeCatalogRepository: Send + Sync {
    /// Inserts the entry if absent, otherwise refreshes it in place.
    async fn upsert_resource_type(
        &self,
        name: &str,
        provider: Provider,
    ) -> Result<UpsertOutcome<ResourceType>, RepositoryError>;

    /// Case-insensitive exact lookup scoped to `provider`.
    async fn find_resource_type(
        &self,
        name: &str,
        provider: Provider,
    ) -> Result<Option<ResourceType>, RepositoryError>;

    async fn list_resource_types(
        &self,
        provider: Provider,
    ) -> Result<Vec<ResourceType>, RepositoryError>;
}
