use cloud_inventory_shared::{Provider, Tag};

use crate::RepositoryError;

/// Shared, deduplicated tags.
///
/// One tag exists per `(name, provider)`; its value is last-write-wins.
#[async_trait::async_trait]
pub trait TagRepository: Send + Sync {
    /// Creates the tag if absent, otherwise overwrites its value.
    async fn upsert_tag(
        &self,
        name: &str,
        provider: Provider,
        value: &str,
    ) -> Result<Tag, RepositoryError>;

    async fn list_tags(&self, provider: Provider) -> Result<Vec<Tag>, RepositoryError>;
}
