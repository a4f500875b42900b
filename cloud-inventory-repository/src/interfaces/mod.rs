//! This module defines the storage interfaces for the inventory: the resource type
//! catalog, shared tags, subscriptions, resource groups, resources and the change
//! event log.
mod events;
mod resource_groups;
mod resources;
mod subscriptions;
mod tags;
mod type_catalog;

pub use events::{EventFilter, EventLogRepository};
pub use resource_groups::{ResourceGroupRepository, ResourceGroupUpsert};
pub use resources::{ResourceRepository, ResourceUpsert};
pub use subscriptions::SubscriptionRepository;
pub use tags::TagRepository;
pub use type_catalog::TypeCatalogRepository;

/// Result of an insert-or-update by natural key.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertOutcome<T> {
    /// The stored entity after the write.
    pub entity: T,
    /// The live entity as it was immediately before the write, if there was one.
    pub previous: Option<T>,
    /// `true` when the write created the entity, or revived a soft-deleted one.
    pub created: bool,
}

/// Everything a reconciler needs from storage.
pub trait InventoryRepository:
    TypeCatalogRepository
    + TagRepository
    + SubscriptionRepository
    + ResourceGroupRepository
    + ResourceRepository
    + EventLogRepository
{
}

impl<T> InventoryRepository for T where
    T: TypeCatalogRepository
        + TagRepository
        + SubscriptionRepository
        + ResourceGroupRepository
        + ResourceRepository
        + EventLogRepository
{
}
