//! # Cloud Inventory Repository
//! This crate provides the storage interfaces used by the reconcilers, along with
//! an in-memory implementation for tests and local runs and a PostgreSQL
//! implementation for production.
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod postgres;

pub use errors::RepositoryError;
pub use interfaces::{
    EventFilter, EventLogRepository, InventoryRepository, ResourceGroupRepository,
    ResourceGroupUpsert, ResourceRepository, ResourceUpsert, SubscriptionRepository,
    TagRepository, TypeCatalogRepository, UpsertOutcome,
};
pub use memory::MemoryRepository;
pub use postgres::PostgresRepository;
