//! # Cloud Inventory Shared
//!
//! This crate defines the data structures shared across the cloud inventory sync:
//! the inventory entities (resource types, tags, resource groups, resources), the raw
//! records returned by a provider, change events and the run tally.

pub mod types;

pub use types::{
    ChangeEvent, EntityKind, EventAction, EventTarget, ListEnvelope, NewChangeEvent,
    PatchOperation, Provider, RawRecord, Resource, ResourceGroup, ResourceType, Snapshot,
    Subscription, SyncTally, Tag,
};
