//! Core inventory types. Each submodule owns one concept and re-exports it here.

mod event;
mod patch;
mod provider;
mod raw_record;
mod resource;
mod resource_group;
mod resource_type;
mod snapshot;
mod subscription;
mod tag;
mod tally;

pub use event::{ChangeEvent, EntityKind, EventAction, EventTarget, NewChangeEvent};
pub use patch::PatchOperation;
pub use provider::{ParseProviderError, Provider};
pub use raw_record::{ListEnvelope, RawRecord};
pub use resource::Resource;
pub use resource_group::ResourceGroup;
pub use resource_type::ResourceType;
pub use snapshot::{Snapshot, VOLATILE_FIELDS};
pub use subscription::Subscription;
pub use tag::Tag;
pub use tally::SyncTally;
