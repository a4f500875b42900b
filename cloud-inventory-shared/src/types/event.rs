//! Change events recorded in the append-only event log.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::types::PatchOperation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventAction {
    Create,
    Update,
    Delete,
}

impl EventAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventAction::Create => "CREATE",
            EventAction::Update => "UPDATE",
            EventAction::Delete => "DELETE",
        }
    }
}

impl fmt::Display for EventAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(EventAction::Create),
            "UPDATE" => Ok(EventAction::Update),
            "DELETE" => Ok(EventAction::Delete),
            other => Err(format!("Unknown event action: {}", other)),
        }
    }
}

/// Kinds of entity an event can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    ResourceGroup,
    Resource,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::ResourceGroup => "resource_group",
            EntityKind::Resource => "resource",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resource_group" => Ok(EntityKind::ResourceGroup),
            "resource" => Ok(EntityKind::Resource),
            other => Err(format!("Unknown entity kind: {}", other)),
        }
    }
}

/// The entity an event is about, tagged with its kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "resource_id", rename_all = "snake_case")]
pub enum EventTarget {
    ResourceGroup(String),
    Resource(String),
}

impl EventTarget {
    pub fn new(kind: EntityKind, resource_id: impl Into<String>) -> Self {
        match kind {
            EntityKind::ResourceGroup => EventTarget::ResourceGroup(resource_id.into()),
            EntityKind::Resource => EventTarget::Resource(resource_id.into()),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            EventTarget::ResourceGroup(_) => EntityKind::ResourceGroup,
            EventTarget::Resource(_) => EntityKind::Resource,
        }
    }

    pub fn resource_id(&self) -> &str {
        match self {
            EventTarget::ResourceGroup(id) | EventTarget::Resource(id) => id,
        }
    }
}

/// An event ready to be appended to the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewChangeEvent {
    pub action: EventAction,
    pub target: EventTarget,
    pub old_object: Option<Value>,
    pub new_object: Option<Value>,
    /// Patch from `old_object` to `new_object`; only set for updates.
    pub changes: Option<Vec<PatchOperation>>,
}

impl NewChangeEvent {
    pub fn create(target: EventTarget, new_object: Value) -> Self {
        Self {
            action: EventAction::Create,
            target,
            old_object: None,
            new_object: Some(new_object),
            changes: None,
        }
    }

    pub fn update(
        target: EventTarget,
        old_object: Value,
        new_object: Value,
        changes: Vec<PatchOperation>,
    ) -> Self {
        Self {
            action: EventAction::Update,
            target,
            old_object: Some(old_object),
            new_object: Some(new_object),
            changes: Some(changes),
        }
    }

    pub fn delete(target: EventTarget, old_object: Value) -> Self {
        Self {
            action: EventAction::Delete,
            target,
            old_object: Some(old_object),
            new_object: None,
            changes: None,
        }
    }
}

/// An event as persisted, with its id and position in the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub id: Uuid,
    /// Monotonic append position.
    pub sequence: i64,
    pub action: EventAction,
    pub target: EventTarget,
    pub old_object: Option<Value>,
    pub new_object: Option<Value>,
    pub changes: Option<Vec<PatchOperation>>,
    pub created_at: DateTime<Utc>,
}
