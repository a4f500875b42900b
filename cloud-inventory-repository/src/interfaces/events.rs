use cloud_inventory_shared::{ChangeEvent, EntityKind, EventAction, NewChangeEvent};

use crate::RepositoryError;

/// Filter for event log queries. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub kind: Option<EntityKind>,
    pub resource_id: Option<String>,
    pub action: Option<EventAction>,
}

impl EventFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_target(kind: EntityKind, resource_id: impl Into<String>) -> Self {
        Self {
            kind: Some(kind),
            resource_id: Some(resource_id.into()),
            action: None,
        }
    }

    pub fn with_kind(mut self, kind: EntityKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_action(mut self, action: EventAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn matches(&self, event: &ChangeEvent) -> bool {
        self.kind.is_none_or(|kind| event.target.kind() == kind)
            && self
                .resource_id
                .as_deref()
                .is_none_or(|id| event.target.resource_id() == id)
            && self.action.is_none_or(|action| event.action == action)
    }
}

/// Append-only change event log.
#[async_trait::async_trait]
pub trait EventLogRepository: Send + Sync {
    async fn append_event(&self, event: &NewChangeEvent) -> Result<ChangeEvent, RepositoryError>;

    /// Matching events in append order.
    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<ChangeEvent>, RepositoryError>;
}
