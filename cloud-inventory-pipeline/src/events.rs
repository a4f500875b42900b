//! Writes CREATE / UPDATE / DELETE records to the event log.

use cloud_inventory_repository::EventLogRepository;
use cloud_inventory_shared::{ChangeEvent, EventTarget, NewChangeEvent, Snapshot};
use serde_json::Value;
use tracing::{debug, info};

use crate::diff::compute_patch;
use crate::errors::SyncError;

/// Emits change events for one reconciliation run.
pub struct EventEmitter<'a, R: ?Sized> {
    log: &'a R,
}

impl<'a, R> EventEmitter<'a, R>
where
    R: EventLogRepository + ?Sized,
{
    pub fn new(log: &'a R) -> Self {
        Self { log }
    }

    /// Records the post-upsert snapshot of a newly seen entity.
    pub async fn emit_create<E: Snapshot + Sync>(
        &self,
        target: EventTarget,
        entity: &E,
    ) -> Result<ChangeEvent, SyncError> {
        let new_object = entity.snapshot()?;
        let event = self
            .log
            .append_event(&NewChangeEvent::create(target, new_object))
            .await?;
        debug!(resource_id = %event.target.resource_id(), "create event change");
        Ok(event)
    }

    /// Records an update only when the patch between the snapshots is non-empty.
    pub async fn emit_update<E: Snapshot + Sync>(
        &self,
        target: EventTarget,
        old_object: Value,
        entity: &E,
    ) -> Result<Option<ChangeEvent>, SyncError> {
        let new_object = entity.snapshot()?;
        let changes = compute_patch(&old_object, &new_object);
        if changes.is_empty() {
            return Ok(None);
        }

        info!(
            resource_id = %target.resource_id(),
            operations = changes.len(),
            "create event change update"
        );
        let event = self
            .log
            .append_event(&NewChangeEvent::update(target, old_object, new_object, changes))
            .await?;
        Ok(Some(event))
    }

    /// Records one DELETE per entity, each carrying its pre-deletion snapshot.
    pub async fn emit_delete_batch<E: Snapshot + Sync>(
        &self,
        entities: &[(EventTarget, E)],
    ) -> Result<Vec<ChangeEvent>, SyncError> {
        let mut events = Vec::with_capacity(entities.len());
        for (target, entity) in entities {
            let old_object = entity.snapshot()?;
            let event = self
                .log
                .append_event(&NewChangeEvent::delete(target.clone(), old_object))
                .await?;
            events.push(event);
        }
        Ok(events)
    }
}
