//! Reconcilers for the resource type catalog, resource groups and resources.
//!
//! A run walks the remote records in fetch order, one at a time. Each record is
//! resolved, upserted atomically and diffed against its previous snapshot; a bad
//! record is counted and skipped. Once every record has been seen, live entities
//! the remote side no longer reports are logged as DELETE events and soft-deleted.
//!
//! Failures before the record loop (subscription lookup, authentication, session,
//! list fetch) and storage failures abort the run with a [`SyncError`].
mod resource;
mod resource_group;
mod resource_type;

use std::collections::BTreeMap;
use std::sync::Arc;

use cloud_inventory_repository::{InventoryRepository, RepositoryError, UpsertOutcome};
use cloud_inventory_shared::{
    EventTarget, Provider, RawRecord, Snapshot, Subscription, SyncTally,
};
use tracing::error;
use uuid::Uuid;

use crate::catalog::ProviderCatalog;
use crate::config::SyncPolicy;
use crate::errors::{RecordError, SyncError};
use crate::events::EventEmitter;
use crate::source::{Authenticator, InventorySource, Session};

/// What happened to one record that was processed successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordOutcome {
    Created,
    Updated,
    Unchanged,
}

impl RecordOutcome {
    fn count(self, tally: &mut SyncTally) {
        match self {
            RecordOutcome::Created => tally.created += 1,
            RecordOutcome::Updated => tally.updated += 1,
            RecordOutcome::Unchanged => {}
        }
    }
}

/// Keeps a key conflict local to its record; every other storage failure ends the run.
fn isolate_conflict<T>(
    resource_id: &str,
    result: Result<T, RepositoryError>,
) -> Result<Result<T, RecordError>, SyncError> {
    match result {
        Ok(value) => Ok(Ok(value)),
        Err(RepositoryError::Conflict(reason)) => Ok(Err(RecordError::Conflict {
            resource_id: resource_id.to_string(),
            reason,
        })),
        Err(e) => Err(e.into()),
    }
}

/// Drives reconciliation runs against one provider.
pub struct Reconciler {
    repository: Arc<dyn InventoryRepository>,
    source: Arc<dyn InventorySource>,
    authenticator: Arc<dyn Authenticator>,
    catalog: ProviderCatalog,
    policy: SyncPolicy,
}

impl Reconciler {
    pub fn new(
        repository: Arc<dyn InventoryRepository>,
        source: Arc<dyn InventorySource>,
        authenticator: Arc<dyn Authenticator>,
        catalog: ProviderCatalog,
    ) -> Self {
        Self {
            repository,
            source,
            authenticator,
            catalog,
            policy: SyncPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: SyncPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> SyncPolicy {
        self.policy
    }

    pub fn provider(&self) -> Provider {
        self.catalog.provider()
    }

    /// Looks up the subscription and opens a provider session for it.
    async fn open_scope(&self, subscription_id: &str) -> Result<(Subscription, Session), SyncError> {
        let subscription = self
            .repository
            .get_subscription(subscription_id)
            .await?
            .ok_or_else(|| SyncError::SubscriptionNotFound(subscription_id.to_string()))?;

        if !subscription.active {
            return Err(SyncError::SubscriptionInactive(subscription_id.to_string()));
        }

        let token = self.authenticator.access_token(&subscription).await?;
        let session = self.source.open_session(&token).await?;
        Ok((subscription, session))
    }

    /// Upserts every tag and returns the ids to attach.
    async fn upsert_tags(&self, tags: &BTreeMap<String, String>) -> Result<Vec<Uuid>, SyncError> {
        let mut tag_ids = Vec::with_capacity(tags.len());
        for (name, value) in tags {
            let tag = self.repository.upsert_tag(name, self.provider(), value).await?;
            tag_ids.push(tag.id);
        }
        Ok(tag_ids)
    }

    /// Emits the CREATE or UPDATE event matching an upsert.
    async fn record_change<E: Snapshot + Sync>(
        &self,
        emitter: &EventEmitter<'_, dyn InventoryRepository>,
        target: EventTarget,
        outcome: UpsertOutcome<E>,
    ) -> Result<RecordOutcome, SyncError> {
        match outcome.previous {
            None => {
                if self.policy.emit_create_events {
                    emitter.emit_create(target, &outcome.entity).await?;
                }
                Ok(RecordOutcome::Created)
            }
            Some(previous) => {
                let old_object = previous.snapshot()?;
                match emitter.emit_update(target, old_object, &outcome.entity).await? {
                    Some(_) => Ok(RecordOutcome::Updated),
                    None => Ok(RecordOutcome::Unchanged),
                }
            }
        }
    }

    fn skip_record(&self, tally: &mut SyncTally, record: &RawRecord, failure: &RecordError) {
        tally.errors += 1;
        error!(
            resource_id = %failure.resource_id(),
            resource_type = %record.resource_type,
            error = %failure,
            "record skipped"
        );
    }
}
