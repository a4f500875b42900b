use std::collections::HashSet;

use cloud_inventory_repository::{InventoryRepository, ResourceGroupUpsert};
use cloud_inventory_shared::{EventTarget, RawRecord, ResourceGroup, Subscription, SyncTally};
use tracing::{info, instrument};

use crate::errors::{RecordError, SyncError};
use crate::events::EventEmitter;
use crate::reconciler::{RecordOutcome, Reconciler, isolate_conflict};
use crate::resolver::TypeResolver;

impl Reconciler {
    /// Reconciles the resource groups of one subscription.
    #[instrument(skip(self), fields(provider = %self.provider()))]
    pub async fn sync_resource_groups(&self, subscription_id: &str) -> Result<SyncTally, SyncError> {
        let (subscription, session) = self.open_scope(subscription_id).await?;
        let records = self
            .source
            .list_resource_groups(&subscription.subscription_id, &session)
            .await?;

        let resolver = TypeResolver::new(self.repository.as_ref(), self.provider());
        let emitter = EventEmitter::new(self.repository.as_ref());

        let mut tally = SyncTally::default();
        let mut seen_ids = HashSet::with_capacity(records.len());

        for record in &records {
            let resource_id = record.normalized_id();
            seen_ids.insert(resource_id.clone());

            match self
                .reconcile_group(&subscription, &resolver, &emitter, record, &resource_id)
                .await?
            {
                Ok(outcome) => outcome.count(&mut tally),
                Err(failure) => self.skip_record(&mut tally, record, &failure),
            }
        }

        info!(
            errors = tally.errors,
            created = tally.created,
            updated = tally.updated,
            "sync - {} - ResourceGroup",
            self.provider()
        );

        tally.deleted = self
            .prune_resource_groups(&subscription, &seen_ids, &emitter)
            .await?;
        info!(deleted = tally.deleted, "mark for deleted old ResourceGroup");

        Ok(tally)
    }

    async fn reconcile_group(
        &self,
        subscription: &Subscription,
        resolver: &TypeResolver<'_, dyn InventoryRepository>,
        emitter: &EventEmitter<'_, dyn InventoryRepository>,
        record: &RawRecord,
        resource_id: &str,
    ) -> Result<Result<RecordOutcome, RecordError>, SyncError> {
        if resource_id.is_empty() {
            return Ok(Err(RecordError::invalid(resource_id, "record has no id")));
        }

        let Some(resource_type) = resolver.resolve(&record.resource_type).await? else {
            return Ok(Err(RecordError::UnknownType {
                resource_id: resource_id.to_string(),
                resource_type: record.resource_type.clone(),
            }));
        };

        let tag_ids = self.upsert_tags(&record.tags()).await?;

        let upserted = self
            .repository
            .upsert_resource_group(&ResourceGroupUpsert {
                resource_id: resource_id.to_string(),
                name: record.name.clone(),
                location: record.location.clone(),
                provider: self.provider(),
                resource_type: resource_type.name,
                subscription_id: subscription.subscription_id.clone(),
                company: subscription.company.clone(),
                metas: record.metas(),
                tag_ids,
            })
            .await;
        let outcome = match isolate_conflict(resource_id, upserted)? {
            Ok(outcome) => outcome,
            Err(failure) => return Ok(Err(failure)),
        };

        let target = EventTarget::ResourceGroup(resource_id.to_string());
        self.record_change(emitter, target, outcome).await.map(Ok)
    }

    /// Emits DELETE events for live groups missing from the fetch, then soft-deletes them.
    async fn prune_resource_groups(
        &self,
        subscription: &Subscription,
        seen_ids: &HashSet<String>,
        emitter: &EventEmitter<'_, dyn InventoryRepository>,
    ) -> Result<u64, SyncError> {
        let stale: Vec<(EventTarget, ResourceGroup)> = self
            .repository
            .list_resource_groups(&subscription.subscription_id)
            .await?
            .into_iter()
            .filter(|group| !seen_ids.contains(&group.resource_id))
            .map(|group| (EventTarget::ResourceGroup(group.resource_id.clone()), group))
            .collect();

        if stale.is_empty() {
            return Ok(0);
        }

        emitter.emit_delete_batch(&stale).await?;
        let stale_ids: Vec<String> = stale
            .iter()
            .map(|(_, group)| group.resource_id.clone())
            .collect();
        let deleted = self.repository.soft_delete_resource_groups(&stale_ids).await?;

        if self.policy.cascade_group_deletes {
            self.cascade_group_deletes(&stale_ids, emitter).await?;
        }

        Ok(deleted)
    }

    /// Prunes the live resources of deleted groups. Not counted in the group tally.
    async fn cascade_group_deletes(
        &self,
        group_ids: &[String],
        emitter: &EventEmitter<'_, dyn InventoryRepository>,
    ) -> Result<u64, SyncError> {
        let mut children = Vec::new();
        for group_id in group_ids {
            for resource in self.repository.list_resources_by_group(group_id).await? {
                children.push((EventTarget::Resource(resource.resource_id.clone()), resource));
            }
        }

        if children.is_empty() {
            return Ok(0);
        }

        emitter.emit_delete_batch(&children).await?;
        let child_ids: Vec<String> = children
            .iter()
            .map(|(_, resource)| resource.resource_id.clone())
            .collect();
        let deleted = self.repository.soft_delete_resources(&child_ids).await?;

        info!(deleted, groups = group_ids.len(), "cascaded group deletion to resources");
        Ok(deleted)
    }
}
