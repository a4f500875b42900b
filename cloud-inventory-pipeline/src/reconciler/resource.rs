use std::collections::HashSet;

use cloud_inventory_repository::{InventoryRepository, ResourceUpsert};
use cloud_inventory_shared::{EventTarget, RawRecord, Resource, Subscription, SyncTally};
use tracing::{info, instrument};

use crate::errors::{RecordError, SyncError};
use crate::events::EventEmitter;
use crate::reconciler::{RecordOutcome, Reconciler, isolate_conflict};
use crate::resolver::{TypeResolver, split_composite_type};
use crate::source::Session;

/// Position of the group name in `/subscriptions/<sub>/resourceGroups/<group>/...`.
const GROUP_SEGMENT: usize = 4;

/// Natural key of the group owning `resource_id`, composed under `subscription_id`.
fn owning_group_id(subscription_id: &str, resource_id: &str) -> Option<String> {
    let group = resource_id
        .split('/')
        .nth(GROUP_SEGMENT)
        .filter(|segment| !segment.is_empty())?;
    Some(format!(
        "/subscriptions/{}/resourceGroups/{}",
        subscription_id, group
    ))
}

impl Reconciler {
    /// Reconciles the resources of one subscription.
    ///
    /// Groups must have been synced first: a resource whose group is unknown
    /// locally is skipped and counted as an error.
    #[instrument(skip(self), fields(provider = %self.provider()))]
    pub async fn sync_resources(&self, subscription_id: &str) -> Result<SyncTally, SyncError> {
        let (subscription, session) = self.open_scope(subscription_id).await?;
        let records = self
            .source
            .list_resources(&subscription.subscription_id, &session)
            .await?;

        let resolver = TypeResolver::new(self.repository.as_ref(), self.provider());
        let emitter = EventEmitter::new(self.repository.as_ref());

        let mut tally = SyncTally::default();
        let mut seen_ids = HashSet::with_capacity(records.len());

        for record in &records {
            let resource_id = record.normalized_id();
            seen_ids.insert(resource_id.clone());

            match self
                .reconcile_resource(&subscription, &session, &resolver, &emitter, record, &resource_id)
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
            "sync - {} - Resource",
            self.provider()
        );

        tally.deleted = self
            .prune_resources(&subscription, &seen_ids, &emitter)
            .await?;
        info!(deleted = tally.deleted, "mark for deleted old Resource");

        Ok(tally)
    }

    async fn reconcile_resource(
        &self,
        subscription: &Subscription,
        session: &Session,
        resolver: &TypeResolver<'_, dyn InventoryRepository>,
        emitter: &EventEmitter<'_, dyn InventoryRepository>,
        record: &RawRecord,
        resource_id: &str,
    ) -> Result<Result<RecordOutcome, RecordError>, SyncError> {
        if resource_id.is_empty() {
            return Ok(Err(RecordError::invalid(resource_id, "record has no id")));
        }

        let (base_type, type_suffix) = split_composite_type(&record.resource_type);
        let Some(resource_type) = resolver.resolve(base_type).await? else {
            return Ok(Err(RecordError::UnknownType {
                resource_id: resource_id.to_string(),
                resource_type: base_type.to_string(),
            }));
        };

        let Some(group_id) = owning_group_id(&subscription.subscription_id, resource_id) else {
            return Ok(Err(RecordError::invalid(
                resource_id,
                "cannot derive resource group from id",
            )));
        };
        let Some(group) = self
            .repository
            .find_resource_group(&subscription.subscription_id, &group_id)
            .await?
        else {
            return Ok(Err(RecordError::UnresolvedParent {
                resource_id: resource_id.to_string(),
                group_id,
            }));
        };

        let detail = match self.source.get_resource_by_id(resource_id, session).await {
            Ok(detail) => detail,
            Err(source) => {
                return Ok(Err(RecordError::Fetch {
                    resource_id: resource_id.to_string(),
                    source,
                }));
            }
        };

        let tag_ids = self.upsert_tags(&detail.tags()).await?;
        let name = if detail.name.is_empty() {
            record.name.clone()
        } else {
            detail.name.clone()
        };

        let upserted = self
            .repository
            .upsert_resource(&ResourceUpsert {
                resource_id: resource_id.to_string(),
                name,
                location: detail.location.clone(),
                provider: self.provider(),
                resource_type: resource_type.name,
                subscription_id: subscription.subscription_id.clone(),
                resource_group_id: group.resource_id,
                company: subscription.company.clone(),
                metas: detail.metas(),
                sku: detail.sku(),
                kind: detail.kind().or_else(|| type_suffix.map(str::to_string)),
                tag_ids,
            })
            .await;
        let outcome = match isolate_conflict(resource_id, upserted)? {
            Ok(outcome) => outcome,
            Err(failure) => return Ok(Err(failure)),
        };

        let target = EventTarget::Resource(resource_id.to_string());
        self.record_change(emitter, target, outcome).await.map(Ok)
    }

    async fn prune_resources(
        &self,
        subscription: &Subscription,
        seen_ids: &HashSet<String>,
        emitter: &EventEmitter<'_, dyn InventoryRepository>,
    ) -> Result<u64, SyncError> {
        let stale: Vec<(EventTarget, Resource)> = self
            .repository
            .list_resources(&subscription.subscription_id)
            .await?
            .into_iter()
            .filter(|resource| !seen_ids.contains(&resource.resource_id))
            .map(|resource| (EventTarget::Resource(resource.resource_id.clone()), resource))
            .collect();

        if stale.is_empty() {
            return Ok(0);
        }

        emitter.emit_delete_batch(&stale).await?;
        let stale_ids: Vec<String> = stale
            .iter()
            .map(|(_, resource)| resource.resource_id.clone())
            .collect();
        Ok(self.repository.soft_delete_resources(&stale_ids).await?)
    }
}
