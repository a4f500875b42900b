//! In-memory implementation of the inventory repository.
//!
//! Backs tests and local runs without a database. Every trait method takes the
//! single state lock for its whole duration, so each upsert is atomic in the same
//! way a PostgreSQL transaction is.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use cloud_inventory_shared::{
    ChangeEvent, NewChangeEvent, Provider, Resource, ResourceGroup, ResourceType, Subscription,
    Tag,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::interfaces::{
    EventFilter, EventLogRepository, ResourceGroupRepository, ResourceGroupUpsert,
    ResourceRepository, ResourceUpsert, SubscriptionRepository, TagRepository,
    TypeCatalogRepository, UpsertOutcome,
};
use crate::RepositoryError;

/// An entity as stored, with its tag references kept apart so that tag values
/// are always read from the shared tag table.
#[derive(Debug, Clone)]
struct Stored<T> {
    entity: T,
    tag_ids: Vec<Uuid>,
}

#[derive(Debug, Default)]
struct MemoryState {
    resource_types: BTreeMap<(String, Provider), ResourceType>,
    tags: HashMap<Uuid, Tag>,
    tag_index: HashMap<(String, Provider), Uuid>,
    subscriptions: BTreeMap<String, Subscription>,
    resource_groups: BTreeMap<String, Stored<ResourceGroup>>,
    resources: BTreeMap<String, Stored<Resource>>,
    events: Vec<ChangeEvent>,
}

impl MemoryState {
    fn tag_map(&self, tag_ids: &[Uuid]) -> BTreeMap<String, String> {
        tag_ids
            .iter()
            .filter_map(|id| self.tags.get(id))
            .map(|tag| (tag.name.clone(), tag.value.clone()))
            .collect()
    }

    fn group(&self, stored: &Stored<ResourceGroup>) -> ResourceGroup {
        let mut group = stored.entity.clone();
        group.tags = self.tag_map(&stored.tag_ids);
        group
    }

    fn resource(&self, stored: &Stored<Resource>) -> Resource {
        let mut resource = stored.entity.clone();
        resource.tags = self.tag_map(&stored.tag_ids);
        resource
    }
}

/// Inventory storage held entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: RwLock<MemoryState>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TypeCatalogRepository for MemoryRepository {
    async fn upsert_resource_type(
        &self,
        name: &str,
        provider: Provider,
    ) -> Result<UpsertOutcome<ResourceType>, RepositoryError> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let key = (name.to_lowercase(), provider);

        let previous = state.resource_types.get(&key).cloned();
        let entity = match &previous {
            Some(existing) => ResourceType {
                name: name.to_string(),
                updated_at: now,
                ..existing.clone()
            },
            None => ResourceType {
                id: Uuid::new_v4(),
                name: name.to_string(),
                provider,
                created_at: now,
                updated_at: now,
            },
        };
        state.resource_types.insert(key, entity.clone());

        Ok(UpsertOutcome {
            created: previous.is_none(),
            entity,
            previous,
        })
    }

    async fn find_resource_type(
        &self,
        name: &str,
        provider: Provider,
    ) -> Result<Option<ResourceType>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .resource_types
            .get(&(name.to_lowercase(), provider))
            .cloned())
    }

    async fn list_resource_types(
        &self,
        provider: Provider,
    ) -> Result<Vec<ResourceType>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .resource_types
            .values()
            .filter(|entry| entry.provider == provider)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TagRepository for MemoryRepository {
    async fn upsert_tag(
        &self,
        name: &str,
        provider: Provider,
        value: &str,
    ) -> Result<Tag, RepositoryError> {
        let mut state = self.state.write().await;
        let key = (name.to_string(), provider);

        if let Some(id) = state.tag_index.get(&key).copied() {
            if let Some(tag) = state.tags.get_mut(&id) {
                tag.value = value.to_string();
                return Ok(tag.clone());
            }
        }

        let tag = Tag {
            id: Uuid::new_v4(),
            name: name.to_string(),
            provider,
            value: value.to_string(),
        };
        state.tag_index.insert(key, tag.id);
        state.tags.insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn list_tags(&self, provider: Provider) -> Result<Vec<Tag>, RepositoryError> {
        let state = self.state.read().await;
        let mut tags: Vec<Tag> = state
            .tags
            .values()
            .filter(|tag| tag.provider == provider)
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }
}

#[async_trait]
impl SubscriptionRepository for MemoryRepository {
    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<Subscription>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.subscriptions.get(subscription_id).cloned())
    }

    async fn list_active_subscriptions(&self) -> Result<Vec<Subscription>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .subscriptions
            .values()
            .filter(|subscription| subscription.active)
            .cloned()
            .collect())
    }

    async fn upsert_subscription(
        &self,
        subscription: &Subscription,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        state
            .subscriptions
            .insert(subscription.subscription_id.clone(), subscription.clone());
        Ok(())
    }
}

#[async_trait]
impl ResourceGroupRepository for MemoryRepository {
    async fn get_resource_group(
        &self,
        resource_id: &str,
    ) -> Result<Option<ResourceGroup>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .resource_groups
            .get(resource_id)
            .filter(|stored| !stored.entity.deleted)
            .map(|stored| state.group(stored)))
    }

    async fn find_resource_group(
        &self,
        subscription_id: &str,
        resource_id: &str,
    ) -> Result<Option<ResourceGroup>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .resource_groups
            .get(&resource_id.to_lowercase())
            .filter(|stored| {
                !stored.entity.deleted && stored.entity.subscription_id == subscription_id
            })
            .map(|stored| state.group(stored)))
    }

    async fn upsert_resource_group(
        &self,
        upsert: &ResourceGroupUpsert,
    ) -> Result<UpsertOutcome<ResourceGroup>, RepositoryError> {
        let mut state = self.state.write().await;
        let now = Utc::now();

        let existing = state.resource_groups.get(&upsert.resource_id);
        if let Some(existing) = existing {
            if existing.entity.subscription_id != upsert.subscription_id {
                return Err(RepositoryError::conflict(format!(
                    "resource group {} belongs to subscription {}",
                    upsert.resource_id, existing.entity.subscription_id
                )));
            }
        }
        let created_at = existing.map_or(now, |stored| stored.entity.created_at);
        let previous = existing
            .filter(|stored| !stored.entity.deleted)
            .map(|stored| state.group(stored));

        let stored = Stored {
            entity: ResourceGroup {
                resource_id: upsert.resource_id.clone(),
                name: upsert.name.clone(),
                location: upsert.location.clone(),
                provider: upsert.provider,
                resource_type: upsert.resource_type.clone(),
                subscription_id: upsert.subscription_id.clone(),
                company: upsert.company.clone(),
                metas: upsert.metas.clone(),
                tags: BTreeMap::new(),
                deleted: false,
                created_at,
                updated_at: now,
            },
            tag_ids: upsert.tag_ids.clone(),
        };
        let entity = state.group(&stored);
        state
            .resource_groups
            .insert(upsert.resource_id.clone(), stored);

        Ok(UpsertOutcome {
            entity,
            created: previous.is_none(),
            previous,
        })
    }

    async fn list_resource_groups(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<ResourceGroup>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .resource_groups
            .values()
            .filter(|stored| {
                !stored.entity.deleted && stored.entity.subscription_id == subscription_id
            })
            .map(|stored| state.group(stored))
            .collect())
    }

    async fn list_all_resource_groups(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<ResourceGroup>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .resource_groups
            .values()
            .filter(|stored| stored.entity.subscription_id == subscription_id)
            .map(|stored| state.group(stored))
            .collect())
    }

    async fn soft_delete_resource_groups(
        &self,
        resource_ids: &[String],
    ) -> Result<u64, RepositoryError> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let mut deleted = 0;
        for id in resource_ids {
            if let Some(stored) = state.resource_groups.get_mut(id) {
                if !stored.entity.deleted {
                    stored.entity.deleted = true;
                    stored.entity.updated_at = now;
                    deleted += 1;
                }
            }
        }
        Ok(deleted)
    }
}

#[async_trait]
impl ResourceRepository for MemoryRepository {
    async fn get_resource(&self, resource_id: &str) -> Result<Option<Resource>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .resources
            .get(resource_id)
            .filter(|stored| !stored.entity.deleted)
            .map(|stored| state.resource(stored)))
    }

    async fn upsert_resource(
        &self,
        upsert: &ResourceUpsert,
    ) -> Result<UpsertOutcome<Resource>, RepositoryError> {
        let mut state = self.state.write().await;
        let now = Utc::now();

        if !state.resource_groups.contains_key(&upsert.resource_group_id) {
            return Err(RepositoryError::not_found(
                "resource group",
                upsert.resource_group_id.clone(),
            ));
        }

        let existing = state.resources.get(&upsert.resource_id);
        if let Some(existing) = existing {
            if existing.entity.subscription_id != upsert.subscription_id {
                return Err(RepositoryError::conflict(format!(
                    "resource {} belongs to subscription {}",
                    upsert.resource_id, existing.entity.subscription_id
                )));
            }
        }
        let created_at = existing.map_or(now, |stored| stored.entity.created_at);
        let sku = upsert
            .sku
            .clone()
            .or_else(|| existing.and_then(|stored| stored.entity.sku.clone()));
        let kind = upsert
            .kind
            .clone()
            .or_else(|| existing.and_then(|stored| stored.entity.kind.clone()));
        let previous = existing
            .filter(|stored| !stored.entity.deleted)
            .map(|stored| state.resource(stored));

        let stored = Stored {
            entity: Resource {
                resource_id: upsert.resource_id.clone(),
                name: upsert.name.clone(),
                location: upsert.location.clone(),
                provider: upsert.provider,
                resource_type: upsert.resource_type.clone(),
                subscription_id: upsert.subscription_id.clone(),
                company: upsert.company.clone(),
                resource_group_id: upsert.resource_group_id.clone(),
                metas: upsert.metas.clone(),
                tags: BTreeMap::new(),
                sku,
                kind,
                deleted: false,
                created_at,
                updated_at: now,
            },
            tag_ids: upsert.tag_ids.clone(),
        };
        let entity = state.resource(&stored);
        state.resources.insert(upsert.resource_id.clone(), stored);

        Ok(UpsertOutcome {
            entity,
            created: previous.is_none(),
            previous,
        })
    }

    async fn list_resources(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<Resource>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .resources
            .values()
            .filter(|stored| {
                !stored.entity.deleted && stored.entity.subscription_id == subscription_id
            })
            .map(|stored| state.resource(stored))
            .collect())
    }

    async fn list_all_resources(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<Resource>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .resources
            .values()
            .filter(|stored| stored.entity.subscription_id == subscription_id)
            .map(|stored| state.resource(stored))
            .collect())
    }

    async fn list_resources_by_group(
        &self,
        resource_group_id: &str,
    ) -> Result<Vec<Resource>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .resources
            .values()
            .filter(|stored| {
                !stored.entity.deleted && stored.entity.resource_group_id == resource_group_id
            })
            .map(|stored| state.resource(stored))
            .collect())
    }

    async fn soft_delete_resources(
        &self,
        resource_ids: &[String],
    ) -> Result<u64, RepositoryError> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let mut deleted = 0;
        for id in resource_ids {
            if let Some(stored) = state.resources.get_mut(id) {
                if !stored.entity.deleted {
                    stored.entity.deleted = true;
                    stored.entity.updated_at = now;
                    deleted += 1;
                }
            }
        }
        Ok(deleted)
    }
}

#[async_trait]
impl EventLogRepository for MemoryRepository {
    async fn append_event(&self, event: &NewChangeEvent) -> Result<ChangeEvent, RepositoryError> {
        let mut state = self.state.write().await;
        let event = ChangeEvent {
            id: Uuid::new_v4(),
            sequence: state.events.len() as i64 + 1,
            action: event.action,
            target: event.target.clone(),
            old_object: event.old_object.clone(),
            new_object: event.new_object.clone(),
            changes: event.changes.clone(),
            created_at: Utc::now(),
        };
        state.events.push(event.clone());
        Ok(event)
    }

    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<ChangeEvent>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .events
            .iter()
            .filter(|event| filter.matches(event))
            .cloned()
            .collect())
    }
}
