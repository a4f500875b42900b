//! PostgreSQL implementation of the inventory repository.
//!
//! ## Key Features
//!
//! - Connection pooling with `sqlx::PgPool`
//! - One transaction per entity upsert: the live row is locked, captured, then
//!   written with `ON CONFLICT DO UPDATE`
//! - Tag sets stored in join tables and materialized with `jsonb_object_agg`
//! - Soft delete through a `deleted` flag; default queries filter it out
//!
//! ## Database Tables
//!
//! - `resource_types`: type catalog, unique on `(lower(name), provider)`
//! - `tags`: shared tags, unique on `(name, provider)`
//! - `subscriptions`: subscription scopes
//! - `resource_groups`, `resource_group_tags`: groups and their tag sets
//! - `resources`, `resource_tags`: resources and their tag sets
//! - `change_events`: append-only event log
use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cloud_inventory_shared::{
    ChangeEvent, EntityKind, EventAction, EventTarget, NewChangeEvent, PatchOperation, Provider,
    Resource, ResourceGroup, ResourceType, Subscription, Tag,
};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgExecutor, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use crate::interfaces::{
    EventFilter, EventLogRepository, ResourceGroupRepository, ResourceGroupUpsert,
    ResourceRepository, ResourceUpsert, SubscriptionRepository, TagRepository,
    TypeCatalogRepository, UpsertOutcome,
};
use crate::RepositoryError;

const GROUP_COLUMNS: &str = r#"
    g.resource_id, g.name, g.location, g.provider, g.resource_type, g.subscription_id,
    g.company, g.metas, g.deleted, g.created_at, g.updated_at,
    COALESCE(
        (SELECT jsonb_object_agg(t.name, t.value)
           FROM resource_group_tags gt
           JOIN tags t ON t.id = gt.tag_id
          WHERE gt.resource_group_id = g.resource_id),
        '{}'::jsonb
    ) AS tags
"#;

const RESOURCE_COLUMNS: &str = r#"
    r.resource_id, r.name, r.location, r.provider, r.resource_type, r.subscription_id,
    r.company, r.resource_group_id, r.metas, r.sku, r.kind, r.deleted, r.created_at,
    r.updated_at,
    COALESCE(
        (SELECT jsonb_object_agg(t.name, t.value)
           FROM resource_tags rt
           JOIN tags t ON t.id = rt.tag_id
          WHERE rt.resource_id = r.resource_id),
        '{}'::jsonb
    ) AS tags
"#;

const EVENT_COLUMNS: &str =
    "id, sequence, action, target_kind, target_id, old_object, new_object, changes, created_at";

fn parse_provider(value: &str) -> Result<Provider, RepositoryError> {
    value
        .parse()
        .map_err(|e| RepositoryError::invalid_value(format!("{}", e)))
}

#[derive(sqlx::FromRow)]
struct ResourceTypeRow {
    id: Uuid,
    name: String,
    provider: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ResourceTypeRow> for ResourceType {
    type Error = RepositoryError;

    fn try_from(row: ResourceTypeRow) -> Result<Self, Self::Error> {
        Ok(ResourceType {
            id: row.id,
            name: row.name,
            provider: parse_provider(&row.provider)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TagRow {
    id: Uuid,
    name: String,
    provider: String,
    value: String,
}

impl TryFrom<TagRow> for Tag {
    type Error = RepositoryError;

    fn try_from(row: TagRow) -> Result<Self, Self::Error> {
        Ok(Tag {
            id: row.id,
            name: row.name,
            provider: parse_provider(&row.provider)?,
            value: row.value,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SubscriptionRow {
    subscription_id: String,
    name: String,
    tenant: String,
    location: Option<String>,
    company: Option<String>,
    active: bool,
}

impl From<SubscriptionRow> for Subscription {
    fn from(row: SubscriptionRow) -> Self {
        Subscription {
            subscription_id: row.subscription_id,
            name: row.name,
            tenant: row.tenant,
            location: row.location,
            company: row.company,
            active: row.active,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ResourceGroupRow {
    resource_id: String,
    name: String,
    location: Option<String>,
    provider: String,
    resource_type: String,
    subscription_id: String,
    company: Option<String>,
    metas: Value,
    tags: Json<BTreeMap<String, String>>,
    deleted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ResourceGroupRow> for ResourceGroup {
    type Error = RepositoryError;

    fn try_from(row: ResourceGroupRow) -> Result<Self, Self::Error> {
        Ok(ResourceGroup {
            resource_id: row.resource_id,
            name: row.name,
            location: row.location,
            provider: parse_provider(&row.provider)?,
            resource_type: row.resource_type,
            subscription_id: row.subscription_id,
            company: row.company,
            metas: row.metas,
            tags: row.tags.0,
            deleted: row.deleted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ResourceRow {
    resource_id: String,
    name: String,
    location: Option<String>,
    provider: String,
    resource_type: String,
    subscription_id: String,
    company: Option<String>,
    resource_group_id: String,
    metas: Value,
    sku: Option<Value>,
    kind: Option<String>,
    tags: Json<BTreeMap<String, String>>,
    deleted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ResourceRow> for Resource {
    type Error = RepositoryError;

    fn try_from(row: ResourceRow) -> Result<Self, Self::Error> {
        Ok(Resource {
            resource_id: row.resource_id,
            name: row.name,
            location: row.location,
            provider: parse_provider(&row.provider)?,
            resource_type: row.resource_type,
            subscription_id: row.subscription_id,
            company: row.company,
            resource_group_id: row.resource_group_id,
            metas: row.metas,
            tags: row.tags.0,
            sku: row.sku,
            kind: row.kind,
            deleted: row.deleted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ChangeEventRow {
    id: Uuid,
    sequence: i64,
    action: String,
    target_kind: String,
    target_id: String,
    old_object: Option<Value>,
    new_object: Option<Value>,
    changes: Option<Json<Vec<PatchOperation>>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ChangeEventRow> for ChangeEvent {
    type Error = RepositoryError;

    fn try_from(row: ChangeEventRow) -> Result<Self, Self::Error> {
        let action: EventAction = row.action.parse().map_err(RepositoryError::invalid_value)?;
        let kind: EntityKind = row
            .target_kind
            .parse()
            .map_err(RepositoryError::invalid_value)?;

        Ok(ChangeEvent {
            id: row.id,
            sequence: row.sequence,
            action,
            target: EventTarget::new(kind, row.target_id),
            old_object: row.old_object,
            new_object: row.new_object,
            changes: row.changes.map(|changes| changes.0),
            created_at: row.created_at,
        })
    }
}

/// PostgreSQL-backed inventory repository.
pub struct PostgresRepository {
    pool: sqlx::PgPool,
}

impl PostgresRepository {
    /// Wraps an existing pool. The schema is expected to be migrated already.
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool to `database_url` and applies pending migrations.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
    ) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        let repository = Self::new(pool);
        repository.migrate().await?;
        Ok(repository)
    }

    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("src/postgres/migrations")
            .run(&self.pool)
            .await?;
        info!("Inventory schema migrated");
        Ok(())
    }

    async fn fetch_group<'e, E>(
        executor: E,
        resource_id: &str,
    ) -> Result<Option<ResourceGroup>, RepositoryError>
    where
        E: PgExecutor<'e>,
    {
        let row = sqlx::query_as::<_, ResourceGroupRow>(&format!(
            "SELECT {GROUP_COLUMNS} FROM resource_groups g WHERE g.resource_id = $1"
        ))
        .bind(resource_id)
        .fetch_optional(executor)
        .await?;

        row.map(ResourceGroup::try_from).transpose()
    }

    async fn fetch_resource<'e, E>(
        executor: E,
        resource_id: &str,
    ) -> Result<Option<Resource>, RepositoryError>
    where
        E: PgExecutor<'e>,
    {
        let row = sqlx::query_as::<_, ResourceRow>(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources r WHERE r.resource_id = $1"
        ))
        .bind(resource_id)
        .fetch_optional(executor)
        .await?;

        row.map(Resource::try_from).transpose()
    }

    /// Locks the row and returns `(subscription_id, deleted)` when it exists.
    async fn lock_row(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        table: &str,
        resource_id: &str,
    ) -> Result<Option<(String, bool)>, RepositoryError> {
        let row = sqlx::query_as::<_, (String, bool)>(&format!(
            "SELECT subscription_id, deleted FROM {table} WHERE resource_id = $1 FOR UPDATE"
        ))
        .bind(resource_id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(row)
    }

    async fn replace_tags(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        table: &str,
        owner_column: &str,
        owner_id: &str,
        tag_ids: &[Uuid],
    ) -> Result<(), RepositoryError> {
        sqlx::query(&format!("DELETE FROM {table} WHERE {owner_column} = $1"))
            .bind(owner_id)
            .execute(&mut **tx)
            .await?;

        if tag_ids.is_empty() {
            return Ok(());
        }

        sqlx::query(&format!(
            "INSERT INTO {table} ({owner_column}, tag_id) \
             SELECT $1, UNNEST($2::uuid[]) \
             ON CONFLICT DO NOTHING"
        ))
        .bind(owner_id)
        .bind(tag_ids)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

fn ensure_same_subscription(
    kind: &str,
    resource_id: &str,
    stored: &Option<(String, bool)>,
    subscription_id: &str,
) -> Result<(), RepositoryError> {
    match stored {
        Some((owner, _)) if owner != subscription_id => Err(RepositoryError::conflict(format!(
            "{} {} belongs to subscription {}",
            kind, resource_id, owner
        ))),
        _ => Ok(()),
    }
}

#[async_trait]
impl TypeCatalogRepository for PostgresRepository {
    async fn upsert_resource_type(
        &self,
        name: &str,
        provider: Provider,
    ) -> Result<UpsertOutcome<ResourceType>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let previous = sqlx::query_as::<_, ResourceTypeRow>(
            "SELECT id, name, provider, created_at, updated_at FROM resource_types \
             WHERE lower(name) = lower($1) AND provider = $2 FOR UPDATE",
        )
        .bind(name)
        .bind(provider.as_str())
        .fetch_optional(&mut *tx)
        .await?
        .map(ResourceType::try_from)
        .transpose()?;

        let row = sqlx::query_as::<_, ResourceTypeRow>(
            "INSERT INTO resource_types (id, name, provider) VALUES ($1, $2, $3) \
             ON CONFLICT ((lower(name)), provider) \
             DO UPDATE SET name = EXCLUDED.name, updated_at = now() \
             RETURNING id, name, provider, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(provider.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(UpsertOutcome {
            entity: row.try_into()?,
            created: previous.is_none(),
            previous,
        })
    }

    async fn find_resource_type(
        &self,
        name: &str,
        provider: Provider,
    ) -> Result<Option<ResourceType>, RepositoryError> {
        sqlx::query_as::<_, ResourceTypeRow>(
            "SELECT id, name, provider, created_at, updated_at FROM resource_types \
             WHERE lower(name) = lower($1) AND provider = $2",
        )
        .bind(name)
        .bind(provider.as_str())
        .fetch_optional(&self.pool)
        .await?
        .map(ResourceType::try_from)
        .transpose()
    }

    async fn list_resource_types(
        &self,
        provider: Provider,
    ) -> Result<Vec<ResourceType>, RepositoryError> {
        sqlx::query_as::<_, ResourceTypeRow>(
            "SELECT id, name, provider, created_at, updated_at FROM resource_types \
             WHERE provider = $1 ORDER BY lower(name)",
        )
        .bind(provider.as_str())
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(ResourceType::try_from)
        .collect()
    }
}

#[async_trait]
impl TagRepository for PostgresRepository {
    async fn upsert_tag(
        &self,
        name: &str,
        provider: Provider,
        value: &str,
    ) -> Result<Tag, RepositoryError> {
        sqlx::query_as::<_, TagRow>(
            "INSERT INTO tags (id, name, provider, value) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (name, provider) DO UPDATE SET value = EXCLUDED.value \
             RETURNING id, name, provider, value",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(provider.as_str())
        .bind(value)
        .fetch_one(&self.pool)
        .await?
        .try_into()
    }

    async fn list_tags(&self, provider: Provider) -> Result<Vec<Tag>, RepositoryError> {
        sqlx::query_as::<_, TagRow>(
            "SELECT id, name, provider, value FROM tags WHERE provider = $1 ORDER BY name",
        )
        .bind(provider.as_str())
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Tag::try_from)
        .collect()
    }
}

#[async_trait]
impl SubscriptionRepository for PostgresRepository {
    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<Subscription>, RepositoryError> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            "SELECT subscription_id, name, tenant, location, company, active \
             FROM subscriptions WHERE subscription_id = $1",
        )
        .bind(subscription_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Subscription::from))
    }

    async fn list_active_subscriptions(&self) -> Result<Vec<Subscription>, RepositoryError> {
        let rows = sqlx::query_as::<_, SubscriptionRow>(
            "SELECT subscription_id, name, tenant, location, company, active \
             FROM subscriptions WHERE active ORDER BY subscription_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Subscription::from).collect())
    }

    async fn upsert_subscription(
        &self,
        subscription: &Subscription,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO subscriptions (subscription_id, name, tenant, location, company, active) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (subscription_id) DO UPDATE SET \
                name = EXCLUDED.name, \
                tenant = EXCLUDED.tenant, \
                location = EXCLUDED.location, \
                company = EXCLUDED.company, \
                active = EXCLUDED.active",
        )
        .bind(&subscription.subscription_id)
        .bind(&subscription.name)
        .bind(&subscription.tenant)
        .bind(&subscription.location)
        .bind(&subscription.company)
        .bind(subscription.active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl ResourceGroupRepository for PostgresRepository {
    async fn get_resource_group(
        &self,
        resource_id: &str,
    ) -> Result<Option<ResourceGroup>, RepositoryError> {
        let group = Self::fetch_group(&self.pool, resource_id).await?;
        Ok(group.filter(|group| !group.deleted))
    }

    async fn find_resource_group(
        &self,
        subscription_id: &str,
        resource_id: &str,
    ) -> Result<Option<ResourceGroup>, RepositoryError> {
        sqlx::query_as::<_, ResourceGroupRow>(&format!(
            "SELECT {GROUP_COLUMNS} FROM resource_groups g \
             WHERE lower(g.resource_id) = lower($1) AND g.subscription_id = $2 AND NOT g.deleted"
        ))
        .bind(resource_id)
        .bind(subscription_id)
        .fetch_optional(&self.pool)
        .await?
        .map(ResourceGroup::try_from)
        .transpose()
    }

    async fn upsert_resource_group(
        &self,
        group: &ResourceGroupUpsert,
    ) -> Result<UpsertOutcome<ResourceGroup>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let stored = Self::lock_row(&mut tx, "resource_groups", &group.resource_id).await?;
        ensure_same_subscription(
            "resource group",
            &group.resource_id,
            &stored,
            &group.subscription_id,
        )?;
        let previous = match stored {
            Some((_, false)) => Self::fetch_group(&mut *tx, &group.resource_id).await?,
            _ => None,
        };

        sqlx::query(
            "INSERT INTO resource_groups \
                (resource_id, name, location, provider, resource_type, subscription_id, company, metas) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (resource_id) DO UPDATE SET \
                name = EXCLUDED.name, \
                location = EXCLUDED.location, \
                provider = EXCLUDED.provider, \
                resource_type = EXCLUDED.resource_type, \
                subscription_id = EXCLUDED.subscription_id, \
                company = EXCLUDED.company, \
                metas = EXCLUDED.metas, \
                deleted = FALSE, \
                updated_at = now()",
        )
        .bind(&group.resource_id)
        .bind(&group.name)
        .bind(&group.location)
        .bind(group.provider.as_str())
        .bind(&group.resource_type)
        .bind(&group.subscription_id)
        .bind(&group.company)
        .bind(&group.metas)
        .execute(&mut *tx)
        .await?;

        Self::replace_tags(
            &mut tx,
            "resource_group_tags",
            "resource_group_id",
            &group.resource_id,
            &group.tag_ids,
        )
        .await?;

        let entity = Self::fetch_group(&mut *tx, &group.resource_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("resource group", &group.resource_id))?;

        tx.commit().await?;

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
        sqlx::query_as::<_, ResourceGroupRow>(&format!(
            "SELECT {GROUP_COLUMNS} FROM resource_groups g \
             WHERE g.subscription_id = $1 AND NOT g.deleted ORDER BY g.resource_id"
        ))
        .bind(subscription_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(ResourceGroup::try_from)
        .collect()
    }

    async fn list_all_resource_groups(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<ResourceGroup>, RepositoryError> {
        sqlx::query_as::<_, ResourceGroupRow>(&format!(
            "SELECT {GROUP_COLUMNS} FROM resource_groups g \
             WHERE g.subscription_id = $1 ORDER BY g.resource_id"
        ))
        .bind(subscription_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(ResourceGroup::try_from)
        .collect()
    }

    async fn soft_delete_resource_groups(
        &self,
        resource_ids: &[String],
    ) -> Result<u64, RepositoryError> {
        if resource_ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            "UPDATE resource_groups SET deleted = TRUE, updated_at = now() \
             WHERE resource_id = ANY($1) AND NOT deleted",
        )
        .bind(resource_ids)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ResourceRepository for PostgresRepository {
    async fn get_resource(&self, resource_id: &str) -> Result<Option<Resource>, RepositoryError> {
        let resource = Self::fetch_resource(&self.pool, resource_id).await?;
        Ok(resource.filter(|resource| !resource.deleted))
    }

    async fn upsert_resource(
        &self,
        resource: &ResourceUpsert,
    ) -> Result<UpsertOutcome<Resource>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let stored = Self::lock_row(&mut tx, "resources", &resource.resource_id).await?;
        ensure_same_subscription(
            "resource",
            &resource.resource_id,
            &stored,
            &resource.subscription_id,
        )?;
        let previous = match stored {
            Some((_, false)) => Self::fetch_resource(&mut *tx, &resource.resource_id).await?,
            _ => None,
        };

        // sku and kind keep their stored value when the record omits them
        sqlx::query(
            "INSERT INTO resources \
                (resource_id, name, location, provider, resource_type, subscription_id, \
                 resource_group_id, company, metas, sku, kind) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (resource_id) DO UPDATE SET \
                name = EXCLUDED.name, \
                location = EXCLUDED.location, \
                provider = EXCLUDED.provider, \
                resource_type = EXCLUDED.resource_type, \
                subscription_id = EXCLUDED.subscription_id, \
                resource_group_id = EXCLUDED.resource_group_id, \
                company = EXCLUDED.company, \
                metas = EXCLUDED.metas, \
                sku = COALESCE(EXCLUDED.sku, resources.sku), \
                kind = COALESCE(EXCLUDED.kind, resources.kind), \
                deleted = FALSE, \
                updated_at = now()",
        )
        .bind(&resource.resource_id)
        .bind(&resource.name)
        .bind(&resource.location)
        .bind(resource.provider.as_str())
        .bind(&resource.resource_type)
        .bind(&resource.subscription_id)
        .bind(&resource.resource_group_id)
        .bind(&resource.company)
        .bind(&resource.metas)
        .bind(&resource.sku)
        .bind(&resource.kind)
        .execute(&mut *tx)
        .await?;

        Self::replace_tags(
            &mut tx,
            "resource_tags",
            "resource_id",
            &resource.resource_id,
            &resource.tag_ids,
        )
        .await?;

        let entity = Self::fetch_resource(&mut *tx, &resource.resource_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("resource", &resource.resource_id))?;

        tx.commit().await?;

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
        sqlx::query_as::<_, ResourceRow>(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources r \
             WHERE r.subscription_id = $1 AND NOT r.deleted ORDER BY r.resource_id"
        ))
        .bind(subscription_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Resource::try_from)
        .collect()
    }

    async fn list_all_resources(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<Resource>, RepositoryError> {
        sqlx::query_as::<_, ResourceRow>(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources r \
             WHERE r.subscription_id = $1 ORDER BY r.resource_id"
        ))
        .bind(subscription_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Resource::try_from)
        .collect()
    }

    async fn list_resources_by_group(
        &self,
        resource_group_id: &str,
    ) -> Result<Vec<Resource>, RepositoryError> {
        sqlx::query_as::<_, ResourceRow>(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources r \
             WHERE r.resource_group_id = $1 AND NOT r.deleted ORDER BY r.resource_id"
        ))
        .bind(resource_group_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Resource::try_from)
        .collect()
    }

    async fn soft_delete_resources(
        &self,
        resource_ids: &[String],
    ) -> Result<u64, RepositoryError> {
        if resource_ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            "UPDATE resources SET deleted = TRUE, updated_at = now() \
             WHERE resource_id = ANY($1) AND NOT deleted",
        )
        .bind(resource_ids)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl EventLogRepository for PostgresRepository {
    async fn append_event(&self, event: &NewChangeEvent) -> Result<ChangeEvent, RepositoryError> {
        let changes = event
            .changes
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        sqlx::query_as::<_, ChangeEventRow>(&format!(
            "INSERT INTO change_events \
                (id, action, target_kind, target_id, old_object, new_object, changes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(event.action.as_str())
        .bind(event.target.kind().as_str())
        .bind(event.target.resource_id())
        .bind(&event.old_object)
        .bind(&event.new_object)
        .bind(changes)
        .fetch_one(&self.pool)
        .await?
        .try_into()
    }

    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<ChangeEvent>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {EVENT_COLUMNS} FROM change_events WHERE TRUE"
        ));
        if let Some(kind) = filter.kind {
            query.push(" AND target_kind = ").push_bind(kind.as_str());
        }
        if let Some(resource_id) = &filter.resource_id {
            query.push(" AND target_id = ").push_bind(resource_id.clone());
        }
        if let Some(action) = filter.action {
            query.push(" AND action = ").push_bind(action.as_str());
        }
        query.push(" ORDER BY sequence");

        query
            .build_query_as::<ChangeEventRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(ChangeEvent::try_from)
            .collect()
    }
}
