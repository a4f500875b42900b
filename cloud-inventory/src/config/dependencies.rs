//! Dependency initialization and wiring for the inventory sync.

use std::sync::Arc;

use cloud_inventory_pipeline::source::{FileSnapshotSource, StaticAuthenticator};
use cloud_inventory_pipeline::{ProviderCatalog, Reconciler, SyncError};
use cloud_inventory_repository::{
    InventoryRepository, MemoryRepository, PostgresRepository, RepositoryError,
    SubscriptionRepository,
};
use tracing::info;

use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::AppError;

/// Where inventory state is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreSource {
    /// In-memory store, lost at exit.
    Memory,

    /// PostgreSQL storage.
    Postgres {
        database_url: String,
        max_connections: u32,
    },
}

impl StoreSource {
    pub fn memory() -> Self {
        Self::Memory
    }

    pub fn postgres(database_url: impl Into<String>, max_connections: u32) -> Self {
        Self::Postgres {
            database_url: database_url.into(),
            max_connections,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Postgres { .. } => "postgres",
        }
    }

    /// Picks PostgreSQL when a database URL is configured.
    pub fn from_settings(settings: &Settings) -> Self {
        match &settings.database_url {
            Some(url) => Self::postgres(url.clone(), settings.max_connections),
            None => Self::memory(),
        }
    }

    /// Create the repository with the appropriate storage backend.
    pub async fn into_repository(self) -> Result<Arc<dyn InventoryRepository>, RepositoryError> {
        match self {
            Self::Memory => Ok(Arc::new(MemoryRepository::new())),
            Self::Postgres {
                database_url,
                max_connections,
            } => {
                let repository = PostgresRepository::connect(&database_url, max_connections).await?;
                Ok(Arc::new(repository))
            }
        }
    }
}

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    pub async fn new() -> Result<Self, AppError> {
        let settings = Settings::from_env()?;
        Self::from_settings(settings).await
    }

    pub async fn from_settings(settings: Settings) -> Result<Self, AppError> {
        let store = StoreSource::from_settings(&settings);
        info!(
            store = store.label(),
            snapshot_dir = %settings.snapshot_dir.display(),
            emit_create_events = settings.policy.emit_create_events,
            cascade_group_deletes = settings.policy.cascade_group_deletes,
            "Initializing dependencies"
        );

        let repository = store.into_repository().await?;
        let source = FileSnapshotSource::new(settings.snapshot_dir.clone());

        let subscriptions = source
            .load_subscriptions()
            .await
            .map_err(SyncError::from)?;
        for subscription in &subscriptions {
            repository.upsert_subscription(subscription).await?;
        }
        info!(count = subscriptions.len(), "Subscriptions loaded");

        let catalog = ProviderCatalog::azure()
            .map_err(|e| AppError::config(format!("Invalid type catalog: {}", e)))?;

        let reconciler = Reconciler::new(
            repository.clone(),
            Arc::new(source),
            Arc::new(StaticAuthenticator::new(settings.access_token.clone())),
            catalog,
        )
        .with_policy(settings.policy);

        Ok(Self {
            orchestrator: Orchestrator::new(reconciler, repository),
        })
    }
}
