//! Integration tests for type catalog reconciliation.

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;

use cloud_inventory_pipeline::{ProviderCatalog, Reconciler};
use cloud_inventory_repository::{MemoryRepository, TypeCatalogRepository};
use cloud_inventory_shared::{Provider, SyncTally};
use common::{MockAuthenticator, MockSource};
use serde_json::json;

fn reconciler(repository: Arc<MemoryRepository>, catalog: ProviderCatalog) -> Reconciler {
    Reconciler::new(
        repository,
        Arc::new(MockSource::new()),
        Arc::new(MockAuthenticator::new()),
        catalog,
    )
}

#[tokio::test]
async fn test_catalog_sync_creates_then_updates() {
    let repository = Arc::new(MemoryRepository::new());
    let catalog = ProviderCatalog::azure().unwrap();
    let count = catalog.len() as u64;
    let reconciler = reconciler(repository.clone(), catalog);

    let tally = reconciler.sync_resource_types().await.unwrap();
    assert_eq!(tally, SyncTally::new(0, count, 0, 0));
    assert_eq!(
        repository.list_resource_types(Provider::Azure).await.unwrap().len() as u64,
        count
    );

    let tally = reconciler.sync_resource_types().await.unwrap();
    assert_eq!(tally, SyncTally::new(0, 0, count, 0));
}

#[tokio::test]
async fn test_catalog_entries_are_never_pruned() {
    let repository = Arc::new(MemoryRepository::new());
    reconciler(repository.clone(), ProviderCatalog::azure().unwrap())
        .sync_resource_types()
        .await
        .unwrap();
    let before = repository.list_resource_types(Provider::Azure).await.unwrap().len();

    let shrunk = ProviderCatalog::new(
        Provider::Azure,
        BTreeMap::from([("Microsoft.Web/sites".to_string(), json!({}))]),
    );
    let tally = reconciler(repository.clone(), shrunk)
        .sync_resource_types()
        .await
        .unwrap();

    assert_eq!(tally, SyncTally::new(0, 0, 1, 0));
    assert_eq!(
        repository.list_resource_types(Provider::Azure).await.unwrap().len(),
        before
    );
}
