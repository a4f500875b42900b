//! Shared fixtures for the reconciler integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use cloud_inventory_pipeline::source::{AccessToken, Authenticator, InventorySource, Session};
use cloud_inventory_pipeline::{ProviderCatalog, Reconciler, SourceError, SyncPolicy};
use cloud_inventory_repository::{MemoryRepository, SubscriptionRepository, TypeCatalogRepository};
use cloud_inventory_shared::{Provider, RawRecord, Subscription};
use serde_json::{Value, json};

pub const SUBSCRIPTION: &str = "00000000-0000-0000-0000-000000000000";
pub const OTHER_SUBSCRIPTION: &str = "99999999-9999-9999-9999-999999999999";
pub const GROUP_TYPE: &str = "Microsoft.Resources/resourceGroups";
pub const STORAGE_TYPE: &str = "Microsoft.Storage/storageAccounts";
pub const SITE_TYPE: &str = "Microsoft.Web/sites";

// Mock inventory source for testing
pub struct MockSource {
    groups: Mutex<HashMap<String, Vec<RawRecord>>>,
    resources: Mutex<HashMap<String, Vec<RawRecord>>>,
    details: Mutex<HashMap<String, RawRecord>>,
    failing_details: Mutex<HashSet<String>>,
    fail_listing: Mutex<bool>,
    detail_calls: Mutex<usize>,
}

impl MockSource {
    pub fn new() -> Self {
        Self {
            groups: Mutex::new(HashMap::new()),
            resources: Mutex::new(HashMap::new()),
            details: Mutex::new(HashMap::new()),
            failing_details: Mutex::new(HashSet::new()),
            fail_listing: Mutex::new(false),
            detail_calls: Mutex::new(0),
        }
    }

    pub fn set_groups(&self, subscription_id: &str, groups: Vec<RawRecord>) {
        self.groups
            .lock()
            .unwrap()
            .insert(subscription_id.to_string(), groups);
    }

    pub fn set_resources(&self, subscription_id: &str, resources: Vec<RawRecord>) {
        self.resources
            .lock()
            .unwrap()
            .insert(subscription_id.to_string(), resources);
    }

    /// Overrides the detail record returned for one resource.
    pub fn set_detail(&self, detail: RawRecord) {
        self.details
            .lock()
            .unwrap()
            .insert(detail.id.to_lowercase(), detail);
    }

    pub fn fail_detail(&self, resource_id: &str) {
        self.failing_details
            .lock()
            .unwrap()
            .insert(resource_id.to_lowercase());
    }

    pub fn fail_listing(&self) {
        *self.fail_listing.lock().unwrap() = true;
    }

    pub fn detail_calls(&self) -> usize {
        *self.detail_calls.lock().unwrap()
    }

    fn check_listing(&self) -> Result<(), SourceError> {
        if *self.fail_listing.lock().unwrap() {
            Err(SourceError::fetch("Mock listing error"))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl InventorySource for MockSource {
    async fn open_session(&self, token: &AccessToken) -> Result<Session, SourceError> {
        Ok(Session::new(token.clone()))
    }

    async fn list_resource_groups(
        &self,
        subscription_id: &str,
        _session: &Session,
    ) -> Result<Vec<RawRecord>, SourceError> {
        self.check_listing()?;
        Ok(self
            .groups
            .lock()
            .unwrap()
            .get(subscription_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_resources(
        &self,
        subscription_id: &str,
        _session: &Session,
    ) -> Result<Vec<RawRecord>, SourceError> {
        self.check_listing()?;
        Ok(self
            .resources
            .lock()
            .unwrap()
            .get(subscription_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_resource_by_id(
        &self,
        resource_id: &str,
        _session: &Session,
    ) -> Result<RawRecord, SourceError> {
        *self.detail_calls.lock().unwrap() += 1;

        let key = resource_id.to_lowercase();
        if self.failing_details.lock().unwrap().contains(&key) {
            return Err(SourceError::fetch("Mock detail error"));
        }
        if let Some(detail) = self.details.lock().unwrap().get(&key) {
            return Ok(detail.clone());
        }
        self.resources
            .lock()
            .unwrap()
            .values()
            .flatten()
            .find(|record| record.id.to_lowercase() == key)
            .cloned()
            .ok_or_else(|| SourceError::fetch(format!("resource {} not found", resource_id)))
    }
}

// Mock authenticator for testing
pub struct MockAuthenticator {
    should_fail: bool,
}

impl MockAuthenticator {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn failing() -> Self {
        Self { should_fail: true }
    }
}

#[async_trait::async_trait]
impl Authenticator for MockAuthenticator {
    async fn access_token(&self, _subscription: &Subscription) -> Result<AccessToken, SourceError> {
        if self.should_fail {
            Err(SourceError::authentication("Mock authentication error"))
        } else {
            Ok(AccessToken::new("test-token"))
        }
    }
}

pub struct Harness {
    pub repository: Arc<MemoryRepository>,
    pub source: Arc<MockSource>,
    pub reconciler: Reconciler,
}

pub fn test_catalog() -> ProviderCatalog {
    let entries = [GROUP_TYPE, STORAGE_TYPE, SITE_TYPE]
        .into_iter()
        .map(|name| (name.to_string(), json!({})))
        .collect();
    ProviderCatalog::new(Provider::Azure, entries)
}

pub fn subscription(id: &str, active: bool) -> Subscription {
    Subscription {
        subscription_id: id.to_string(),
        name: "sub1".to_string(),
        tenant: "00000000-0000-0000-0000-000000000000".to_string(),
        location: Some("francecentral".to_string()),
        company: Some("acme".to_string()),
        active,
    }
}

pub async fn harness_with(policy: SyncPolicy, authenticator: MockAuthenticator) -> Harness {
    let repository = Arc::new(MemoryRepository::new());
    let source = Arc::new(MockSource::new());

    repository
        .upsert_subscription(&subscription(SUBSCRIPTION, true))
        .await
        .unwrap();
    repository
        .upsert_subscription(&subscription(OTHER_SUBSCRIPTION, true))
        .await
        .unwrap();
    for name in test_catalog().names() {
        repository
            .upsert_resource_type(name, Provider::Azure)
            .await
            .unwrap();
    }

    let reconciler = Reconciler::new(
        repository.clone(),
        source.clone(),
        Arc::new(authenticator),
        test_catalog(),
    )
    .with_policy(policy);

    Harness {
        repository,
        source,
        reconciler,
    }
}

pub async fn harness() -> Harness {
    harness_with(SyncPolicy::default(), MockAuthenticator::new()).await
}

pub fn group_id(subscription_id: &str, name: &str) -> String {
    format!("/subscriptions/{}/resourceGroups/{}", subscription_id, name)
}

pub fn make_group(subscription_id: &str, name: &str) -> RawRecord {
    serde_json::from_value(json!({
        "id": group_id(subscription_id, name),
        "name": name,
        "type": GROUP_TYPE,
        "location": "francecentral",
        "properties": {"provisioningState": "Succeeded"},
        "tags": {"env": "prod"}
    }))
    .unwrap()
}

pub fn make_resource(subscription_id: &str, group: &str, name: &str, resource_type: &str) -> RawRecord {
    let provider_path = resource_type.split('|').next().unwrap_or(resource_type);
    serde_json::from_value(json!({
        "id": format!("{}/providers/{}/{}", group_id(subscription_id, group), provider_path, name),
        "name": name,
        "type": resource_type,
        "location": "francecentral",
        "properties": {"provisioningState": "Succeeded"},
        "tags": {}
    }))
    .unwrap()
}

pub fn with_field(record: RawRecord, field: &str, value: Value) -> RawRecord {
    let mut json = serde_json::to_value(record).unwrap();
    json[field] = value;
    serde_json::from_value(json).unwrap()
}
