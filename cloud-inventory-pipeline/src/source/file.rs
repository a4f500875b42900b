//! Inventory source backed by ARM list exports on disk.
//!
//! Layout under the root directory:
//!
//! ```text
//! subscriptions.json
//! <subscription_id>/resource_groups.json
//! <subscription_id>/resources.json
//! ```
//!
//! Each file holds a `{"value": [...]}` envelope.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cloud_inventory_shared::{ListEnvelope, RawRecord, Subscription};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::errors::SourceError;
use crate::source::{AccessToken, InventorySource, Session};

const SUBSCRIPTIONS_FILE: &str = "subscriptions.json";
const RESOURCE_GROUPS_FILE: &str = "resource_groups.json";
const RESOURCES_FILE: &str = "resources.json";

#[derive(Debug, Deserialize)]
struct SubscriptionEnvelope {
    #[serde(default)]
    value: Vec<Subscription>,
}

/// Lowercased resource id -> record, for one subscription's `resources.json`.
type DetailIndex = HashMap<String, RawRecord>;

#[derive(Debug)]
pub struct FileSnapshotSource {
    root: PathBuf,
    /// Keyed by lowercased subscription id; rebuilt on every resource listing.
    details: RwLock<HashMap<String, Arc<DetailIndex>>>,
}

impl FileSnapshotSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            details: RwLock::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Subscriptions declared in `subscriptions.json`; empty when the file is absent.
    pub async fn load_subscriptions(&self) -> Result<Vec<Subscription>, SourceError> {
        let path = self.root.join(SUBSCRIPTIONS_FILE);
        if !tokio::fs::try_exists(&path).await? {
            return Ok(Vec::new());
        }
        let bytes = tokio::fs::read(&path).await?;
        let envelope: SubscriptionEnvelope = serde_json::from_slice(&bytes)?;
        Ok(envelope.value)
    }

    async fn read_list(&self, directory: &Path, file: &str) -> Result<Vec<RawRecord>, SourceError> {
        let path = directory.join(file);
        debug!(path = %path.display(), "reading inventory export");
        let bytes = tokio::fs::read(&path).await?;
        let envelope: ListEnvelope = serde_json::from_slice(&bytes)?;
        Ok(envelope.value)
    }

    /// Export directory of a subscription, matching its name case-insensitively
    /// when the exact name is absent.
    async fn subscription_dir(&self, subscription_id: &str) -> Result<PathBuf, SourceError> {
        let exact = self.root.join(subscription_id);
        if tokio::fs::try_exists(&exact).await? {
            return Ok(exact);
        }

        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.eq_ignore_ascii_case(subscription_id))
            {
                return Ok(entry.path());
            }
        }
        Ok(exact)
    }

    async fn index_details(&self, subscription_id: &str, records: &[RawRecord]) -> Arc<DetailIndex> {
        let index: DetailIndex = records
            .iter()
            .map(|record| (record.normalized_id(), record.clone()))
            .collect();
        let index = Arc::new(index);
        self.details
            .write()
            .await
            .insert(subscription_id.to_lowercase(), index.clone());
        index
    }

    async fn detail_index(&self, subscription_id: &str) -> Result<Arc<DetailIndex>, SourceError> {
        if let Some(index) = self.details.read().await.get(&subscription_id.to_lowercase()) {
            return Ok(index.clone());
        }
        let directory = self.subscription_dir(subscription_id).await?;
        let records = self.read_list(&directory, RESOURCES_FILE).await?;
        Ok(self.index_details(subscription_id, &records).await)
    }
}

/// `/subscriptions/<id>/...` -> `<id>`
fn subscription_of(resource_id: &str) -> Option<&str> {
    let mut segments = resource_id.split('/');
    match (segments.next(), segments.next(), segments.next()) {
        (Some(""), Some(scope), Some(id)) if scope.eq_ignore_ascii_case("subscriptions") && !id.is_empty() => {
            Some(id)
        }
        _ => None,
    }
}

#[async_trait::async_trait]
impl InventorySource for FileSnapshotSource {
    async fn open_session(&self, token: &AccessToken) -> Result<Session, SourceError> {
        if !tokio::fs::try_exists(&self.root).await? {
            return Err(SourceError::session(format!(
                "snapshot directory {} does not exist",
                self.root.display()
            )));
        }
        Ok(Session::new(token.clone()))
    }

    async fn list_resource_groups(
        &self,
        subscription_id: &str,
        _session: &Session,
    ) -> Result<Vec<RawRecord>, SourceError> {
        let directory = self.subscription_dir(subscription_id).await?;
        self.read_list(&directory, RESOURCE_GROUPS_FILE).await
    }

    async fn list_resources(
        &self,
        subscription_id: &str,
        _session: &Session,
    ) -> Result<Vec<RawRecord>, SourceError> {
        let directory = self.subscription_dir(subscription_id).await?;
        let records = self.read_list(&directory, RESOURCES_FILE).await?;
        self.index_details(subscription_id, &records).await;
        Ok(records)
    }

    async fn get_resource_by_id(
        &self,
        resource_id: &str,
        _session: &Session,
    ) -> Result<RawRecord, SourceError> {
        let subscription_id = subscription_of(resource_id).ok_or_else(|| {
            SourceError::fetch(format!("cannot derive subscription from {}", resource_id))
        })?;

        self.detail_index(subscription_id)
            .await?
            .get(&resource_id.to_lowercase())
            .cloned()
            .ok_or_else(|| SourceError::fetch(format!("resource {} not found", resource_id)))
    }
}
