//! Static resource type catalogs supplied per provider.

use std::collections::BTreeMap;

use cloud_inventory_shared::Provider;
use serde_json::Value;

const AZURE_CATALOG: &str = include_str!("azure.json");

/// A read-only `name -> metadata` mapping of the types a provider can report.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderCatalog {
    provider: Provider,
    entries: BTreeMap<String, Value>,
}

impl ProviderCatalog {
    pub fn new(provider: Provider, entries: BTreeMap<String, Value>) -> Self {
        Self { provider, entries }
    }

    /// Parses a JSON object keyed by type name.
    pub fn from_json(provider: Provider, json: &str) -> Result<Self, serde_json::Error> {
        let entries = serde_json::from_str(json)?;
        Ok(Self::new(provider, entries))
    }

    /// The catalog of Azure Resource Manager types bundled with the crate.
    pub fn azure() -> Result<Self, serde_json::Error> {
        Self::from_json(Provider::Azure, AZURE_CATALOG)
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Type names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn metadata(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
