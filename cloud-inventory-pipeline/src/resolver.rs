//! Maps a remote record's declared type onto the local type catalog.

use cloud_inventory_repository::{RepositoryError, TypeCatalogRepository};
use cloud_inventory_shared::{Provider, ResourceType};

/// Splits a composite `"A|B"` type into its base type and optional suffix.
///
/// Only the first pipe separates; an empty suffix counts as absent.
pub fn split_composite_type(declared: &str) -> (&str, Option<&str>) {
    match declared.split_once('|') {
        Some((base, suffix)) => (base, Some(suffix).filter(|suffix| !suffix.is_empty())),
        None => (declared, None),
    }
}

/// Resolves declared type strings for one provider.
pub struct TypeResolver<'a, R: ?Sized> {
    catalog: &'a R,
    provider: Provider,
}

impl<'a, R> TypeResolver<'a, R>
where
    R: TypeCatalogRepository + ?Sized,
{
    pub fn new(catalog: &'a R, provider: Provider) -> Self {
        Self { catalog, provider }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Case-insensitive exact lookup of the base type, scoped to the provider.
    ///
    /// `Ok(None)` means the type is unknown. That is a per-record problem for the
    /// caller, while `Err` is a storage failure.
    pub async fn resolve(&self, declared: &str) -> Result<Option<ResourceType>, RepositoryError> {
        let (base, _) = split_composite_type(declared);
        self.catalog.find_resource_type(base, self.provider).await
    }
}
