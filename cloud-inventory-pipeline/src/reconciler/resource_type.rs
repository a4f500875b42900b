use cloud_inventory_shared::SyncTally;
use tracing::{info, instrument};

use crate::errors::SyncError;
use crate::reconciler::Reconciler;

impl Reconciler {
    /// Upserts one catalog entry per type of the static provider catalog.
    ///
    /// Entries already present count as updated. Nothing is ever pruned here, since
    /// existing entities may still reference a type dropped from the catalog.
    #[instrument(skip(self), fields(provider = %self.provider()))]
    pub async fn sync_resource_types(&self) -> Result<SyncTally, SyncError> {
        let mut tally = SyncTally::default();

        for name in self.catalog.names() {
            let outcome = self
                .repository
                .upsert_resource_type(name, self.provider())
                .await?;
            if outcome.created {
                tally.created += 1;
            } else {
                tally.updated += 1;
            }
        }

        info!(
            errors = tally.errors,
            created = tally.created,
            updated = tally.updated,
            "sync - {} - ResourceType",
            self.provider()
        );
        Ok(tally)
    }
}
