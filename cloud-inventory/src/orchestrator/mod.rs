//! One-shot sync over every active subscription.
//!
//! The type catalog is synced first. Each subscription then runs its resource
//! group sync followed by its resource sync, since resources resolve their parent
//! group from local state. A failed group run skips that subscription's resources.

use std::sync::Arc;

use cloud_inventory_pipeline::Reconciler;
use cloud_inventory_repository::{InventoryRepository, SubscriptionRepository};
use cloud_inventory_shared::SyncTally;
use tracing::{error, info, instrument};

use crate::AppError;

/// Outcome of one subscription within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionReport {
    pub subscription_id: String,
    pub resource_groups: Option<SyncTally>,
    pub resources: Option<SyncTally>,
    /// Message of the error that aborted one of the runs.
    pub error: Option<String>,
}

impl SubscriptionReport {
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Outcome of a full run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub resource_types: SyncTally,
    pub subscriptions: Vec<SubscriptionReport>,
}

impl RunReport {
    pub fn failed_subscriptions(&self) -> usize {
        self.subscriptions.iter().filter(|report| report.failed()).count()
    }
}

/// Sequences the reconcilers for a full inventory sync.
pub struct Orchestrator {
    reconciler: Reconciler,
    repository: Arc<dyn InventoryRepository>,
}

impl Orchestrator {
    pub fn new(reconciler: Reconciler, repository: Arc<dyn InventoryRepository>) -> Self {
        Self {
            reconciler,
            repository,
        }
    }

    /// Runs the catalog sync, then group and resource syncs per active subscription.
    ///
    /// A failing catalog sync or subscription listing aborts the whole run; a
    /// failing subscription is reported and the run moves on.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<RunReport, AppError> {
        let resource_types = self.reconciler.sync_resource_types().await?;

        let subscriptions = self.repository.list_active_subscriptions().await?;
        info!(count = subscriptions.len(), "Syncing active subscriptions");

        let mut reports = Vec::with_capacity(subscriptions.len());
        for subscription in subscriptions {
            reports.push(self.sync_subscription(subscription.subscription_id).await);
        }

        let report = RunReport {
            resource_types,
            subscriptions: reports,
        };
        info!(
            subscriptions = report.subscriptions.len(),
            failed = report.failed_subscriptions(),
            "Inventory sync finished"
        );
        Ok(report)
    }

    async fn sync_subscription(&self, subscription_id: String) -> SubscriptionReport {
        let mut report = SubscriptionReport {
            subscription_id,
            resource_groups: None,
            resources: None,
            error: None,
        };

        match self
            .reconciler
            .sync_resource_groups(&report.subscription_id)
            .await
        {
            Ok(tally) => report.resource_groups = Some(tally),
            Err(e) => {
                error!(
                    subscription_id = %report.subscription_id,
                    error = %e,
                    "Resource group sync failed, skipping resources"
                );
                report.error = Some(e.to_string());
                return report;
            }
        }

        match self.reconciler.sync_resources(&report.subscription_id).await {
            Ok(tally) => report.resources = Some(tally),
            Err(e) => {
                error!(
                    subscription_id = %report.subscription_id,
                    error = %e,
                    "Resource sync failed"
                );
                report.error = Some(e.to_string());
            }
        }

        report
    }
}
