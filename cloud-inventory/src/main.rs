//! Cloud Inventory Main Entry Point
//!
//! Syncs the type catalog, then the resource groups and resources of every
//! active subscription, and exits.

use std::env;

use cloud_inventory::{AppError, Dependencies};
use dotenv::dotenv;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("cloud_inventory=info,cloud_inventory_pipeline=info"));

    let json = env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .init();
    }

    info!(
        service_name = "cloud-inventory",
        service_version = env!("CARGO_PKG_VERSION"),
        json,
        "Tracing initialized"
    );
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenv().ok();
    init_tracing();

    let dependencies = match Dependencies::new().await {
        Ok(dependencies) => dependencies,
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    let report = dependencies.orchestrator.run().await?;
    info!(
        errors = report.resource_types.errors,
        created = report.resource_types.created,
        updated = report.resource_types.updated,
        "sync - ResourceType"
    );
    for subscription in &report.subscriptions {
        if let Some(error) = &subscription.error {
            warn!(subscription_id = %subscription.subscription_id, error = %error, "Subscription failed");
        }
    }

    Ok(())
}
