//! # Cloud Inventory
//!
//! Binary-side wiring for the inventory sync.
//!
//! ## Modules
//!
//! - [`config`]: Environment settings and dependency initialization
//! - [`orchestrator`]: Runs the type catalog, group and resource syncs in order
//! - [`errors`]: Error types for the application

pub mod config;
pub mod errors;
pub mod orchestrator;

pub use config::{Dependencies, Settings, StoreSource};
pub use errors::AppError;
pub use orchestrator::{Orchestrator, RunReport, SubscriptionReport};
