//! # Cloud Inventory Pipeline
//! This crate holds the reconciliation engine: it resolves remote types against the
//! local catalog, upserts entities, diffs their snapshots and records change events,
//! then prunes whatever the remote side no longer reports.
pub mod catalog;
pub mod config;
pub mod diff;
pub mod errors;
pub mod events;
pub mod reconciler;
pub mod resolver;
pub mod source;

pub use catalog::ProviderCatalog;
pub use config::SyncPolicy;
pub use errors::{RecordError, SourceError, SyncError};
pub use reconciler::Reconciler;
