//! Error types for the reconciliation pipeline.
//!
//! `RecordError` covers a single bad record and never leaves a run. `SyncError`
//! aborts the run it is raised from.
mod record;
mod source;
mod sync;

pub use record::RecordError;
pub use source::SourceError;
pub use sync::SyncError;
