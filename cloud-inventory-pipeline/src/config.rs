//! Run-level policy for the reconcilers.

/// Knobs that change what a reconciliation run records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncPolicy {
    /// Emit a CREATE event when an entity is first seen (or revived).
    pub emit_create_events: bool,
    /// When a resource group is pruned, also prune its live resources.
    pub cascade_group_deletes: bool,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            emit_create_events: true,
            cascade_group_deletes: false,
        }
    }
}
