use std::fmt;

use serde::{Deserialize, Serialize};

/// Summary returned by every reconciliation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncTally {
    pub errors: u64,
    pub created: u64,
    pub updated: u64,
    pub deleted: u64,
}

impl SyncTally {
    pub fn new(errors: u64, created: u64, updated: u64, deleted: u64) -> Self {
        Self {
            errors,
            created,
            updated,
            deleted,
        }
    }

    /// Number of records that changed local state.
    pub fn changes(&self) -> u64 {
        self.created + self.updated + self.deleted
    }
}

impl fmt::Display for SyncTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "errors[{}] - created[{}] - updated[{}] - deleted[{}]",
            self.errors, self.created, self.updated, self.deleted
        )
    }
}
