//! Serialized entity snapshots as stored in the event log.

use serde::Serialize;
use serde_json::Value;

/// Bookkeeping fields dropped from every snapshot before it is compared or logged.
pub const VOLATILE_FIELDS: &[&str] = &["created_at", "updated_at"];

/// Full serialized form of an entity, minus [`VOLATILE_FIELDS`].
///
/// `serde_json` keeps object keys sorted, so two snapshots of the same state serialize
/// to identical bytes.
pub trait Snapshot: Serialize {
    fn snapshot(&self) -> Result<Value, serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            for field in VOLATILE_FIELDS {
                map.remove(*field);
            }
        }
        Ok(value)
    }
}
