use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Provider;

/// A tag interned per provider.
///
/// One row exists per `(name, provider)`; its value is overwritten by the last sync
/// that saw the tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub provider: Provider,
    pub value: String,
}
