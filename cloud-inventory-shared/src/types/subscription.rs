use serde::{Deserialize, Serialize};

/// A provider subscription: the scope a resource-group or resource sync runs against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub subscription_id: String,
    pub name: String,
    /// Directory (tenant) the subscription authenticates against.
    pub tenant: String,
    #[serde(default)]
    pub location: Option<String>,
    /// Owning company, copied onto every synced entity.
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}
