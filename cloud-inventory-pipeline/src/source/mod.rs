//! Interfaces to the remote provider: authentication, session and inventory listing.
//!
//! The reconcilers only talk to these traits. `FileSnapshotSource` reads ARM-style
//! list exports from disk and `StaticAuthenticator` hands out a configured token.
mod auth;
mod file;

pub use auth::StaticAuthenticator;
pub use file::FileSnapshotSource;

use std::fmt;

use chrono::{DateTime, Utc};
use cloud_inventory_shared::{RawRecord, Subscription};

use crate::errors::SourceError;

/// Bearer token for the provider API.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// An authenticated session against the provider.
#[derive(Debug, Clone)]
pub struct Session {
    token: AccessToken,
    opened_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: AccessToken) -> Self {
        Self {
            token,
            opened_at: Utc::now(),
        }
    }

    pub fn token(&self) -> &AccessToken {
        &self.token
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }
}

/// Acquires access tokens for a subscription.
#[async_trait::async_trait]
pub trait Authenticator: Send + Sync {
    async fn access_token(&self, subscription: &Subscription) -> Result<AccessToken, SourceError>;
}

/// Remote inventory producer.
#[async_trait::async_trait]
pub trait InventorySource: Send + Sync {
    async fn open_session(&self, token: &AccessToken) -> Result<Session, SourceError>;

    async fn list_resource_groups(
        &self,
        subscription_id: &str,
        session: &Session,
    ) -> Result<Vec<RawRecord>, SourceError>;

    /// Summary form of every resource in the subscription.
    async fn list_resources(
        &self,
        subscription_id: &str,
        session: &Session,
    ) -> Result<Vec<RawRecord>, SourceError>;

    /// Detailed record for one resource.
    async fn get_resource_by_id(
        &self,
        resource_id: &str,
        session: &Session,
    ) -> Result<RawRecord, SourceError>;
}
