use cloud_inventory_shared::Subscription;

use crate::errors::SourceError;
use crate::source::{AccessToken, Authenticator};

/// Hands out the same configured token for every subscription.
///
/// Without a configured token an anonymous one is issued, which is enough for
/// sources that do not check credentials.
#[derive(Debug, Clone)]
pub struct StaticAuthenticator {
    token: Option<String>,
}

impl StaticAuthenticator {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }

    pub fn anonymous() -> Self {
        Self { token: None }
    }
}

#[async_trait::async_trait]
impl Authenticator for StaticAuthenticator {
    async fn access_token(&self, subscription: &Subscription) -> Result<AccessToken, SourceError> {
        match self.token.as_deref() {
            None => Ok(AccessToken::new("anonymous")),
            Some(token) if token.trim().is_empty() => Err(SourceError::authentication(format!(
                "empty access token configured for subscription {}",
                subscription.subscription_id
            ))),
            Some(token) => Ok(AccessToken::new(token)),
        }
    }
}
