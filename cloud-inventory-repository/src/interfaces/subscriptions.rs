use cloud_inventory_shared::Subscription;

use crate::RepositoryError;

#[async_trait::async_trait]
pub trait SubscriptionRepository: Send + Sync {
    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<Subscription>, RepositoryError>;

    /// Active subscriptions, ordered by id.
    async fn list_active_subscriptions(&self) -> Result<Vec<Subscription>, RepositoryError>;

    async fn upsert_subscription(&self, subscription: &Subscription)
    -> Result<(), RepositoryError>;
}
