mod inmemory;
mod postgres;

use boxoffice_domain::{EventSubscription, ID};
pub use inmemory::InMemorySubscriptionRepo;
pub use postgres::PostgresSubscriptionRepo;

#[async_trait::async_trait]
pub trait ISubscriptionRepo: Send + Sync {
    /// Fails if the user already is subscribed to the `Event`
    async fn insert(&self, subscription: &EventSubscription) -> anyhow::Result<()>;
    async fn find_by_event_and_user(
        &self,
        event_id: &ID,
        user_id: &ID,
    ) -> Option<EventSubscription>;
    async fn find_by_event(&self, event_id: &ID) -> anyhow::Result<Vec<EventSubscription>>;
}
