use super::ISubscriptionRepo;
use crate::repos::shared::inmemory_repo::*;
use boxoffice_domain::{EventSubscription, ID};
use std::sync::Mutex;

pub struct InMemorySubscriptionRepo {
    pub(crate) subscriptions: Mutex<Vec<EventSubscription>>,
}

impl InMemorySubscriptionRepo {
    pub fn new() -> Self {
        Self {
            subscriptions: Mutex::new(vec![]),
        }
    }
}

#[async_trait::async_trait]
impl ISubscriptionRepo for InMemorySubscriptionRepo {
    async fn insert(&self, subscription: &EventSubscription) -> anyhow::Result<()> {
        let mut subscriptions = lock(&self.subscriptions);
        if subscriptions
            .iter()
            .any(|s| s.event_id == subscription.event_id && s.user_id == subscription.user_id)
        {
            anyhow::bail!(
                "User {} is already subscribed to event {}",
                subscription.user_id,
                subscription.event_id
            );
        }
        subscriptions.push(subscription.clone());
        Ok(())
    }

    async fn find_by_event_and_user(
        &self,
        event_id: &ID,
        user_id: &ID,
    ) -> Option<EventSubscription> {
        find_by(&self.subscriptions, |s| {
            s.event_id == *event_id && s.user_id == *user_id
        })
        .into_iter()
        .next()
    }

    async fn find_by_event(&self, event_id: &ID) -> anyhow::Result<Vec<EventSubscription>> {
        Ok(find_by(&self.subscriptions, |s| s.event_id == *event_id))
    }
}
