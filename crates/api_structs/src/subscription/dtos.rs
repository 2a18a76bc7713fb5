use boxoffice_domain::{EventSubscription, SubscriptionStatus, ID};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDTO {
    pub id: ID,
    pub event_id: ID,
    pub user_id: ID,
    pub status: SubscriptionStatus,
    pub created: i64,
}

impl SubscriptionDTO {
    pub fn new(subscription: EventSubscription) -> Self {
        Self {
            id: subscription.id,
            event_id: subscription.event_id,
            user_id: subscription.user_id,
            status: subscription.status,
            created: subscription.created,
        }
    }
}
