use crate::shared::entity::{Entity, ID};
use crate::shared::status::Status;
use crate::status_strings;

/// A user's registration of interest in an `Event` that has not opened yet
#[derive(Debug, Clone, PartialEq)]
pub struct EventSubscription {
    pub id: ID,
    pub event_id: ID,
    pub user_id: ID,
    pub status: SubscriptionStatus,
    pub created: i64,
    pub updated: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionStatus {
    Notify,
    Active,
    Disabled,
}

impl Status for SubscriptionStatus {
    const ENTITY: &'static str = "subscription";

    fn next(&self) -> &'static [Self] {
        use SubscriptionStatus::*;
        match self {
            Notify => &[Active, Disabled],
            Active => &[Notify, Disabled],
            Disabled => &[Notify],
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Notify => "notify",
            Self::Active => "active",
            Self::Disabled => "disabled",
        }
    }
}

status_strings!(
    SubscriptionStatus,
    [
        SubscriptionStatus::Notify,
        SubscriptionStatus::Active,
        SubscriptionStatus::Disabled,
    ]
);

impl EventSubscription {
    pub fn new(event_id: ID, user_id: ID, now: i64) -> Self {
        Self {
            id: Default::default(),
            event_id,
            user_id,
            status: SubscriptionStatus::Notify,
            created: now,
            updated: now,
        }
    }
}

impl Entity for EventSubscription {
    fn id(&self) -> &ID {
        &self.id
    }
}
