use crate::dtos::SubscriptionDTO;
use boxoffice_domain::{EventSubscription, ID};
use serde::{Deserialize, Serialize};

pub mod subscribe {
    use super::*;

    #[derive(Deserialize)]
    pub struct PathParams {
        pub event_id: ID,
    }

    #[derive(Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub subscription: SubscriptionDTO,
    }

    impl APIResponse {
        pub fn new(subscription: EventSubscription) -> Self {
            Self {
                subscription: SubscriptionDTO::new(subscription),
            }
        }
    }
}
