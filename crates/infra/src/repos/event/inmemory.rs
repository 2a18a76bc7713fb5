use super::IEventRepo;
use crate::repos::shared::inmemory_repo::*;
use boxoffice_domain::{Event, EventStatus, ID};
use std::sync::Mutex;

pub struct InMemoryEventRepo {
    pub(crate) events: Mutex<Vec<Event>>,
}

impl InMemoryEventRepo {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(vec![]),
        }
    }
}

#[async_trait::async_trait]
impl IEventRepo for InMemoryEventRepo {
    async fn insert(&self, e: &Event) -> anyhow::Result<()> {
        insert(e, &self.events);
        Ok(())
    }

    async fn find(&self, event_id: &ID) -> Option<Event> {
        find(event_id, &self.events)
    }

    async fn find_by_statuses_starting_before(
        &self,
        statuses: &[EventStatus],
        before: i64,
    ) -> anyhow::Result<Vec<Event>> {
        Ok(find_by(&self.events, |e| {
            statuses.contains(&e.status) && e.date_time < before
        }))
    }
}
