mod inmemory;
mod postgres;

use boxoffice_domain::{Event, EventStatus, ID};
pub use inmemory::InMemoryEventRepo;
pub(crate) use postgres::insert_event;
pub use postgres::PostgresEventRepo;

#[async_trait::async_trait]
pub trait IEventRepo: Send + Sync {
    async fn insert(&self, e: &Event) -> anyhow::Result<()>;
    async fn find(&self, event_id: &ID) -> Option<Event>;
    async fn find_by_statuses_starting_before(
        &self,
        statuses: &[EventStatus],
        before: i64,
    ) -> anyhow::Result<Vec<Event>>;
}

#[cfg(test)]
mod tests {
    use crate::setup_context;
    use boxoffice_domain::{Event, EventStatus, ID};

    #[tokio::test]
    async fn finds_events_that_started() {
        let ctx = setup_context().await.unwrap();
        let mut past = Event::new(ID::default(), "Past".into(), 100, "UTC".into(), 0);
        past.status = EventStatus::Notify;
        let mut future = Event::new(ID::default(), "Future".into(), 10_000, "UTC".into(), 0);
        future.status = EventStatus::Notify;
        let draft = Event::new(ID::default(), "Draft".into(), 100, "UTC".into(), 0);
        for e in [&past, &future, &draft] {
            ctx.repos.events.insert(e).await.unwrap();
        }

        let events = ctx
            .repos
            .events
            .find_by_statuses_starting_before(&[EventStatus::Notify, EventStatus::Open], 500)
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, past.id);
    }
}
