mod inmemory;
mod postgres;

use boxoffice_domain::ID;
pub use inmemory::InMemoryQueue;
pub use postgres::PostgresQueue;
use std::time::Duration;

/// A message handed out by `IQueue::receive`. It stays hidden from other
/// receivers until the visibility timeout passes or it is deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedMessage {
    pub id: ID,
    /// Proof of this particular receive. Needed to delete the message.
    pub receipt_handle: String,
    pub body: String,
    /// How many times the message has been received, this one included
    pub receive_count: i32,
}

/// Durable point to point queues with topic fan out
#[async_trait::async_trait]
pub trait IQueue: Send + Sync {
    /// Enqueues `body`. It becomes visible to receivers after `delay`.
    async fn send(&self, queue: &str, body: &str, delay: Duration) -> anyhow::Result<ID>;
    /// Long polls for up to `max_messages` visible messages. Returns as soon as
    /// there is at least one or when `wait` has elapsed.
    async fn receive(
        &self,
        queue: &str,
        max_messages: usize,
        wait: Duration,
    ) -> anyhow::Result<Vec<ReceivedMessage>>;
    /// Returns false if the receipt is no longer valid, e.g. because the
    /// message was redelivered to another receiver meanwhile
    async fn delete(&self, queue: &str, receipt_handle: &str) -> anyhow::Result<bool>;
    /// Every message published to `topic` from now on is delivered to `queue`
    async fn subscribe(&self, topic: &str, queue: &str) -> anyhow::Result<()>;
    /// Sends `body` to every queue subscribed to `topic` and returns how many there were
    async fn publish(&self, topic: &str, body: &str) -> anyhow::Result<usize>;
}

fn receipt_handle(message_id: &ID, receipt: &ID) -> String {
    format!("{}:{}", message_id, receipt)
}

fn parse_receipt_handle(handle: &str) -> Option<(ID, ID)> {
    let (message_id, receipt) = handle.split_once(':')?;
    Some((message_id.parse().ok()?, receipt.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::RealSys;
    use std::sync::Arc;

    fn queue() -> InMemoryQueue {
        InMemoryQueue::new(Arc::new(RealSys {}), Duration::from_millis(200))
    }

    #[tokio::test]
    async fn receives_and_deletes() {
        let q = queue();
        q.send("jobs", "hello", Duration::ZERO).await.unwrap();

        let msgs = q.receive("jobs", 10, Duration::from_millis(50)).await.unwrap();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].body, "hello");
        assert_eq!(msgs[0].receive_count, 1);
        // In flight
        assert!(q
            .receive("jobs", 10, Duration::from_millis(10))
            .await
            .unwrap()
            .is_empty());

        assert!(q.delete("jobs", &msgs[0].receipt_handle).await.unwrap());
        assert!(!q.delete("jobs", &msgs[0].receipt_handle).await.unwrap());
    }

    #[tokio::test]
    async fn redelivers_after_visibility_timeout() {
        let q = queue();
        q.send("jobs", "again", Duration::ZERO).await.unwrap();
        let first = q.receive("jobs", 1, Duration::ZERO).await.unwrap();

        tokio::time::sleep(Duration::from_millis(250)).await;
        let second = q.receive("jobs", 1, Duration::from_millis(50)).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id, first[0].id);
        assert_eq!(second[0].receive_count, 2);
        // The first receipt went stale with the redelivery
        assert!(!q.delete("jobs", &first[0].receipt_handle).await.unwrap());
        assert!(q.delete("jobs", &second[0].receipt_handle).await.unwrap());
    }

    #[tokio::test]
    async fn delayed_messages_wait_for_their_delay() {
        let q = queue();
        q.send("jobs", "later", Duration::from_millis(100)).await.unwrap();
        assert!(q.receive("jobs", 1, Duration::ZERO).await.unwrap().is_empty());
        let msgs = q.receive("jobs", 1, Duration::from_secs(2)).await.unwrap();
        assert_eq!(msgs.len(), 1);
    }

    #[tokio::test]
    async fn publish_fans_out_to_subscribed_queues() {
        let q = queue();
        q.subscribe("events-open", "events-open").await.unwrap();
        q.subscribe("events-open", "audit").await.unwrap();
        q.subscribe("events-open", "audit").await.unwrap();

        assert_eq!(q.publish("events-open", "{}").await.unwrap(), 2);
        assert_eq!(q.publish("nobody-listens", "{}").await.unwrap(), 0);
        for name in ["events-open", "audit"] {
            let msgs = q.receive(name, 10, Duration::ZERO).await.unwrap();
            assert_eq!(msgs.len(), 1);
        }
    }

    #[test]
    fn parses_receipt_handles() {
        let (m, r) = (ID::default(), ID::default());
        assert_eq!(parse_receipt_handle(&receipt_handle(&m, &r)), Some((m, r)));
        assert_eq!(parse_receipt_handle("garbage"), None);
    }
}
