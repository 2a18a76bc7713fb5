use super::{parse_receipt_handle, receipt_handle, IQueue, ReceivedMessage};
use crate::system::ISys;
use boxoffice_domain::ID;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;

struct StoredMessage {
    id: ID,
    body: String,
    visible_at: i64,
    receive_count: i32,
    receipt: Option<ID>,
}

/// Queue used when no database is configured and in tests. Messages are lost
/// when the process exits.
pub struct InMemoryQueue {
    sys: Arc<dyn ISys>,
    visibility_timeout: Duration,
    queues: Mutex<HashMap<String, Vec<StoredMessage>>>,
    subscriptions: Mutex<HashMap<String, Vec<String>>>,
    sent: Notify,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

const POLL_INTERVAL: Duration = Duration::from_millis(50);

impl InMemoryQueue {
    pub fn new(sys: Arc<dyn ISys>, visibility_timeout: Duration) -> Self {
        Self {
            sys,
            visibility_timeout,
            queues: Mutex::new(HashMap::new()),
            subscriptions: Mutex::new(HashMap::new()),
            sent: Notify::new(),
        }
    }

    fn claim(&self, queue: &str, max_messages: usize) -> Vec<ReceivedMessage> {
        let now = self.sys.get_timestamp_millis();
        let hidden_until = now + self.visibility_timeout.as_millis() as i64;
        let mut queues = lock(&self.queues);
        let messages = match queues.get_mut(queue) {
            Some(messages) => messages,
            None => return vec![],
        };

        messages
            .iter_mut()
            .filter(|m| m.visible_at <= now)
            .take(max_messages)
            .map(|m| {
                let receipt = ID::default();
                m.visible_at = hidden_until;
                m.receive_count += 1;
                m.receipt = Some(receipt.clone());
                ReceivedMessage {
                    id: m.id.clone(),
                    receipt_handle: receipt_handle(&m.id, &receipt),
                    body: m.body.clone(),
                    receive_count: m.receive_count,
                }
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl IQueue for InMemoryQueue {
    async fn send(&self, queue: &str, body: &str, delay: Duration) -> anyhow::Result<ID> {
        let id = ID::default();
        let visible_at = self.sys.get_timestamp_millis() + delay.as_millis() as i64;
        lock(&self.queues)
            .entry(queue.to_string())
            .or_default()
            .push(StoredMessage {
                id: id.clone(),
                body: body.to_string(),
                visible_at,
                receive_count: 0,
                receipt: None,
            });
        self.sent.notify_waiters();
        Ok(id)
    }

    async fn receive(
        &self,
        queue: &str,
        max_messages: usize,
        wait: Duration,
    ) -> anyhow::Result<Vec<ReceivedMessage>> {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            let messages = self.claim(queue, max_messages);
            let now = tokio::time::Instant::now();
            if !messages.is_empty() || now >= deadline {
                return Ok(messages);
            }
            let pause = std::cmp::min(deadline - now, POLL_INTERVAL);
            let _ = tokio::time::timeout(pause, self.sent.notified()).await;
        }
    }

    async fn delete(&self, queue: &str, receipt_handle: &str) -> anyhow::Result<bool> {
        let (message_id, receipt) = match parse_receipt_handle(receipt_handle) {
            Some(parsed) => parsed,
            None => anyhow::bail!("Malformed receipt handle: {}", receipt_handle),
        };
        let mut queues = lock(&self.queues);
        let messages = match queues.get_mut(queue) {
            Some(messages) => messages,
            None => return Ok(false),
        };
        let before = messages.len();
        messages.retain(|m| !(m.id == message_id && m.receipt.as_ref() == Some(&receipt)));
        Ok(messages.len() < before)
    }

    async fn subscribe(&self, topic: &str, queue: &str) -> anyhow::Result<()> {
        let mut subscriptions = lock(&self.subscriptions);
        let queues = subscriptions.entry(topic.to_string()).or_default();
        if !queues.iter().any(|q| q == queue) {
            queues.push(queue.to_string());
        }
        Ok(())
    }

    async fn publish(&self, topic: &str, body: &str) -> anyhow::Result<usize> {
        let queues = lock(&self.subscriptions)
            .get(topic)
            .cloned()
            .unwrap_or_default();
        for queue in &queues {
            self.send(queue, body, Duration::ZERO).await?;
        }
        Ok(queues.len())
    }
}
