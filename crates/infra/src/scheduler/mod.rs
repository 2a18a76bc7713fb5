use futures::future::BoxFuture;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

/// In-process one shot timers. Nothing is persisted, the `JobTask`s are the
/// durable record of what is armed here.
pub trait IScheduler: Send + Sync {
    /// Runs `task` once after `delay`. Returns false and drops `task` if a
    /// task with the same key is already armed.
    fn register_once(&self, key: &str, delay: Duration, task: BoxFuture<'static, ()>) -> bool;
    fn is_armed(&self, key: &str) -> bool;
}

/// Spawns one tokio task per timer
#[derive(Default)]
pub struct TokioScheduler {
    armed: Arc<Mutex<HashSet<String>>>,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

fn disarm(armed: &Mutex<HashSet<String>>, key: &str) {
    let mut armed = armed.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    armed.remove(key);
}

impl IScheduler for TokioScheduler {
    fn register_once(&self, key: &str, delay: Duration, task: BoxFuture<'static, ()>) -> bool {
        {
            let mut armed = self
                .armed
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if !armed.insert(key.to_string()) {
                return false;
            }
        }

        debug!("Arming timer {} to fire in {:?}", key, delay);
        let armed = self.armed.clone();
        let key = key.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            disarm(&armed, &key);
            task.await;
        });
        true
    }

    fn is_armed(&self, key: &str) -> bool {
        self.armed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(key)
    }
}
