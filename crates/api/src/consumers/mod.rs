mod handlers;

use boxoffice_domain::{dead_letter_queue, Topic};
use boxoffice_infra::{BoxofficeContext, IQueue, ReceivedMessage};
use futures::Future;
use handlers::handle_message;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Semaphore};
use tracing::{error, info, warn};

/// Consumers of every queue. Dropping or shutting down the pool stops
/// receiving new messages. Messages being handled are left to finish.
pub struct ConsumerPool {
    shutdown: watch::Sender<bool>,
}

impl ConsumerPool {
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}

/// Starts one consumer for the queue of every `Topic`
pub fn start_consumers(ctx: BoxofficeContext) -> ConsumerPool {
    let (shutdown, shutdown_rx) = watch::channel(false);
    for topic in Topic::ALL {
        spawn_consumer(
            topic.queue_name(),
            ctx.clone(),
            shutdown_rx.clone(),
            move |body, ctx| handle_message(topic, body, ctx),
        );
    }
    ConsumerPool { shutdown }
}

/// Long polls `queue` and feeds the messages through a bounded channel to a
/// dispatcher that runs `handler` on up to `concurrency` messages at a time.
///
/// A message is deleted when its handler succeeds and left for redelivery
/// when it fails. Messages whose handler panicked, or that were received more
/// than `max_receive_count` times, are moved to the dead letter queue.
pub fn spawn_consumer<F, Fut>(
    queue: &'static str,
    ctx: BoxofficeContext,
    mut shutdown: watch::Receiver<bool>,
    handler: F,
) where
    F: Fn(String, BoxofficeContext) -> Fut + 'static,
    Fut: Future<Output = anyhow::Result<()>> + 'static,
{
    let config = ctx.config.queue.clone();
    let (intake, mut messages) = mpsc::channel::<ReceivedMessage>(config.intake_capacity);

    let receiver = ctx.queue.clone();
    actix_web::rt::spawn(async move {
        info!(queue, "Consumer started");
        let wait = Duration::from_secs(config.wait_secs);
        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = shutdown.changed() => break,
                received = receiver.receive(queue, config.max_messages, wait) => match received {
                    Ok(received) => {
                        for message in received {
                            if intake.send(message).await.is_err() {
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        error!(queue, "Unable to receive messages: {:?}", e);
                        actix_web::rt::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        }
        info!(queue, "Consumer stopped");
    });

    actix_web::rt::spawn(async move {
        let permits = Arc::new(Semaphore::new(config.concurrency));
        while let Some(message) = messages.recv().await {
            if message.receive_count > config.max_receive_count {
                warn!(
                    queue,
                    message_id = %message.id,
                    "Message was received {} times", message.receive_count
                );
                dead_letter(ctx.queue.clone(), queue, message).await;
                continue;
            }

            let permit = match permits.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let handle = actix_web::rt::spawn(handler(message.body.clone(), ctx.clone()));
            let queue_client = ctx.queue.clone();
            actix_web::rt::spawn(async move {
                let outcome = handle.await;
                drop(permit);
                match outcome {
                    Ok(Ok(())) => {
                        if let Err(e) = queue_client.delete(queue, &message.receipt_handle).await {
                            error!(queue, message_id = %message.id, "Unable to delete message: {:?}", e);
                        }
                    }
                    Ok(Err(e)) => {
                        warn!(
                            queue,
                            message_id = %message.id,
                            "Message handler failed, leaving it for redelivery: {:?}", e
                        );
                    }
                    Err(e) => {
                        error!(queue, message_id = %message.id, "Message handler panicked: {:?}", e);
                        dead_letter(queue_client, queue, message).await;
                    }
                }
            });
        }
    });
}

async fn dead_letter(client: Arc<dyn IQueue>, queue: &str, message: ReceivedMessage) {
    let dead_letters = dead_letter_queue(queue);
    if let Err(e) = client.send(&dead_letters, &message.body, Duration::ZERO).await {
        error!(queue, message_id = %message.id, "Unable to dead letter message: {:?}", e);
        return;
    }
    if let Err(e) = client.delete(queue, &message.receipt_handle).await {
        error!(queue, message_id = %message.id, "Unable to delete dead lettered message: {:?}", e);
    }
}
