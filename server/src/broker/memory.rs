//! In-process broker backed by tokio broadcast channels.

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{Broker, PublishError, RawSubscription, SubscriptionError, SubscriptionGuard};

const BROADCAST_CAPACITY: usize = 256;

/// Fan-out broker living inside the process. Used by tests and local runs.
pub struct MemoryBroker {
    channels: DashMap<String, broadcast::Sender<String>>,
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Number of live subscriptions on `channel`.
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.channels
            .get(channel)
            .map_or(0, |tx| tx.receiver_count())
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    async fn publish(&self, channel: &str, payload: String) -> Result<(), PublishError> {
        let receivers = self
            .channels
            .get(channel)
            .and_then(|tx| tx.send(payload).ok())
            .unwrap_or(0);
        debug!(channel, receivers, "Published to memory channel");
        Ok(())
    }

    async fn subscribe(
        &self,
        channel: &str,
        queue_capacity: usize,
    ) -> Result<RawSubscription, SubscriptionError> {
        let mut rx = self
            .channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(BROADCAST_CAPACITY).0)
            .subscribe();

        let (tx, payloads) = mpsc::channel(queue_capacity);
        let channel_name = channel.to_string();
        let forward = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(payload) => {
                        if tx.send(payload).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(channel = %channel_name, skipped, "Memory subscriber lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Ok(RawSubscription::new(
            payloads,
            Box::new(ForwarderGuard {
                forward: Some(forward),
            }),
        ))
    }
}

/// Stops the forwarding task, which drops the broadcast receiver.
struct ForwarderGuard {
    forward: Option<JoinHandle<()>>,
}

#[async_trait]
impl SubscriptionGuard for ForwarderGuard {
    async fn release(self: Box<Self>) {
        let mut guard = self;
        if let Some(forward) = guard.forward.take() {
            forward.abort();
            let _ = forward.await;
        }
    }
}

impl Drop for ForwarderGuard {
    fn drop(&mut self) {
        if let Some(forward) = &self.forward {
            forward.abort();
        }
    }
}
