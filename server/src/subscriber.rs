//! Channel Subscriber
//!
//! Turns a broker subscription into an ordered stream of [`SmsEvent`]s.
//! Connection handling and reconnection stay with the broker; this layer
//! decodes envelopes and guarantees the subscription is released.

use std::sync::Arc;

use relay_common::{ChannelEnvelope, SmsEvent};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::broker::{Broker, RawSubscription, SubscriptionError};

/// Opens subscriptions on behalf of viewers.
#[derive(Clone)]
pub struct ChannelSubscriber {
    broker: Arc<dyn Broker>,
    queue_capacity: usize,
}

impl ChannelSubscriber {
    pub fn new(broker: Arc<dyn Broker>, queue_capacity: usize) -> Self {
        Self {
            broker,
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Subscribe to `channel` and pull events with [`Subscription::next_event`].
    pub async fn subscribe(&self, channel: &str) -> Result<Subscription, SubscriptionError> {
        let raw = self.broker.subscribe(channel, self.queue_capacity).await?;
        debug!(channel, "Subscribed");
        Ok(Subscription {
            channel: channel.to_string(),
            raw,
        })
    }

    /// Subscribe to `channel` and call `on_message` once per event, in
    /// delivery order, from a single task.
    pub async fn subscribe_with<F>(
        &self,
        channel: &str,
        mut on_message: F,
    ) -> Result<SubscriptionHandle, SubscriptionError>
    where
        F: FnMut(SmsEvent) + Send + 'static,
    {
        let mut subscription = self.subscribe(channel).await?;
        let cancel = CancellationToken::new();
        let stop = cancel.clone();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = stop.cancelled() => break,
                    event = subscription.next_event() => match event {
                        Some(event) => on_message(event),
                        None => break,
                    },
                }
            }
            subscription.release().await;
        });

        Ok(SubscriptionHandle { cancel, task })
    }
}

/// A live subscription yielding decoded events.
///
/// Dropping it releases the broker subscription; [`Subscription::release`]
/// does the same and waits for it to finish.
pub struct Subscription {
    channel: String,
    raw: RawSubscription,
}

impl Subscription {
    /// Next event in delivery order, or `None` when the transport closed.
    ///
    /// Payloads that are not `smsEvent` envelopes are logged and skipped.
    pub async fn next_event(&mut self) -> Option<SmsEvent> {
        loop {
            let payload = self.raw.recv().await?;
            match ChannelEnvelope::decode(&payload) {
                Ok(event) => return Some(event),
                Err(e) => warn!(channel = %self.channel, "Skipping pub/sub message: {}", e),
            }
        }
    }

    pub async fn release(self) {
        debug!(channel = %self.channel, "Releasing subscription");
        self.raw.release().await;
    }
}

/// Handle to a callback subscription started by
/// [`ChannelSubscriber::subscribe_with`]. Dropping it stops delivery.
pub struct SubscriptionHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    /// Stop delivery and wait until the broker subscription is released.
    pub async fn release(mut self) {
        self.cancel.cancel();
        if let Err(e) = (&mut self.task).await {
            warn!("Subscription task ended abnormally: {}", e);
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
