//! Redis pub/sub broker.

use anyhow::Result;
use async_trait::async_trait;
use fred::clients::SubscriberClient;
use fred::prelude::*;
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use super::{Broker, PublishError, RawSubscription, SubscriptionError, SubscriptionGuard};

/// Broker backed by Redis `PUBLISH`/`SUBSCRIBE`.
///
/// Publishing shares one client across requests. Every subscription gets its
/// own subscriber connection, which re-subscribes by itself after reconnects.
#[derive(Clone)]
pub struct RedisBroker {
    config: Config,
    publisher: Client,
}

impl RedisBroker {
    /// Connect the shared publishing client.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let config = Config::from_url(redis_url)?;
        let publisher = Client::new(config.clone(), None, None, Some(reconnect_policy()));
        publisher.connect();
        publisher.wait_for_connect().await?;

        info!("Connected to Redis");
        Ok(Self { config, publisher })
    }
}

fn reconnect_policy() -> ReconnectPolicy {
    // Unlimited attempts, 100ms doubling up to 30s.
    ReconnectPolicy::new_exponential(0, 100, 30_000, 2)
}

fn is_auth_failure(err: &Error) -> bool {
    matches!(err.kind(), ErrorKind::Auth)
        || err.details().contains("NOAUTH")
        || err.details().contains("WRONGPASS")
}

impl From<Error> for PublishError {
    fn from(err: Error) -> Self {
        if is_auth_failure(&err) {
            Self::Unauthorized(err.to_string())
        } else {
            Self::Unreachable(err.to_string())
        }
    }
}

impl From<Error> for SubscriptionError {
    fn from(err: Error) -> Self {
        if is_auth_failure(&err) {
            Self::Unauthorized(err.to_string())
        } else {
            Self::Unreachable(err.to_string())
        }
    }
}

#[async_trait]
impl Broker for RedisBroker {
    async fn publish(&self, channel: &str, payload: String) -> Result<(), PublishError> {
        let receivers: i64 = self.publisher.publish(channel, payload).await?;
        debug!(channel, receivers, "Published to Redis channel");
        Ok(())
    }

    async fn subscribe(
        &self,
        channel: &str,
        queue_capacity: usize,
    ) -> Result<RawSubscription, SubscriptionError> {
        let subscriber = Builder::from_config(self.config.clone())
            .set_policy(reconnect_policy())
            .build_subscriber_client()?;
        subscriber.init().await?;

        let resubscribe = subscriber.manage_subscriptions().abort_handle();
        let mut messages = subscriber.message_rx();

        if let Err(e) = subscriber.subscribe(channel).await {
            resubscribe.abort();
            let _ = subscriber.quit().await;
            return Err(e.into());
        }

        let (tx, payloads) = mpsc::channel(queue_capacity);
        let channel_name = channel.to_string();
        let forward = tokio::spawn(async move {
            loop {
                match messages.recv().await {
                    Ok(message) => {
                        if message.channel.to_string() != channel_name {
                            continue;
                        }
                        let Some(payload) = message.value.into_string() else {
                            warn!(channel = %channel_name, "Dropping non-text pub/sub payload");
                            continue;
                        };
                        if tx.send(payload).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(channel = %channel_name, skipped, "Redis subscriber lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
        .abort_handle();

        debug!(channel, "Redis subscription established");
        Ok(RawSubscription::new(
            payloads,
            Box::new(RedisSubscription {
                subscriber: Some(subscriber),
                channel: channel.to_string(),
                tasks: [forward, resubscribe],
            }),
        ))
    }
}

/// Owns the subscriber connection for one subscription.
struct RedisSubscription {
    subscriber: Option<SubscriberClient>,
    channel: String,
    tasks: [AbortHandle; 2],
}

impl RedisSubscription {
    fn abort_tasks(&self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[async_trait]
impl SubscriptionGuard for RedisSubscription {
    async fn release(self: Box<Self>) {
        let mut this = self;
        this.abort_tasks();
        if let Some(subscriber) = this.subscriber.take() {
            if let Err(e) = subscriber.unsubscribe(this.channel.as_str()).await {
                debug!(channel = %this.channel, "Unsubscribe failed: {}", e);
            }
            let _ = subscriber.quit().await;
            debug!(channel = %this.channel, "Redis subscription released");
        }
    }
}

impl Drop for RedisSubscription {
    fn drop(&mut self) {
        self.abort_tasks();
        let Some(subscriber) = self.subscriber.take() else {
            return;
        };
        // Dropped without release(): close the connection in the background.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                let _ = subscriber.quit().await;
            });
        }
    }
}
