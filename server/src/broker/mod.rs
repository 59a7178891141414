//! Pub/Sub Broker
//!
//! Transport seam between the relay and the message broker. Connection
//! management and reconnection belong to the implementation; callers only see
//! publish and a single-consumer queue of raw payloads per subscription.

mod memory;
mod redis;

pub use memory::MemoryBroker;
pub use redis::RedisBroker;

use std::time::Duration;

use async_trait::async_trait;
use relay_common::EnvelopeError;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors from a publish attempt.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Broker connection could not be established or was lost.
    #[error("Broker unreachable: {0}")]
    Unreachable(String),

    /// Broker rejected the credentials.
    #[error("Broker rejected credentials: {0}")]
    Unauthorized(String),

    /// Publish did not complete in time.
    #[error("Publish timed out after {0:?}")]
    Timeout(Duration),

    /// Event could not be encoded.
    #[error("Failed to encode envelope: {0}")]
    Encode(#[from] EnvelopeError),
}

impl PublishError {
    /// Stable error code reported to webhook callers.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unreachable(_) => "broker_unreachable",
            Self::Unauthorized(_) => "broker_unauthorized",
            Self::Timeout(_) => "publish_timeout",
            Self::Encode(_) => "encode_failed",
        }
    }
}

/// Errors from establishing a subscription.
///
/// Failures after a subscription is live are the transport's to recover from
/// and never surface here.
#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("Broker unreachable: {0}")]
    Unreachable(String),

    #[error("Broker rejected credentials: {0}")]
    Unauthorized(String),
}

/// Releases the transport resources behind a subscription.
///
/// Implementations must also release on drop, so a session that ends without
/// calling [`SubscriptionGuard::release`] still unsubscribes.
#[async_trait]
pub trait SubscriptionGuard: Send {
    async fn release(self: Box<Self>);
}

/// A live subscription: raw payloads in transport order plus its release guard.
pub struct RawSubscription {
    payloads: mpsc::Receiver<String>,
    guard: Box<dyn SubscriptionGuard>,
}

impl RawSubscription {
    pub fn new(payloads: mpsc::Receiver<String>, guard: Box<dyn SubscriptionGuard>) -> Self {
        Self { payloads, guard }
    }

    /// Next payload, or `None` once the transport side has gone away.
    pub async fn recv(&mut self) -> Option<String> {
        self.payloads.recv().await
    }

    /// Stop delivery and release the transport subscription.
    pub async fn release(self) {
        let Self { mut payloads, guard } = self;
        payloads.close();
        guard.release().await;
    }
}

/// Message broker used by the publisher and by viewer subscriptions.
///
/// Implementations must be safe to call concurrently.
#[async_trait]
pub trait Broker: Send + Sync + 'static {
    /// Publish one payload to `channel` as a single operation.
    async fn publish(&self, channel: &str, payload: String) -> Result<(), PublishError>;

    /// Subscribe to `channel`, buffering up to `queue_capacity` undelivered payloads.
    async fn subscribe(
        &self,
        channel: &str,
        queue_capacity: usize,
    ) -> Result<RawSubscription, SubscriptionError>;
}
