//! Event Publisher
//!
//! Pushes canonical events onto the fixed notifications channel.

use std::sync::Arc;
use std::time::Duration;

use relay_common::{ChannelEnvelope, SmsEvent, CHANNEL_NAME};
use tracing::{debug, instrument};

use crate::broker::{Broker, PublishError};

/// Publishes SMS events to [`CHANNEL_NAME`].
///
/// Exactly one publish attempt per call, bounded by `timeout`. No retries.
#[derive(Clone)]
pub struct EventPublisher {
    broker: Arc<dyn Broker>,
    timeout: Duration,
}

impl EventPublisher {
    pub fn new(broker: Arc<dyn Broker>, timeout: Duration) -> Self {
        Self { broker, timeout }
    }

    #[instrument(skip_all, fields(from = %event.from))]
    pub async fn publish(&self, event: &SmsEvent) -> Result<(), PublishError> {
        let payload = ChannelEnvelope::sms(event.clone()).encode()?;

        tokio::time::timeout(self.timeout, self.broker.publish(CHANNEL_NAME, payload))
            .await
            .map_err(|_| PublishError::Timeout(self.timeout))??;

        debug!(channel = CHANNEL_NAME, "SMS event published");
        Ok(())
    }
}
