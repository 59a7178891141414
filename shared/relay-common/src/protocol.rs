//! Pub/Sub Channel Protocol
//!
//! Every message on the broker is a JSON envelope `{ "name", "data" }` where
//! `data` is always the structured [`SmsEvent`].

use serde::{Deserialize, Serialize};

use crate::error::EnvelopeError;
use crate::event::SmsEvent;

/// Channel every relay instance publishes to and every viewer subscribes to.
pub const CHANNEL_NAME: &str = "sms-notifications";

/// Envelope name attached to SMS events.
pub const EVENT_NAME: &str = "smsEvent";

/// Message envelope carried over the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelEnvelope {
    pub name: String,
    pub data: SmsEvent,
}

impl ChannelEnvelope {
    /// Wrap an event with the fixed event name.
    pub fn sms(event: SmsEvent) -> Self {
        Self {
            name: EVENT_NAME.to_string(),
            data: event,
        }
    }

    /// Serialize to the broker payload.
    pub fn encode(&self) -> Result<String, EnvelopeError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a broker payload, accepting only `smsEvent` envelopes.
    pub fn decode(payload: &str) -> Result<SmsEvent, EnvelopeError> {
        let envelope: Self = serde_json::from_str(payload)?;
        if envelope.name != EVENT_NAME {
            return Err(EnvelopeError::UnexpectedName(envelope.name));
        }
        Ok(envelope.data)
    }
}
