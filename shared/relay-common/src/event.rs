//! SMS Event Types

use std::fmt;

use serde::{Deserialize, Serialize};

/// Gateway-supplied message timestamp.
///
/// Kept as the gateway sent it: a canonical decimal integer becomes
/// [`Timestamp::Millis`] and serializes as a JSON number, anything else stays
/// [`Timestamp::Text`] verbatim. The value is never checked for plausibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    /// Epoch milliseconds.
    Millis(i64),
    /// ISO-8601 or any other textual form.
    Text(String),
}

impl Timestamp {
    /// Interpret a raw query value without altering it.
    ///
    /// Only strings that print back identically as integers are treated as
    /// numbers, so `"007"` or `"+5"` stay textual.
    pub fn from_raw(raw: &str) -> Self {
        match raw.parse::<i64>() {
            Ok(millis) if millis.to_string() == raw => Self::Millis(millis),
            _ => Self::Text(raw.to_string()),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Millis(millis) => write!(f, "{millis}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Canonical inbound SMS notification.
///
/// Built once by webhook ingestion and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsEvent {
    /// Gateway message id. Not unique as far as the relay is concerned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Sender number (`msisdn`), not reformatted.
    pub from: String,
    /// Message body, possibly empty.
    #[serde(default)]
    pub text: String,
    /// Gateway classification, possibly empty.
    #[serde(default, rename = "type")]
    pub kind: String,
    /// Gateway `message-timestamp`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
}
