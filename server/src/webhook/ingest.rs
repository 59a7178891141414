//! Webhook Ingestion
//!
//! Validates raw gateway callback parameters and builds the canonical event.

use std::collections::HashMap;

use relay_common::{SmsEvent, Timestamp};
use thiserror::Error;

/// Destination number parameter.
pub const PARAM_TO: &str = "to";
/// Sender number parameter.
pub const PARAM_MSISDN: &str = "msisdn";
pub const PARAM_MESSAGE_ID: &str = "messageId";
pub const PARAM_TEXT: &str = "text";
pub const PARAM_TYPE: &str = "type";
pub const PARAM_TIMESTAMP: &str = "message-timestamp";

/// Rejection of an inbound callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required parameter is absent or empty.
    #[error("Missing required parameter: {0}")]
    MissingField(&'static str),
}

fn required<'a>(
    params: &'a HashMap<String, String>,
    name: &'static str,
) -> Result<&'a str, ValidationError> {
    params
        .get(name)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .ok_or(ValidationError::MissingField(name))
}

/// Build an [`SmsEvent`] from raw callback parameters.
///
/// Only `to` and `msisdn` are checked. Every other value is copied through
/// untouched; absent `text`/`type` become empty strings.
pub fn ingest(params: &HashMap<String, String>) -> Result<SmsEvent, ValidationError> {
    required(params, PARAM_TO)?;
    let from = required(params, PARAM_MSISDN)?;

    let field = |name: &str| params.get(name).cloned().unwrap_or_default();

    Ok(SmsEvent {
        message_id: params.get(PARAM_MESSAGE_ID).cloned(),
        from: from.to_string(),
        text: field(PARAM_TEXT),
        kind: field(PARAM_TYPE),
        timestamp: params
            .get(PARAM_TIMESTAMP)
            .map(|raw| Timestamp::from_raw(raw)),
    })
}
