//! Webhook HTTP Handler
//!
//! Ingest, publish, then answer the gateway exactly once with the real outcome.

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use relay_common::SmsEvent;
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use super::ingest::{ingest, ValidationError};
use crate::api::AppState;
use crate::broker::PublishError;

/// Final result of one webhook call. Converted into the whole response at once.
#[derive(Debug)]
pub enum WebhookOutcome {
    /// Event built and published.
    Accepted(SmsEvent),
    /// Not a valid inbound SMS; nothing was published.
    Rejected(ValidationError),
    /// Event built but the publish attempt failed.
    PublishFailed(PublishError),
}

/// Success body: `{ success: true, messageId, from, text, type, timestamp }`.
#[derive(Debug, Serialize)]
pub struct AcceptedBody {
    pub success: bool,
    #[serde(flatten)]
    pub event: SmsEvent,
}

/// Failure body for publish errors.
#[derive(Debug, Serialize)]
pub struct FailureBody {
    pub success: bool,
    pub error: &'static str,
}

impl IntoResponse for WebhookOutcome {
    fn into_response(self) -> Response {
        match self {
            Self::Accepted(event) => (
                StatusCode::OK,
                Json(AcceptedBody {
                    success: true,
                    event,
                }),
            )
                .into_response(),
            Self::Rejected(_) => StatusCode::BAD_REQUEST.into_response(),
            Self::PublishFailed(err) => {
                let status = match err {
                    PublishError::Unreachable(_) | PublishError::Timeout(_) => {
                        StatusCode::SERVICE_UNAVAILABLE
                    }
                    PublishError::Unauthorized(_) | PublishError::Encode(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (
                    status,
                    Json(FailureBody {
                        success: false,
                        error: err.code(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

/// GET|POST `/api/acceptWebhook`
#[instrument(skip_all)]
pub async fn accept_webhook(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> WebhookOutcome {
    let event = match ingest(&params) {
        Ok(event) => event,
        Err(e) => {
            warn!("This is not a valid inbound SMS message: {}", e);
            return WebhookOutcome::Rejected(e);
        }
    };

    match state.publisher.publish(&event).await {
        Ok(()) => {
            info!(
                from = %event.from,
                message_id = event.message_id.as_deref().unwrap_or(""),
                "Inbound SMS relayed"
            );
            WebhookOutcome::Accepted(event)
        }
        Err(e) => {
            error!(from = %event.from, code = e.code(), "Failed to publish SMS event: {}", e);
            WebhookOutcome::PublishFailed(e)
        }
    }
}
