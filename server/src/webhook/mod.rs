//! Inbound SMS Webhooks
//!
//! Gateway delivery callbacks: validation, normalization and the HTTP handler.

pub mod handlers;
pub mod ingest;

use axum::{routing::get, Router};

use crate::api::AppState;

pub use handlers::{accept_webhook, WebhookOutcome};
pub use ingest::{ingest, ValidationError};

/// Webhook routes. Gateways may be configured for either GET or POST.
///
/// Both methods read parameters from the query string only; a POST that
/// carries them in a form or JSON body is rejected as missing fields.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/acceptWebhook", get(accept_webhook).post(accept_webhook))
        .route("/webhooks/sms", get(accept_webhook).post(accept_webhook))
}
