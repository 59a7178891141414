//! API Router and Application State
//!
//! Central routing configuration and shared state.

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    broker::Broker, config::Config, publisher::EventPublisher, subscriber::ChannelSubscriber,
    webhook, ws,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Publishes ingested events
    pub publisher: EventPublisher,
    /// Opens per-viewer subscriptions
    pub subscriber: ChannelSubscriber,
    /// Server configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state on top of a broker.
    #[must_use]
    pub fn new(broker: Arc<dyn Broker>, config: Config) -> Self {
        Self {
            publisher: EventPublisher::new(broker.clone(), config.publish_timeout),
            subscriber: ChannelSubscriber::new(broker, config.viewer_queue_capacity),
            config: Arc::new(config),
        }
    }
}

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Gateway callbacks
        .merge(webhook::router())
        // Live viewers
        .route("/ws", get(ws::handler))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // State
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    /// Service status
    status: &'static str,
}

/// Health check endpoint.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
