//! Reusable test helpers for HTTP and WebSocket integration tests.
//!
//! Provides `TestApp` for sending requests through the full axum router on top
//! of an in-process [`MemoryBroker`], plus brokers that fail on purpose.
//!
//! ## Test Servers
//!
//! Use [`spawn_test_server()`] when a real socket is needed (WebSocket
//! viewers) instead of `tower::ServiceExt::oneshot`.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sms_relay_server::api::{create_router, AppState};
use sms_relay_server::broker::{
    Broker, MemoryBroker, PublishError, RawSubscription, SubscriptionError,
};
use sms_relay_server::config::Config;
use tokio::task::JoinHandle;
use tower::ServiceExt;

// ============================================================================
// Test App
// ============================================================================

/// A test application wrapping the full axum router.
pub struct TestApp {
    pub router: Router,
    pub broker: Arc<MemoryBroker>,
    pub config: Config,
}

impl TestApp {
    /// Create a new test app on a fresh memory broker.
    pub fn new() -> Self {
        let broker = Arc::new(MemoryBroker::new());
        let config = Config::default_for_test();
        let router = create_router(AppState::new(broker.clone(), config.clone()));

        Self {
            router,
            broker,
            config,
        }
    }

    /// Router wired to an arbitrary broker.
    pub fn router_with(broker: Arc<dyn Broker>, config: Config) -> Router {
        create_router(AppState::new(broker, config))
    }

    /// Send a request through the router via `tower::ServiceExt::oneshot`.
    pub async fn oneshot(&self, request: Request<Body>) -> (StatusCode, Bytes) {
        send(&self.router, request).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Bytes) {
        self.oneshot(request(Method::GET, uri)).await
    }
}

/// Build an empty-bodied request.
pub fn request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("valid request")
}

/// Send a request through any router and collect the body.
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Bytes) {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("oneshot request failed");
    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    (status, body)
}

/// Webhook query string for the standard inbound example.
pub fn valid_webhook_uri() -> String {
    "/api/acceptWebhook?to=15550001111&msisdn=447911123456&messageId=0A0000001234\
     &text=Hello&type=SMS&message-timestamp=1700000000000"
        .to_string()
}

// ============================================================================
// Failing brokers
// ============================================================================

/// Broker whose publishes always fail with the configured error.
pub struct FailingBroker {
    make_error: fn() -> PublishError,
}

impl FailingBroker {
    pub fn unreachable() -> Self {
        Self {
            make_error: || PublishError::Unreachable("connection refused".into()),
        }
    }

    pub fn unauthorized() -> Self {
        Self {
            make_error: || PublishError::Unauthorized("WRONGPASS invalid password".into()),
        }
    }
}

#[async_trait]
impl Broker for FailingBroker {
    async fn publish(&self, _channel: &str, _payload: String) -> Result<(), PublishError> {
        Err((self.make_error)())
    }

    async fn subscribe(
        &self,
        _channel: &str,
        _queue_capacity: usize,
    ) -> Result<RawSubscription, SubscriptionError> {
        Err(SubscriptionError::Unreachable("connection refused".into()))
    }
}

/// Broker whose publishes never complete.
pub struct StalledBroker;

#[async_trait]
impl Broker for StalledBroker {
    async fn publish(&self, _channel: &str, _payload: String) -> Result<(), PublishError> {
        std::future::pending().await
    }

    async fn subscribe(
        &self,
        _channel: &str,
        _queue_capacity: usize,
    ) -> Result<RawSubscription, SubscriptionError> {
        Err(SubscriptionError::Unreachable("stalled".into()))
    }
}

/// Config with a short publish timeout.
pub fn fast_timeout_config() -> Config {
    Config {
        publish_timeout: Duration::from_millis(50),
        ..Config::default_for_test()
    }
}

// ============================================================================
// Test Server
// ============================================================================

/// A running test server bound to a random port.
pub struct TestServer {
    /// Server address (127.0.0.1:PORT).
    pub addr: SocketAddr,
    /// Base URL for HTTP requests (e.g., `http://127.0.0.1:12345`).
    pub url: String,
    /// WebSocket URL for viewers.
    pub ws_url: String,
    /// Handle to the server task for cleanup.
    handle: JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawn a real HTTP server on a random port.
pub async fn spawn_test_server(router: Router) -> TestServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().expect("Failed to get local addr");

    let handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("Test server failed");
    });

    TestServer {
        addr,
        url: format!("http://{addr}"),
        ws_url: format!("ws://{addr}/ws"),
        handle,
    }
}

/// Wait until `check` holds, polling for up to two seconds.
pub async fn eventually(mut check: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not met in time");
}
