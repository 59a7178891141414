//! WebSocket Handler
//!
//! Live viewers: each socket subscribes to the notifications channel, keeps
//! its own bounded history and receives every relayed SMS as it arrives.

use axum::extract::ws::{Message, WebSocket};
use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use relay_common::{SmsEvent, CHANNEL_NAME};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{api::AppState, subscriber::Subscription, viewer::ViewerSession};

/// Client-to-server events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Ping for keepalive
    Ping,
    /// Ask for the most recent `limit` events (whole history if omitted)
    History {
        #[serde(default)]
        limit: Option<usize>,
    },
}

/// Server-to-client events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Subscription is live
    Ready { viewer_id: Uuid, capacity: usize },
    /// Pong response
    Pong,
    /// New SMS appended to this viewer's history
    SmsReceived {
        event: SmsEvent,
        /// Whether the oldest entry was dropped to make room
        evicted: bool,
        history_len: usize,
    },
    /// History snapshot, oldest first
    History { events: Vec<SmsEvent> },
    /// Error
    Error { code: String, message: String },
}

type WsSender = SplitSink<WebSocket, Message>;
type WsReceiver = SplitStream<WebSocket>;

/// Why a viewer session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    ViewerClosed,
    SocketError,
    TransportClosed,
}

/// WebSocket upgrade handler.
pub async fn handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle WebSocket connection.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let viewer_id = Uuid::now_v7();
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let mut subscription = match state.subscriber.subscribe(CHANNEL_NAME).await {
        Ok(subscription) => subscription,
        Err(e) => {
            error!(viewer = %viewer_id, "Viewer subscription failed: {}", e);
            let _ = send_event(
                &mut ws_sender,
                &ServerEvent::Error {
                    code: "subscribe_failed".to_string(),
                    message: e.to_string(),
                },
            )
            .await;
            let _ = ws_sender.close().await;
            return;
        }
    };

    info!(viewer = %viewer_id, "WebSocket connected");

    let mut session = ViewerSession::new(viewer_id);
    let end = run_session(&mut session, &mut subscription, &mut ws_sender, &mut ws_receiver).await;

    // Released on every exit path; dropping the subscription covers aborts.
    subscription.release().await;

    info!(
        viewer = %viewer_id,
        reason = ?end,
        history_len = session.history().len(),
        "WebSocket disconnected"
    );
}

/// Single loop per viewer: appends and sends happen one at a time, in
/// delivery order, never interleaved with another append.
async fn run_session(
    session: &mut ViewerSession,
    subscription: &mut Subscription,
    ws_sender: &mut WsSender,
    ws_receiver: &mut WsReceiver,
) -> SessionEnd {
    if send_event(ws_sender, &session.ready()).await.is_err() {
        return SessionEnd::SocketError;
    }

    loop {
        tokio::select! {
            event = subscription.next_event() => {
                let Some(event) = event else {
                    return SessionEnd::TransportClosed;
                };
                debug!(viewer = %session.id(), from = %event.from, "Delivering SMS to viewer");
                let frame = session.on_event(event);
                if send_event(ws_sender, &frame).await.is_err() {
                    return SessionEnd::SocketError;
                }
            }
            msg = ws_receiver.next() => {
                let reply = match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientEvent>(text.as_str()) {
                            Ok(request) => session.on_client_event(request),
                            Err(e) => ServerEvent::Error {
                                code: "invalid_message".to_string(),
                                message: e.to_string(),
                            },
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return SessionEnd::ViewerClosed,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        warn!(viewer = %session.id(), "WebSocket error: {}", e);
                        return SessionEnd::SocketError;
                    }
                };
                if send_event(ws_sender, &reply).await.is_err() {
                    return SessionEnd::SocketError;
                }
            }
        }
    }
}

async fn send_event(ws_sender: &mut WsSender, event: &ServerEvent) -> Result<(), axum::Error> {
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize event: {}", e);
            return Ok(());
        }
    };
    ws_sender.send(Message::Text(json.into())).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_events_parse() {
        assert!(matches!(
            serde_json::from_str::<ClientEvent>(r#"{"type":"ping"}"#).unwrap(),
            ClientEvent::Ping
        ));
        assert!(matches!(
            serde_json::from_str::<ClientEvent>(r#"{"type":"history","limit":20}"#).unwrap(),
            ClientEvent::History { limit: Some(20) }
        ));
        assert!(matches!(
            serde_json::from_str::<ClientEvent>(r#"{"type":"history"}"#).unwrap(),
            ClientEvent::History { limit: None }
        ));
    }

    #[test]
    fn sms_frame_is_tagged() {
        let frame = ServerEvent::SmsReceived {
            event: SmsEvent {
                message_id: None,
                from: "447911123456".into(),
                text: "Hello".into(),
                kind: "SMS".into(),
                timestamp: None,
            },
            evicted: false,
            history_len: 1,
        };

        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "sms_received");
        assert_eq!(json["event"]["from"], "447911123456");
        assert_eq!(json["history_len"], 1);
    }
}
