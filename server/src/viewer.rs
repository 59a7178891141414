//! Viewer Session State
//!
//! Per-connection state for one live viewer: its history buffer and the
//! translation of inbound traffic into frames to send. Owned by exactly one
//! socket task, so updates are strictly sequential.

use relay_common::{HistoryBuffer, SmsEvent};
use uuid::Uuid;

use crate::ws::{ClientEvent, ServerEvent};

/// One connected viewer.
#[derive(Debug)]
pub struct ViewerSession {
    id: Uuid,
    history: HistoryBuffer,
}

impl ViewerSession {
    /// Fresh session with an empty history.
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            history: HistoryBuffer::new(),
        }
    }

    #[cfg(test)]
    fn with_history(id: Uuid, history: HistoryBuffer) -> Self {
        Self { id, history }
    }

    pub const fn id(&self) -> Uuid {
        self.id
    }

    pub const fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    /// Greeting sent once the subscription is live.
    pub fn ready(&self) -> ServerEvent {
        ServerEvent::Ready {
            viewer_id: self.id,
            capacity: self.history.capacity(),
        }
    }

    /// Append a delivered event. The returned frame reflects the updated buffer.
    pub fn on_event(&mut self, event: SmsEvent) -> ServerEvent {
        let appended = self.history.push(event.clone());
        ServerEvent::SmsReceived {
            event,
            evicted: appended.evicted.is_some(),
            history_len: appended.len,
        }
    }

    /// Answer a client request.
    pub fn on_client_event(&self, event: ClientEvent) -> ServerEvent {
        match event {
            ClientEvent::Ping => ServerEvent::Pong,
            ClientEvent::History { limit } => {
                let limit = limit.unwrap_or_else(|| self.history.capacity());
                ServerEvent::History {
                    events: self.history.latest(limit).cloned().collect(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(n: usize) -> SmsEvent {
        SmsEvent {
            message_id: Some(format!("m-{n}")),
            from: "447911123456".into(),
            text: format!("message {n}"),
            kind: "text".into(),
            timestamp: None,
        }
    }

    #[test]
    fn new_session_starts_empty() {
        let session = ViewerSession::new(Uuid::now_v7());
        assert!(session.history().is_empty());
        assert!(matches!(
            session.ready(),
            ServerEvent::Ready { capacity: 200, .. }
        ));
    }

    #[test]
    fn on_event_appends_before_emitting() {
        let mut session = ViewerSession::new(Uuid::now_v7());

        let frame = session.on_event(event(1));

        assert_eq!(session.history().newest(), Some(&event(1)));
        match frame {
            ServerEvent::SmsReceived {
                event: e,
                evicted,
                history_len,
            } => {
                assert_eq!(e, event(1));
                assert!(!evicted);
                assert_eq!(history_len, 1);
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn eviction_is_reported() {
        let mut session =
            ViewerSession::with_history(Uuid::now_v7(), HistoryBuffer::with_capacity(1));
        session.on_event(event(1));

        let frame = session.on_event(event(2));
        assert!(matches!(
            frame,
            ServerEvent::SmsReceived {
                evicted: true,
                history_len: 1,
                ..
            }
        ));
    }

    #[test]
    fn history_request_returns_latest_in_order() {
        let mut session = ViewerSession::new(Uuid::now_v7());
        for n in 0..5 {
            session.on_event(event(n));
        }

        match session.on_client_event(ClientEvent::History { limit: Some(2) }) {
            ServerEvent::History { events } => assert_eq!(events, vec![event(3), event(4)]),
            other => panic!("unexpected frame: {other:?}"),
        }
        match session.on_client_event(ClientEvent::History { limit: None }) {
            ServerEvent::History { events } => assert_eq!(events.len(), 5),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn ping_gets_pong() {
        let session = ViewerSession::new(Uuid::now_v7());
        assert!(matches!(
            session.on_client_event(ClientEvent::Ping),
            ServerEvent::Pong
        ));
    }
}
