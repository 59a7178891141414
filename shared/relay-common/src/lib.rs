//! SMS Relay Common Library
//!
//! Shared types used by the relay server and by any viewer client: the
//! canonical SMS event, the pub/sub envelope and the bounded history buffer.
//! Nothing in here performs I/O.

pub mod error;
pub mod event;
pub mod history;
pub mod protocol;

pub use error::EnvelopeError;
pub use event::{SmsEvent, Timestamp};
pub use history::{Appended, HistoryBuffer, HISTORY_CAPACITY};
pub use protocol::{ChannelEnvelope, CHANNEL_NAME, EVENT_NAME};
