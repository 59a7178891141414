//! Viewer History Buffer
//!
//! Bounded, arrival-ordered history of received events. One buffer belongs to
//! exactly one viewer session and is dropped with it.

use std::collections::vec_deque::{self, VecDeque};

use crate::event::SmsEvent;

/// Default number of events a viewer keeps.
pub const HISTORY_CAPACITY: usize = 200;

/// Result of a [`HistoryBuffer::push`].
///
/// Lets the render layer react to "a new item was appended".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appended {
    /// Oldest event dropped to make room, if the buffer was full.
    pub evicted: Option<SmsEvent>,
    /// Buffer length after the append.
    pub len: usize,
}

/// Append-only ring of the newest events, oldest evicted first.
///
/// Events are kept in arrival order, never sorted by timestamp and never
/// deduplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryBuffer {
    events: VecDeque<SmsEvent>,
    capacity: usize,
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryBuffer {
    /// Empty buffer holding up to [`HISTORY_CAPACITY`] events.
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    /// Empty buffer with a custom bound. A zero capacity is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an event, evicting the oldest one when full.
    pub fn push(&mut self, event: SmsEvent) -> Appended {
        let evicted = if self.events.len() == self.capacity {
            self.events.pop_front()
        } else {
            None
        };
        self.events.push_back(event);

        Appended {
            evicted,
            len: self.events.len(),
        }
    }

    /// Consuming append: the last `capacity - 1` events followed by `event`.
    #[must_use]
    pub fn appended(mut self, event: SmsEvent) -> Self {
        self.push(event);
        self
    }

    /// The newest `k` events (fewer if the buffer is shorter), oldest first.
    pub fn latest(&self, k: usize) -> impl DoubleEndedIterator<Item = &SmsEvent> + '_ {
        let skip = self.events.len().saturating_sub(k);
        self.events.iter().skip(skip)
    }

    /// All events, oldest first.
    pub fn iter(&self) -> vec_deque::Iter<'_, SmsEvent> {
        self.events.iter()
    }

    /// Most recently appended event.
    pub fn newest(&self) -> Option<&SmsEvent> {
        self.events.back()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<'a> IntoIterator for &'a HistoryBuffer {
    type Item = &'a SmsEvent;
    type IntoIter = vec_deque::Iter<'a, SmsEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
