//! Bounded message log consumed by presentation.

use std::collections::VecDeque;

use delve_core::{ConfigError, Message, MessageColor};

/// Ordered, bounded sequence of colored messages. The oldest entry is dropped on overflow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageLog {
    capacity: usize,
    entries: VecDeque<Message>,
}

impl MessageLog {
    /// Creates an empty log holding at most `capacity` messages.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::MessageCapacity);
        }
        Ok(Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        })
    }

    /// Appends a message, evicting the oldest one when full.
    pub fn push(&mut self, text: impl Into<String>, color: MessageColor) {
        if self.entries.len() == self.capacity {
            let _ = self.entries.pop_front();
        }
        self.entries.push_back(Message {
            text: text.into(),
            color,
        });
    }

    /// Messages from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter()
    }

    /// Most recent message, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.entries.back()
    }

    /// Number of stored messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether no message is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of stored messages.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops every stored message.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_is_rejected() {
        assert_eq!(MessageLog::new(0), Err(ConfigError::MessageCapacity));
    }

    #[test]
    fn oldest_message_is_dropped_on_overflow() {
        let mut log = MessageLog::new(2).expect("capacity");
        log.push("first", MessageColor::INFO);
        log.push("second", MessageColor::HIT);
        log.push("third", MessageColor::MISS);

        let texts: Vec<_> = log.iter().map(|message| message.text.as_str()).collect();
        assert_eq!(texts, ["second", "third"]);
        assert_eq!(log.last().map(|message| message.color), Some(MessageColor::MISS));
    }
}
