use std::collections::VecDeque;

use chrono::{DateTime, Utc};

/// First console line after startup and after every `help` reset.
pub const CONSOLE_BANNER: &str = "KAS Explorer.";

/// One console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleEntry {
    pub at: DateTime<Utc>,
    pub text: String,
}

/// Bounded FIFO of console messages. Empty messages are ignored and the
/// oldest entry is evicted once `capacity` is exceeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLog {
    entries: VecDeque<ConsoleEntry>,
    capacity: usize,
}

impl ConsoleLog {
    /// A log holding only the banner. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let mut log = Self {
            entries: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
        };
        log.reset();
        log
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append `text` unless it is empty. Returns whether it was appended.
    pub fn push(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        self.entries.push_back(ConsoleEntry {
            at: Utc::now(),
            text: text.to_string(),
        });
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        true
    }

    /// Drop everything and start again from the banner.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.push(CONSOLE_BANNER);
    }

    /// Entries oldest first.
    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &ConsoleEntry> + '_ {
        self.entries.iter()
    }

    /// Message texts oldest first.
    pub fn messages(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.text.as_str()).collect()
    }

    /// Entries newest first, the order both skins display them in.
    pub fn newest_first(&self) -> impl Iterator<Item = &ConsoleEntry> + '_ {
        self.entries.iter().rev()
    }
}
