//! Bounded in-memory record of human-readable events for the UI.

#[cfg(test)]
mod tests;

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, PoisonError},
};

/// Number of entries the UI shows at once.
pub const UI_LOG_LINES: usize = 12;

/// A cheaply cloneable ring of the most recent log messages.
///
/// Every message is also emitted as a `tracing` event, so the ring never
/// needs to be the only place an error is visible.
#[derive(Clone, Debug)]
pub struct LogRing {
    entries: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl LogRing {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Record a message, evicting the oldest entry once full.
    pub fn push(&self, message: impl Into<String>) {
        // A panic while holding the lock cannot leave the deque half-written
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(message.into());
    }

    pub fn info(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{message}");
        self.push(message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{message}");
        self.push(message);
    }

    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{message}");
        self.push(message);
    }

    /// The `n` most recent messages, newest first.
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<String> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        entries.iter().rev().take(n).cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
