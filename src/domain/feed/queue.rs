//! Holding queue for updates to tokens whose metadata has not fully arrived

use std::time::Instant;
use crate::shared::types::TokenUpdateMessage;

/// A token update waiting for the next flush
#[derive(Debug, Clone)]
pub struct QueuedMessage {
    pub message: TokenUpdateMessage,
    pub enqueued_at: Instant,
}

/// FIFO buffer flushed wholesale on every timer tick
#[derive(Debug, Default)]
pub struct MessageQueue {
    pending: Vec<QueuedMessage>,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `message` should wait for the next flush instead of routing now.
    ///
    /// `new` messages always route immediately. An update is routed directly
    /// once a queued message for the same mint carries an image and the
    /// incoming one does too.
    pub fn should_enqueue(&self, message: &TokenUpdateMessage) -> bool {
        if message.kind.is_new() {
            return false;
        }

        let converged = message.has_image()
            && self
                .pending
                .iter()
                .any(|queued| queued.message.mint == message.mint && queued.message.has_image());
        !converged
    }

    pub fn push(&mut self, message: TokenUpdateMessage, now: Instant) {
        self.pending.push(QueuedMessage {
            message,
            enqueued_at: now,
        });
    }

    /// Takes everything queued so far in insertion order, leaving the queue empty
    pub fn take_snapshot(&mut self) -> Vec<QueuedMessage> {
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Age of the oldest pending message
    pub fn oldest_age(&self, now: Instant) -> Option<std::time::Duration> {
        self.pending
            .first()
            .map(|queued| now.saturating_duration_since(queued.enqueued_at))
    }
}
