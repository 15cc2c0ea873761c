//! Pause-aware dispatch of classified updates into the live lists

use std::collections::VecDeque;
use tracing::debug;
use crate::shared::errors::StoreError;
use crate::shared::types::{Category, TokenUpdateMessage};

/// Owner of the canonical live lists, one per category
pub trait ListStore {
    fn contains(&self, category: Category, mint: &str) -> bool;

    /// Update in place when the mint is present, insert otherwise
    fn upsert(&mut self, category: Category, message: TokenUpdateMessage) -> Result<(), StoreError>;

    /// Signals a minimal re-render of the category's list
    fn bump_changed_count(&mut self, category: Category);
}

/// Hover and tutorial flags, read synchronously at dispatch time
pub trait PauseState {
    fn is_hovered(&self, category: Category) -> bool;
    fn is_tutorial_active(&self, category: Category) -> bool;

    fn is_paused(&self, category: Category) -> bool {
        self.is_hovered(category) || self.is_tutorial_active(category)
    }
}

/// Where a dispatched message ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Applied,
    Paused,
}

/// Per-category newest-first side buffers for tokens held back while paused
#[derive(Debug, Default)]
pub struct PausedBuffers {
    buffers: [VecDeque<TokenUpdateMessage>; 3],
}

impl PausedBuffers {
    pub fn push_front(&mut self, category: Category, message: TokenUpdateMessage) {
        self.buffers[category.index()].push_front(message);
    }

    pub fn head(&self, category: Category) -> Option<&TokenUpdateMessage> {
        self.buffers[category.index()].front()
    }

    pub fn len(&self, category: Category) -> usize {
        self.buffers[category.index()].len()
    }

    pub fn is_empty(&self, category: Category) -> bool {
        self.buffers[category.index()].is_empty()
    }

    /// Empties the category's buffer, newest first
    pub fn drain(&mut self, category: Category) -> Vec<TokenUpdateMessage> {
        self.buffers[category.index()].drain(..).collect()
    }

    pub fn clear(&mut self) {
        for buffer in &mut self.buffers {
            buffer.clear();
        }
    }
}

/// Routes classified updates either into the live list or a paused buffer
#[derive(Debug, Default)]
pub struct PauseAwareDispatcher {
    paused: PausedBuffers,
}

impl PauseAwareDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Known mints are always updated in place; unknown mints wait in the
    /// paused buffer while the category is hovered or under a tutorial.
    pub fn dispatch<S, P>(
        &mut self,
        category: Category,
        message: TokenUpdateMessage,
        store: &mut S,
        pause: &P,
    ) -> Result<DispatchOutcome, StoreError>
    where
        S: ListStore + ?Sized,
        P: PauseState + ?Sized,
    {
        if pause.is_paused(category) && !store.contains(category, &message.mint) {
            debug!(mint = %message.mint, %category, "List paused, holding new token");
            self.paused.push_front(category, message);
            return Ok(DispatchOutcome::Paused);
        }

        store.upsert(category, message)?;
        store.bump_changed_count(category);
        Ok(DispatchOutcome::Applied)
    }

    pub fn paused(&self) -> &PausedBuffers {
        &self.paused
    }

    pub fn drain_paused(&mut self, category: Category) -> Vec<TokenUpdateMessage> {
        self.paused.drain(category)
    }

    pub fn clear(&mut self) {
        self.paused.clear();
    }
}
