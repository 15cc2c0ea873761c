//! In-memory live lists and shared hover/tutorial flags

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use crate::domain::feed::{ListStore, PauseState};
use crate::shared::errors::StoreError;
use crate::shared::types::{Category, TokenUpdateMessage};

/// Newest-first token lists, one per category, each capped at `max_len`
#[derive(Debug, Clone)]
pub struct MemoryListStore {
    lists: [Vec<TokenUpdateMessage>; 3],
    changed_counts: [u64; 3],
    max_len: usize,
}

impl MemoryListStore {
    pub fn new(max_len: usize) -> Self {
        Self {
            lists: Default::default(),
            changed_counts: [0; 3],
            max_len: max_len.max(1),
        }
    }

    pub fn list(&self, category: Category) -> &[TokenUpdateMessage] {
        &self.lists[category.index()]
    }

    pub fn changed_count(&self, category: Category) -> u64 {
        self.changed_counts[category.index()]
    }

    pub fn get(&self, category: Category, mint: &str) -> Option<&TokenUpdateMessage> {
        self.lists[category.index()].iter().find(|token| token.mint == mint)
    }

    /// Folds a drained paused buffer (newest first) back into the live list.
    ///
    /// Mints that reached the live list in the meantime are skipped, since the
    /// live copy is never older than the buffered one. The rest are prepended
    /// keeping their newest-first order, and duplicate mints in the buffer
    /// collapse to the newest entry. Returns how many tokens were added.
    pub fn merge_paused(&mut self, category: Category, paused: Vec<TokenUpdateMessage>) -> usize {
        let slot = category.index();
        let mut fresh: Vec<TokenUpdateMessage> = Vec::with_capacity(paused.len());

        for message in paused {
            let in_live = self.lists[slot].iter().any(|token| token.mint == message.mint);
            let seen = fresh.iter().any(|token| token.mint == message.mint);
            if !in_live && !seen {
                fresh.push(message);
            }
        }

        let added = fresh.len();
        if added > 0 {
            let list = &mut self.lists[slot];
            fresh.append(list);
            *list = fresh;
            list.truncate(self.max_len);
            self.changed_counts[slot] += 1;
        }
        added
    }

    pub fn len(&self, category: Category) -> usize {
        self.lists[category.index()].len()
    }
}

impl Default for MemoryListStore {
    fn default() -> Self {
        Self::new(100)
    }
}

impl ListStore for MemoryListStore {
    fn contains(&self, category: Category, mint: &str) -> bool {
        self.get(category, mint).is_some()
    }

    fn upsert(&mut self, category: Category, message: TokenUpdateMessage) -> Result<(), StoreError> {
        if message.mint.is_empty() {
            return Err(StoreError::Rejected {
                mint: message.mint,
                reason: "empty mint".to_string(),
            });
        }

        let list = &mut self.lists[category.index()];
        match list.iter_mut().find(|token| token.mint == message.mint) {
            Some(existing) => *existing = message,
            None => {
                list.insert(0, message);
                list.truncate(self.max_len);
            }
        }
        Ok(())
    }

    fn bump_changed_count(&mut self, category: Category) {
        self.changed_counts[category.index()] += 1;
    }
}

/// Hover and tutorial flags shared between the UI side and the pipeline.
///
/// Cloning yields another handle to the same flags.
#[derive(Debug, Clone, Default)]
pub struct PauseFlags {
    hovered: Arc<[AtomicBool; 3]>,
    tutorial: Arc<[AtomicBool; 3]>,
}

impl PauseFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_hovered(&self, category: Category, hovered: bool) {
        self.hovered[category.index()].store(hovered, Ordering::Relaxed);
    }

    pub fn set_tutorial_active(&self, category: Category, active: bool) {
        self.tutorial[category.index()].store(active, Ordering::Relaxed);
    }
}

impl PauseState for PauseFlags {
    fn is_hovered(&self, category: Category) -> bool {
        self.hovered[category.index()].load(Ordering::Relaxed)
    }

    fn is_tutorial_active(&self, category: Category) -> bool {
        self.tutorial[category.index()].load(Ordering::Relaxed)
    }
}
