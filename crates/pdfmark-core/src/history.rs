//! Bounded linear undo/redo history of full snapshots.

use crate::config::HISTORY_CAPACITY;
use std::collections::VecDeque;

/// Snapshot history with a cursor.
///
/// The history owns copies of every state; callers never hand it their live
/// value. Pushing after an undo discards the redo branch for good.
#[derive(Debug, Clone)]
pub struct History<S> {
    entries: VecDeque<S>,
    index: usize,
    capacity: usize,
}

impl<S: Clone> Default for History<S> {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}

impl<S: Clone> History<S> {
    /// Create an empty history holding at most `capacity` snapshots.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            index: 0,
            capacity: capacity.max(1),
        }
    }

    /// Create a history whose oldest entry is `base`.
    pub fn with_base(base: &S, capacity: usize) -> Self {
        let mut history = Self::new(capacity);
        history.push(base);
        history
    }

    /// Drop every entry and start over from `base`.
    pub fn reset(&mut self, base: &S) {
        self.entries.clear();
        self.index = 0;
        self.push(base);
    }

    /// Record a copy of `state` as the newest entry.
    pub fn push(&mut self, state: &S) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.index + 1);
        }
        self.entries.push_back(state.clone());
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.index = self.entries.len() - 1;
    }

    /// Step back one entry and return it.
    pub fn undo(&mut self) -> Option<&S> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        self.entries.get(self.index)
    }

    /// Step forward one entry and return it.
    pub fn redo(&mut self) -> Option<&S> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        self.entries.get(self.index)
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.entries.is_empty() && self.index < self.entries.len() - 1
    }

    /// Entry under the cursor.
    pub fn current(&self) -> Option<&S> {
        self.entries.get(self.index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
