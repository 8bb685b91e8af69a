//! Linear undo/redo over whole-document snapshots
//!
//! Snapshots are [`Form`] clones. Because pages are reference counted a
//! snapshot costs one `Arc` bump per page; only pages edited afterwards are
//! copied.

use std::collections::VecDeque;

use crate::domain::aggregates::Form;

/// Maximum number of undo steps kept.
pub const MAX_HISTORY: usize = 50;

#[derive(Clone, Debug)]
pub struct HistoryStack {
    undo: VecDeque<Form>,
    redo: Vec<Form>,
    capacity: usize,
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStack {
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            undo: VecDeque::with_capacity(capacity),
            redo: Vec::new(),
            capacity,
        }
    }

    /// Record `current` before a mutation is applied. Evicts the oldest
    /// entry past capacity and forgets any redo branch.
    pub fn checkpoint(&mut self, current: &Form) {
        self.undo.push_back(current.clone());
        while self.undo.len() > self.capacity {
            self.undo.pop_front();
        }
        self.redo.clear();
    }

    /// Step back. `current` moves to the redo stack. `None` when there is
    /// nothing to undo.
    pub fn undo(&mut self, current: &Form) -> Option<Form> {
        let previous = self.undo.pop_back()?;
        self.redo.push(current.clone());
        Some(previous)
    }

    pub fn redo(&mut self, current: &Form) -> Option<Form> {
        let next = self.redo.pop()?;
        self.undo.push_back(current.clone());
        while self.undo.len() > self.capacity {
            self.undo.pop_front();
        }
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titled(title: &str) -> Form {
        Form::new(title, "g")
    }

    #[test]
    fn test_undo_redo_roundtrip() {
        let mut history = HistoryStack::new();
        let v0 = titled("v0");
        let v1 = titled("v1");

        history.checkpoint(&v0);
        let back = history.undo(&v1).unwrap();
        assert_eq!(back, v0);
        assert!(history.can_redo());

        let forward = history.redo(&back).unwrap();
        assert_eq!(forward, v1);
        assert_eq!(history.undo_len(), 1);
        assert_eq!(history.redo_len(), 0);
    }

    #[test]
    fn test_empty_stacks_are_noops() {
        let mut history = HistoryStack::new();
        let current = titled("now");
        assert!(history.undo(&current).is_none());
        assert!(history.redo(&current).is_none());
        assert_eq!(history.redo_len(), 0);
    }

    #[test]
    fn test_fifty_first_checkpoint_evicts_oldest() {
        let mut history = HistoryStack::new();
        for i in 0..=MAX_HISTORY {
            history.checkpoint(&titled(&format!("v{}", i)));
        }
        assert_eq!(history.undo_len(), MAX_HISTORY);

        let mut current = titled("latest");
        let mut oldest = None;
        while let Some(prev) = history.undo(&current) {
            oldest = Some(prev.title.clone());
            current = prev;
        }
        assert_eq!(oldest.as_deref(), Some("v1"));
    }

    #[test]
    fn test_checkpoint_clears_redo() {
        let mut history = HistoryStack::new();
        history.checkpoint(&titled("a"));
        history.undo(&titled("b")).unwrap();
        assert!(history.can_redo());

        history.checkpoint(&titled("c"));
        assert!(!history.can_redo());
    }
}
