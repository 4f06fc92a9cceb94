//! Bounded undo/redo stacks of whole-grid snapshots

use std::collections::VecDeque;

/// Default number of undo steps kept
pub const DEFAULT_UNDO_LIMIT: usize = 50;

/// Snapshot history.
///
/// `record` stores the state *before* a mutation and clears redo. The undo
/// stack drops its oldest entry once `limit` is reached.
#[derive(Debug, Clone)]
pub struct History<T> {
    undo: VecDeque<T>,
    redo: Vec<T>,
    limit: usize,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_LIMIT)
    }
}

impl<T> History<T> {
    pub fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    fn push_undo(&mut self, snapshot: T) {
        if self.undo.len() == self.limit {
            self.undo.pop_front();
        }
        self.undo.push_back(snapshot);
    }

    /// Record the pre-mutation state of a new edit
    pub fn record(&mut self, before: T) {
        self.push_undo(before);
        self.redo.clear();
    }

    /// Step back: `current` moves to redo, the previous state is returned
    pub fn undo(&mut self, current: T) -> Result<T, T> {
        match self.undo.pop_back() {
            Some(previous) => {
                self.redo.push(current);
                Ok(previous)
            }
            None => Err(current),
        }
    }

    /// Step forward: `current` moves to undo, the next state is returned
    pub fn redo(&mut self, current: T) -> Result<T, T> {
        match self.redo.pop() {
            Some(next) => {
                self.push_undo(current);
                Ok(next)
            }
            None => Err(current),
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_redo_round_trip() {
        let mut history = History::new(10);
        let mut state = 0;
        for next in 1..=3 {
            history.record(state);
            state = next;
        }

        state = history.undo(state).unwrap();
        state = history.undo(state).unwrap();
        assert_eq!(state, 1);
        state = history.redo(state).unwrap();
        state = history.redo(state).unwrap();
        assert_eq!(state, 3);
        assert!(history.redo(state).is_err());
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let mut history = History::new(10);
        history.record("a");
        let state = history.undo("b").unwrap();
        assert!(history.can_redo());

        history.record(state);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut history = History::new(3);
        for s in 0..5 {
            history.record(s);
        }
        assert_eq!(history.undo_depth(), 3);

        let mut state = 5;
        let mut seen = Vec::new();
        while let Ok(prev) = history.undo(state) {
            seen.push(prev);
            state = prev;
        }
        assert_eq!(seen, vec![4, 3, 2]);
    }

    #[test]
    fn test_empty_undo_returns_current() {
        let mut history: History<i32> = History::default();
        assert_eq!(history.limit(), DEFAULT_UNDO_LIMIT);
        assert_eq!(history.undo(7), Err(7));
    }

    #[test]
    fn test_zero_limit_clamped() {
        let mut history = History::new(0);
        history.record(1);
        assert_eq!(history.undo_depth(), 1);
    }
}
