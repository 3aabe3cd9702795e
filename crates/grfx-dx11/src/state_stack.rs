//! Append-only, index-addressed history of one piece of pipeline state.
//!
//! Recording code mutates the head through [`StateStack::current_mut`]. Terminal operations call
//! [`StateStack::commit`], which freezes the head into the history (only if it was touched since
//! the previous commit) and hands back an index. Actions store those indices instead of copies,
//! so two draws that share state share the index, and the executor can skip re-applying it.

/// State that can be kept in a [`StateStack`].
pub trait StackState: Default + Clone {
    /// Called on the head right after it has been frozen into the history.
    ///
    /// Slot-binding records use this to forget the per-commit list of written ranges while the
    /// slot contents themselves carry over into the next version.
    fn new_commit_init(&mut self) {}
}

#[derive(Debug, Clone)]
pub struct StateStack<T> {
    history: Vec<T>,
    current: T,
    committed: u32,
    dirty: bool,
}

impl<T: StackState> Default for StateStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: StackState> StateStack<T> {
    pub fn new() -> Self {
        Self {
            history: vec![T::default()],
            current: T::default(),
            committed: 0,
            dirty: false,
        }
    }

    /// Drops all history. Index 0 is a default-constructed entry afterwards.
    pub fn reset(&mut self) {
        self.history.clear();
        self.history.push(T::default());
        self.current = T::default();
        self.committed = 0;
        self.dirty = false;
    }

    /// Mutable access to the head. Marks the stack dirty unconditionally.
    pub fn current_mut(&mut self) -> &mut T {
        self.dirty = true;
        &mut self.current
    }

    pub fn current(&self) -> &T {
        &self.current
    }

    /// Frozen entry at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` was not returned by [`StateStack::commit`] since the last reset (or is
    /// not 0).
    pub fn at(&self, index: u32) -> &T {
        match self.history.get(index as usize) {
            Some(state) => state,
            None => panic!(
                "state stack index {index} out of range (len {})",
                self.history.len()
            ),
        }
    }

    /// Freezes the head if it was modified and returns the index of the latest frozen entry.
    ///
    /// Calling this again without an intervening [`StateStack::current_mut`] returns the same
    /// index.
    pub fn commit(&mut self) -> u32 {
        if self.dirty {
            self.history.push(self.current.clone());
            self.committed = u32::try_from(self.history.len() - 1)
                .unwrap_or_else(|_| panic!("state stack exceeded u32::MAX entries"));
            self.current.new_commit_init();
            self.dirty = false;
        }
        self.committed
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of frozen entries, including the default entry at index 0.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Counter {
        value: u32,
        writes_since_commit: u32,
    }

    impl StackState for Counter {
        fn new_commit_init(&mut self) {
            self.writes_since_commit = 0;
        }
    }

    #[test]
    fn commit_is_idempotent_without_writes() {
        let mut stack = StateStack::<Counter>::new();
        stack.current_mut().value = 5;
        let first = stack.commit();
        let second = stack.commit();
        assert_eq!(first, second);
        assert_eq!(first, 1);
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn commit_on_fresh_stack_returns_default_entry() {
        let mut stack = StateStack::<Counter>::new();
        assert_eq!(stack.commit(), 0);
        assert_eq!(stack.at(0), &Counter::default());
    }

    #[test]
    fn read_only_access_does_not_dirty() {
        let mut stack = StateStack::<Counter>::new();
        let _ = stack.current();
        assert!(!stack.is_dirty());
        assert_eq!(stack.commit(), 0);
    }

    #[test]
    fn head_carries_values_and_runs_new_commit_init() {
        let mut stack = StateStack::<Counter>::new();
        {
            let head = stack.current_mut();
            head.value = 9;
            head.writes_since_commit = 3;
        }
        let idx = stack.commit();
        assert_eq!(stack.at(idx).writes_since_commit, 3);
        assert_eq!(stack.current().value, 9);
        assert_eq!(stack.current().writes_since_commit, 0);
    }

    #[test]
    fn frozen_entries_are_not_affected_by_later_writes() {
        let mut stack = StateStack::<Counter>::new();
        stack.current_mut().value = 1;
        let a = stack.commit();
        stack.current_mut().value = 2;
        let b = stack.commit();
        assert_ne!(a, b);
        assert_eq!(stack.at(a).value, 1);
        assert_eq!(stack.at(b).value, 2);
        assert_eq!(stack.at(0).value, 0);
    }

    #[test]
    fn reset_clears_history() {
        let mut stack = StateStack::<Counter>::new();
        stack.current_mut().value = 4;
        stack.commit();
        stack.current_mut().value = 8;
        stack.reset();
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.at(0), &Counter::default());
        assert_eq!(stack.current(), &Counter::default());
        assert!(!stack.is_dirty());
        assert_eq!(stack.commit(), 0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range_access_panics() {
        let stack = StateStack::<Counter>::new();
        let _ = stack.at(1);
    }
}
