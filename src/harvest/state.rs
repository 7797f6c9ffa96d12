//! Per-run collection state and the termination policy.

use serde::Serialize;

use super::dedup::DeduplicationIndex;
use crate::models::CollectedItem;

/// How a run that did not fault came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Collected exactly the target count.
    ReachedTarget,
    /// Hit the stall threshold before reaching the target.
    Exhausted,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReachedTarget => write!(f, "reached target"),
            Self::Exhausted => write!(f, "exhausted"),
        }
    }
}

/// What the loop does after evaluating a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// New items arrived; scan again without scrolling.
    Rescan,
    /// Nothing new; scroll further and scan again.
    Scroll,
    Done(Outcome),
}

/// Everything one collection run accumulates.
///
/// Owned by a single run and handed back to the caller when it ends.
#[derive(Debug)]
pub struct CollectionState {
    collected: Vec<CollectedItem>,
    seen: DeduplicationIndex,
    target_count: usize,
    stall_count: u32,
    stall_threshold: u32,
    scroll_position: i64,
}

impl CollectionState {
    pub fn new(target_count: usize, stall_threshold: u32) -> Self {
        Self {
            collected: Vec::new(),
            seen: DeduplicationIndex::new(),
            target_count,
            stall_count: 0,
            stall_threshold,
            scroll_position: 0,
        }
    }

    pub fn target_reached(&self) -> bool {
        self.collected.len() >= self.target_count
    }

    pub fn is_new(&self, key: &str) -> bool {
        self.seen.is_new(key)
    }

    /// Append a first-seen item. Returns false (and drops it) if its key was
    /// already collected.
    pub fn accept(&mut self, item: CollectedItem) -> bool {
        if !self.seen.record(item.identity_key()) {
            return false;
        }
        self.collected.push(item);
        true
    }

    /// Apply the termination policy to the outcome of one scan.
    pub fn evaluate(&mut self, new_items: usize) -> Transition {
        if self.target_reached() {
            return Transition::Done(Outcome::ReachedTarget);
        }

        if new_items > 0 {
            self.stall_count = 0;
            return Transition::Rescan;
        }

        self.stall_count += 1;
        if self.stall_count >= self.stall_threshold {
            Transition::Done(Outcome::Exhausted)
        } else {
            Transition::Scroll
        }
    }

    /// Record a scroll target; the estimate never moves backwards.
    pub fn advance_scroll(&mut self, position: i64) {
        self.scroll_position = self.scroll_position.max(position);
    }

    pub fn len(&self) -> usize {
        self.collected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collected.is_empty()
    }

    pub fn stall_count(&self) -> u32 {
        self.stall_count
    }

    pub fn scroll_position(&self) -> i64 {
        self.scroll_position
    }

    pub fn into_items(self) -> Vec<CollectedItem> {
        self.collected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(n: usize) -> CollectedItem {
        CollectedItem::new(format!("https://example.com/products/{}", n))
    }

    #[test]
    fn test_duplicate_is_rejected() {
        let mut state = CollectionState::new(10, 3);
        assert!(state.accept(item(1)));
        assert!(!state.accept(item(1)));
        assert_eq!(state.len(), 1);
        assert!(!state.is_new(item(1).identity_key()));
    }

    #[test]
    fn test_reaching_target_finishes() {
        let mut state = CollectionState::new(2, 3);
        state.accept(item(1));
        state.accept(item(2));
        assert_eq!(state.evaluate(2), Transition::Done(Outcome::ReachedTarget));
    }

    #[test]
    fn test_new_items_reset_stall_count() {
        let mut state = CollectionState::new(10, 3);
        assert_eq!(state.evaluate(0), Transition::Scroll);
        assert_eq!(state.evaluate(0), Transition::Scroll);
        assert_eq!(state.stall_count(), 2);

        state.accept(item(1));
        assert_eq!(state.evaluate(1), Transition::Rescan);
        assert_eq!(state.stall_count(), 0);
    }

    #[test]
    fn test_stall_threshold_exhausts() {
        let mut state = CollectionState::new(10, 3);
        assert_eq!(state.evaluate(0), Transition::Scroll);
        assert_eq!(state.evaluate(0), Transition::Scroll);
        assert_eq!(state.evaluate(0), Transition::Done(Outcome::Exhausted));
    }

    #[test]
    fn test_zero_target_is_already_reached() {
        let mut state = CollectionState::new(0, 3);
        assert!(state.target_reached());
        assert_eq!(state.evaluate(0), Transition::Done(Outcome::ReachedTarget));
    }

    #[test]
    fn test_scroll_position_never_decreases() {
        let mut state = CollectionState::new(10, 3);
        state.advance_scroll(4000);
        state.advance_scroll(2000);
        assert_eq!(state.scroll_position(), 4000);
    }
}
