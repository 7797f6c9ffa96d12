//! Identity index for items already collected in a run.

use std::collections::HashSet;

/// Set of identity keys seen so far.
#[derive(Debug, Default, Clone)]
pub struct DeduplicationIndex {
    seen: HashSet<String>,
}

impl DeduplicationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `key` has not been recorded yet.
    pub fn is_new(&self, key: &str) -> bool {
        !self.seen.contains(key)
    }

    /// Record `key`; returns false if it was already present.
    pub fn record(&mut self, key: &str) -> bool {
        self.seen.insert(key.to_string())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_new_until_recorded() {
        let mut index = DeduplicationIndex::new();
        assert!(index.is_new("https://example.com/p/1"));

        assert!(index.record("https://example.com/p/1"));
        assert!(!index.is_new("https://example.com/p/1"));
        assert!(index.is_new("https://example.com/p/2"));
    }

    #[test]
    fn test_record_twice_reports_duplicate() {
        let mut index = DeduplicationIndex::new();
        assert!(index.record("a"));
        assert!(!index.record("a"));
        assert_eq!(index.len(), 1);
    }
}
