//! Undo/Redo snapshot history.
//!
//! Every undo step carries the whole serialized document. The history is
//! linear: pushing after an undo drops the redo branch. Identical pushes are
//! ignored and the oldest snapshot is evicted once capacity is exceeded.

use std::fmt;
use std::sync::Arc;

/// Default number of snapshots kept.
pub const DEFAULT_CAPACITY: usize = 50;

/// An immutable serialized document. Clones share the same buffer.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Snapshot(Arc<str>);

impl Snapshot {
    pub fn new(markup: impl Into<Arc<str>>) -> Self {
        Self(markup.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Snapshot {
    fn from(markup: String) -> Self {
        Self::new(markup)
    }
}

impl From<&str> for Snapshot {
    fn from(markup: &str) -> Self {
        Self::new(markup)
    }
}

impl AsRef<str> for Snapshot {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const PREVIEW: usize = 32;
        let preview: String = self.0.chars().take(PREVIEW).collect();
        if self.0.chars().nth(PREVIEW).is_some() {
            write!(f, "Snapshot({preview:?}… {} bytes)", self.0.len())
        } else {
            write!(f, "Snapshot({preview:?})")
        }
    }
}

/// Bounded, linear snapshot stack.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Snapshot>,
    /// Index of the snapshot the user currently sees; `None` when empty.
    position: Option<usize>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl History {
    /// Create an empty history. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Vec::with_capacity(capacity),
            position: None,
            capacity,
        }
    }

    /// Drop everything and start over from a single snapshot.
    pub fn reset(&mut self, snapshot: Snapshot) {
        self.entries.clear();
        self.entries.push(snapshot);
        self.position = Some(0);
        log::debug!("history reset");
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.position = None;
    }

    /// Record a new state.
    pub fn push(&mut self, snapshot: Snapshot) {
        if self.current() == Some(&snapshot) {
            log::trace!("history push skipped: unchanged");
            return;
        }

        let keep = self.position.map_or(0, |p| p + 1);
        let discarded = self.entries.len() - keep;
        self.entries.truncate(keep);
        self.entries.push(snapshot);

        let overflow = self.entries.len().saturating_sub(self.capacity);
        if overflow > 0 {
            self.entries.drain(..overflow);
        }
        self.position = Some(self.entries.len() - 1);

        log::debug!(
            "history push: {} entries, discarded {discarded} redo, evicted {overflow}",
            self.entries.len()
        );
    }

    /// Step back one snapshot. `None` when already at the oldest.
    pub fn undo(&mut self) -> Option<Snapshot> {
        let position = self.position.filter(|&p| p > 0)? - 1;
        self.position = Some(position);
        log::debug!("undo → {position}");
        self.entries.get(position).cloned()
    }

    /// Step forward one snapshot. `None` when already at the newest.
    pub fn redo(&mut self) -> Option<Snapshot> {
        let position = self.position.filter(|&p| p + 1 < self.entries.len())? + 1;
        self.position = Some(position);
        log::debug!("redo → {position}");
        self.entries.get(position).cloned()
    }

    pub fn can_undo(&self) -> bool {
        self.position.is_some_and(|p| p > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.position.is_some_and(|p| p + 1 < self.entries.len())
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.entries.get(self.position?)
    }

    pub fn position(&self) -> Option<usize> {
        self.position
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

    pub fn entries(&self) -> impl Iterator<Item = &Snapshot> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn snap(s: &str) -> Snapshot {
        Snapshot::from(s)
    }

    fn contents(history: &History) -> Vec<&str> {
        history.entries().map(Snapshot::as_str).collect()
    }

    #[test]
    fn empty_history_is_inert() {
        let mut history = History::default();
        assert_eq!(history.position(), None);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), None);
        assert_eq!(history.position(), None);
    }

    #[test]
    fn push_advances_position() {
        let mut history = History::new(10);
        for (i, s) in ["a", "b", "c"].into_iter().enumerate() {
            history.push(snap(s));
            assert_eq!(history.len(), i + 1);
            assert_eq!(history.position(), Some(i));
        }
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn duplicate_push_is_ignored() {
        let mut history = History::new(10);
        history.push(snap("a"));
        history.push(snap("a"));
        assert_eq!(history.len(), 1);
        assert_eq!(history.position(), Some(0));
    }

    #[test]
    fn duplicate_of_current_after_undo_keeps_redo_branch() {
        let mut history = History::new(10);
        history.push(snap("a"));
        history.push(snap("b"));
        history.undo();
        history.push(snap("a"));
        assert_eq!(contents(&history), vec!["a", "b"]);
        assert!(history.can_redo());
    }

    #[test]
    fn undo_redo_walk() {
        let mut history = History::new(10);
        history.push(snap("a"));
        history.push(snap("b"));
        assert_eq!(history.undo(), Some(snap("a")));
        assert_eq!(history.undo(), None);
        assert_eq!(history.position(), Some(0));
        assert_eq!(history.redo(), Some(snap("b")));
        assert_eq!(history.redo(), None);
        assert_eq!(history.position(), Some(1));
    }

    #[test]
    fn push_after_undo_discards_redo_branch() {
        let mut history = History::new(10);
        history.push(snap("A"));
        history.push(snap("B"));
        history.push(snap("C"));
        history.undo();
        history.undo();
        history.push(snap("D"));
        assert_eq!(contents(&history), vec!["A", "D"]);
        assert_eq!(history.position(), Some(1));
        assert_eq!(history.redo(), None);
    }

    #[test]
    fn overflow_evicts_oldest() {
        let mut history = History::new(3);
        for s in ["1", "2", "3", "4"] {
            history.push(snap(s));
        }
        assert_eq!(contents(&history), vec!["2", "3", "4"]);
        assert_eq!(history.position(), Some(2));
        assert_eq!(history.current(), Some(&snap("4")));
    }

    #[test]
    fn reset_leaves_single_entry() {
        let mut history = History::new(3);
        history.push(snap("1"));
        history.push(snap("2"));
        history.reset(snap("fresh"));
        assert_eq!(contents(&history), vec!["fresh"]);
        assert_eq!(history.position(), Some(0));
        assert!(!history.can_undo());
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.current(), None);
    }

    #[test]
    fn zero_capacity_keeps_latest() {
        let mut history = History::new(0);
        history.push(snap("a"));
        history.push(snap("b"));
        assert_eq!(contents(&history), vec!["b"]);
    }

    #[test]
    fn debug_truncates_long_snapshots() {
        let long = "x".repeat(100);
        let debug = format!("{:?}", snap(&long));
        assert!(debug.contains("100 bytes"), "{debug}");
    }
}
