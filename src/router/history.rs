//! Navigation history: a cursor over committed navigations.

use crate::instruction::InstructionTree;

/// One committed navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Full snapshot of the tree, every viewport named.
    pub tree: InstructionTree,
    /// The router URL at the time.
    pub url: String,
    pub title: Option<String>,
}

/// Entries in navigation order plus the index of the current one.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
    index: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry after the current one, dropping any forward entries.
    pub fn push(&mut self, entry: HistoryEntry) {
        let keep = self.index.map_or(0, |i| i + 1);
        self.entries.truncate(keep);
        self.entries.push(entry);
        self.index = Some(self.entries.len() - 1);
    }

    /// Overwrite the current entry (or push the first one).
    pub fn replace_current(&mut self, entry: HistoryEntry) {
        match self.index.and_then(|i| self.entries.get_mut(i)) {
            Some(current) => *current = entry,
            None => self.push(entry),
        }
    }

    /// The entry `delta` steps away from the current one.
    pub fn peek(&self, delta: isize) -> Option<&HistoryEntry> {
        let target = self.index?.checked_add_signed(delta)?;
        self.entries.get(target)
    }

    /// Move the cursor by `delta`. Returns `false` when out of range.
    pub fn go(&mut self, delta: isize) -> bool {
        match self.index.and_then(|i| i.checked_add_signed(delta)) {
            Some(target) if target < self.entries.len() => {
                self.index = Some(target);
                true
            }
            _ => false,
        }
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.index.and_then(|i| self.entries.get(i))
    }

    pub fn can_go_back(&self) -> bool {
        self.peek(-1).is_some()
    }

    pub fn can_go_forward(&self) -> bool {
        self.peek(1).is_some()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(url: &str) -> HistoryEntry {
        HistoryEntry {
            tree: InstructionTree::empty(),
            url: url.to_owned(),
            title: None,
        }
    }

    fn urls(history: &History) -> Vec<&str> {
        history.entries().iter().map(|e| e.url.as_str()).collect()
    }

    #[test]
    fn push_and_walk() {
        let mut history = History::new();
        assert!(history.current().is_none());
        history.push(entry("a"));
        history.push(entry("b"));
        assert_eq!(history.current().map(|e| e.url.as_str()), Some("b"));
        assert!(history.can_go_back());
        assert!(!history.can_go_forward());

        assert!(history.go(-1));
        assert_eq!(history.current().map(|e| e.url.as_str()), Some("a"));
        assert!(!history.go(-1));
        assert_eq!(history.peek(1).map(|e| e.url.as_str()), Some("b"));
    }

    #[test]
    fn push_drops_forward_entries() {
        let mut history = History::new();
        history.push(entry("a"));
        history.push(entry("b"));
        history.go(-1);
        history.push(entry("c"));
        assert_eq!(urls(&history), vec!["a", "c"]);
        assert_eq!(history.index(), Some(1));
    }

    #[test]
    fn replace_current_entry() {
        let mut history = History::new();
        history.replace_current(entry("a"));
        history.replace_current(entry("b"));
        assert_eq!(urls(&history), vec!["b"]);
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.index(), None);
    }
}
