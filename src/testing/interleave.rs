//! Order-insensitive log comparison for interleaved hook chains.
//!
//! When several hook chains run concurrently only each chain's own order is
//! fixed. [`is_interleaving`] checks that a log is some merge of the expected
//! chains: it contains exactly their events, and every chain appears in order.

use std::collections::HashSet;

/// Whether `actual` is a merge of `sequences` preserving each one's order.
pub fn is_interleaving<S: AsRef<str>>(actual: &[S], sequences: &[Vec<S>]) -> bool {
    let total: usize = sequences.iter().map(Vec::len).sum();
    if total != actual.len() {
        return false;
    }
    let mut failed = HashSet::new();
    let mut cursors = vec![0; sequences.len()];
    merge_from(actual, sequences, &mut cursors, &mut failed)
}

fn merge_from<S: AsRef<str>>(
    actual: &[S],
    sequences: &[Vec<S>],
    cursors: &mut Vec<usize>,
    failed: &mut HashSet<Vec<usize>>,
) -> bool {
    let consumed: usize = cursors.iter().sum();
    let Some(next) = actual.get(consumed) else {
        return true;
    };
    if failed.contains(cursors) {
        return false;
    }

    for i in 0..sequences.len() {
        let matches = sequences[i]
            .get(cursors[i])
            .is_some_and(|candidate| candidate.as_ref() == next.as_ref());
        if matches {
            cursors[i] += 1;
            let ok = merge_from(actual, sequences, cursors, failed);
            cursors[i] -= 1;
            if ok {
                return true;
            }
        }
    }

    failed.insert(cursors.clone());
    false
}

/// Panic with a readable diff unless `actual` interleaves `sequences`.
#[track_caller]
pub fn assert_interleaving<S: AsRef<str> + std::fmt::Debug>(actual: &[S], sequences: &[Vec<S>]) {
    if !is_interleaving(actual, sequences) {
        panic!(
            "log is not an interleaving of the expected chains\n  actual: {actual:#?}\n  chains: {sequences:#?}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(items: &[&'static str]) -> Vec<&'static str> {
        items.to_vec()
    }

    #[test]
    fn accepts_any_merge() {
        let a = v(&["a1", "a2"]);
        let b = v(&["b1", "b2"]);
        assert!(is_interleaving(&v(&["a1", "a2", "b1", "b2"]), &[a.clone(), b.clone()]));
        assert!(is_interleaving(&v(&["b1", "a1", "b2", "a2"]), &[a.clone(), b.clone()]));
        assert!(is_interleaving(&v(&["a1", "b1", "b2", "a2"]), &[a, b]));
    }

    #[test]
    fn rejects_reordered_chain() {
        assert!(!is_interleaving(
            &v(&["a2", "a1", "b1"]),
            &[v(&["a1", "a2"]), v(&["b1"])]
        ));
    }

    #[test]
    fn rejects_missing_or_extra_events() {
        assert!(!is_interleaving(&v(&["a1"]), &[v(&["a1", "a2"])]));
        assert!(!is_interleaving(&v(&["a1", "x"]), &[v(&["a1"])]));
    }

    #[test]
    fn backtracks_over_shared_events() {
        let a = v(&["x", "a"]);
        let b = v(&["x", "b"]);
        assert!(is_interleaving(&v(&["x", "x", "b", "a"]), &[a.clone(), b.clone()]));
        assert!(is_interleaving(&v(&["x", "b", "x", "a"]), &[a, b]));
    }

    #[test]
    #[should_panic(expected = "not an interleaving")]
    fn assertion_panics() {
        assert_interleaving(&v(&["b"]), &[v(&["a"])]);
    }
}
