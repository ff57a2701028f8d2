//! Transition record and its status machine.

use std::fmt;

use crate::instruction::InstructionTree;
use crate::options::RouterOptions;

/// Where a transition is in its life.
///
/// ```text
/// Pending → Guarding → Aborted
///                    → Committing → Completed
///                                 → Errored
/// ```
/// Guard-phase errors and redirect loops also end in `Errored`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransitionStatus {
    #[default]
    Pending,
    Guarding,
    Committing,
    Completed,
    Aborted,
    Errored,
}

impl TransitionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Aborted | Self::Errored)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Guarding => "guarding",
            Self::Committing => "committing",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
            Self::Errored => "errored",
        }
    }
}

impl fmt::Display for TransitionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One navigation attempt from `previous` to `target`.
#[derive(Debug, Clone)]
pub struct Transition {
    /// Monotonic sequence number.
    pub id: u64,
    /// Tree snapshot when the transition started.
    pub previous: InstructionTree,
    /// Resolved target. Replaced when a guard redirects.
    pub target: InstructionTree,
    /// Options in effect for this transition.
    pub options: RouterOptions,
    pub status: TransitionStatus,
    /// The transition this one was queued behind.
    pub previous_id: Option<u64>,
    /// Number of redirects followed.
    pub redirects: usize,
}

impl Transition {
    pub fn new(
        id: u64,
        previous: InstructionTree,
        target: InstructionTree,
        options: RouterOptions,
        previous_id: Option<u64>,
    ) -> Self {
        Self {
            id,
            previous,
            target,
            options,
            status: TransitionStatus::Pending,
            previous_id,
            redirects: 0,
        }
    }

    /// Move to `status`, logging the step.
    pub fn advance(&mut self, status: TransitionStatus) {
        tracing::debug!(
            target: crate::router::targets::TRANSITION,
            transition = self.id,
            from = %self.status,
            to = %status,
            "status"
        );
        self.status = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!TransitionStatus::Pending.is_terminal());
        assert!(!TransitionStatus::Committing.is_terminal());
        assert!(TransitionStatus::Aborted.is_terminal());
        assert!(TransitionStatus::Completed.is_terminal());
        assert!(TransitionStatus::Errored.is_terminal());
    }

    #[test]
    fn new_transition_is_pending() {
        let mut t = Transition::new(
            3,
            InstructionTree::empty(),
            InstructionTree::empty(),
            RouterOptions::default(),
            Some(2),
        );
        assert_eq!(t.status, TransitionStatus::Pending);
        assert_eq!(t.redirects, 0);
        t.advance(TransitionStatus::Guarding);
        assert_eq!(t.status.to_string(), "guarding");
    }
}
