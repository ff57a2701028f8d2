//! Router-level guards: functions consulted between `canUnload` and `canLoad`.
//!
//! A guard is registered with a [`GuardTarget`] saying which entering
//! instructions it cares about. It runs once per guarding pass when at least
//! one entering instruction matches, and receives only the matching ones.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::component::{GuardOutcome, Hook};
use crate::instruction::ViewportInstruction;

pub type GuardId = u64;

/// A registered guard function.
pub type GuardFn = Rc<dyn Fn(&[ViewportInstruction]) -> Hook<GuardOutcome>>;

/// One include or exclude rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardMatch {
    /// Instructions loading this component.
    Component(String),
    /// Instructions targeting this viewport.
    Viewport(String),
}

impl GuardMatch {
    pub fn matches(&self, instruction: &ViewportInstruction) -> bool {
        match self {
            Self::Component(name) => instruction.component_name() == Some(name.as_str()),
            Self::Viewport(name) => instruction.viewport.as_deref() == Some(name.as_str()),
        }
    }
}

impl From<&str> for GuardMatch {
    fn from(component: &str) -> Self {
        Self::Component(component.to_owned())
    }
}

/// Which instructions a guard applies to. An empty include list means all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuardTarget {
    pub include: Vec<GuardMatch>,
    pub exclude: Vec<GuardMatch>,
}

impl GuardTarget {
    /// Every instruction.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn include(mut self, rule: impl Into<GuardMatch>) -> Self {
        self.include.push(rule.into());
        self
    }

    pub fn exclude(mut self, rule: impl Into<GuardMatch>) -> Self {
        self.exclude.push(rule.into());
        self
    }

    pub fn matches(&self, instruction: &ViewportInstruction) -> bool {
        (self.include.is_empty() || self.include.iter().any(|r| r.matches(instruction)))
            && !self.exclude.iter().any(|r| r.matches(instruction))
    }
}

#[derive(Clone)]
struct Guard {
    id: GuardId,
    target: GuardTarget,
    run: GuardFn,
}

/// The registered guards, in registration order.
///
/// A handle: clones share the same guard list, so guards added through
/// [`Router::guardian`](crate::router::Router::guardian) apply to the router.
#[derive(Clone, Default)]
pub struct Guardian {
    next_id: Rc<Cell<GuardId>>,
    guards: Rc<RefCell<Vec<Guard>>>,
}

impl Guardian {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_guard(
        &self,
        guard: impl Fn(&[ViewportInstruction]) -> Hook<GuardOutcome> + 'static,
        target: GuardTarget,
    ) -> GuardId {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.guards.borrow_mut().push(Guard {
            id,
            target,
            run: Rc::new(guard),
        });
        id
    }

    /// Returns `false` if no guard has this id.
    pub fn remove_guard(&self, id: GuardId) -> bool {
        let mut guards = self.guards.borrow_mut();
        let before = guards.len();
        guards.retain(|g| g.id != id);
        guards.len() != before
    }

    pub fn len(&self) -> usize {
        self.guards.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.borrow().is_empty()
    }

    /// Guards with at least one matching instruction, each paired with the
    /// instructions it matched.
    pub fn matching(
        &self,
        entering: &[ViewportInstruction],
    ) -> Vec<(GuardId, GuardFn, Vec<ViewportInstruction>)> {
        self.guards
            .borrow()
            .iter()
            .filter_map(|guard| {
                let matched: Vec<ViewportInstruction> = entering
                    .iter()
                    .filter(|i| guard.target.matches(i))
                    .cloned()
                    .collect();
                (!matched.is_empty()).then(|| (guard.id, Rc::clone(&guard.run), matched))
            })
            .collect()
    }
}

impl fmt::Debug for Guardian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.guards.borrow().iter().map(|g| (g.id, g.target.clone())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::resolved;

    fn entering() -> Vec<ViewportInstruction> {
        vec![
            ViewportInstruction::new("admin").with_viewport("main"),
            ViewportInstruction::new("menu").with_viewport("side"),
        ]
    }

    #[test]
    fn empty_target_matches_everything() {
        let guardian = Guardian::new();
        guardian.add_guard(|_| resolved(GuardOutcome::Allow), GuardTarget::all());
        let matched = guardian.matching(&entering());
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].2.len(), 2);
    }

    #[test]
    fn include_and_exclude() {
        let guardian = Guardian::new();
        guardian.add_guard(|_| None, GuardTarget::all().include("admin"));
        guardian.add_guard(
            |_| None,
            GuardTarget::all().exclude(GuardMatch::Viewport("side".into())),
        );
        guardian.add_guard(|_| None, GuardTarget::all().include("nobody"));

        let matched = guardian.matching(&entering());
        let ids: Vec<GuardId> = matched.iter().map(|m| m.0).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(matched[0].2[0].component_name(), Some("admin"));
        assert_eq!(matched[1].2.len(), 1);
    }

    #[test]
    fn remove_guard() {
        let guardian = Guardian::new();
        let id = guardian.add_guard(|_| None, GuardTarget::all());
        assert_eq!(guardian.len(), 1);
        assert!(guardian.remove_guard(id));
        assert!(!guardian.remove_guard(id));
        assert!(guardian.is_empty());
    }

    #[test]
    fn clones_share_guards() {
        let guardian = Guardian::new();
        let handle = guardian.clone();
        let id = handle.add_guard(|_| None, GuardTarget::all());
        assert_eq!(guardian.len(), 1);
        assert!(guardian.remove_guard(id));
        assert!(handle.is_empty());
    }
}
