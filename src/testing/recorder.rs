//! Hook recording: a shared log plus components that write into it.
//!
//! [`Logged`] builds a [`ComponentDefinition`] whose instances append
//! `"<phase>.<component>.<hook>"` to a [`HookLog`] every time the router calls
//! one of their hooks. Each hook can be made asynchronous, failing, hanging or
//! return a chosen guard outcome.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::component::{
    deferred, rejected, resolved, Component, ComponentDefinition, GuardOutcome, Hook, HookName,
    NavigationContext, Routable, ViewController,
};
use crate::viewport::ViewportOptions;

// ---------------------------------------------------------------------------
// HookLog
// ---------------------------------------------------------------------------

/// Shared, append-only log of hook calls. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct HookLog {
    entries: Rc<RefCell<Vec<String>>>,
    phase: Rc<RefCell<String>>,
}

impl HookLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix for the entries recorded from now on. Empty means no prefix.
    pub fn set_phase(&self, phase: impl Into<String>) {
        *self.phase.borrow_mut() = phase.into();
    }

    pub fn phase(&self) -> String {
        self.phase.borrow().clone()
    }

    pub fn record(&self, component: &str, hook: HookName) {
        let phase = self.phase.borrow();
        let entry = if phase.is_empty() {
            format!("{component}.{hook}")
        } else {
            format!("{phase}.{component}.{hook}")
        };
        self.entries.borrow_mut().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }

    /// Drain the log.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.entries.borrow_mut())
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Position of the first entry equal to `entry`.
    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries.borrow().iter().position(|e| e == entry)
    }
}

// ---------------------------------------------------------------------------
// Inert
// ---------------------------------------------------------------------------

/// A component implementing no hooks at all.
#[derive(Debug)]
pub struct Inert {
    name: String,
}

impl Inert {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Factory for [`ComponentDefinition::new`].
    pub fn factory(name: &str) -> impl Fn() -> Rc<dyn Component> + 'static {
        let name = name.to_owned();
        move || Rc::new(Inert::new(name.clone())) as Rc<dyn Component>
    }
}

impl Routable for Inert {}
impl ViewController for Inert {}

impl Component for Inert {
    fn name(&self) -> &str {
        &self.name
    }
}

// ---------------------------------------------------------------------------
// Logged
// ---------------------------------------------------------------------------

/// How an implemented hook completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookMode {
    /// Ready on the first poll.
    #[default]
    Sync,
    /// Yields to the executor `yields` times before completing.
    Async { yields: usize },
}

/// What a hook does when called.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HookBehavior {
    /// Succeed (guards allow).
    #[default]
    Succeed,
    /// Not implemented: the router never sees a call, nothing is logged.
    Absent,
    /// Fail with this message.
    Fail(String),
    /// Guards only: return this outcome.
    Outcome(GuardOutcome),
    /// Never complete.
    Hang,
}

/// Builder for logging test components.
#[derive(Debug, Clone)]
pub struct Logged {
    name: String,
    log: HookLog,
    mode: HookMode,
    modes: HashMap<HookName, HookMode>,
    behaviors: HashMap<HookName, HookBehavior>,
    viewports: Vec<ViewportOptions>,
    created: Rc<Cell<usize>>,
}

impl Logged {
    pub fn new(name: impl Into<String>, log: &HookLog) -> Self {
        Self {
            name: name.into(),
            log: log.clone(),
            mode: HookMode::Sync,
            modes: HashMap::new(),
            behaviors: HashMap::new(),
            viewports: Vec::new(),
            created: Rc::new(Cell::new(0)),
        }
    }

    /// Completion mode of every hook (builder).
    pub fn with_mode(mut self, mode: HookMode) -> Self {
        self.mode = mode;
        self
    }

    /// Completion mode of one hook (builder).
    pub fn with_hook_mode(mut self, hook: HookName, mode: HookMode) -> Self {
        self.modes.insert(hook, mode);
        self
    }

    /// Behavior of one hook (builder).
    pub fn with_hook(mut self, hook: HookName, behavior: HookBehavior) -> Self {
        self.behaviors.insert(hook, behavior);
        self
    }

    pub fn failing(self, hook: HookName, message: &str) -> Self {
        self.with_hook(hook, HookBehavior::Fail(message.to_owned()))
    }

    pub fn guarding(self, hook: HookName, outcome: impl Into<GuardOutcome>) -> Self {
        self.with_hook(hook, HookBehavior::Outcome(outcome.into()))
    }

    pub fn without(self, hook: HookName) -> Self {
        self.with_hook(hook, HookBehavior::Absent)
    }

    /// Declare a child viewport (builder).
    pub fn with_viewport(mut self, viewport: impl Into<ViewportOptions>) -> Self {
        self.viewports.push(viewport.into());
        self
    }

    /// Number of instances created so far.
    pub fn created(&self) -> usize {
        self.created.get()
    }

    /// Shared instance counter, readable after the builder has been consumed.
    pub fn counter(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.created)
    }

    pub fn definition(&self) -> ComponentDefinition {
        let config = Rc::new(self.clone());
        let factory_config = Rc::clone(&config);
        ComponentDefinition::new(self.name.clone(), move || {
            factory_config.created.set(factory_config.created.get() + 1);
            Rc::new(LoggedComponent {
                config: Rc::clone(&factory_config),
            }) as Rc<dyn Component>
        })
        .with_viewports(config.viewports.iter().cloned())
    }
}

/// An instance created by a [`Logged`] definition.
struct LoggedComponent {
    config: Rc<Logged>,
}

impl LoggedComponent {
    fn call<T: 'static>(&self, hook: HookName, value: impl FnOnce() -> T) -> Hook<T> {
        let behavior = self.config.behaviors.get(&hook).cloned().unwrap_or_default();
        if behavior == HookBehavior::Absent {
            return None;
        }
        self.config.log.record(&self.config.name, hook);

        let mode = self.config.modes.get(&hook).copied().unwrap_or(self.config.mode);
        let result = match behavior {
            HookBehavior::Hang => return deferred(futures::future::pending()),
            HookBehavior::Fail(message) => Err(anyhow::anyhow!(message)),
            _ => Ok(value()),
        };

        match (mode, result) {
            (HookMode::Sync, Ok(value)) => resolved(value),
            (HookMode::Sync, Err(error)) => rejected(error),
            (HookMode::Async { yields }, result) => deferred(async move {
                for _ in 0..yields {
                    tokio::task::yield_now().await;
                }
                result
            }),
        }
    }

    fn guard(&self, hook: HookName) -> Hook<GuardOutcome> {
        let outcome = match self.config.behaviors.get(&hook) {
            Some(HookBehavior::Outcome(outcome)) => outcome.clone(),
            _ => GuardOutcome::Allow,
        };
        self.call(hook, move || outcome)
    }
}

impl Routable for LoggedComponent {
    fn can_load(&self, _ctx: &NavigationContext) -> Hook<GuardOutcome> {
        self.guard(HookName::CanLoad)
    }

    fn load(&self, _ctx: &NavigationContext) -> Hook<()> {
        self.call(HookName::Load, || ())
    }

    fn can_unload(&self, _ctx: &NavigationContext) -> Hook<GuardOutcome> {
        self.guard(HookName::CanUnload)
    }

    fn unload(&self, _ctx: &NavigationContext) -> Hook<()> {
        self.call(HookName::Unload, || ())
    }
}

impl ViewController for LoggedComponent {
    fn binding(&self) -> Hook<()> {
        self.call(HookName::Binding, || ())
    }

    fn bound(&self) -> Hook<()> {
        self.call(HookName::Bound, || ())
    }

    fn attaching(&self) -> Hook<()> {
        self.call(HookName::Attaching, || ())
    }

    fn attached(&self) -> Hook<()> {
        self.call(HookName::Attached, || ())
    }

    fn detaching(&self) -> Hook<()> {
        self.call(HookName::Detaching, || ())
    }

    fn unbinding(&self) -> Hook<()> {
        self.call(HookName::Unbinding, || ())
    }

    fn dispose(&self) -> Hook<()> {
        self.call(HookName::Dispose, || ())
    }
}

impl Component for LoggedComponent {
    fn name(&self) -> &str {
        &self.config.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::Parameters;
    use crate::viewport::ViewportPath;
    use pretty_assertions::assert_eq;

    fn ctx() -> NavigationContext {
        NavigationContext {
            params: Parameters::new(),
            next: None,
            current: None,
            viewport: ViewportPath::root(),
            transition: 1,
        }
    }

    #[test]
    fn log_prefixes_phase() {
        let log = HookLog::new();
        log.record("a", HookName::Load);
        log.set_phase("start");
        log.record("a", HookName::Binding);
        assert_eq!(log.entries(), vec!["a.load", "start.a.binding"]);
        assert_eq!(log.take().len(), 2);
        assert!(log.is_empty());
    }

    #[test]
    fn logged_records_calls() {
        let log = HookLog::new();
        let def = Logged::new("a01", &log).definition();
        let instance = def.create();
        assert!(instance.binding().is_some());
        assert!(instance.can_load(&ctx()).is_some());
        assert_eq!(log.entries(), vec!["a01.binding", "a01.canLoad"]);
    }

    #[test]
    fn absent_hooks_are_not_logged() {
        let log = HookLog::new();
        let def = Logged::new("a", &log).without(HookName::Load).definition();
        assert!(def.create().load(&ctx()).is_none());
        assert!(log.is_empty());
    }

    #[test]
    fn guard_outcome_is_returned() {
        let log = HookLog::new();
        let def = Logged::new("a", &log)
            .guarding(HookName::CanLoad, false)
            .definition();
        let outcome = tokio_test::block_on(def.create().can_load(&ctx()).unwrap()).unwrap();
        assert_eq!(outcome, GuardOutcome::Block);
    }

    #[test]
    fn failing_hook_rejects() {
        let log = HookLog::new();
        let def = Logged::new("a", &log)
            .failing(HookName::CanLoad, "error in canLoad")
            .definition();
        let err = tokio_test::block_on(def.create().can_load(&ctx()).unwrap()).unwrap_err();
        assert_eq!(err.to_string(), "error in canLoad");
    }

    #[test]
    fn async_mode_is_pending() {
        let log = HookLog::new();
        let def = Logged::new("a", &log)
            .with_mode(HookMode::Async { yields: 2 })
            .definition();
        let hook = def.create().attached().unwrap();
        assert!(!hook.is_ready());
    }

    #[test]
    fn counts_instances() {
        let log = HookLog::new();
        let builder = Logged::new("a", &log);
        let def = builder.definition();
        def.create();
        def.create();
        assert_eq!(builder.created(), 2);
    }

    #[test]
    fn inert_has_no_hooks() {
        let inert = Inert::factory("x")();
        assert_eq!(inert.name(), "x");
        assert!(inert.attached().is_none());
    }
}
