//! Router facade: start/stop, navigation queue, history, guards, menus, events.
//!
//! [`Router`] owns the viewport tree and the [`TransitionRunner`]. Every
//! navigation takes a FIFO lock, so overlapping `load` calls run one after
//! another in call order and never preempt each other. A hook that awaits a
//! nested `load` on the same router therefore waits forever.

pub mod events;
pub mod guardian;
pub mod history;
pub mod nav;

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use tracing::Instrument;

use crate::component::{ComponentDefinition, ComponentResolver, GuardOutcome, Hook};
use crate::error::RouterError;
use crate::instruction::{
    parse, InstructionTree, NavigationInstruction, ViewportInstruction,
};
use crate::options::RouterOptions;
use crate::transition::{RunOutcome, Transition, TransitionRunner, TransitionStatus};
use crate::viewport::ViewportTree;

pub use events::{RouterEvent, SubscriptionId};
pub use guardian::{GuardId, GuardMatch, GuardTarget, Guardian};
pub use history::{History, HistoryEntry};
pub use nav::{Nav, NavRoute};

/// `tracing` targets used by the crate.
pub mod targets {
    /// Router lifecycle and navigation spans.
    pub const ROUTER: &str = "viewport_router::router";
    /// Transition status changes, plans, redirects.
    pub const TRANSITION: &str = "viewport_router::transition";
    /// Individual hook calls.
    pub const HOOKS: &str = "viewport_router::hooks";
}

// ---------------------------------------------------------------------------
// LoadOptions
// ---------------------------------------------------------------------------

/// Per-navigation options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Start from an empty tree instead of merging into the current one.
    pub replace: bool,
    /// Title stored with the history entry.
    pub title: Option<String>,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace instead of merge (builder).
    pub fn replace(mut self, replace: bool) -> Self {
        self.replace = replace;
        self
    }

    /// Set the history title (builder).
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// What a committed navigation does to the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HistoryMove {
    Push,
    Go(isize),
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// The router instance. Single-threaded: keep it on one task (or use a
/// `LocalSet`) and share it by reference or `Rc`.
pub struct Router {
    tree: Rc<RefCell<ViewportTree>>,
    runner: TransitionRunner,
    options: RefCell<RouterOptions>,
    /// Id of the last transition that took the lock.
    queue: tokio::sync::Mutex<Option<u64>>,
    next_id: Cell<u64>,
    started: Cell<bool>,
    last: RefCell<Option<Transition>>,
    guardian: Guardian,
    history: RefCell<History>,
    navs: RefCell<Vec<Nav>>,
    subscribers: RefCell<events::Subscribers>,
}

impl Router {
    pub fn new(
        root: ComponentDefinition,
        resolver: impl ComponentResolver + 'static,
        options: RouterOptions,
    ) -> Self {
        let tree = Rc::new(RefCell::new(ViewportTree::new()));
        let runner = TransitionRunner::new(Rc::clone(&tree), Rc::new(resolver), Rc::new(root));
        Self {
            tree,
            runner,
            options: RefCell::new(options),
            queue: tokio::sync::Mutex::new(None),
            next_id: Cell::new(0),
            started: Cell::new(false),
            last: RefCell::new(None),
            guardian: Guardian::new(),
            history: RefCell::new(History::new()),
            navs: RefCell::new(Vec::new()),
            subscribers: RefCell::new(events::Subscribers::default()),
        }
    }

    fn next_id(&self) -> u64 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Attach the root component, create its viewports and load their
    /// default components.
    pub async fn start(&self) -> Result<(), RouterError> {
        if self.started.get() {
            return Err(RouterError::AlreadyStarted);
        }
        {
            let mut queue = self.queue.lock().await;
            let id = self.next_id();
            *queue = Some(id);
            let options = self.options.borrow().clone();
            let span = tracing::debug_span!(target: targets::ROUTER, "start", transition = id);
            self.runner.activate(id, &options).instrument(span).await?;
            self.started.set(true);
        }
        tracing::info!(target: targets::ROUTER, root = self.runner.root().name(), "router started");

        self.navigate(InstructionTree::empty(), false, None, HistoryMove::Push)
            .await?;
        if self.history.borrow().is_empty() {
            let entry = self.history_entry(None);
            self.history.borrow_mut().push(entry);
        }
        Ok(())
    }

    /// Detach and dispose everything, root included.
    ///
    /// Reports a commit error remembered from an earlier navigation.
    pub async fn stop(&self) -> Result<(), RouterError> {
        if !self.started.get() {
            return Err(RouterError::NotStarted);
        }
        let mut queue = self.queue.lock().await;
        let id = self.next_id();
        *queue = Some(id);
        self.started.set(false);

        let options = self.options.borrow().clone();
        let span = tracing::debug_span!(target: targets::ROUTER, "stop", transition = id);
        let result = self.runner.deactivate(id, &options).instrument(span).await;

        self.history.borrow_mut().clear();
        self.refresh_navs();
        tracing::info!(target: targets::ROUTER, ok = result.is_ok(), "router stopped");
        result
    }

    pub fn is_started(&self) -> bool {
        self.started.get()
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    /// Navigate, merging into the current tree.
    ///
    /// `Ok(true)` when committed, `Ok(false)` when a guard blocked it.
    pub async fn load(
        &self,
        instruction: impl Into<NavigationInstruction>,
    ) -> Result<bool, RouterError> {
        self.load_with(instruction, LoadOptions::default()).await
    }

    /// Alias of [`Router::load`].
    pub async fn goto(
        &self,
        instruction: impl Into<NavigationInstruction>,
    ) -> Result<bool, RouterError> {
        self.load(instruction).await
    }

    pub async fn load_with(
        &self,
        instruction: impl Into<NavigationInstruction>,
        options: LoadOptions,
    ) -> Result<bool, RouterError> {
        let request = parse(instruction)?;
        if !self.started.get() {
            return Err(RouterError::NotStarted);
        }
        self.navigate(request, options.replace, options.title, HistoryMove::Push)
            .await
    }

    /// Go to the previous history entry. `Ok(false)` if there is none.
    pub async fn back(&self) -> Result<bool, RouterError> {
        self.traverse(-1).await
    }

    /// Go to the next history entry. `Ok(false)` if there is none.
    pub async fn forward(&self) -> Result<bool, RouterError> {
        self.traverse(1).await
    }

    async fn traverse(&self, delta: isize) -> Result<bool, RouterError> {
        if !self.started.get() {
            return Err(RouterError::NotStarted);
        }
        let entry = self.history.borrow().peek(delta).cloned();
        let Some(entry) = entry else {
            return Ok(false);
        };
        self.navigate(entry.tree, true, entry.title, HistoryMove::Go(delta))
            .await
    }

    async fn navigate(
        &self,
        request: InstructionTree,
        replace: bool,
        title: Option<String>,
        history: HistoryMove,
    ) -> Result<bool, RouterError> {
        let mut queue = self.queue.lock().await;
        // `stop` may have run while this navigation waited for the queue.
        if !self.started.get() {
            return Err(RouterError::NotStarted);
        }
        let id = self.next_id();
        let previous = self.tree.borrow().snapshot();
        let options = self.options.borrow().clone();
        let mut transition = Transition::new(id, previous, request.clone(), options, *queue);
        *queue = Some(id);

        let instruction = request.to_string();
        self.emit(RouterEvent::NavigationStart {
            id,
            instruction: instruction.clone(),
        });
        let guardian = self.guardian.clone();
        let span = tracing::debug_span!(
            target: targets::ROUTER,
            "navigation",
            transition = id,
            instruction = %instruction,
            replace
        );
        let result = self
            .runner
            .run(&mut transition, request, replace, &guardian)
            .instrument(span)
            .await;

        let outcome = match result {
            Ok(RunOutcome::Blocked) => {
                self.emit(RouterEvent::NavigationCancel { id, instruction });
                Ok(false)
            }
            Ok(RunOutcome::Committed {
                record_history,
                remembered,
            }) => {
                match history {
                    HistoryMove::Push if record_history => {
                        let entry = self.history_entry(title);
                        self.history.borrow_mut().push(entry);
                    }
                    HistoryMove::Push => {}
                    HistoryMove::Go(delta) => {
                        self.history.borrow_mut().go(delta);
                    }
                }
                self.refresh_navs();
                match remembered {
                    Some(err) => {
                        let error = RouterError::from(err);
                        self.emit(RouterEvent::NavigationError {
                            id,
                            instruction,
                            error: error.clone(),
                        });
                        Err(error)
                    }
                    None => {
                        self.emit(RouterEvent::NavigationEnd {
                            id,
                            instruction,
                            url: self.url(),
                        });
                        Ok(true)
                    }
                }
            }
            Err(error) => {
                tracing::warn!(target: targets::ROUTER, transition = id, %error, "navigation failed");
                self.emit(RouterEvent::NavigationError {
                    id,
                    instruction,
                    error: error.clone(),
                });
                Err(error)
            }
        };

        *self.last.borrow_mut() = Some(transition);
        outcome
    }

    fn history_entry(&self, title: Option<String>) -> HistoryEntry {
        HistoryEntry {
            tree: self.tree.borrow().snapshot(),
            url: self.url(),
            title,
        }
    }

    // -----------------------------------------------------------------------
    // Guards
    // -----------------------------------------------------------------------

    /// Register a guard consulted after `canUnload` and before `canLoad`.
    pub fn add_guard(
        &self,
        guard: impl Fn(&[ViewportInstruction]) -> Hook<GuardOutcome> + 'static,
        target: GuardTarget,
    ) -> GuardId {
        self.guardian.add_guard(guard, target)
    }

    pub fn remove_guard(&self, id: GuardId) -> bool {
        self.guardian.remove_guard(id)
    }

    /// A handle on the registered guards. Guards added through it apply to
    /// this router.
    pub fn guardian(&self) -> Guardian {
        self.guardian.clone()
    }

    // -----------------------------------------------------------------------
    // Menus
    // -----------------------------------------------------------------------

    /// Add a menu. An existing menu with the same name is replaced.
    pub fn add_nav(&self, name: impl Into<String>, routes: Vec<NavRoute>) {
        let mut nav = Nav::new(name, routes);
        nav.refresh(&self.current());
        let mut navs = self.navs.borrow_mut();
        match navs.iter_mut().find(|n| n.name == nav.name) {
            Some(existing) => *existing = nav,
            None => navs.push(nav),
        }
    }

    /// Replace the routes of a menu, creating it if needed.
    pub fn set_nav(&self, name: impl Into<String>, routes: Vec<NavRoute>) {
        self.add_nav(name, routes);
    }

    pub fn nav(&self, name: &str) -> Option<Nav> {
        self.navs.borrow().iter().find(|n| n.name == name).cloned()
    }

    fn refresh_navs(&self) {
        let current = self.current();
        for nav in self.navs.borrow_mut().iter_mut() {
            nav.refresh(&current);
        }
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    pub fn subscribe(&self, listener: impl Fn(&RouterEvent) + 'static) -> SubscriptionId {
        self.subscribers.borrow_mut().subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.borrow_mut().unsubscribe(id)
    }

    fn emit(&self, event: RouterEvent) {
        tracing::trace!(target: targets::ROUTER, event = %event, "emit");
        let listeners = self.subscribers.borrow().listeners();
        for listener in listeners {
            listener(&event);
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// What is loaded, every viewport named.
    pub fn current(&self) -> InstructionTree {
        self.tree.borrow().snapshot()
    }

    /// Canonical URL of what is loaded. `NO_LINK` viewports are left out.
    pub fn url(&self) -> String {
        self.tree.borrow().link_tree().to_string()
    }

    /// Read access to the live tree. Do not hold across an `.await`.
    pub fn viewports(&self) -> Ref<'_, ViewportTree> {
        self.tree.borrow()
    }

    /// The most recent transition, finished or not.
    pub fn last_transition(&self) -> Option<Transition> {
        self.last.borrow().clone()
    }

    /// Status of the most recent transition.
    pub fn last_status(&self) -> Option<TransitionStatus> {
        self.last.borrow().as_ref().map(|t| t.status)
    }

    pub fn history(&self) -> Ref<'_, History> {
        self.history.borrow()
    }

    pub fn options(&self) -> RouterOptions {
        self.options.borrow().clone()
    }

    /// New options apply from the next transition on.
    pub fn set_options(&self, options: RouterOptions) {
        *self.options.borrow_mut() = options;
    }
}
