//! Pilot: drive a router and read back the hooks it called.
//!
//! The `Pilot` owns a [`Router`] built from [`Logged`] components and the
//! [`HookLog`] they write to. Each driving method sets the log phase first,
//! so entries read `"<phase>.<component>.<hook>"`.

use crate::component::ComponentRegistry;
use crate::error::RouterError;
use crate::instruction::NavigationInstruction;
use crate::options::RouterOptions;
use crate::router::{LoadOptions, Router};

use super::recorder::{HookLog, Logged};

// ---------------------------------------------------------------------------
// Pilot
// ---------------------------------------------------------------------------

/// A headless router driver for testing.
///
/// # Examples
///
/// ```ignore
/// use viewport_router::testing::{HookLog, Logged, Pilot};
///
/// let log = HookLog::new();
/// let pilot = Pilot::build(
///     &log,
///     Logged::new("app", &log).with_viewport("main"),
///     [Logged::new("home", &log)],
///     Default::default(),
/// );
/// pilot.start().await?;
/// pilot.load("go", "home").await?;
/// assert!(pilot.take().contains(&"go.home.attached".to_string()));
/// ```
pub struct Pilot {
    router: Router,
    log: HookLog,
}

impl Pilot {
    /// Wrap an existing router.
    pub fn new(router: Router, log: &HookLog) -> Self {
        Self {
            router,
            log: log.clone(),
        }
    }

    /// Build a router whose root is `root` and whose registry holds `components`.
    pub fn build(
        log: &HookLog,
        root: Logged,
        components: impl IntoIterator<Item = Logged>,
        options: RouterOptions,
    ) -> Self {
        let registry = components
            .into_iter()
            .fold(ComponentRegistry::new(), |registry, c| registry.with(c.definition()));
        Self::new(Router::new(root.definition(), registry, options), log)
    }

    // ── Driving ──────────────────────────────────────────────────────

    pub async fn start(&self) -> Result<(), RouterError> {
        self.log.set_phase("start");
        self.router.start().await
    }

    pub async fn stop(&self) -> Result<(), RouterError> {
        self.log.set_phase("stop");
        self.router.stop().await
    }

    /// Load `instruction`, logging under `phase`.
    pub async fn load(
        &self,
        phase: &str,
        instruction: impl Into<NavigationInstruction>,
    ) -> Result<bool, RouterError> {
        self.log.set_phase(phase);
        self.router.load(instruction).await
    }

    pub async fn load_with(
        &self,
        phase: &str,
        instruction: impl Into<NavigationInstruction>,
        options: LoadOptions,
    ) -> Result<bool, RouterError> {
        self.log.set_phase(phase);
        self.router.load_with(instruction, options).await
    }

    pub async fn back(&self, phase: &str) -> Result<bool, RouterError> {
        self.log.set_phase(phase);
        self.router.back().await
    }

    pub async fn forward(&self, phase: &str) -> Result<bool, RouterError> {
        self.log.set_phase(phase);
        self.router.forward().await
    }

    // ── Query ────────────────────────────────────────────────────────

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn log(&self) -> &HookLog {
        &self.log
    }

    /// Drain the hook log.
    pub fn take(&self) -> Vec<String> {
        self.log.take()
    }

    pub fn url(&self) -> String {
        self.router.url()
    }

    /// Indented dump of the viewport tree.
    pub fn tree(&self) -> String {
        self.router.viewports().debug_tree()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
