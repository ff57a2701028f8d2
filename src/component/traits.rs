//! Component contract: routing hooks, controller lifecycle, guard outcomes.
//!
//! A routed component implements whichever hooks it cares about. Every trait
//! method has a default returning `None`, which the invoker reads as "hook not
//! implemented" and answers with a neutral value. Implemented hooks return
//! `Some(Awaitable)`, ready for synchronous work or pending for async work.

use std::future::Future;

use super::awaitable::Awaitable;
use crate::instruction::{Parameters, ViewportInstruction};
use crate::viewport::ViewportPath;

/// What an implemented hook returns.
pub type Hook<T> = Option<Awaitable<anyhow::Result<T>>>;

/// An implemented hook that finished synchronously with `value`.
pub fn resolved<T>(value: T) -> Hook<T> {
    Some(Awaitable::ready(Ok(value)))
}

/// An implemented hook that failed synchronously.
pub fn rejected<T>(error: anyhow::Error) -> Hook<T> {
    Some(Awaitable::ready(Err(error)))
}

/// An implemented hook that completes when `future` does.
pub fn deferred<T, F>(future: F) -> Hook<T>
where
    F: Future<Output = anyhow::Result<T>> + 'static,
{
    Some(Awaitable::pending(future))
}

// ---------------------------------------------------------------------------
// GuardOutcome
// ---------------------------------------------------------------------------

/// Result of a guard (`canLoad`, `canUnload`, registered guards).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Continue the navigation.
    Allow,
    /// Abort the navigation without error.
    Block,
    /// Abort and navigate to these instructions instead.
    Redirect(Vec<ViewportInstruction>),
    /// Abort and navigate to this URL instead.
    RedirectUrl(String),
}

impl GuardOutcome {
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect(_) | Self::RedirectUrl(_))
    }

    /// Collapse unusable redirects (empty list or empty URL) into `Block`.
    pub fn normalize(self, source: &str) -> Self {
        match self {
            Self::Redirect(list) if list.is_empty() => {
                tracing::warn!(source, "guard returned an empty redirect; blocking");
                Self::Block
            }
            Self::RedirectUrl(url) if url.trim().is_empty() => {
                tracing::warn!(source, "guard returned an empty redirect url; blocking");
                Self::Block
            }
            other => other,
        }
    }
}

impl From<bool> for GuardOutcome {
    fn from(allow: bool) -> Self {
        if allow {
            Self::Allow
        } else {
            Self::Block
        }
    }
}

impl From<&str> for GuardOutcome {
    fn from(url: &str) -> Self {
        Self::RedirectUrl(url.to_owned())
    }
}

impl From<String> for GuardOutcome {
    fn from(url: String) -> Self {
        Self::RedirectUrl(url)
    }
}

impl From<ViewportInstruction> for GuardOutcome {
    fn from(instruction: ViewportInstruction) -> Self {
        Self::Redirect(vec![instruction])
    }
}

impl From<Vec<ViewportInstruction>> for GuardOutcome {
    fn from(instructions: Vec<ViewportInstruction>) -> Self {
        Self::Redirect(instructions)
    }
}

// ---------------------------------------------------------------------------
// NavigationContext
// ---------------------------------------------------------------------------

/// Arguments of the routing hooks: `(params, next, current)` plus the target
/// viewport and the transition id.
#[derive(Debug, Clone)]
pub struct NavigationContext {
    pub params: Parameters,
    /// The instruction entering the viewport, if any.
    pub next: Option<ViewportInstruction>,
    /// The instruction leaving the viewport, if any.
    pub current: Option<ViewportInstruction>,
    pub viewport: ViewportPath,
    pub transition: u64,
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Routing hooks. All optional.
pub trait Routable {
    fn can_load(&self, _ctx: &NavigationContext) -> Hook<GuardOutcome> {
        None
    }

    fn load(&self, _ctx: &NavigationContext) -> Hook<()> {
        None
    }

    fn can_unload(&self, _ctx: &NavigationContext) -> Hook<GuardOutcome> {
        None
    }

    fn unload(&self, _ctx: &NavigationContext) -> Hook<()> {
        None
    }
}

/// Controller lifecycle, driven by the templating collaborator. All optional.
pub trait ViewController {
    fn binding(&self) -> Hook<()> {
        None
    }

    fn bound(&self) -> Hook<()> {
        None
    }

    fn attaching(&self) -> Hook<()> {
        None
    }

    fn attached(&self) -> Hook<()> {
        None
    }

    fn detaching(&self) -> Hook<()> {
        None
    }

    fn unbinding(&self) -> Hook<()> {
        None
    }

    fn dispose(&self) -> Hook<()> {
        None
    }
}

/// A routed component instance.
pub trait Component: Routable + ViewController {
    /// The registered component name.
    fn name(&self) -> &str;
}
