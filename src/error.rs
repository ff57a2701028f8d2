//! Error taxonomy: parse errors, hook errors, router errors.
//!
//! Guard blocks are not errors: a blocked navigation resolves to `Ok(false)`.
//! Everything that rejects a navigation is a [`RouterError`].

use std::fmt;
use std::rc::Rc;

use crate::component::HookName;

// ---------------------------------------------------------------------------
// ParseError
// ---------------------------------------------------------------------------

/// Errors from parsing or validating a navigation instruction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected token at position {position}: {message}")]
    UnexpectedToken { position: usize, message: String },
    #[error("unexpected end of input: {0}")]
    UnexpectedEof(String),
    #[error("malformed parameter in '{segment}': {message}")]
    MalformedParameter { segment: String, message: String },
    #[error("viewport '{viewport}' is targeted more than once at the same level")]
    DuplicateViewport { viewport: String },
    #[error("invalid instruction: {0}")]
    InvalidInstruction(String),
}

// ---------------------------------------------------------------------------
// NavigationHookError
// ---------------------------------------------------------------------------

/// A routed hook threw, rejected, or timed out.
///
/// Carries the failing component and hook next to the original error. The
/// original is shared (`Rc`) so the runner can remember it and re-surface it
/// later while the caller of `load` still receives its own copy.
#[derive(Clone)]
pub struct NavigationHookError {
    component: String,
    hook: HookName,
    source: Rc<anyhow::Error>,
}

impl NavigationHookError {
    pub fn new(component: impl Into<String>, hook: HookName, source: anyhow::Error) -> Self {
        Self {
            component: component.into(),
            hook,
            source: Rc::new(source),
        }
    }

    /// Name of the component whose hook failed.
    pub fn component(&self) -> &str {
        &self.component
    }

    /// The hook that failed.
    pub fn hook(&self) -> HookName {
        self.hook
    }

    /// The original error returned by the hook.
    pub fn original(&self) -> &anyhow::Error {
        &self.source
    }
}

impl fmt::Display for NavigationHookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hook '{}' of component '{}' failed: {}",
            self.hook, self.component, self.source
        )
    }
}

impl fmt::Debug for NavigationHookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationHookError")
            .field("component", &self.component)
            .field("hook", &self.hook)
            .field("source", &self.source)
            .finish()
    }
}

impl std::error::Error for NavigationHookError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        let inner: &(dyn std::error::Error + Send + Sync + 'static) = (*self.source).as_ref();
        Some(inner)
    }
}

// ---------------------------------------------------------------------------
// RouterError
// ---------------------------------------------------------------------------

/// Everything that can make a navigation or a router lifecycle call fail.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RouterError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Hook(#[from] NavigationHookError),
    #[error("redirect loop detected after {redirects} redirect(s): target '{target}'")]
    RedirectLoop { target: String, redirects: usize },
    #[error("component '{component}' is not allowed in viewport '{viewport}'")]
    NotAllowed { component: String, viewport: String },
    #[error("viewport '{viewport}' does not exist under '{parent}'")]
    UnknownViewport { viewport: String, parent: String },
    #[error("no free viewport for component '{component}'")]
    NoAvailableViewport { component: String },
    #[error("router has not been started")]
    NotStarted,
    #[error("router is already started")]
    AlreadyStarted,
}

impl RouterError {
    /// The hook error wrapped by this error, if any.
    pub fn as_hook_error(&self) -> Option<&NavigationHookError> {
        match self {
            Self::Hook(err) => Some(err),
            _ => None,
        }
    }
}
