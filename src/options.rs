//! Router configuration: deferral juncture, swap strategy, hook timeout.
//!
//! [`RouterOptions`] is supplied when the router is constructed and is
//! snapshotted into every transition, so changing options never affects a
//! transition that is already running.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Upper bound on redirects followed by a single navigation.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Errors from parsing option values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionsError {
    #[error("unknown deferral juncture '{0}' (expected 'none' or 'load-hooks')")]
    UnknownDeferral(String),
    #[error(
        "unknown swap strategy '{0}' (expected 'parallel-remove-first', \
         'sequential-remove-first' or 'sequential-add-first')"
    )]
    UnknownSwapStrategy(String),
}

// ---------------------------------------------------------------------------
// DeferUntil
// ---------------------------------------------------------------------------

/// When the attach sequence of a newly entering parent may start relative to
/// its children's `canLoad`/`load` hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeferUntil {
    /// A component attaches right after its own `load`, without waiting for
    /// its children.
    #[default]
    None,
    /// A parent attaches only after all of its entering descendants have
    /// resolved `load`; children attach nested inside the parent's attach.
    LoadHooks,
}

impl DeferUntil {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::LoadHooks => "load-hooks",
        }
    }
}

impl fmt::Display for DeferUntil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeferUntil {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "none" => Ok(Self::None),
            "load-hooks" => Ok(Self::LoadHooks),
            other => Err(OptionsError::UnknownDeferral(other.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// SwapStrategy
// ---------------------------------------------------------------------------

/// Ordering of the outgoing detach sequence versus the incoming attach
/// sequence in a viewport whose content is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SwapStrategy {
    /// Both sequences run interleaved, detach started first. With synchronous
    /// hooks this is indistinguishable from [`SwapStrategy::SequentialRemoveFirst`].
    ParallelRemoveFirst,
    /// Detach completes before attach starts.
    #[default]
    SequentialRemoveFirst,
    /// Attach completes before detach starts.
    SequentialAddFirst,
}

impl SwapStrategy {
    pub const ALL: [SwapStrategy; 3] = [
        Self::ParallelRemoveFirst,
        Self::SequentialRemoveFirst,
        Self::SequentialAddFirst,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ParallelRemoveFirst => "parallel-remove-first",
            Self::SequentialRemoveFirst => "sequential-remove-first",
            Self::SequentialAddFirst => "sequential-add-first",
        }
    }
}

impl fmt::Display for SwapStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SwapStrategy {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "parallel-remove-first" => Ok(Self::ParallelRemoveFirst),
            "sequential-remove-first" => Ok(Self::SequentialRemoveFirst),
            "sequential-add-first" => Ok(Self::SequentialAddFirst),
            other => Err(OptionsError::UnknownSwapStrategy(other.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// RouterOptions
// ---------------------------------------------------------------------------

/// Configuration for a [`Router`](crate::router::Router).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterOptions {
    /// Deferral juncture for attach sequences.
    pub defer_until: DeferUntil,
    /// Swap ordering for replaced viewports.
    pub swap_strategy: SwapStrategy,
    /// Maximum wait for a single pending hook. `None` waits indefinitely.
    pub hook_timeout: Option<Duration>,
    /// Maximum number of redirects one navigation may follow.
    pub max_redirects: usize,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            defer_until: DeferUntil::default(),
            swap_strategy: SwapStrategy::default(),
            hook_timeout: None,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

impl RouterOptions {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the deferral juncture (builder).
    pub fn with_defer_until(mut self, defer_until: DeferUntil) -> Self {
        self.defer_until = defer_until;
        self
    }

    /// Set the swap strategy (builder).
    pub fn with_swap_strategy(mut self, swap_strategy: SwapStrategy) -> Self {
        self.swap_strategy = swap_strategy;
        self
    }

    /// Bound every pending hook by `timeout` (builder).
    pub fn with_hook_timeout(mut self, timeout: Duration) -> Self {
        self.hook_timeout = Some(timeout);
        self
    }

    /// Set the redirect limit (builder).
    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = RouterOptions::default();
        assert_eq!(options.defer_until, DeferUntil::None);
        assert_eq!(options.swap_strategy, SwapStrategy::SequentialRemoveFirst);
        assert_eq!(options.hook_timeout, None);
        assert_eq!(options.max_redirects, DEFAULT_MAX_REDIRECTS);
    }

    #[test]
    fn builder_chain() {
        let options = RouterOptions::new()
            .with_defer_until(DeferUntil::LoadHooks)
            .with_swap_strategy(SwapStrategy::SequentialAddFirst)
            .with_hook_timeout(Duration::from_millis(50))
            .with_max_redirects(2);
        assert_eq!(options.defer_until, DeferUntil::LoadHooks);
        assert_eq!(options.swap_strategy, SwapStrategy::SequentialAddFirst);
        assert_eq!(options.hook_timeout, Some(Duration::from_millis(50)));
        assert_eq!(options.max_redirects, 2);
    }

    #[test]
    fn swap_strategy_parses_its_own_display() {
        for strategy in SwapStrategy::ALL {
            assert_eq!(strategy.to_string().parse::<SwapStrategy>(), Ok(strategy));
        }
    }

    #[test]
    fn defer_until_parses() {
        assert_eq!("none".parse::<DeferUntil>(), Ok(DeferUntil::None));
        assert_eq!(" load-hooks ".parse::<DeferUntil>(), Ok(DeferUntil::LoadHooks));
    }

    #[test]
    fn unknown_values_are_rejected() {
        assert_eq!(
            "eager".parse::<DeferUntil>(),
            Err(OptionsError::UnknownDeferral("eager".into()))
        );
        assert!(matches!(
            "random".parse::<SwapStrategy>(),
            Err(OptionsError::UnknownSwapStrategy(_))
        ));
    }
}
