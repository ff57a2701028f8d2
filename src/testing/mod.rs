//! Headless testing framework: hook recorder, interleave comparator, Pilot.
//!
//! Use [`Logged`] to build components that record every hook call into a
//! shared [`HookLog`], the [`Pilot`] to drive a router built from them, and
//! [`assert_interleaving`] to check logs produced by concurrent hook chains.

pub mod interleave;
pub mod pilot;
pub mod recorder;

pub use interleave::{assert_interleaving, is_interleaving};
pub use pilot::Pilot;
pub use recorder::{HookBehavior, HookLog, HookMode, Inert, Logged};
