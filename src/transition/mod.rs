//! Transition engine: resolve, plan, invoke hooks, run.
//!
//! A navigation flows through these modules in order:
//!
//! 1. [`resolve`] merges the parsed request into the current tree,
//! 2. [`plan`] diffs the current tree against the target,
//! 3. [`runner`] walks the plan, calling hooks through the [`invoker`],
//! 4. [`state`] tracks the status of the attempt.

pub mod invoker;
pub mod plan;
pub mod resolve;
pub mod runner;
pub mod state;

pub use invoker::HookInvoker;
pub use plan::{plan, Change, Phase, PlanNode, PlanStep, TransitionPlan};
pub use resolve::{resolve, Resolved};
pub use runner::{RunOutcome, TransitionRunner};
pub use state::{Transition, TransitionStatus};
