//! # viewport-router
//!
//! A viewport-tree router with a policy-driven navigation transition engine.
//!
//! Given a navigation instruction (a URL like `users/user(42)+menu@side` or an
//! instruction object graph), the router works out which routed components
//! leave and which enter, and runs their hooks in a well-defined order:
//!
//! ```text
//! canUnload → canLoad → unload → load → detaching/unbinding/dispose
//!                                     → binding/bound/attaching/attached
//! ```
//!
//! Hooks may complete synchronously or asynchronously. Synchronous hooks never
//! introduce a suspension point, so a fully synchronous navigation has one
//! exact hook order; asynchronous hooks interleave within documented batches.
//!
//! ## Core Systems
//!
//! - **[`instruction`]**: Instruction model, logos tokenizer, parser, stringifier
//! - **[`viewport`]**: Slotmap-backed viewport tree
//! - **[`component`]**: Component contract, awaitables, definitions, resolver
//! - **[`transition`]**: Resolve, plan, hook invoker, runner
//! - **[`router`]**: Router facade: queue, history, guards, menus, events
//! - **[`options`]**: Deferral juncture, swap strategy, hook timeout
//! - **[`error`]**: Error taxonomy
//! - **[`testing`]**: Hook recorder and Pilot

// Foundation
pub mod error;
pub mod options;

// Data model
pub mod component;
pub mod instruction;
pub mod viewport;

// Engine
pub mod router;
pub mod transition;

// Test tooling
pub mod testing;

pub use component::{
    Component, ComponentDefinition, ComponentRegistry, ComponentResolver, GuardOutcome, Hook,
    HookName, NavigationContext, Routable, ViewController,
};
pub use error::{NavigationHookError, ParseError, RouterError};
pub use instruction::{parse, parse_url, stringify, InstructionTree, ViewportInstruction};
pub use options::{DeferUntil, RouterOptions, SwapStrategy};
pub use router::{LoadOptions, Router, RouterEvent};
pub use viewport::{ViewportFlags, ViewportOptions};
