//! Component contract: hooks, awaitables, definitions, resolver.

pub mod awaitable;
pub mod hooks;
pub mod registry;
pub mod traits;

pub use awaitable::Awaitable;
pub use hooks::HookName;
pub use registry::{ComponentDefinition, ComponentRegistry, ComponentResolver};
pub use traits::{
    deferred, rejected, resolved, Component, GuardOutcome, Hook, NavigationContext, Routable,
    ViewController,
};
