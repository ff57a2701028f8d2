//! Hook invoker: probe, call, await, tag errors.
//!
//! Missing hooks answer with a neutral value, ready values are consumed on the
//! spot, and only pending hooks suspend the caller. Failures come back as
//! [`NavigationHookError`] naming the component and the hook.

use std::time::Duration;

use crate::component::{Awaitable, Component, GuardOutcome, Hook, HookName, NavigationContext};
use crate::error::NavigationHookError;
use crate::router::targets;

/// Calls hooks on behalf of one transition.
#[derive(Debug, Clone, Copy)]
pub struct HookInvoker {
    transition: u64,
    timeout: Option<Duration>,
}

impl HookInvoker {
    pub fn new(transition: u64, timeout: Option<Duration>) -> Self {
        Self {
            transition,
            timeout,
        }
    }

    pub fn transition(&self) -> u64 {
        self.transition
    }

    pub async fn can_load(
        &self,
        component: &dyn Component,
        ctx: &NavigationContext,
    ) -> Result<GuardOutcome, NavigationHookError> {
        let outcome = self
            .settle(component.name(), HookName::CanLoad, component.can_load(ctx), GuardOutcome::Allow)
            .await?;
        Ok(outcome.normalize(component.name()))
    }

    pub async fn can_unload(
        &self,
        component: &dyn Component,
        ctx: &NavigationContext,
    ) -> Result<GuardOutcome, NavigationHookError> {
        let outcome = self
            .settle(component.name(), HookName::CanUnload, component.can_unload(ctx), GuardOutcome::Allow)
            .await?;
        Ok(outcome.normalize(component.name()))
    }

    pub async fn load(
        &self,
        component: &dyn Component,
        ctx: &NavigationContext,
    ) -> Result<(), NavigationHookError> {
        self.settle(component.name(), HookName::Load, component.load(ctx), ())
            .await
    }

    pub async fn unload(
        &self,
        component: &dyn Component,
        ctx: &NavigationContext,
    ) -> Result<(), NavigationHookError> {
        self.settle(component.name(), HookName::Unload, component.unload(ctx), ())
            .await
    }

    /// One of the controller lifecycle hooks (`binding` .. `dispose`).
    pub async fn lifecycle(
        &self,
        component: &dyn Component,
        hook: HookName,
    ) -> Result<(), NavigationHookError> {
        let probe = match hook {
            HookName::Binding => component.binding(),
            HookName::Bound => component.bound(),
            HookName::Attaching => component.attaching(),
            HookName::Attached => component.attached(),
            HookName::Detaching => component.detaching(),
            HookName::Unbinding => component.unbinding(),
            HookName::Dispose => component.dispose(),
            routing => {
                tracing::warn!(target: targets::HOOKS, hook = %routing, "not a lifecycle hook");
                None
            }
        };
        self.settle(component.name(), hook, probe, ()).await
    }

    /// A hook registered outside any component (router guards).
    pub async fn guard(
        &self,
        source: &str,
        probe: Hook<GuardOutcome>,
    ) -> Result<GuardOutcome, NavigationHookError> {
        let outcome = self
            .settle(source, HookName::CanLoad, probe, GuardOutcome::Allow)
            .await?;
        Ok(outcome.normalize(source))
    }

    async fn settle<T>(
        &self,
        component: &str,
        hook: HookName,
        probe: Hook<T>,
        neutral: T,
    ) -> Result<T, NavigationHookError> {
        let Some(awaitable) = probe else {
            return Ok(neutral);
        };
        tracing::trace!(
            target: targets::HOOKS,
            transition = self.transition,
            component,
            %hook,
            ready = awaitable.is_ready(),
            "invoke"
        );

        let result = match awaitable.try_into_ready() {
            Ok(value) => value,
            Err(pending) => self.wait(pending).await,
        };

        result.map_err(|source| {
            tracing::debug!(
                target: targets::HOOKS,
                transition = self.transition,
                component,
                %hook,
                error = %source,
                "hook failed"
            );
            NavigationHookError::new(component, hook, source)
        })
    }

    async fn wait<T>(&self, pending: Awaitable<anyhow::Result<T>>) -> anyhow::Result<T> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, pending)
                .await
                .unwrap_or_else(|_| Err(anyhow::anyhow!("timed out after {limit:?}"))),
            None => pending.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::Parameters;
    use crate::testing::recorder::{HookBehavior, HookLog, HookMode, Inert, Logged};
    use crate::viewport::ViewportPath;
    use tokio_test::{assert_pending, task};

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
    fn missing_hooks_are_neutral() {
        let inert = Inert::new("x");
        let invoker = HookInvoker::new(1, None);
        let outcome = tokio_test::block_on(invoker.can_load(&inert, &ctx())).unwrap();
        assert_eq!(outcome, GuardOutcome::Allow);
        tokio_test::block_on(invoker.lifecycle(&inert, HookName::Binding)).unwrap();
    }

    #[test]
    fn sync_hooks_complete_on_first_poll() {
        let log = HookLog::new();
        let component = Logged::new("a", &log).definition().create();
        let invoker = HookInvoker::new(1, None);
        let mut fut = task::spawn(invoker.lifecycle(component.as_ref(), HookName::Attached));
        assert!(fut.poll().is_ready());
        assert_eq!(log.entries(), vec!["a.attached"]);
    }

    #[test]
    fn async_hooks_suspend() {
        let log = HookLog::new();
        let component = Logged::new("a", &log)
            .with_mode(HookMode::Async { yields: 1 })
            .definition()
            .create();
        let invoker = HookInvoker::new(1, None);
        let binding = ctx();
        let mut fut = task::spawn(invoker.load(component.as_ref(), &binding));
        assert_pending!(fut.poll());
    }

    #[test]
    fn errors_are_tagged() {
        let log = HookLog::new();
        let component = Logged::new("a", &log)
            .failing(HookName::CanLoad, "error in canLoad")
            .definition()
            .create();
        let invoker = HookInvoker::new(1, None);
        let err = tokio_test::block_on(invoker.can_load(component.as_ref(), &ctx())).unwrap_err();
        assert_eq!(err.component(), "a");
        assert_eq!(err.hook(), HookName::CanLoad);
        assert!(err.to_string().contains("error in canLoad"));
        assert!(err.to_string().contains("canLoad"));
    }

    #[test]
    fn empty_redirect_blocks() {
        let log = HookLog::new();
        let component = Logged::new("a", &log)
            .guarding(HookName::CanUnload, GuardOutcome::Redirect(Vec::new()))
            .definition()
            .create();
        let invoker = HookInvoker::new(1, None);
        let outcome = tokio_test::block_on(invoker.can_unload(component.as_ref(), &ctx())).unwrap();
        assert_eq!(outcome, GuardOutcome::Block);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_hook_times_out() {
        let log = HookLog::new();
        let component = Logged::new("a", &log)
            .with_hook(HookName::Load, HookBehavior::Hang)
            .definition()
            .create();
        let invoker = HookInvoker::new(1, Some(Duration::from_millis(50)));
        let err = invoker.load(component.as_ref(), &ctx()).await.unwrap_err();
        assert_eq!(err.hook(), HookName::Load);
        assert!(err.to_string().contains("timed out"));
    }
}
