//! Transition runner: drives one transition through guarding and commit.
//!
//! The runner owns no scheduling policy of its own. It resolves the request,
//! asks the planner for a [`TransitionPlan`] and walks it: guard batches with
//! `join_all`, then the commit chains, mutating the [`ViewportTree`] as
//! attach sequences start and detach sequences end. The tree lives in a
//! `RefCell` that is only borrowed between awaits.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use futures::future::{join_all, LocalBoxFuture};
use futures::FutureExt;

use super::invoker::HookInvoker;
use super::plan::{plan, Change, PlanNode, TransitionPlan};
use super::resolve::{resolve, Resolved};
use super::state::{Transition, TransitionStatus};
use crate::component::{
    ComponentDefinition, ComponentResolver, GuardOutcome, HookName, NavigationContext,
};
use crate::error::{NavigationHookError, RouterError};
use crate::instruction::{parse, parse_url, InstructionTree, Parameters, ViewportInstruction};
use crate::options::{DeferUntil, RouterOptions, SwapStrategy};
use crate::router::guardian::Guardian;
use crate::router::targets;
use crate::viewport::{
    Viewport, ViewportContent, ViewportFlags, ViewportId, ViewportOptions, ViewportPath,
    ViewportTree,
};

type HookResult = Result<(), NavigationHookError>;

/// How a run ended when it did not fail.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The target is loaded.
    Committed {
        /// False when every changed viewport is `NO_HISTORY` or nothing changed.
        record_history: bool,
        /// Error left behind by an earlier failed commit, reported now.
        remembered: Option<NavigationHookError>,
    },
    /// A guard blocked the navigation. Nothing changed.
    Blocked,
}

/// A content plus the flags of the viewport it occupies or will occupy.
#[derive(Debug, Clone)]
struct Slot {
    content: ViewportContent,
    flags: ViewportFlags,
}

/// Runs transitions against a shared viewport tree.
pub struct TransitionRunner {
    tree: Rc<RefCell<ViewportTree>>,
    resolver: Rc<dyn ComponentResolver>,
    root: Rc<ComponentDefinition>,
    remembered: RefCell<Option<NavigationHookError>>,
    stateful: RefCell<HashMap<ViewportPath, Vec<ViewportContent>>>,
}

impl TransitionRunner {
    pub fn new(
        tree: Rc<RefCell<ViewportTree>>,
        resolver: Rc<dyn ComponentResolver>,
        root: Rc<ComponentDefinition>,
    ) -> Self {
        Self {
            tree,
            resolver,
            root,
            remembered: RefCell::new(None),
            stateful: RefCell::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Rc<ComponentDefinition> {
        &self.root
    }

    /// The commit error waiting to be re-surfaced, if any.
    pub fn remembered_error(&self) -> Option<NavigationHookError> {
        self.remembered.borrow().clone()
    }

    /// Number of instances parked in stateful viewports.
    pub fn cached_instances(&self) -> usize {
        self.stateful.borrow().values().map(Vec::len).sum()
    }

    // -----------------------------------------------------------------------
    // Root lifecycle
    // -----------------------------------------------------------------------

    /// Install the root component and run its attach sequence.
    pub async fn activate(&self, id: u64, options: &RouterOptions) -> Result<(), RouterError> {
        let content = ViewportContent::create(Rc::clone(&self.root), Parameters::new());
        {
            let mut tree = self.tree.borrow_mut();
            let root = tree.insert_root(
                Viewport::new(ViewportOptions::new(self.root.name())).with_content(content.clone()),
            );
            tree.reconcile_children(root, self.root.viewports(), &[]);
        }

        let invoker = HookInvoker::new(id, options.hook_timeout);
        for hook in HookName::ATTACH {
            if let Err(err) = invoker.lifecycle(content.component.as_ref(), hook).await {
                let mut tree = self.tree.borrow_mut();
                if let Some(root) = tree.root() {
                    tree.remove(root);
                }
                return Err(err.into());
            }
        }
        tracing::debug!(target: targets::TRANSITION, transition = id, root = self.root.name(), "root attached");
        Ok(())
    }

    /// Detach the whole tree, dispose every instance and remove the root.
    ///
    /// Reports the remembered commit error when the teardown itself succeeds.
    pub async fn deactivate(&self, id: u64, options: &RouterOptions) -> Result<(), RouterError> {
        let (post, pre) = {
            let tree = self.tree.borrow();
            let Some(root) = tree.root() else {
                return Ok(());
            };
            let contents = |order: Vec<ViewportId>| -> Vec<ViewportContent> {
                order
                    .into_iter()
                    .filter_map(|vp| tree.get(vp).and_then(|v| v.content.clone()))
                    .collect()
            };
            (contents(tree.walk_post_order(root)), contents(tree.walk_depth_first(root)))
        };

        let invoker = HookInvoker::new(id, options.hook_timeout);
        let result = async {
            for hook in [HookName::Detaching, HookName::Unbinding] {
                for content in &post {
                    invoker.lifecycle(content.component.as_ref(), hook).await?;
                }
            }
            for content in &pre {
                invoker.lifecycle(content.component.as_ref(), HookName::Dispose).await?;
            }
            let parked: Vec<ViewportContent> =
                self.stateful.borrow_mut().drain().flat_map(|(_, list)| list).collect();
            for content in &parked {
                invoker.lifecycle(content.component.as_ref(), HookName::Dispose).await?;
            }
            Ok::<(), NavigationHookError>(())
        }
        .await;

        {
            let mut tree = self.tree.borrow_mut();
            if let Some(root) = tree.root() {
                tree.remove(root);
            }
        }
        self.stateful.borrow_mut().clear();
        match self.settle_remembered(result)? {
            Some(remembered) => Err(remembered.into()),
            None => Ok(()),
        }
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Run `transition` towards `request`.
    ///
    /// `transition.previous` must be the tree snapshot the request applies to.
    /// Guard redirects restart resolution against that same snapshot.
    pub async fn run(
        &self,
        transition: &mut Transition,
        request: InstructionTree,
        replace: bool,
        guardian: &Guardian,
    ) -> Result<RunOutcome, RouterError> {
        let result = self.drive(transition, request, replace, guardian).await;
        match &result {
            Ok(RunOutcome::Blocked) => transition.advance(TransitionStatus::Aborted),
            Ok(RunOutcome::Committed { .. }) => transition.advance(TransitionStatus::Completed),
            Err(err) => {
                tracing::debug!(target: targets::TRANSITION, transition = transition.id, error = %err, "failed");
                transition.advance(TransitionStatus::Errored);
            }
        }
        result
    }

    async fn drive(
        &self,
        transition: &mut Transition,
        mut request: InstructionTree,
        replace: bool,
        guardian: &Guardian,
    ) -> Result<RunOutcome, RouterError> {
        let invoker = HookInvoker::new(transition.id, transition.options.hook_timeout);
        let mut attempted = HashSet::new();

        loop {
            let resolved = resolve(
                &request,
                &transition.previous,
                &self.root,
                self.resolver.as_ref(),
                replace,
            )?;
            let target = resolved.tree.to_string();
            if !attempted.insert(target.clone()) {
                return Err(RouterError::RedirectLoop {
                    target,
                    redirects: transition.redirects,
                });
            }
            transition.target = resolved.tree.clone();

            let plan = plan(&transition.previous, &resolved.tree, &transition.options);
            if plan.is_noop() {
                tracing::debug!(target: targets::TRANSITION, transition = transition.id, "nothing to do");
                return Ok(RunOutcome::Committed {
                    record_history: false,
                    remembered: None,
                });
            }
            tracing::trace!(target: targets::TRANSITION, transition = transition.id, plan = %plan.describe(), "planned");

            transition.advance(TransitionStatus::Guarding);
            let run = Run {
                runner: self,
                invoker,
                plan: &plan,
                incoming: self.instantiate(&plan, &resolved),
                outgoing: self.outgoing(&plan),
            };

            let next = match run.guard(guardian).await? {
                GuardOutcome::Allow => {
                    transition.advance(TransitionStatus::Committing);
                    let record_history = run.records_history(&resolved);
                    let result = run.commit().await;
                    let remembered = self.settle_remembered(result)?;
                    return Ok(RunOutcome::Committed {
                        record_history,
                        remembered,
                    });
                }
                GuardOutcome::Block => {
                    tracing::debug!(target: targets::TRANSITION, transition = transition.id, "blocked");
                    return Ok(RunOutcome::Blocked);
                }
                GuardOutcome::Redirect(instructions) => parse(instructions)?,
                GuardOutcome::RedirectUrl(url) => parse_url(&url)?,
            };

            transition.redirects += 1;
            if transition.redirects > transition.options.max_redirects {
                return Err(RouterError::RedirectLoop {
                    target: next.to_string(),
                    redirects: transition.redirects,
                });
            }
            tracing::debug!(
                target: targets::TRANSITION,
                transition = transition.id,
                redirect = %next,
                count = transition.redirects,
                "redirected"
            );
            request = next;
        }
    }

    /// Fold a finished commit into the remembered error.
    ///
    /// A failure replaces whatever was remembered and is returned. A success
    /// hands back the remembered error, if any, clearing it.
    fn settle_remembered(
        &self,
        result: HookResult,
    ) -> Result<Option<NavigationHookError>, NavigationHookError> {
        match result {
            Ok(()) => Ok(self.remembered.borrow_mut().take()),
            Err(err) => {
                if let Some(dropped) = self.remembered.borrow_mut().replace(err.clone()) {
                    tracing::warn!(
                        target: targets::TRANSITION,
                        dropped = %dropped,
                        "remembered error superseded by a newer one"
                    );
                }
                Err(err)
            }
        }
    }

    /// Instances for every incoming node, created before guarding.
    fn instantiate(&self, plan: &TransitionPlan, resolved: &Resolved) -> HashMap<ViewportPath, Slot> {
        let cache = self.stateful.borrow();
        let mut out = HashMap::new();
        for node in plan.incoming() {
            let Some(next) = node.incoming() else { continue };
            let Some(definition) = next
                .component
                .as_ref()
                .and_then(|c| self.resolver.resolve(c))
            else {
                continue;
            };
            let flags = resolved
                .options(&node.path)
                .map(|o| o.flags)
                .unwrap_or_default();

            let parked = cache
                .get(&node.path)
                .filter(|_| flags.contains(ViewportFlags::STATEFUL))
                .and_then(|list| {
                    list.iter()
                        .find(|c| c.name() == definition.name() && c.parameters == next.parameters)
                })
                .cloned();
            let content = match parked {
                Some(content) => {
                    tracing::debug!(
                        target: targets::TRANSITION,
                        component = content.name(),
                        viewport = %node.path,
                        "reusing stateful instance"
                    );
                    content
                }
                None => ViewportContent::create(definition, next.parameters.clone()),
            };
            out.insert(node.path.clone(), Slot { content, flags });
        }
        out
    }

    /// Current contents of every outgoing node.
    fn outgoing(&self, plan: &TransitionPlan) -> HashMap<ViewportPath, Slot> {
        let tree = self.tree.borrow();
        let mut out = HashMap::new();
        for node in plan.outgoing() {
            let Some(id) = tree.find_path(&node.path) else { continue };
            let Some(vp) = tree.get(id) else { continue };
            if let Some(content) = vp.content.clone() {
                out.insert(
                    node.path.clone(),
                    Slot {
                        content,
                        flags: vp.flags(),
                    },
                );
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Run: one attempt of one transition
// ---------------------------------------------------------------------------

struct Run<'a> {
    runner: &'a TransitionRunner,
    invoker: HookInvoker,
    plan: &'a TransitionPlan,
    incoming: HashMap<ViewportPath, Slot>,
    outgoing: HashMap<ViewportPath, Slot>,
}

/// The first error of a batch, after every member has finished.
fn first_error(results: Vec<HookResult>) -> HookResult {
    results.into_iter().collect()
}

/// Errors win over outcomes; among outcomes the first non-allow one wins.
fn verdict(
    results: Vec<Result<GuardOutcome, NavigationHookError>>,
) -> Result<Option<GuardOutcome>, NavigationHookError> {
    let mut verdict = None;
    for result in results {
        let outcome = result?;
        if verdict.is_none() && !outcome.is_allow() {
            verdict = Some(outcome);
        }
    }
    Ok(verdict)
}

impl Run<'_> {
    /// The instance leaving `node`. A `Leave` and an `Enter` node may share a
    /// path, so the slot maps are only consulted for the matching change.
    fn leaving(&self, node: &PlanNode) -> Option<&Slot> {
        node.outgoing().and(self.outgoing.get(&node.path))
    }

    /// The instance entering `node`.
    fn entering(&self, node: &PlanNode) -> Option<&Slot> {
        node.incoming().and(self.incoming.get(&node.path))
    }

    fn context(&self, node: &PlanNode, params: &Parameters) -> NavigationContext {
        NavigationContext {
            params: params.clone(),
            next: node.incoming().cloned(),
            current: node.outgoing().cloned(),
            viewport: node.path.clone(),
            transition: self.invoker.transition(),
        }
    }

    fn records_history(&self, resolved: &Resolved) -> bool {
        self.plan.changed_paths().into_iter().any(|path| {
            let flags = resolved
                .options(path)
                .map(|o| o.flags)
                .or_else(|| self.outgoing.get(path).map(|s| s.flags))
                .unwrap_or_default();
            !flags.contains(ViewportFlags::NO_HISTORY)
        })
    }

    // -----------------------------------------------------------------------
    // Guarding
    // -----------------------------------------------------------------------

    async fn guard(&self, guardian: &Guardian) -> Result<GuardOutcome, NavigationHookError> {
        let invoker = self.invoker;

        for batch in self.plan.can_unload_batches() {
            let results = join_all(batch.into_iter().filter_map(|node| {
                let slot = self.leaving(node)?;
                let ctx = self.context(node, &slot.content.parameters);
                Some(async move { invoker.can_unload(slot.content.component.as_ref(), &ctx).await })
            }))
            .await;
            if let Some(outcome) = verdict(results)? {
                return Ok(outcome);
            }
        }

        let entering: Vec<ViewportInstruction> = self
            .plan
            .incoming()
            .into_iter()
            .filter_map(|node| node.incoming().cloned())
            .collect();
        let results = join_all(guardian.matching(&entering).into_iter().map(
            |(id, guard, instructions)| async move {
                invoker.guard(&format!("guard {id}"), guard(&instructions)).await
            },
        ))
        .await;
        if let Some(outcome) = verdict(results)? {
            return Ok(outcome);
        }

        for batch in self.plan.can_load_batches() {
            let results = join_all(batch.into_iter().filter_map(|node| {
                let slot = self.entering(node)?;
                let ctx = self.context(node, &slot.content.parameters);
                Some(async move { invoker.can_load(slot.content.component.as_ref(), &ctx).await })
            }))
            .await;
            if let Some(outcome) = verdict(results)? {
                return Ok(outcome);
            }
        }

        Ok(GuardOutcome::Allow)
    }

    // -----------------------------------------------------------------------
    // Commit
    // -----------------------------------------------------------------------

    async fn commit(&self) -> HookResult {
        let invoker = self.invoker;
        for batch in self.plan.unload_batches() {
            let results = join_all(batch.into_iter().filter_map(|node| {
                let slot = self.leaving(node)?;
                let ctx = self.context(node, &slot.content.parameters);
                Some(async move { invoker.unload(slot.content.component.as_ref(), &ctx).await })
            }))
            .await;
            first_error(results)?;
        }

        first_error(join_all(self.plan.chains().into_iter().map(|node| self.chain(node))).await)
    }

    fn chain<'a>(&'a self, node: &'a PlanNode) -> LocalBoxFuture<'a, HookResult> {
        async move {
            if node.change == Change::Leave {
                return self.detach(node).await;
            }
            match self.plan.defer_until {
                DeferUntil::None => {
                    self.load(node).await?;
                    self.swap(node, false).await?;
                    first_error(
                        join_all(node.child_chains().into_iter().map(|child| self.chain(child))).await,
                    )
                }
                DeferUntil::LoadHooks => {
                    for batch in node.load_batches() {
                        first_error(join_all(batch.into_iter().map(|n| self.load(n))).await)?;
                    }
                    self.swap(node, true).await?;
                    first_error(
                        join_all(node.deferred_chains().into_iter().map(|child| self.chain(child)))
                            .await,
                    )
                }
            }
        }
        .boxed_local()
    }

    async fn load(&self, node: &PlanNode) -> HookResult {
        let Some(slot) = self.entering(node) else {
            return Ok(());
        };
        let ctx = self.context(node, &slot.content.parameters);
        self.invoker.load(slot.content.component.as_ref(), &ctx).await
    }

    async fn swap(&self, node: &PlanNode, nested: bool) -> HookResult {
        if self.leaving(node).is_none() {
            return self.attach(node, nested).await;
        }
        match self.plan.swap_strategy {
            SwapStrategy::SequentialRemoveFirst => {
                self.detach(node).await?;
                self.attach(node, nested).await
            }
            SwapStrategy::SequentialAddFirst => {
                self.attach(node, nested).await?;
                self.detach(node).await
            }
            SwapStrategy::ParallelRemoveFirst => {
                let (detached, attached) =
                    futures::join!(self.detach(node), self.attach(node, nested));
                detached.and(attached)
            }
        }
    }

    /// `binding, bound, attaching`, then (nested) the entering children's
    /// attach sequences, then `attached`.
    fn attach<'a>(&'a self, node: &'a PlanNode, nested: bool) -> LocalBoxFuture<'a, HookResult> {
        async move {
            let Some(slot) = self.entering(node) else {
                return Ok(());
            };
            self.begin_attach(node, slot);
            let component = slot.content.component.as_ref();
            for hook in [HookName::Binding, HookName::Bound, HookName::Attaching] {
                self.invoker.lifecycle(component, hook).await?;
            }
            if nested {
                first_error(
                    join_all(node.entering_children().map(|child| self.attach(child, true))).await,
                )?;
            }
            self.invoker.lifecycle(component, HookName::Attached).await
        }
        .boxed_local()
    }

    fn begin_attach(&self, node: &PlanNode, slot: &Slot) {
        let mut tree = self.runner.tree.borrow_mut();
        let Some(id) = tree.find_path(&node.path) else {
            tracing::warn!(
                target: targets::TRANSITION,
                viewport = %node.path,
                component = slot.content.name(),
                "viewport vanished before attach"
            );
            return;
        };
        tree.set_content(id, slot.content.clone());
        tree.reconcile_children(id, slot.content.definition.viewports(), &node.pass_through());

        if slot.flags.contains(ViewportFlags::STATEFUL) {
            if let Some(list) = self.runner.stateful.borrow_mut().get_mut(&node.path) {
                list.retain(|parked| !parked.same_instance(&slot.content));
            }
        }
    }

    /// `detaching` and `unbinding` children first, `dispose` parent first.
    async fn detach(&self, node: &PlanNode) -> HookResult {
        let post = node.detach_post_order();
        for hook in [HookName::Detaching, HookName::Unbinding] {
            for leaving in &post {
                if let Some(slot) = self.leaving(leaving) {
                    self.invoker.lifecycle(slot.content.component.as_ref(), hook).await?;
                }
            }
        }
        for leaving in node.detach_pre_order() {
            let Some(slot) = self.leaving(leaving) else { continue };
            if slot.flags.contains(ViewportFlags::STATEFUL) {
                self.runner
                    .stateful
                    .borrow_mut()
                    .entry(leaving.path.clone())
                    .or_default()
                    .push(slot.content.clone());
            } else {
                self.invoker
                    .lifecycle(slot.content.component.as_ref(), HookName::Dispose)
                    .await?;
            }
        }
        self.end_detach(node);
        Ok(())
    }

    /// Empty the viewport unless new content has already moved in.
    fn end_detach(&self, node: &PlanNode) {
        let Some(slot) = self.leaving(node) else { return };
        let mut tree = self.runner.tree.borrow_mut();
        let Some(id) = tree.find_path(&node.path) else { return };
        let still_there = tree
            .get(id)
            .and_then(|vp| vp.content.as_ref())
            .is_some_and(|current| current.same_instance(&slot.content));
        if still_there {
            tree.clear_content(id);
            tree.prune_children(id, &node.pass_through());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentRegistry;
    use crate::testing::interleave::assert_interleaving;
    use crate::testing::recorder::{HookLog, HookMode, Logged};
    use pretty_assertions::assert_eq;

    struct Fixture {
        runner: TransitionRunner,
        tree: Rc<RefCell<ViewportTree>>,
        log: HookLog,
        options: RouterOptions,
        next_id: u64,
    }

    impl Fixture {
        fn new(registry: ComponentRegistry, root: ComponentDefinition, log: &HookLog) -> Self {
            let tree = Rc::new(RefCell::new(ViewportTree::new()));
            let runner = TransitionRunner::new(Rc::clone(&tree), Rc::new(registry), Rc::new(root));
            Self {
                runner,
                tree,
                log: log.clone(),
                options: RouterOptions::default(),
                next_id: 0,
            }
        }

        async fn go(&mut self, url: &str) -> Result<RunOutcome, RouterError> {
            self.next_id += 1;
            let previous = self.tree.borrow().snapshot();
            let mut transition =
                Transition::new(self.next_id, previous, InstructionTree::empty(), self.options.clone(), None);
            self.runner
                .run(&mut transition, parse_url(url)?, false, &Guardian::default())
                .await
        }

        fn dump(&self) -> String {
            self.tree.borrow().debug_tree()
        }
    }

    fn setup(log: &HookLog, mode: HookMode) -> Fixture {
        let registry = ComponentRegistry::new()
            .with(Logged::new("a", log).with_mode(mode).with_viewport("inner").definition())
            .with(Logged::new("b", log).with_mode(mode).definition())
            .with(Logged::new("c", log).with_mode(mode).definition());
        let root = Logged::new("root", log).with_viewport("main").definition();
        Fixture::new(registry, root, log)
    }

    #[tokio::test]
    async fn activate_then_load_then_deactivate() {
        let log = HookLog::new();
        let mut fx = setup(&log, HookMode::Sync);
        fx.runner.activate(0, &fx.options).await.unwrap();
        assert_eq!(log.take(), vec!["root.binding", "root.bound", "root.attaching", "root.attached"]);

        let outcome = fx.go("a/b").await.unwrap();
        assert!(matches!(outcome, RunOutcome::Committed { record_history: true, remembered: None }));
        insta::assert_snapshot!(fx.dump(), @r"
        root
          main: a
            inner: b
        ");
        log.clear();

        fx.runner.deactivate(9, &fx.options).await.unwrap();
        assert_eq!(
            log.take(),
            vec![
                "b.detaching", "a.detaching", "root.detaching", "b.unbinding", "a.unbinding",
                "root.unbinding", "root.dispose", "a.dispose", "b.dispose",
            ]
        );
        assert!(fx.tree.borrow().is_empty());
    }

    #[tokio::test]
    async fn async_commit_matches_plan_per_component() {
        let log = HookLog::new();
        let mut fx = setup(&log, HookMode::Async { yields: 2 });
        fx.runner.activate(0, &fx.options).await.unwrap();
        fx.go("b").await.unwrap();
        log.clear();

        fx.go("c").await.unwrap();
        let entries = log.take();
        let b: Vec<String> = entries.iter().filter(|e| e.starts_with("b.")).cloned().collect();
        let c: Vec<String> = entries.iter().filter(|e| e.starts_with("c.")).cloned().collect();
        assert_interleaving(&entries, &[b, c]);
        assert_eq!(fx.dump(), "root\n  main: c\n");
    }

    #[tokio::test]
    async fn failing_hook_is_remembered_and_resurfaced() {
        let log = HookLog::new();
        let registry = ComponentRegistry::new()
            .with(Logged::new("a", &log).failing(HookName::Unload, "boom").definition())
            .with(Logged::new("b", &log).definition());
        let root = Logged::new("root", &log).with_viewport("main").definition();
        let mut fx = Fixture::new(registry, root, &log);
        fx.runner.activate(0, &fx.options).await.unwrap();
        fx.go("a").await.unwrap();

        let err = fx.go("b").await.unwrap_err();
        assert!(err.to_string().contains("boom"));
        assert!(fx.runner.remembered_error().is_some());

        let err = fx.runner.deactivate(5, &fx.options).await.unwrap_err();
        assert!(err.to_string().contains("boom"));
        assert!(fx.runner.remembered_error().is_none());
    }

    #[tokio::test]
    async fn stateful_viewport_parks_and_reuses_instances() {
        let log = HookLog::new();
        let a = Logged::new("a", &log);
        let created = a.counter();
        let registry = ComponentRegistry::new()
            .with(a.definition())
            .with(Logged::new("b", &log).definition());
        let root = Logged::new("root", &log)
            .with_viewport(ViewportOptions::new("main").stateful(true))
            .definition();
        let mut fx = Fixture::new(registry, root, &log);
        fx.runner.activate(0, &fx.options).await.unwrap();

        fx.go("a").await.unwrap();
        log.clear();
        fx.go("b").await.unwrap();
        assert!(!log.entries().contains(&"a.dispose".to_owned()));
        assert_eq!(fx.runner.cached_instances(), 1);

        fx.go("a").await.unwrap();
        assert_eq!(created.get(), 1);
        assert_eq!(fx.runner.cached_instances(), 1);
    }

    #[tokio::test]
    async fn no_history_viewport_changes_skip_history() {
        let log = HookLog::new();
        let registry = ComponentRegistry::new()
            .with(Logged::new("a", &log).definition())
            .with(Logged::new("menu", &log).definition());
        let root = Logged::new("root", &log)
            .with_viewport("main")
            .with_viewport(ViewportOptions::new("side").no_history(true).with_used_by(["menu"]))
            .definition();
        let mut fx = Fixture::new(registry, root, &log);
        fx.runner.activate(0, &fx.options).await.unwrap();

        let outcome = fx.go("menu").await.unwrap();
        assert!(matches!(outcome, RunOutcome::Committed { record_history: false, .. }));
        let outcome = fx.go("a").await.unwrap();
        assert!(matches!(outcome, RunOutcome::Committed { record_history: true, .. }));
    }
}
