//! Transition planner: diff two resolved trees into a schedule of hook calls.
//!
//! Nodes are matched by viewport name at each depth. The plan is a pure
//! function of its inputs; the runner walks it, and [`TransitionPlan::steps`]
//! flattens it into the order the runner produces when every hook completes
//! synchronously.
//!
//! # Schedule
//!
//! ```text
//! guard   canUnload   outgoing, deepest batch first
//!         (router guards)
//!         canLoad     incoming, shallowest batch first
//! commit  unload      outgoing, deepest batch first
//!         chains      one per top-level change, interleaved:
//!                       none:       load → swap(flat attach) → child chains
//!                       load-hooks: load batches → swap(nested attach)
//! ```

use std::collections::BTreeMap;
use std::fmt;

use crate::component::HookName;
use crate::instruction::{InstructionTree, ViewportInstruction};
use crate::options::{DeferUntil, RouterOptions, SwapStrategy};
use crate::viewport::ViewportPath;

// ---------------------------------------------------------------------------
// Plan nodes
// ---------------------------------------------------------------------------

/// What happens to one viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Change {
    /// Same component and parameters. No hooks.
    Unchanged,
    /// A different component takes over the viewport.
    Replace,
    /// An empty viewport gets content.
    Enter,
    /// The content goes away.
    Leave,
}

impl Change {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Replace => "replace",
            Self::Enter => "enter",
            Self::Leave => "leave",
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One viewport in the plan.
///
/// Below a `Replace` node the old and new children are matched again:
/// identical ones stay `Unchanged` and pass through with their viewport,
/// the rest are `Leave` (part of the parent's detach) or `Enter`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanNode {
    pub change: Change,
    pub path: ViewportPath,
    /// Content before the transition, without children.
    pub previous: Option<ViewportInstruction>,
    /// Content after the transition, without children.
    pub next: Option<ViewportInstruction>,
    pub children: Vec<PlanNode>,
}

impl PlanNode {
    pub fn depth(&self) -> usize {
        self.path.depth()
    }

    pub fn is_changed(&self) -> bool {
        self.change != Change::Unchanged
    }

    /// The instruction whose component leaves.
    pub fn outgoing(&self) -> Option<&ViewportInstruction> {
        match self.change {
            Change::Replace | Change::Leave => self.previous.as_ref(),
            _ => None,
        }
    }

    /// The instruction whose component enters.
    pub fn incoming(&self) -> Option<&ViewportInstruction> {
        match self.change {
            Change::Replace | Change::Enter => self.next.as_ref(),
            _ => None,
        }
    }

    /// Names of the child viewports that survive this node's swap.
    pub fn pass_through(&self) -> Vec<String> {
        self.children
            .iter()
            .filter(|c| c.change == Change::Unchanged)
            .filter_map(|c| c.path.name().map(str::to_owned))
            .collect()
    }

    fn walk<'a>(&'a self, out: &mut Vec<&'a PlanNode>) {
        out.push(self);
        for child in &self.children {
            child.walk(out);
        }
    }

    /// This node and its leaving descendants, parent before children.
    pub fn detach_pre_order(&self) -> Vec<&PlanNode> {
        let mut out = Vec::new();
        self.detach_pre_into(&mut out);
        out
    }

    fn detach_pre_into<'a>(&'a self, out: &mut Vec<&'a PlanNode>) {
        out.push(self);
        for child in self.children.iter().filter(|c| c.change == Change::Leave) {
            child.detach_pre_into(out);
        }
    }

    /// This node and its leaving descendants, children before parent.
    pub fn detach_post_order(&self) -> Vec<&PlanNode> {
        let mut out = Vec::new();
        self.detach_post_into(&mut out);
        out
    }

    fn detach_post_into<'a>(&'a self, out: &mut Vec<&'a PlanNode>) {
        for child in self.children.iter().filter(|c| c.change == Change::Leave) {
            child.detach_post_into(out);
        }
        out.push(self);
    }

    /// Entering children attached as part of this node's nested attach.
    pub fn entering_children(&self) -> impl Iterator<Item = &PlanNode> {
        self.children.iter().filter(|c| c.change == Change::Enter)
    }

    /// Chains started after this node's swap when loads are not deferred.
    pub fn child_chains(&self) -> Vec<&PlanNode> {
        let mut out = Vec::new();
        for child in &self.children {
            match child.change {
                Change::Enter | Change::Replace => out.push(child),
                Change::Unchanged => out.extend(collect_chains(&child.children)),
                Change::Leave => {}
            }
        }
        out
    }

    /// Load batches of the entering subtree, parents first.
    pub fn load_batches(&self) -> Vec<Vec<&PlanNode>> {
        let mut entering = Vec::new();
        self.entering_into(&mut entering);
        by_depth(entering, false)
    }

    fn entering_into<'a>(&'a self, out: &mut Vec<&'a PlanNode>) {
        out.push(self);
        for child in self.entering_children() {
            child.entering_into(out);
        }
    }

    /// Chains below pass-through viewports of the entering subtree, started
    /// after the nested attach.
    pub fn deferred_chains(&self) -> Vec<&PlanNode> {
        let mut out = Vec::new();
        for child in &self.children {
            match child.change {
                Change::Unchanged => out.extend(collect_chains(&child.children)),
                Change::Enter => out.extend(child.deferred_chains()),
                _ => {}
            }
        }
        out
    }
}

/// Changed nodes reachable through unchanged ones.
fn collect_chains(nodes: &[PlanNode]) -> Vec<&PlanNode> {
    let mut out = Vec::new();
    for node in nodes {
        if node.is_changed() {
            out.push(node);
        } else {
            out.extend(collect_chains(&node.children));
        }
    }
    out
}

fn by_depth(nodes: Vec<&PlanNode>, deepest_first: bool) -> Vec<Vec<&PlanNode>> {
    let mut groups: BTreeMap<usize, Vec<&PlanNode>> = BTreeMap::new();
    for node in nodes {
        groups.entry(node.depth()).or_default().push(node);
    }
    let batches = groups.into_values();
    if deepest_first {
        batches.rev().collect()
    } else {
        batches.collect()
    }
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// Guard or commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Guard,
    Commit,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Guard => "guard",
            Self::Commit => "commit",
        })
    }
}

/// One hook call of the linearised plan.
///
/// Steps sharing a `batch` may interleave across components when hooks are
/// asynchronous; each component's own steps always keep their order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStep {
    pub phase: Phase,
    pub batch: usize,
    pub path: ViewportPath,
    pub component: String,
    pub hook: HookName,
}

impl fmt::Display for PlanStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] {}.{} {}",
            self.phase, self.batch, self.component, self.hook, self.path
        )
    }
}

// ---------------------------------------------------------------------------
// TransitionPlan
// ---------------------------------------------------------------------------

/// The diff of two trees plus the policies that order its hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionPlan {
    pub nodes: Vec<PlanNode>,
    pub defer_until: DeferUntil,
    pub swap_strategy: SwapStrategy,
}

/// Diff `previous` against `next`.
///
/// Both trees must name the viewport of every instruction, as resolved trees
/// and tree snapshots do. Instructions without a viewport are ignored.
pub fn plan(
    previous: &InstructionTree,
    next: &InstructionTree,
    options: &RouterOptions,
) -> TransitionPlan {
    TransitionPlan {
        nodes: diff(
            &ViewportPath::root(),
            &previous.instructions,
            &next.instructions,
            false,
        ),
        defer_until: options.defer_until,
        swap_strategy: options.swap_strategy,
    }
}

fn diff(
    parent: &ViewportPath,
    previous: &[ViewportInstruction],
    next: &[ViewportInstruction],
    under_change: bool,
) -> Vec<PlanNode> {
    let mut names: Vec<&str> = Vec::new();
    for instruction in previous.iter().chain(next) {
        if let Some(name) = instruction.viewport.as_deref() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    fn find<'a>(list: &'a [ViewportInstruction], name: &str) -> Option<&'a ViewportInstruction> {
        list.iter().find(|i| i.viewport.as_deref() == Some(name))
    }

    let mut out = Vec::new();
    for name in names {
        let path = parent.child(name);
        match (find(previous, name), find(next, name)) {
            (Some(old), Some(new)) if old.same_content(new) => out.push(PlanNode {
                change: Change::Unchanged,
                children: diff(&path, &old.children, &new.children, false),
                previous: Some(old.shallow()),
                next: Some(new.shallow()),
                path,
            }),
            (Some(old), Some(new)) if !under_change => out.push(PlanNode {
                change: Change::Replace,
                children: diff(&path, &old.children, &new.children, true),
                previous: Some(old.shallow()),
                next: Some(new.shallow()),
                path,
            }),
            (Some(old), Some(new)) => {
                out.push(leave(path.clone(), old));
                out.push(enter(path, new));
            }
            (Some(old), None) => out.push(leave(path, old)),
            (None, Some(new)) => out.push(enter(path, new)),
            (None, None) => {}
        }
    }
    out
}

fn leave(path: ViewportPath, old: &ViewportInstruction) -> PlanNode {
    PlanNode {
        change: Change::Leave,
        children: diff(&path, &old.children, &[], true),
        previous: Some(old.shallow()),
        next: None,
        path,
    }
}

fn enter(path: ViewportPath, new: &ViewportInstruction) -> PlanNode {
    PlanNode {
        change: Change::Enter,
        children: diff(&path, &[], &new.children, true),
        previous: None,
        next: Some(new.shallow()),
        path,
    }
}

impl TransitionPlan {
    /// Whether nothing changes at all.
    pub fn is_noop(&self) -> bool {
        self.walk().iter().all(|n| !n.is_changed())
    }

    /// Every node, pre-order.
    pub fn walk(&self) -> Vec<&PlanNode> {
        let mut out = Vec::new();
        for node in &self.nodes {
            node.walk(&mut out);
        }
        out
    }

    /// Nodes whose component leaves.
    pub fn outgoing(&self) -> Vec<&PlanNode> {
        self.walk()
            .into_iter()
            .filter(|n| n.outgoing().is_some())
            .collect()
    }

    /// Nodes whose component enters.
    pub fn incoming(&self) -> Vec<&PlanNode> {
        self.walk()
            .into_iter()
            .filter(|n| n.incoming().is_some())
            .collect()
    }

    /// `canUnload` batches, deepest first.
    pub fn can_unload_batches(&self) -> Vec<Vec<&PlanNode>> {
        by_depth(self.outgoing(), true)
    }

    /// `canLoad` batches, shallowest first.
    pub fn can_load_batches(&self) -> Vec<Vec<&PlanNode>> {
        by_depth(self.incoming(), false)
    }

    /// `unload` batches, deepest first.
    pub fn unload_batches(&self) -> Vec<Vec<&PlanNode>> {
        by_depth(self.outgoing(), true)
    }

    /// Top-level changes: changed nodes with only unchanged ancestors.
    pub fn chains(&self) -> Vec<&PlanNode> {
        collect_chains(&self.nodes)
    }

    /// Paths of every changed viewport.
    pub fn changed_paths(&self) -> Vec<&ViewportPath> {
        self.walk()
            .into_iter()
            .filter(|n| n.is_changed())
            .map(|n| &n.path)
            .collect()
    }

    /// The schedule as the runner executes it with synchronous hooks.
    pub fn steps(&self) -> Vec<PlanStep> {
        let mut steps = Steps {
            out: Vec::new(),
            batch: 0,
            plan: self,
        };

        for batch in self.can_unload_batches() {
            for node in batch {
                steps.push_outgoing(Phase::Guard, node, HookName::CanUnload);
            }
            steps.batch += 1;
        }
        for batch in self.can_load_batches() {
            for node in batch {
                steps.push_incoming(Phase::Guard, node, HookName::CanLoad);
            }
            steps.batch += 1;
        }
        for batch in self.unload_batches() {
            for node in batch {
                steps.push_outgoing(Phase::Commit, node, HookName::Unload);
            }
            steps.batch += 1;
        }
        let chains = self.chains();
        if !chains.is_empty() {
            for node in chains {
                steps.chain(node);
            }
            steps.batch += 1;
        }
        steps.out
    }

    /// Indented text dump of the plan tree.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            describe_node(node, 0, &mut out);
        }
        out
    }
}

fn describe_node(node: &PlanNode, depth: usize, out: &mut String) {
    let name = |i: &Option<ViewportInstruction>| {
        i.as_ref()
            .map(|i| ViewportInstruction { viewport: None, ..i.clone() }.to_string())
            .unwrap_or_else(|| "-".to_owned())
    };
    let indent = "  ".repeat(depth);
    let line = match node.change {
        Change::Unchanged => format!("{indent}{} {} {}", node.change, node.path, name(&node.next)),
        Change::Enter => format!("{indent}{} {} {}", node.change, node.path, name(&node.next)),
        Change::Leave => format!("{indent}{} {} {}", node.change, node.path, name(&node.previous)),
        Change::Replace => format!(
            "{indent}{} {} {} -> {}",
            node.change,
            node.path,
            name(&node.previous),
            name(&node.next)
        ),
    };
    out.push_str(&line);
    out.push('\n');
    for child in &node.children {
        describe_node(child, depth + 1, out);
    }
}

struct Steps<'a> {
    out: Vec<PlanStep>,
    batch: usize,
    plan: &'a TransitionPlan,
}

impl Steps<'_> {
    fn push(&mut self, phase: Phase, node: &PlanNode, component: Option<&ViewportInstruction>, hook: HookName) {
        if let Some(name) = component.and_then(ViewportInstruction::component_name) {
            self.out.push(PlanStep {
                phase,
                batch: self.batch,
                path: node.path.clone(),
                component: name.to_owned(),
                hook,
            });
        }
    }

    fn push_outgoing(&mut self, phase: Phase, node: &PlanNode, hook: HookName) {
        self.push(phase, node, node.outgoing(), hook);
    }

    fn push_incoming(&mut self, phase: Phase, node: &PlanNode, hook: HookName) {
        self.push(phase, node, node.incoming(), hook);
    }

    fn chain(&mut self, node: &PlanNode) {
        if node.change == Change::Leave {
            self.detach(node);
            return;
        }
        match self.plan.defer_until {
            DeferUntil::None => {
                self.push_incoming(Phase::Commit, node, HookName::Load);
                self.swap(node, Self::attach_flat);
                for child in node.child_chains() {
                    self.chain(child);
                }
            }
            DeferUntil::LoadHooks => {
                for batch in node.load_batches() {
                    for entering in batch {
                        self.push_incoming(Phase::Commit, entering, HookName::Load);
                    }
                }
                self.swap(node, Self::attach_nested);
                for child in node.deferred_chains() {
                    self.chain(child);
                }
            }
        }
    }

    fn swap(&mut self, node: &PlanNode, attach: fn(&mut Self, &PlanNode)) {
        let replacing = node.outgoing().is_some();
        match self.plan.swap_strategy {
            SwapStrategy::SequentialAddFirst => {
                attach(self, node);
                if replacing {
                    self.detach(node);
                }
            }
            SwapStrategy::SequentialRemoveFirst | SwapStrategy::ParallelRemoveFirst => {
                if replacing {
                    self.detach(node);
                }
                attach(self, node);
            }
        }
    }

    fn attach_flat(&mut self, node: &PlanNode) {
        for hook in HookName::ATTACH {
            self.push_incoming(Phase::Commit, node, hook);
        }
    }

    fn attach_nested(&mut self, node: &PlanNode) {
        for hook in &HookName::ATTACH[..3] {
            self.push_incoming(Phase::Commit, node, *hook);
        }
        for child in node.entering_children() {
            self.attach_nested(child);
        }
        self.push_incoming(Phase::Commit, node, HookName::Attached);
    }

    fn detach(&mut self, node: &PlanNode) {
        for hook in [HookName::Detaching, HookName::Unbinding] {
            for leaving in node.detach_post_order() {
                self.push_outgoing(Phase::Commit, leaving, hook);
            }
        }
        for leaving in node.detach_pre_order() {
            self.push_outgoing(Phase::Commit, leaving, HookName::Dispose);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::parse_url;
    use pretty_assertions::assert_eq;

    fn tree(url: &str) -> InstructionTree {
        parse_url(url).unwrap()
    }

    fn steps(from: &str, to: &str, options: RouterOptions) -> Vec<String> {
        plan(&tree(from), &tree(to), &options)
            .steps()
            .iter()
            .map(|s| format!("{}.{}", s.component, s.hook))
            .collect()
    }

    #[test]
    fn identical_trees_are_a_noop() {
        let p = plan(
            &tree("a@main/b@inner"),
            &tree("a@main/b@inner"),
            &RouterOptions::default(),
        );
        assert!(p.is_noop());
        assert!(p.steps().is_empty());
        assert!(p.chains().is_empty());
    }

    #[test]
    fn param_change_is_a_replace() {
        let p = plan(&tree("a(1)@main"), &tree("a(2)@main"), &RouterOptions::default());
        assert_eq!(p.nodes[0].change, Change::Replace);
    }

    #[test]
    fn replace_sequential_remove_first() {
        insta::assert_snapshot!(
            plan(&tree("a@main"), &tree("b@main"), &RouterOptions::default())
                .steps()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n"),
            @r"
        guard[0] a.canUnload /main
        guard[1] b.canLoad /main
        commit[2] a.unload /main
        commit[3] b.load /main
        commit[3] a.detaching /main
        commit[3] a.unbinding /main
        commit[3] a.dispose /main
        commit[3] b.binding /main
        commit[3] b.bound /main
        commit[3] b.attaching /main
        commit[3] b.attached /main
        "
        );
    }

    #[test]
    fn replace_sequential_add_first() {
        let options = RouterOptions::default().with_swap_strategy(SwapStrategy::SequentialAddFirst);
        assert_eq!(
            steps("a@main", "b@main", options),
            vec![
                "a.canUnload", "b.canLoad", "a.unload", "b.load", "b.binding", "b.bound",
                "b.attaching", "b.attached", "a.detaching", "a.unbinding", "a.dispose",
            ]
        );
    }

    #[test]
    fn parallel_remove_first_linearises_like_remove_first() {
        let parallel = RouterOptions::default().with_swap_strategy(SwapStrategy::ParallelRemoveFirst);
        assert_eq!(
            steps("a@main", "b@main", parallel),
            steps("a@main", "b@main", RouterOptions::default())
        );
    }

    #[test]
    fn shared_child_passes_through() {
        let p = plan(
            &tree("a11@main/a12@inner"),
            &tree("a13@main/a12@inner"),
            &RouterOptions::default(),
        );
        insta::assert_snapshot!(p.describe(), @r"
        replace /main a11 -> a13
          unchanged /main/inner a12
        ");
        assert_eq!(p.nodes[0].pass_through(), vec!["inner".to_owned()]);
        let logged: Vec<String> = p.steps().iter().map(|s| s.component.clone()).collect();
        assert!(!logged.iter().any(|c| c == "a12"));
    }

    #[test]
    fn different_children_under_replace_leave_and_enter() {
        let p = plan(
            &tree("a@main/x@inner"),
            &tree("b@main/y@inner"),
            &RouterOptions::default(),
        );
        let changes: Vec<Change> = p.nodes[0].children.iter().map(|c| c.change).collect();
        assert_eq!(changes, vec![Change::Leave, Change::Enter]);
    }

    #[test]
    fn guard_batches_order_by_depth() {
        let p = plan(
            &tree("a@main/b@inner/c@leaf"),
            &tree("x@main/y@inner/z@leaf"),
            &RouterOptions::default(),
        );
        let unload: Vec<Vec<&str>> = p
            .can_unload_batches()
            .iter()
            .map(|b| b.iter().filter_map(|n| n.outgoing()?.component_name()).collect())
            .collect();
        assert_eq!(unload, vec![vec!["c"], vec!["b"], vec!["a"]]);
        let load: Vec<Vec<&str>> = p
            .can_load_batches()
            .iter()
            .map(|b| b.iter().filter_map(|n| n.incoming()?.component_name()).collect())
            .collect();
        assert_eq!(load, vec![vec!["x"], vec!["y"], vec!["z"]]);
    }

    #[test]
    fn leaving_subtree_detach_order() {
        assert_eq!(
            steps("a@main/(b@l+c@r)", "", RouterOptions::default()),
            vec![
                "b.canUnload", "c.canUnload", "a.canUnload", "b.unload", "c.unload", "a.unload",
                "b.detaching", "c.detaching", "a.detaching", "b.unbinding", "c.unbinding",
                "a.unbinding", "a.dispose", "b.dispose", "c.dispose",
            ]
        );
    }

    #[test]
    fn entering_parent_none_deferral() {
        assert_eq!(
            steps("", "p@main/c@inner", RouterOptions::default()),
            vec![
                "p.canLoad", "c.canLoad", "p.load", "p.binding", "p.bound", "p.attaching",
                "p.attached", "c.load", "c.binding", "c.bound", "c.attaching", "c.attached",
            ]
        );
    }

    #[test]
    fn entering_parent_load_hooks_deferral() {
        let options = RouterOptions::default().with_defer_until(DeferUntil::LoadHooks);
        assert_eq!(
            steps("", "p@main/c@inner", options),
            vec![
                "p.canLoad", "c.canLoad", "p.load", "c.load", "p.binding", "p.bound",
                "p.attaching", "c.binding", "c.bound", "c.attaching", "c.attached", "p.attached",
            ]
        );
    }

    #[test]
    fn unchanged_parent_keeps_child_swaps_separate() {
        let p = plan(
            &tree("a@main/x@inner"),
            &tree("a@main/y@inner"),
            &RouterOptions::default(),
        );
        assert_eq!(p.nodes[0].change, Change::Unchanged);
        assert_eq!(p.nodes[0].children[0].change, Change::Replace);
        assert_eq!(p.chains().len(), 1);
        assert_eq!(p.changed_paths(), vec![&ViewportPath::from_segments(["main", "inner"])]);
    }

    #[test]
    fn siblings_are_separate_chains() {
        let p = plan(&tree("a@l+b@r"), &tree("c@l+d@r"), &RouterOptions::default());
        assert_eq!(p.chains().len(), 2);
        assert_eq!(p.can_unload_batches().len(), 1);
        assert_eq!(p.can_unload_batches()[0].len(), 2);
    }

    #[test]
    fn pass_through_child_changes_run_after_parent_swap() {
        let p = plan(
            &tree("a11@main/a12@inner/x@leaf"),
            &tree("a13@main/a12@inner/y@leaf"),
            &RouterOptions::default(),
        );
        let order = steps(
            "a11@main/a12@inner/x@leaf",
            "a13@main/a12@inner/y@leaf",
            RouterOptions::default(),
        );
        assert_eq!(p.nodes[0].child_chains().len(), 1);
        let attached = order.iter().position(|s| s == "a13.attached").unwrap();
        let y_load = order.iter().position(|s| s == "y.load").unwrap();
        assert!(attached < y_load);
    }
}
