//! Tree operations: insert, remove, content swaps, lookups, walks, snapshots.

use std::collections::VecDeque;
use std::fmt::Write as _;

use slotmap::{SecondaryMap, SlotMap};

use super::node::{Viewport, ViewportContent, ViewportFlags, ViewportId, ViewportOptions};
use super::path::ViewportPath;
use crate::instruction::{InstructionTree, ViewportInstruction};

/// Empty slice constant for returning when a viewport has no children.
const EMPTY_CHILDREN: &[ViewportId] = &[];

/// The live routing scope, backed by a slotmap arena.
///
/// The root node holds the application's root component. Every other node is
/// a viewport declared by the content of its parent. Parent/child links live in
/// secondary maps so that removal is O(subtree size) and lookup is O(1).
pub struct ViewportTree {
    nodes: SlotMap<ViewportId, Viewport>,
    children: SecondaryMap<ViewportId, Vec<ViewportId>>,
    parent: SecondaryMap<ViewportId, ViewportId>,
    root: Option<ViewportId>,
}

impl ViewportTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            children: SecondaryMap::new(),
            parent: SecondaryMap::new(),
            root: None,
        }
    }

    /// Insert the root node, replacing any previous root pointer.
    pub fn insert_root(&mut self, viewport: Viewport) -> ViewportId {
        let id = self.nodes.insert(viewport);
        self.children.insert(id, Vec::new());
        self.root = Some(id);
        id
    }

    /// Insert a viewport under `parent`. Returns `None` if `parent` is gone.
    pub fn insert_child(&mut self, parent: ViewportId, viewport: Viewport) -> Option<ViewportId> {
        if !self.nodes.contains_key(parent) {
            return None;
        }
        let id = self.nodes.insert(viewport);
        self.children.insert(id, Vec::new());
        self.parent.insert(id, parent);
        self.children.get_mut(parent)?.push(id);
        Some(id)
    }

    /// Remove a viewport and all its descendants.
    ///
    /// Returns the removed viewport, or `None` if it didn't exist.
    pub fn remove(&mut self, id: ViewportId) -> Option<Viewport> {
        if !self.nodes.contains_key(id) {
            return None;
        }

        if let Some(parent_id) = self.parent.remove(id) {
            if let Some(siblings) = self.children.get_mut(parent_id) {
                siblings.retain(|&child| child != id);
            }
        }

        if self.root == Some(id) {
            self.root = None;
        }

        let mut to_remove = VecDeque::new();
        to_remove.push_back(id);
        let mut removed = None;

        while let Some(current) = to_remove.pop_front() {
            if let Some(kids) = self.children.remove(current) {
                to_remove.extend(kids);
            }
            self.parent.remove(current);
            let data = self.nodes.remove(current);
            if current == id {
                removed = data;
            }
        }

        removed
    }

    /// Put `content` into a viewport, returning what it displaced.
    pub fn set_content(
        &mut self,
        id: ViewportId,
        content: ViewportContent,
    ) -> Option<ViewportContent> {
        self.nodes.get_mut(id)?.content.replace(content)
    }

    /// Empty a viewport, returning its content.
    pub fn clear_content(&mut self, id: ViewportId) -> Option<ViewportContent> {
        self.nodes.get_mut(id)?.content.take()
    }

    /// Remove every child viewport of `id` whose name is not in `keep`.
    pub fn prune_children(&mut self, id: ViewportId, keep: &[String]) {
        let doomed: Vec<ViewportId> = self
            .children(id)
            .iter()
            .copied()
            .filter(|&child| {
                self.nodes
                    .get(child)
                    .is_some_and(|vp| !keep.iter().any(|k| k == vp.name()))
            })
            .collect();
        for child in doomed {
            self.remove(child);
        }
    }

    /// Make the children of `id` match `declared`: viewports named in `keep`
    /// survive, the others are removed, missing declarations are created.
    /// Children end up in declaration order.
    pub fn reconcile_children(
        &mut self,
        id: ViewportId,
        declared: &[ViewportOptions],
        keep: &[String],
    ) {
        self.prune_children(id, keep);
        for options in declared {
            if self.find_child(id, &options.name).is_none() {
                self.insert_child(id, Viewport::new(options.clone()));
            }
        }

        let nodes = &self.nodes;
        let rank = |child: &ViewportId| {
            nodes
                .get(*child)
                .and_then(|vp| declared.iter().position(|d| d.name == vp.name()))
                .unwrap_or(usize::MAX)
        };
        if let Some(kids) = self.children.get_mut(id) {
            kids.sort_by_key(rank);
        }
    }

    /// Get the parent of a viewport, if it has one.
    pub fn parent(&self, id: ViewportId) -> Option<ViewportId> {
        self.parent.get(id).copied()
    }

    /// Children in declaration order. Empty if the viewport has none or does
    /// not exist.
    pub fn children(&self, id: ViewportId) -> &[ViewportId] {
        self.children
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_CHILDREN)
    }

    /// Ancestors from the immediate parent up to the root.
    pub fn ancestors(&self, id: ViewportId) -> Vec<ViewportId> {
        let mut result = Vec::new();
        let mut current = id;
        while let Some(p) = self.parent.get(current).copied() {
            result.push(p);
            current = p;
        }
        result
    }

    /// The child of `parent` called `name`.
    pub fn find_child(&self, parent: ViewportId, name: &str) -> Option<ViewportId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&child| self.nodes.get(child).is_some_and(|vp| vp.name() == name))
    }

    /// Follow `path` from the root.
    pub fn find_path(&self, path: &ViewportPath) -> Option<ViewportId> {
        let mut current = self.root?;
        for segment in path.segments() {
            current = self.find_child(current, segment)?;
        }
        Some(current)
    }

    /// Path of a viewport from the root.
    pub fn path(&self, id: ViewportId) -> ViewportPath {
        let mut names: Vec<&str> = self
            .ancestors(id)
            .into_iter()
            .rev()
            .skip(1)
            .filter_map(|a| self.nodes.get(a).map(Viewport::name))
            .collect();
        if Some(id) != self.root {
            if let Some(vp) = self.nodes.get(id) {
                names.push(vp.name());
            }
        }
        ViewportPath::from_segments(names)
    }

    /// Immutable access to a viewport.
    pub fn get(&self, id: ViewportId) -> Option<&Viewport> {
        self.nodes.get(id)
    }

    /// Mutable access to a viewport.
    pub fn get_mut(&mut self, id: ViewportId) -> Option<&mut Viewport> {
        self.nodes.get_mut(id)
    }

    /// Content of the viewport at `path`.
    pub fn content_at(&self, path: &ViewportPath) -> Option<&ViewportContent> {
        self.find_path(path)
            .and_then(|id| self.nodes.get(id))
            .and_then(|vp| vp.content.as_ref())
    }

    pub fn root(&self) -> Option<ViewportId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: ViewportId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Pre-order depth-first traversal starting from `start`.
    pub fn walk_depth_first(&self, start: ViewportId) -> Vec<ViewportId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            for &child in self.children(current).iter().rev() {
                stack.push(child);
            }
        }
        result
    }

    /// Post-order depth-first traversal: children before their parent.
    pub fn walk_post_order(&self, start: ViewportId) -> Vec<ViewportId> {
        let mut result = Vec::new();
        self.post_order_into(start, &mut result);
        result
    }

    fn post_order_into(&self, id: ViewportId, out: &mut Vec<ViewportId>) {
        if !self.nodes.contains_key(id) {
            return;
        }
        for &child in self.children(id) {
            self.post_order_into(child, out);
        }
        out.push(id);
    }

    /// Breadth-first traversal starting from `start`.
    pub fn walk_breadth_first(&self, start: ViewportId) -> Vec<ViewportId> {
        let mut result = Vec::new();
        let mut queue = VecDeque::new();
        queue.push_back(start);
        while let Some(current) = queue.pop_front() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            queue.extend(self.children(current).iter().copied());
        }
        result
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    /// The current contents as an instruction tree. Every instruction names
    /// its viewport and carries its component definition.
    pub fn snapshot(&self) -> InstructionTree {
        match self.root {
            Some(root) => InstructionTree::new(self.snapshot_level(root)),
            None => InstructionTree::empty(),
        }
    }

    fn snapshot_level(&self, parent: ViewportId) -> Vec<ViewportInstruction> {
        self.children(parent)
            .iter()
            .filter_map(|&id| {
                let vp = self.nodes.get(id)?;
                let content = vp.content.as_ref()?;
                let mut instruction = content.instruction(vp.name());
                instruction.children = self.snapshot_level(id);
                Some(instruction)
            })
            .collect()
    }

    /// The instruction tree behind the router URL.
    ///
    /// `NO_LINK` viewports are left out, and `@viewport` is dropped wherever
    /// an untargeted instruction would land in the same viewport anyway.
    pub fn link_tree(&self) -> InstructionTree {
        match self.root {
            Some(root) => InstructionTree::new(self.link_level(root)),
            None => InstructionTree::empty(),
        }
    }

    fn link_level(&self, parent: ViewportId) -> Vec<ViewportInstruction> {
        let kids = self.children(parent);
        let mut claimed = vec![false; kids.len()];
        let options: Vec<&ViewportOptions> = kids
            .iter()
            .filter_map(|&k| self.nodes.get(k).map(|v| &v.options))
            .collect();
        let mut out = Vec::new();

        for (index, &id) in kids.iter().enumerate() {
            let Some(vp) = self.nodes.get(id) else { continue };
            let Some(content) = vp.content.as_ref() else { continue };
            if vp.options.has(ViewportFlags::NO_LINK) {
                continue;
            }

            let name = content.name();
            let implicit = first_free(&options, &claimed, name);
            claimed[index] = true;

            let mut instruction = ViewportInstruction::new(name)
                .with_parameters(content.parameters.clone());
            if implicit != Some(index) {
                instruction = instruction.with_viewport(vp.name());
            }
            instruction.children = self.link_level(id);
            out.push(instruction);
        }
        out
    }

    /// Indented text dump of the tree, for tests and diagnostics.
    pub fn debug_tree(&self) -> String {
        let mut out = String::new();
        if let Some(root) = self.root {
            self.debug_node(root, 0, &mut out);
        }
        out
    }

    fn debug_node(&self, id: ViewportId, depth: usize, out: &mut String) {
        let Some(vp) = self.nodes.get(id) else { return };
        let content = match &vp.content {
            Some(c) => ViewportInstruction::new(c.name())
                .with_parameters(c.parameters.clone())
                .to_string(),
            None => "-".to_owned(),
        };
        let indent = "  ".repeat(depth);
        if Some(id) == self.root {
            let _ = writeln!(out, "{indent}{content}");
        } else {
            let _ = writeln!(out, "{indent}{}: {content}", vp.name());
        }
        for &child in self.children(id) {
            self.debug_node(child, depth + 1, out);
        }
    }
}

impl Default for ViewportTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Index of the viewport an untargeted `component` would take: the first
/// unclaimed one listing it in `used_by`, else the first unclaimed one
/// accepting it.
pub(crate) fn first_free(
    options: &[&ViewportOptions],
    claimed: &[bool],
    component: &str,
) -> Option<usize> {
    let free = |i: &usize| !claimed.get(*i).copied().unwrap_or(true);
    (0..options.len())
        .filter(free)
        .find(|&i| options[i].lists(component))
        .or_else(|| {
            (0..options.len())
                .filter(free)
                .find(|&i| options[i].accepts(component))
        })
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::component::ComponentDefinition;
    use crate::instruction::Parameters;
    use crate::testing::recorder::Inert;
    use pretty_assertions::assert_eq;

    fn content(name: &str) -> ViewportContent {
        ViewportContent::create(
            Rc::new(ComponentDefinition::new(name, Inert::factory(name))),
            Parameters::new(),
        )
    }

    /// Build a small test tree:
    /// ```text
    ///        root (shell)
    ///       /           \
    ///   main: page     side: -
    ///      |
    ///   detail: item(3)
    /// ```
    fn sample() -> (ViewportTree, ViewportId, ViewportId, ViewportId, ViewportId) {
        let mut tree = ViewportTree::new();
        let root = tree.insert_root(Viewport::new(ViewportOptions::new("root")).with_content(content("shell")));
        let main = tree
            .insert_child(root, Viewport::new(ViewportOptions::new("main")).with_content(content("page")))
            .unwrap();
        let side = tree
            .insert_child(root, Viewport::new(ViewportOptions::new("side")))
            .unwrap();
        let mut item = content("item");
        item.parameters.push_positional("3");
        let detail = tree
            .insert_child(main, Viewport::new(ViewportOptions::new("detail")).with_content(item))
            .unwrap();
        (tree, root, main, side, detail)
    }

    #[test]
    fn insert_and_relations() {
        let (tree, root, main, side, detail) = sample();
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.root(), Some(root));
        assert_eq!(tree.children(root), &[main, side]);
        assert_eq!(tree.parent(detail), Some(main));
        assert_eq!(tree.ancestors(detail), vec![main, root]);
    }

    #[test]
    fn insert_child_of_missing_parent() {
        let (mut tree, _, main, _, _) = sample();
        tree.remove(main);
        assert!(tree
            .insert_child(main, Viewport::new(ViewportOptions::new("x")))
            .is_none());
    }

    #[test]
    fn remove_takes_subtree() {
        let (mut tree, root, main, side, detail) = sample();
        let removed = tree.remove(main).unwrap();
        assert_eq!(removed.name(), "main");
        assert!(!tree.contains(detail));
        assert_eq!(tree.children(root), &[side]);
        assert!(tree.remove(main).is_none());
    }

    #[test]
    fn find_by_path() {
        let (tree, root, main, _, detail) = sample();
        assert_eq!(tree.find_path(&ViewportPath::root()), Some(root));
        assert_eq!(
            tree.find_path(&ViewportPath::from_segments(["main", "detail"])),
            Some(detail)
        );
        assert_eq!(tree.find_path(&ViewportPath::from_segments(["nope"])), None);
        assert_eq!(tree.path(detail).to_string(), "/main/detail");
        assert_eq!(tree.path(main).to_string(), "/main");
        assert!(tree.path(root).is_root());
    }

    #[test]
    fn set_and_clear_content() {
        let (mut tree, _, _, side, _) = sample();
        assert!(tree.set_content(side, content("menu")).is_none());
        let displaced = tree.set_content(side, content("tree")).unwrap();
        assert_eq!(displaced.name(), "menu");
        assert_eq!(tree.clear_content(side).unwrap().name(), "tree");
        assert!(tree.get(side).unwrap().is_empty());
    }

    #[test]
    fn walks() {
        let (tree, root, main, side, detail) = sample();
        assert_eq!(tree.walk_depth_first(root), vec![root, main, detail, side]);
        assert_eq!(tree.walk_breadth_first(root), vec![root, main, side, detail]);
        assert_eq!(tree.walk_post_order(root), vec![detail, main, side, root]);
    }

    #[test]
    fn reconcile_keeps_pass_through_and_orders_by_declaration() {
        let (mut tree, root, main, side, _) = sample();
        let declared = [
            ViewportOptions::new("left"),
            ViewportOptions::new("side"),
            ViewportOptions::new("right"),
        ];
        tree.reconcile_children(root, &declared, &["side".to_owned()]);
        assert!(!tree.contains(main));
        let names: Vec<&str> = tree
            .children(root)
            .iter()
            .map(|&c| tree.get(c).unwrap().name())
            .collect();
        assert_eq!(names, vec!["left", "side", "right"]);
        assert_eq!(tree.find_child(root, "side"), Some(side));
    }

    #[test]
    fn snapshot_names_viewports() {
        let (tree, ..) = sample();
        assert_eq!(tree.snapshot().to_string(), "page@main/item(3)@detail");
    }

    #[test]
    fn link_tree_drops_implicit_viewports() {
        let (tree, ..) = sample();
        assert_eq!(tree.link_tree().to_string(), "page/item(3)");
    }

    #[test]
    fn link_tree_keeps_needed_viewports_and_skips_no_link() {
        let mut tree = ViewportTree::new();
        let root = tree.insert_root(Viewport::new(ViewportOptions::new("root")).with_content(content("shell")));
        let left = tree
            .insert_child(root, Viewport::new(ViewportOptions::new("left").no_link(true)))
            .unwrap();
        let right = tree
            .insert_child(root, Viewport::new(ViewportOptions::new("right")))
            .unwrap();
        tree.set_content(left, content("menu"));
        tree.set_content(right, content("page"));
        assert_eq!(tree.link_tree().to_string(), "page@right");
        assert_eq!(tree.snapshot().to_string(), "menu@left+page@right");
    }

    #[test]
    fn first_free_prefers_used_by() {
        let any = ViewportOptions::new("a");
        let only = ViewportOptions::new("b").with_used_by(["x"]);
        let options = [&any, &only];
        assert_eq!(first_free(&options, &[false, false], "x"), Some(1));
        assert_eq!(first_free(&options, &[false, false], "y"), Some(0));
        assert_eq!(first_free(&options, &[true, false], "y"), None);
    }

    #[test]
    fn debug_tree_dump() {
        let (tree, ..) = sample();
        insta::assert_snapshot!(tree.debug_tree(), @r"
        shell
          main: page
            detail: item(3)
          side: -
        ");
    }
}
