//! Navigation menus: named route lists with `active` flags.
//!
//! Menus are plain data. The router recomputes the flags against the live
//! tree after every committed navigation.

use crate::error::ParseError;
use crate::instruction::{parse, InstructionTree, NavigationInstruction, ViewportInstruction};

/// One menu entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavRoute {
    pub title: String,
    pub instruction: InstructionTree,
    pub children: Vec<NavRoute>,
    /// Whether the route, or one of its children, is currently loaded.
    pub active: bool,
}

impl NavRoute {
    pub fn new(
        title: impl Into<String>,
        instruction: impl Into<NavigationInstruction>,
    ) -> Result<Self, ParseError> {
        Ok(Self {
            title: title.into(),
            instruction: parse(instruction)?,
            children: Vec::new(),
            active: false,
        })
    }

    /// Add a nested entry (builder).
    pub fn with_child(mut self, child: NavRoute) -> Self {
        self.children.push(child);
        self
    }

    fn refresh(&mut self, current: &InstructionTree) -> bool {
        let mut active = !self.instruction.is_empty()
            && contains(&current.instructions, &self.instruction.instructions);
        for child in &mut self.children {
            active |= child.refresh(current);
        }
        self.active = active;
        active
    }
}

/// Whether every wanted instruction is loaded somewhere in `current` at the
/// same level, with its own children contained below it.
fn contains(current: &[ViewportInstruction], wanted: &[ViewportInstruction]) -> bool {
    wanted.iter().all(|w| {
        current.iter().any(|c| {
            c.same_content(w)
                && w.viewport.as_ref().is_none_or(|v| c.viewport.as_ref() == Some(v))
                && contains(&c.children, &w.children)
        })
    })
}

/// A named menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nav {
    pub name: String,
    pub routes: Vec<NavRoute>,
}

impl Nav {
    pub fn new(name: impl Into<String>, routes: Vec<NavRoute>) -> Self {
        Self {
            name: name.into(),
            routes,
        }
    }

    /// Recompute every `active` flag against `current`.
    pub fn refresh(&mut self, current: &InstructionTree) {
        for route in &mut self.routes {
            route.refresh(current);
        }
    }

    /// Titles of the active top-level routes.
    pub fn active_titles(&self) -> Vec<&str> {
        self.routes
            .iter()
            .filter(|r| r.active)
            .map(|r| r.title.as_str())
            .collect()
    }
}
