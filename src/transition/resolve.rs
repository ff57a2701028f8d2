//! Resolve a parsed request against the current tree and the component
//! definitions, producing the complete target tree.
//!
//! Every instruction in the result names its viewport and carries its
//! definition. Per level:
//!
//! * explicitly targeted viewports must be declared by the owning component
//!   and must accept the component (`used_by`);
//! * untargeted instructions take a free viewport: one already showing the
//!   same component (when merging), else one listing it in `used_by`, else the
//!   first one accepting it;
//! * viewports nobody targets keep their content when merging, or fall back
//!   to their default component;
//! * unknown component names are skipped with a warning.

use std::collections::HashMap;
use std::rc::Rc;

use crate::component::{ComponentDefinition, ComponentResolver};
use crate::error::RouterError;
use crate::instruction::{ComponentRef, InstructionTree, ViewportInstruction};
use crate::router::targets;
use crate::viewport::tree::first_free;
use crate::viewport::{ViewportOptions, ViewportPath};

/// A fully resolved target.
#[derive(Debug, Clone, Default)]
pub struct Resolved {
    pub tree: InstructionTree,
    /// Declaration of every viewport that exists once the target is loaded.
    pub viewports: HashMap<ViewportPath, ViewportOptions>,
}

impl Resolved {
    pub fn options(&self, path: &ViewportPath) -> Option<&ViewportOptions> {
        self.viewports.get(path)
    }
}

/// Merge `request` into `current` (or replace it when `replace` is set).
pub fn resolve(
    request: &InstructionTree,
    current: &InstructionTree,
    root: &ComponentDefinition,
    resolver: &dyn ComponentResolver,
    replace: bool,
) -> Result<Resolved, RouterError> {
    let mut pass = Pass {
        resolver,
        replace,
        viewports: HashMap::new(),
    };
    let instructions = pass.level(
        &ViewportPath::root(),
        root.name(),
        root.viewports(),
        &current.instructions,
        &request.instructions,
    )?;
    Ok(Resolved {
        tree: InstructionTree::new(instructions),
        viewports: pass.viewports,
    })
}

struct Pass<'a> {
    resolver: &'a dyn ComponentResolver,
    replace: bool,
    viewports: HashMap<ViewportPath, ViewportOptions>,
}

type Claim<'r> = (&'r ViewportInstruction, Option<Rc<ComponentDefinition>>);

impl Pass<'_> {
    fn level(
        &mut self,
        parent: &ViewportPath,
        owner: &str,
        declared: &[ViewportOptions],
        current: &[ViewportInstruction],
        requested: &[ViewportInstruction],
    ) -> Result<Vec<ViewportInstruction>, RouterError> {
        for options in declared {
            self.viewports
                .insert(parent.child(&options.name), options.clone());
        }

        let existing = |name: &str| current.iter().find(|c| c.viewport.as_deref() == Some(name));

        let mut wanted: Vec<Claim<'_>> = Vec::new();
        for instruction in requested {
            match &instruction.component {
                None => wanted.push((instruction, None)),
                Some(component) => match self.resolver.resolve(component) {
                    Some(definition) => wanted.push((instruction, Some(definition))),
                    None => tracing::warn!(
                        target: targets::ROUTER,
                        component = component.name(),
                        viewport = %parent,
                        "unknown component; instruction skipped"
                    ),
                },
            }
        }

        let mut claims: Vec<Option<Claim<'_>>> = vec![None; declared.len()];

        for (instruction, definition) in wanted.iter().filter(|(i, _)| i.viewport.is_some()) {
            let name = instruction.viewport.as_deref().unwrap_or_default();
            let Some(index) = declared.iter().position(|d| d.name == name) else {
                return Err(RouterError::UnknownViewport {
                    viewport: name.to_owned(),
                    parent: owner.to_owned(),
                });
            };
            if let Some(definition) = definition {
                if !declared[index].accepts(definition.name()) {
                    return Err(RouterError::NotAllowed {
                        component: definition.name().to_owned(),
                        viewport: name.to_owned(),
                    });
                }
            }
            claims[index] = Some((*instruction, definition.clone()));
        }

        for (instruction, definition) in wanted.iter().filter(|(i, _)| i.viewport.is_none()) {
            let claimed: Vec<bool> = claims.iter().map(Option::is_some).collect();
            let index = match definition {
                Some(definition) => self.pick(declared, &claimed, current, definition.name()),
                None => claimed.iter().position(|taken| !taken),
            };
            let Some(index) = index else {
                return Err(RouterError::NoAvailableViewport {
                    component: instruction.component_name().unwrap_or("-").to_owned(),
                });
            };
            claims[index] = Some((*instruction, definition.clone()));
        }

        let mut out = Vec::new();
        for (options, claim) in declared.iter().zip(claims) {
            let path = parent.child(&options.name);
            let present = existing(&options.name);
            match claim {
                Some((_, None)) => {}
                Some((instruction, Some(definition))) => {
                    let merge = !self.replace && present.is_some_and(|p| p.same_content(instruction));
                    let base: &[ViewportInstruction] = match present {
                        Some(p) if merge => &p.children,
                        _ => &[],
                    };
                    let children = self.level(
                        &path,
                        definition.name(),
                        definition.viewports(),
                        base,
                        &instruction.children,
                    )?;
                    out.push(
                        ViewportInstruction::new(ComponentRef::Definition(definition))
                            .with_parameters(instruction.parameters.clone())
                            .with_viewport(options.name.clone())
                            .with_children(children),
                    );
                }
                None => {
                    if let Some(kept) = present.filter(|_| !self.replace) {
                        self.record(&path, kept);
                        out.push(kept.clone());
                    } else if let Some(default) = &options.default_component {
                        match self.resolver.definition(default) {
                            Some(definition) => {
                                let children = self.level(
                                    &path,
                                    definition.name(),
                                    definition.viewports(),
                                    &[],
                                    &[],
                                )?;
                                out.push(
                                    ViewportInstruction::new(ComponentRef::Definition(definition))
                                        .with_viewport(options.name.clone())
                                        .with_children(children),
                                );
                            }
                            None => tracing::warn!(
                                target: targets::ROUTER,
                                component = default.as_str(),
                                viewport = %path,
                                "unknown default component"
                            ),
                        }
                    }
                }
            }
        }
        Ok(out)
    }

    /// Viewport for an untargeted `component`.
    fn pick(
        &self,
        declared: &[ViewportOptions],
        claimed: &[bool],
        current: &[ViewportInstruction],
        component: &str,
    ) -> Option<usize> {
        if !self.replace {
            let showing = declared.iter().enumerate().position(|(i, d)| {
                !claimed[i]
                    && d.accepts(component)
                    && current.iter().any(|c| {
                        c.viewport.as_deref() == Some(d.name.as_str())
                            && c.component_name() == Some(component)
                    })
            });
            if showing.is_some() {
                return showing;
            }
        }
        let options: Vec<&ViewportOptions> = declared.iter().collect();
        first_free(&options, claimed, component)
    }

    /// Note the viewports below content that stays as it is.
    fn record(&mut self, path: &ViewportPath, kept: &ViewportInstruction) {
        let definition = kept
            .component
            .as_ref()
            .and_then(|c| self.resolver.resolve(c));
        if let Some(definition) = definition {
            for options in definition.viewports() {
                self.viewports.insert(path.child(&options.name), options.clone());
            }
        }
        for child in &kept.children {
            if let Some(name) = &child.viewport {
                self.record(&path.child(name), child);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentRegistry;
    use crate::instruction::parse_url;
    use crate::testing::recorder::Inert;
    use pretty_assertions::assert_eq;

    fn def(name: &str) -> ComponentDefinition {
        ComponentDefinition::new(name, Inert::factory(name))
    }

    fn registry() -> ComponentRegistry {
        ComponentRegistry::new()
            .with(def("a"))
            .with(def("b"))
            .with(def("menu"))
            .with(def("home"))
            .with(def("shell").with_viewport("left").with_viewport("right"))
            .with(def("leaf"))
    }

    fn root() -> ComponentDefinition {
        def("root")
            .with_viewport(ViewportOptions::new("main"))
            .with_viewport(ViewportOptions::new("side").with_used_by(["menu"]))
    }

    fn run(url: &str, current: &str, replace: bool) -> Result<String, RouterError> {
        let registry = registry();
        let current = if current.is_empty() {
            InstructionTree::empty()
        } else {
            resolve(&parse_url(current).unwrap(), &InstructionTree::empty(), &root(), &registry, true)?.tree
        };
        resolve(&parse_url(url).unwrap(), &current, &root(), &registry, replace)
            .map(|r| r.tree.to_string())
    }

    #[test]
    fn untargeted_takes_first_accepting_viewport() {
        assert_eq!(run("a", "", false).unwrap(), "a@main");
    }

    #[test]
    fn used_by_attracts_listed_component() {
        assert_eq!(run("menu", "", false).unwrap(), "menu@side");
        assert_eq!(run("a+menu", "", false).unwrap(), "a@main+menu@side");
    }

    #[test]
    fn no_free_viewport() {
        assert!(matches!(
            run("a+b", "", false),
            Err(RouterError::NoAvailableViewport { component }) if component == "b"
        ));
    }

    #[test]
    fn unknown_viewport() {
        assert!(matches!(
            run("a@nowhere", "", false),
            Err(RouterError::UnknownViewport { viewport, parent }) if viewport == "nowhere" && parent == "root"
        ));
    }

    #[test]
    fn not_allowed() {
        assert!(matches!(
            run("a@side", "", false),
            Err(RouterError::NotAllowed { component, viewport }) if component == "a" && viewport == "side"
        ));
    }

    #[test]
    fn unknown_components_are_skipped() {
        assert_eq!(run("ghost+a", "", false).unwrap(), "a@main");
    }

    #[test]
    fn merge_keeps_untargeted_content() {
        assert_eq!(run("b", "a+menu", false).unwrap(), "b@main+menu@side");
    }

    #[test]
    fn replace_drops_untargeted_content() {
        assert_eq!(run("b", "a+menu", true).unwrap(), "b@main");
    }

    #[test]
    fn clear_empties_viewport() {
        assert_eq!(run("-@side", "a+menu", false).unwrap(), "a@main");
    }

    #[test]
    fn nested_children_resolve_in_declared_viewports() {
        assert_eq!(
            run("shell/(a+b)", "", false).unwrap(),
            "shell@main/(a@left+b@right)"
        );
    }

    #[test]
    fn same_parent_merges_children() {
        assert_eq!(
            run("shell/b@right", "shell/a", false).unwrap(),
            "shell@main/(a@left+b@right)"
        );
    }

    #[test]
    fn untargeted_prefers_viewport_already_showing_it() {
        assert_eq!(
            run("shell/b", "shell/(a+b)", false).unwrap(),
            "shell@main/(a@left+b@right)"
        );
    }

    #[test]
    fn different_parent_drops_old_children() {
        let registry = registry().with(def("frame").with_viewport("left"));
        let current = resolve(
            &parse_url("shell/a").unwrap(),
            &InstructionTree::empty(),
            &root(),
            &registry,
            true,
        )
        .unwrap();
        let next = resolve(&parse_url("frame").unwrap(), &current.tree, &root(), &registry, false).unwrap();
        assert_eq!(next.tree.to_string(), "frame@main");
    }

    #[test]
    fn defaults_fill_empty_viewports() {
        let registry = registry();
        let root = def("root")
            .with_viewport(ViewportOptions::new("main").with_default("home"))
            .with_viewport(ViewportOptions::new("side").with_default("menu"));
        let resolved =
            resolve(&InstructionTree::empty(), &InstructionTree::empty(), &root, &registry, false).unwrap();
        assert_eq!(resolved.tree.to_string(), "home@main+menu@side");

        let cleared =
            resolve(&parse_url("-@side").unwrap(), &resolved.tree, &root, &registry, false).unwrap();
        assert_eq!(cleared.tree.to_string(), "home@main");
    }

    #[test]
    fn viewport_options_are_recorded() {
        let registry = registry();
        let resolved = resolve(
            &parse_url("shell/a").unwrap(),
            &InstructionTree::empty(),
            &root(),
            &registry,
            false,
        )
        .unwrap();
        let left = ViewportPath::from_segments(["main", "left"]);
        assert_eq!(resolved.options(&left).map(|o| o.name.as_str()), Some("left"));
        assert!(resolved
            .options(&ViewportPath::from_segments(["side"]))
            .is_some_and(|o| o.lists("menu")));
    }

    #[test]
    fn resolved_instructions_carry_definitions() {
        let registry = registry();
        let resolved = resolve(
            &parse_url("a").unwrap(),
            &InstructionTree::empty(),
            &root(),
            &registry,
            false,
        )
        .unwrap();
        let component = resolved.tree.instructions[0].component.as_ref().unwrap();
        assert!(component.definition().is_some());
    }
}
