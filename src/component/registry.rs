//! Component definitions and the resolver seam to the DI container.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::traits::Component;
use crate::instruction::ComponentRef;
use crate::viewport::ViewportOptions;

type Factory = Rc<dyn Fn() -> Rc<dyn Component>>;

// ---------------------------------------------------------------------------
// ComponentDefinition
// ---------------------------------------------------------------------------

/// Static description of a routable component: its name, the viewports its
/// template declares, and how to create an instance.
#[derive(Clone)]
pub struct ComponentDefinition {
    name: String,
    viewports: Vec<ViewportOptions>,
    factory: Factory,
}

impl ComponentDefinition {
    pub fn new(name: impl Into<String>, factory: impl Fn() -> Rc<dyn Component> + 'static) -> Self {
        Self {
            name: name.into(),
            viewports: Vec::new(),
            factory: Rc::new(factory),
        }
    }

    /// Declare a child viewport (builder).
    pub fn with_viewport(mut self, viewport: impl Into<ViewportOptions>) -> Self {
        self.viewports.push(viewport.into());
        self
    }

    /// Declare several child viewports (builder).
    pub fn with_viewports(mut self, viewports: impl IntoIterator<Item = ViewportOptions>) -> Self {
        self.viewports.extend(viewports);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Viewports declared by this component, in declaration order.
    pub fn viewports(&self) -> &[ViewportOptions] {
        &self.viewports
    }

    /// The declared viewport called `name`.
    pub fn viewport(&self, name: &str) -> Option<&ViewportOptions> {
        self.viewports.iter().find(|v| v.name == name)
    }

    /// Create a fresh instance.
    pub fn create(&self) -> Rc<dyn Component> {
        (self.factory)()
    }
}

impl fmt::Debug for ComponentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDefinition")
            .field("name", &self.name)
            .field("viewports", &self.viewports)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// ComponentResolver
// ---------------------------------------------------------------------------

/// Looks up component definitions by name. This is the router's only view of
/// the dependency-injection container.
pub trait ComponentResolver {
    fn definition(&self, name: &str) -> Option<Rc<ComponentDefinition>>;

    /// Resolve a reference: definitions carry themselves, names are looked up.
    fn resolve(&self, component: &ComponentRef) -> Option<Rc<ComponentDefinition>> {
        match component {
            ComponentRef::Definition(def) => Some(Rc::clone(def)),
            ComponentRef::Name(name) => self.definition(name),
        }
    }
}

/// Name-keyed map of component definitions.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    definitions: HashMap<String, Rc<ComponentDefinition>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition, replacing any previous one with the same name.
    pub fn register(&mut self, definition: ComponentDefinition) -> Rc<ComponentDefinition> {
        let definition = Rc::new(definition);
        self.definitions
            .insert(definition.name().to_owned(), Rc::clone(&definition));
        definition
    }

    /// Register a definition (builder).
    pub fn with(mut self, definition: ComponentDefinition) -> Self {
        self.register(definition);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.definitions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl ComponentResolver for ComponentRegistry {
    fn definition(&self, name: &str) -> Option<Rc<ComponentDefinition>> {
        self.definitions.get(name).cloned()
    }
}
