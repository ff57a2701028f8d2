//! Viewport node types: ViewportId, Viewport, ViewportContent, ViewportOptions.

use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;
use slotmap::new_key_type;

use crate::component::{Component, ComponentDefinition};
use crate::instruction::{ComponentRef, Parameters, ViewportInstruction};

new_key_type! {
    /// Unique identifier for a viewport. Copy, lightweight (u64).
    pub struct ViewportId;
}

bitflags! {
    /// Behavior switches of a viewport.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ViewportFlags: u8 {
        /// Content is left out of the router's URL.
        const NO_LINK = 1 << 0;
        /// Changes confined to this viewport do not create history entries.
        const NO_HISTORY = 1 << 1;
        /// Outgoing instances are kept alive and reused when they come back.
        const STATEFUL = 1 << 2;
    }
}

// ---------------------------------------------------------------------------
// ViewportOptions
// ---------------------------------------------------------------------------

/// Declaration of a viewport, as written in the owning component's template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewportOptions {
    /// Unique among the siblings declared by the same component.
    pub name: String,
    /// Loaded when the viewport would otherwise stay empty.
    pub default_component: Option<String>,
    /// Allow-list of component names. Empty means any component.
    pub used_by: Vec<String>,
    pub flags: ViewportFlags,
}

impl ViewportOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_component: None,
            used_by: Vec::new(),
            flags: ViewportFlags::empty(),
        }
    }

    /// Set the default component (builder).
    pub fn with_default(mut self, component: impl Into<String>) -> Self {
        self.default_component = Some(component.into());
        self
    }

    /// Restrict the viewport to these components (builder).
    pub fn with_used_by(mut self, components: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.used_by.extend(components.into_iter().map(Into::into));
        self
    }

    /// Add flags (builder).
    pub fn with_flags(mut self, flags: ViewportFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn no_link(self, on: bool) -> Self {
        self.toggle(ViewportFlags::NO_LINK, on)
    }

    pub fn no_history(self, on: bool) -> Self {
        self.toggle(ViewportFlags::NO_HISTORY, on)
    }

    pub fn stateful(self, on: bool) -> Self {
        self.toggle(ViewportFlags::STATEFUL, on)
    }

    fn toggle(mut self, flag: ViewportFlags, on: bool) -> Self {
        self.flags.set(flag, on);
        self
    }

    /// Whether `component` may be loaded here.
    pub fn accepts(&self, component: &str) -> bool {
        self.used_by.is_empty() || self.lists(component)
    }

    /// Whether `component` is named in the allow-list.
    pub fn lists(&self, component: &str) -> bool {
        self.used_by.iter().any(|c| c == component)
    }

    pub fn has(&self, flag: ViewportFlags) -> bool {
        self.flags.contains(flag)
    }
}

impl From<&str> for ViewportOptions {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

// ---------------------------------------------------------------------------
// ViewportContent
// ---------------------------------------------------------------------------

/// A component instance occupying a viewport, with its resolved parameters.
#[derive(Clone)]
pub struct ViewportContent {
    pub component: Rc<dyn Component>,
    pub definition: Rc<ComponentDefinition>,
    pub parameters: Parameters,
}

impl ViewportContent {
    pub fn new(
        component: Rc<dyn Component>,
        definition: Rc<ComponentDefinition>,
        parameters: Parameters,
    ) -> Self {
        Self {
            component,
            definition,
            parameters,
        }
    }

    /// Create a fresh instance from `definition`.
    pub fn create(definition: Rc<ComponentDefinition>, parameters: Parameters) -> Self {
        Self::new(definition.create(), definition, parameters)
    }

    /// Component name.
    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// Whether both contents hold the very same instance.
    pub fn same_instance(&self, other: &ViewportContent) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.component), Rc::as_ptr(&other.component))
    }

    /// The instruction that would load this content into `viewport`.
    pub fn instruction(&self, viewport: &str) -> ViewportInstruction {
        ViewportInstruction::new(ComponentRef::Definition(Rc::clone(&self.definition)))
            .with_parameters(self.parameters.clone())
            .with_viewport(viewport)
    }
}

impl fmt::Debug for ViewportContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewportContent")
            .field("component", &self.name())
            .field("parameters", &self.parameters)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Viewport
// ---------------------------------------------------------------------------

/// A named slot holding at most one content.
#[derive(Debug, Clone)]
pub struct Viewport {
    pub options: ViewportOptions,
    pub content: Option<ViewportContent>,
}

impl Viewport {
    pub fn new(options: ViewportOptions) -> Self {
        Self {
            options,
            content: None,
        }
    }

    /// Set the initial content (builder).
    pub fn with_content(mut self, content: ViewportContent) -> Self {
        self.content = Some(content);
        self
    }

    pub fn name(&self) -> &str {
        &self.options.name
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_none()
    }

    pub fn flags(&self) -> ViewportFlags {
        self.options.flags
    }
}
