//! Instruction model: ViewportInstruction, InstructionTree, Parameters, ComponentRef.

use std::fmt;
use std::rc::Rc;

use crate::component::ComponentDefinition;

// ---------------------------------------------------------------------------
// ComponentRef
// ---------------------------------------------------------------------------

/// Identity of a routed component: a registered name or a definition handle.
///
/// Two refs compare equal when they name the same component, regardless of
/// how they were written.
#[derive(Clone)]
pub enum ComponentRef {
    /// Resolved by name through the component resolver.
    Name(String),
    /// Carries its own definition (and factory).
    Definition(Rc<ComponentDefinition>),
}

impl ComponentRef {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Definition(def) => def.name(),
        }
    }

    pub fn definition(&self) -> Option<&Rc<ComponentDefinition>> {
        match self {
            Self::Name(_) => None,
            Self::Definition(def) => Some(def),
        }
    }
}

impl PartialEq for ComponentRef {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for ComponentRef {}

impl fmt::Debug for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "Name({name:?})"),
            Self::Definition(def) => write!(f, "Definition({:?})", def.name()),
        }
    }
}

impl fmt::Display for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for ComponentRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for ComponentRef {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<Rc<ComponentDefinition>> for ComponentRef {
    fn from(def: Rc<ComponentDefinition>) -> Self {
        Self::Definition(def)
    }
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// A single parameter: positional when `name` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Parameter {
    pub name: Option<String>,
    pub value: String,
}

/// Ordered component parameters. Positional and named entries may mix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Parameters(Vec<Parameter>);

impl Parameters {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Build from positional values.
    pub fn positional<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            values
                .into_iter()
                .map(|value| Parameter {
                    name: None,
                    value: value.into(),
                })
                .collect(),
        )
    }

    /// Build from `(name, value)` pairs.
    pub fn named<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(name, value)| Parameter {
                    name: Some(name.into()),
                    value: value.into(),
                })
                .collect(),
        )
    }

    pub fn push(&mut self, parameter: Parameter) {
        self.0.push(parameter);
    }

    pub fn push_positional(&mut self, value: impl Into<String>) {
        self.0.push(Parameter {
            name: None,
            value: value.into(),
        });
    }

    pub fn push_named(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push(Parameter {
            name: Some(name.into()),
            value: value.into(),
        });
    }

    /// Value of the first parameter called `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|p| p.name.as_deref() == Some(name))
            .map(|p| p.value.as_str())
    }

    /// The `index`-th positional value (named entries are not counted).
    pub fn at(&self, index: usize) -> Option<&str> {
        self.0
            .iter()
            .filter(|p| p.name.is_none())
            .nth(index)
            .map(|p| p.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Parameter> for Parameters {
    fn from_iter<T: IntoIterator<Item = Parameter>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// ViewportInstruction
// ---------------------------------------------------------------------------

/// What should occupy which viewport.
///
/// `component == None` is an explicit clear of the target viewport. Siblings
/// are the neighbouring entries of the list this instruction lives in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewportInstruction {
    pub component: Option<ComponentRef>,
    pub parameters: Parameters,
    pub viewport: Option<String>,
    pub children: Vec<ViewportInstruction>,
}

impl ViewportInstruction {
    /// Instruction loading `component` into the default viewport.
    pub fn new(component: impl Into<ComponentRef>) -> Self {
        Self {
            component: Some(component.into()),
            parameters: Parameters::new(),
            viewport: None,
            children: Vec::new(),
        }
    }

    /// Instruction clearing `viewport` (or the default viewport).
    pub fn clear(viewport: Option<&str>) -> Self {
        Self {
            component: None,
            parameters: Parameters::new(),
            viewport: viewport.map(str::to_owned),
            children: Vec::new(),
        }
    }

    /// Set the parameters (builder).
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Append a positional parameter (builder).
    pub fn with_param(mut self, value: impl Into<String>) -> Self {
        self.parameters.push_positional(value);
        self
    }

    /// Append a named parameter (builder).
    pub fn with_named_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push_named(name, value);
        self
    }

    /// Target a specific viewport (builder).
    pub fn with_viewport(mut self, viewport: impl Into<String>) -> Self {
        self.viewport = Some(viewport.into());
        self
    }

    /// Append a child instruction (builder).
    pub fn with_child(mut self, child: ViewportInstruction) -> Self {
        self.children.push(child);
        self
    }

    /// Append several child instructions (builder).
    pub fn with_children(mut self, children: impl IntoIterator<Item = ViewportInstruction>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn is_clear(&self) -> bool {
        self.component.is_none()
    }

    pub fn component_name(&self) -> Option<&str> {
        self.component.as_ref().map(ComponentRef::name)
    }

    /// Same component and same parameters, ignoring viewport and children.
    pub fn same_content(&self, other: &ViewportInstruction) -> bool {
        self.component == other.component && self.parameters == other.parameters
    }

    /// This instruction without its children.
    pub fn shallow(&self) -> ViewportInstruction {
        Self {
            component: self.component.clone(),
            parameters: self.parameters.clone(),
            viewport: self.viewport.clone(),
            children: Vec::new(),
        }
    }
}

impl fmt::Display for ViewportInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&super::stringify::stringify_instructions(std::slice::from_ref(self)))
    }
}

// ---------------------------------------------------------------------------
// InstructionTree
// ---------------------------------------------------------------------------

/// Root composite of a navigation: the instructions for the top-level viewports.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InstructionTree {
    pub instructions: Vec<ViewportInstruction>,
}

impl InstructionTree {
    pub fn new(instructions: Vec<ViewportInstruction>) -> Self {
        Self { instructions }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ViewportInstruction> {
        self.instructions.iter()
    }

    /// Depth-first walk over every instruction with its depth (root level = 0).
    pub fn walk(&self) -> Vec<(usize, &ViewportInstruction)> {
        fn visit<'a>(
            list: &'a [ViewportInstruction],
            depth: usize,
            out: &mut Vec<(usize, &'a ViewportInstruction)>,
        ) {
            for instruction in list {
                out.push((depth, instruction));
                visit(&instruction.children, depth + 1, out);
            }
        }
        let mut out = Vec::new();
        visit(&self.instructions, 0, &mut out);
        out
    }
}

impl fmt::Display for InstructionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&super::stringify::stringify(self))
    }
}

// ---------------------------------------------------------------------------
// NavigationInstruction
// ---------------------------------------------------------------------------

/// Anything `Router::load` accepts: a URL or an object graph.
#[derive(Debug, Clone)]
pub enum NavigationInstruction {
    Url(String),
    Component(ComponentRef),
    Instruction(ViewportInstruction),
    Instructions(Vec<ViewportInstruction>),
    Tree(InstructionTree),
}

impl From<&str> for NavigationInstruction {
    fn from(url: &str) -> Self {
        Self::Url(url.to_owned())
    }
}

impl From<String> for NavigationInstruction {
    fn from(url: String) -> Self {
        Self::Url(url)
    }
}

impl From<&String> for NavigationInstruction {
    fn from(url: &String) -> Self {
        Self::Url(url.clone())
    }
}

impl From<ComponentRef> for NavigationInstruction {
    fn from(component: ComponentRef) -> Self {
        Self::Component(component)
    }
}

impl From<Rc<ComponentDefinition>> for NavigationInstruction {
    fn from(def: Rc<ComponentDefinition>) -> Self {
        Self::Component(ComponentRef::Definition(def))
    }
}

impl From<ViewportInstruction> for NavigationInstruction {
    fn from(instruction: ViewportInstruction) -> Self {
        Self::Instruction(instruction)
    }
}

impl From<Vec<ViewportInstruction>> for NavigationInstruction {
    fn from(instructions: Vec<ViewportInstruction>) -> Self {
        Self::Instructions(instructions)
    }
}

impl From<InstructionTree> for NavigationInstruction {
    fn from(tree: InstructionTree) -> Self {
        Self::Tree(tree)
    }
}
