//! Viewport tree: slotmap arena of named slots and their contents.

pub mod node;
pub mod path;
pub mod tree;

pub use node::{Viewport, ViewportContent, ViewportFlags, ViewportId, ViewportOptions};
pub use path::ViewportPath;
pub use tree::ViewportTree;
