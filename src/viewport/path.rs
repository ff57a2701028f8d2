//! Viewport paths: the chain of viewport names from the root.

use std::fmt;

/// Names of the viewports from the root down to a viewport.
///
/// The root content itself has the empty path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ViewportPath(Vec<String>);

impl ViewportPath {
    /// The root path.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// This path extended by `name`.
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.to_owned());
        Self(segments)
    }

    pub fn push(&mut self, name: impl Into<String>) {
        self.0.push(name.into());
    }

    /// The enclosing path, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Last segment.
    pub fn name(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Number of segments; top-level viewports have depth 1.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `self` is `other` or one of its ancestors.
    pub fn is_prefix_of(&self, other: &ViewportPath) -> bool {
        other.0.starts_with(&self.0)
    }
}

impl fmt::Display for ViewportPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.0 {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(ViewportPath::root().to_string(), "/");
        assert_eq!(
            ViewportPath::from_segments(["main", "detail"]).to_string(),
            "/main/detail"
        );
    }

    #[test]
    fn child_and_parent() {
        let main = ViewportPath::root().child("main");
        let detail = main.child("detail");
        assert_eq!(detail.depth(), 2);
        assert_eq!(detail.name(), Some("detail"));
        assert_eq!(detail.parent(), Some(main.clone()));
        assert_eq!(main.parent(), Some(ViewportPath::root()));
        assert_eq!(ViewportPath::root().parent(), None);
    }

    #[test]
    fn prefixes() {
        let main = ViewportPath::from_segments(["main"]);
        let deep = ViewportPath::from_segments(["main", "a", "b"]);
        assert!(main.is_prefix_of(&deep));
        assert!(ViewportPath::root().is_prefix_of(&main));
        assert!(!deep.is_prefix_of(&main));
    }
}
