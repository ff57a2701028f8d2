//! Hook names and the documented lifecycle order.

use std::fmt;

/// Every hook the router may call on a routed component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HookName {
    CanUnload,
    CanLoad,
    Unload,
    Load,
    Binding,
    Bound,
    Attaching,
    Attached,
    Detaching,
    Unbinding,
    Dispose,
}

impl HookName {
    /// Attach sequence, in call order.
    pub const ATTACH: [HookName; 4] = [
        HookName::Binding,
        HookName::Bound,
        HookName::Attaching,
        HookName::Attached,
    ];

    /// Detach sequence, in call order (for a single component).
    pub const DETACH: [HookName; 3] = [HookName::Detaching, HookName::Unbinding, HookName::Dispose];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CanUnload => "canUnload",
            Self::CanLoad => "canLoad",
            Self::Unload => "unload",
            Self::Load => "load",
            Self::Binding => "binding",
            Self::Bound => "bound",
            Self::Attaching => "attaching",
            Self::Attached => "attached",
            Self::Detaching => "detaching",
            Self::Unbinding => "unbinding",
            Self::Dispose => "dispose",
        }
    }

    /// `canLoad` / `canUnload`.
    pub fn is_guard(self) -> bool {
        matches!(self, Self::CanLoad | Self::CanUnload)
    }

    /// The four routing hooks (as opposed to controller lifecycle hooks).
    pub fn is_routing(self) -> bool {
        matches!(self, Self::CanLoad | Self::CanUnload | Self::Load | Self::Unload)
    }
}

impl fmt::Display for HookName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_camel_case() {
        assert_eq!(HookName::CanUnload.to_string(), "canUnload");
        assert_eq!(HookName::Attached.to_string(), "attached");
    }

    #[test]
    fn classification() {
        assert!(HookName::CanLoad.is_guard());
        assert!(!HookName::Load.is_guard());
        assert!(HookName::Unload.is_routing());
        assert!(!HookName::Binding.is_routing());
    }

    #[test]
    fn sequences() {
        assert_eq!(HookName::ATTACH.len(), 4);
        assert_eq!(HookName::DETACH[0], HookName::Detaching);
        assert_eq!(HookName::DETACH[2], HookName::Dispose);
    }
}
