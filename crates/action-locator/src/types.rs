//! Core types for the locator engine

use std::fmt;

use serde::{Deserialize, Serialize};

/// Breadth of a search relative to its starting element.
///
/// - Element: the starting element alone
/// - Children: immediate children
/// - Descendants: strict descendants, level by level
/// - Subtree: the starting element, then its descendants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Element,
    Children,
    Descendants,
    Subtree,
}

impl Scope {
    /// Get scope name as string
    pub fn name(&self) -> &'static str {
        match self {
            Scope::Element => "element",
            Scope::Children => "children",
            Scope::Descendants => "descendants",
            Scope::Subtree => "subtree",
        }
    }

    /// Whether the starting element itself is a candidate
    pub fn includes_self(&self) -> bool {
        matches!(self, Scope::Element | Scope::Subtree)
    }

    /// Whether candidates below the immediate children are considered
    pub fn reaches_descendants(&self) -> bool {
        matches!(self, Scope::Descendants | Scope::Subtree)
    }

    /// Path delimiter for this scope, if it has one
    pub fn delimiter(&self) -> Option<&'static str> {
        match self {
            Scope::Children => Some("/"),
            Scope::Descendants | Scope::Subtree => Some("//"),
            Scope::Element => None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_flags() {
        assert!(Scope::Subtree.includes_self());
        assert!(!Scope::Descendants.includes_self());
        assert!(Scope::Descendants.reaches_descendants());
        assert!(!Scope::Children.reaches_descendants());
    }

    #[test]
    fn test_delimiters() {
        assert_eq!(Scope::Children.delimiter(), Some("/"));
        assert_eq!(Scope::Descendants.delimiter(), Some("//"));
        assert_eq!(Scope::Element.delimiter(), None);
    }
}
