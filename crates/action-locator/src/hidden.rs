//! Merging of elements only reachable through OS window enumeration

use std::collections::HashSet;

use action_primitives::{AutomationProvider, WindowDepth};
use tracing::debug;
use uiquery_core_types::{IdentityKey, ProviderError};

use crate::condition::Condition;
use crate::finder::ElementFinder;
use crate::types::Scope;

/// Ordered result set de-duplicated by element identity.
struct MergedResults<N> {
    nodes: Vec<N>,
    seen: HashSet<IdentityKey>,
}

impl<N: Clone> MergedResults<N> {
    fn new() -> Self {
        Self {
            nodes: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Add `node` unless an element with the same identity is already present.
    /// Nodes without any identity are always kept.
    fn push(&mut self, node: N, identity: Option<IdentityKey>) -> bool {
        if let Some(key) = identity {
            if !self.seen.insert(key) {
                return false;
            }
        }
        self.nodes.push(node);
        true
    }

    fn contains(&self, identity: &Option<IdentityKey>) -> bool {
        identity.as_ref().map_or(false, |key| self.seen.contains(key))
    }
}

/// Find all matches under `root`, widened by elements owned by other OS
/// windows that the primary walk does not expose.
///
/// Window enumeration only runs when `root` has a native window handle or
/// `force_all_windows` is set; without a handle it covers every window in
/// the system. Primary results come first, then hidden matches in window
/// enumeration order, with duplicates (by identity) removed.
pub fn find_all_including_hidden<P>(
    provider: &P,
    root: &P::Node,
    scope: Scope,
    condition: &Condition,
    force_all_windows: bool,
) -> Result<Vec<P::Node>, ProviderError>
where
    P: AutomationProvider + ?Sized,
{
    let finder = ElementFinder::new(provider);
    let mut results = MergedResults::new();
    for node in finder.find_all(root, scope, condition)? {
        let identity = provider.identity(&node)?;
        results.push(node, identity);
    }

    let (depth, window_scope) = match scope {
        Scope::Element => return Ok(results.nodes),
        _ if scope.reaches_descendants() => (WindowDepth::Recursive, Scope::Subtree),
        _ => (WindowDepth::Immediate, Scope::Element),
    };

    let handle = provider.native_window_handle(root)?;
    if handle.is_none() && !force_all_windows {
        return Ok(results.nodes);
    }

    let mut visited_windows = HashSet::new();
    if let Some(key) = provider.identity(root)? {
        visited_windows.insert(key);
    }

    let windows = provider.child_windows(handle, depth)?;
    debug!(
        window_count = windows.len(),
        forced = handle.is_none(),
        "merging elements from OS child windows"
    );

    for window in windows {
        let Some(window_node) = provider.element_from_handle(window)? else {
            continue;
        };
        let window_identity = provider.identity(&window_node)?;
        if results.contains(&window_identity) {
            continue;
        }
        if let Some(key) = &window_identity {
            if !visited_windows.insert(key.clone()) {
                continue;
            }
        }

        for node in finder.find_all(&window_node, window_scope, condition)? {
            let identity = provider.identity(&node)?;
            if results.push(node, identity) {
                debug!(%window, "merged element from hidden window");
            }
        }
    }

    Ok(results.nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_primitives::{MemNodeId, MemoryTree, NodeSpec, PropertySource};
    use uiquery_core_types::ControlType;

    fn button(id: &str) -> NodeSpec {
        NodeSpec::new(ControlType::Button).with_automation_id(id)
    }

    fn ids(tree: &MemoryTree, nodes: &[MemNodeId]) -> Vec<String> {
        nodes
            .iter()
            .map(|node| tree.automation_id(node).unwrap().unwrap())
            .collect()
    }

    fn app() -> MemoryTree {
        let spec = NodeSpec::new(ControlType::Pane).named("Desktop").child(
            NodeSpec::new(ControlType::Window)
                .with_automation_id("main")
                .with_window(0x100)
                .child(button("visible"))
                .hidden_child(
                    NodeSpec::new(ControlType::Pane)
                        .with_automation_id("owned")
                        .with_window(0x101)
                        .child(button("hidden")),
                ),
        );
        MemoryTree::from_spec(&spec).unwrap()
    }

    fn main_window(tree: &MemoryTree) -> MemNodeId {
        tree.find_by_automation_id("main").unwrap()
    }

    #[test]
    fn test_hidden_descendants_are_merged_after_primary() {
        let tree = app();
        let found = find_all_including_hidden(
            &tree,
            &main_window(&tree),
            Scope::Descendants,
            &Condition::control_type(ControlType::Button),
            false,
        )
        .unwrap();
        assert_eq!(ids(&tree, &found), vec!["visible", "hidden"]);
    }

    #[test]
    fn test_children_scope_tests_immediate_windows_only() {
        let tree = app();
        let panes = find_all_including_hidden(
            &tree,
            &main_window(&tree),
            Scope::Children,
            &Condition::control_type(ControlType::Pane),
            false,
        )
        .unwrap();
        assert_eq!(ids(&tree, &panes), vec!["owned"]);

        let buttons = find_all_including_hidden(
            &tree,
            &main_window(&tree),
            Scope::Children,
            &Condition::automation_id("hidden"),
            false,
        )
        .unwrap();
        assert!(buttons.is_empty());
    }

    #[test]
    fn test_enumeration_skipped_without_handle() {
        let tree = app();
        let found = find_all_including_hidden(
            &tree,
            &tree.root(),
            Scope::Descendants,
            &Condition::control_type(ControlType::Button),
            false,
        )
        .unwrap();
        assert_eq!(ids(&tree, &found), vec!["visible"]);
    }

    #[test]
    fn test_forced_enumeration_without_handle() {
        let tree = app();
        let found = find_all_including_hidden(
            &tree,
            &tree.root(),
            Scope::Descendants,
            &Condition::control_type(ControlType::Button),
            true,
        )
        .unwrap();
        assert_eq!(ids(&tree, &found), vec!["visible", "hidden"]);
    }

    #[test]
    fn test_element_reachable_both_ways_appears_once() {
        // "shared" is a walk-visible child that also owns an OS window.
        let spec = NodeSpec::new(ControlType::Pane).child(
            NodeSpec::new(ControlType::Window)
                .with_automation_id("main")
                .with_window(0x200)
                .child(button("shared").with_window(0x201)),
        );
        let tree = MemoryTree::from_spec(&spec).unwrap();
        let root = tree.find_by_automation_id("main").unwrap();

        for scope in [Scope::Children, Scope::Descendants, Scope::Subtree] {
            let found = find_all_including_hidden(
                &tree,
                &root,
                scope,
                &Condition::automation_id("shared"),
                false,
            )
            .unwrap();
            assert_eq!(ids(&tree, &found), vec!["shared"], "scope {scope}");
        }
    }

    #[test]
    fn test_element_scope_never_enumerates() {
        let tree = app();
        let before = tree.call_count();
        let found = find_all_including_hidden(
            &tree,
            &main_window(&tree),
            Scope::Element,
            &Condition::automation_id("main"),
            true,
        )
        .unwrap();
        assert_eq!(found.len(), 1);
        // one property read for the condition, two for the identity
        assert!(tree.call_count() - before <= 3);
    }
}
