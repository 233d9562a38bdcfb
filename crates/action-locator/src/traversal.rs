//! Child-only and level-order traversal over a live tree

use std::mem;

use action_primitives::TreeWalker;
use uiquery_core_types::ProviderError;

/// Which part of the tree below a root gets visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalMode {
    Children,
    Descendants,
}

/// Visit nodes below `root` until `visit` returns `false` or the tree is
/// exhausted. The root itself is never visited.
pub fn walk<W, F>(
    walker: &W,
    root: &W::Node,
    mode: TraversalMode,
    visit: F,
) -> Result<(), ProviderError>
where
    W: TreeWalker + ?Sized,
    F: FnMut(&W::Node) -> Result<bool, ProviderError>,
{
    match mode {
        TraversalMode::Children => walk_children(walker, root, visit),
        TraversalMode::Descendants => walk_descendants(walker, root, visit),
    }
}

/// Visit the immediate children of `root` in sibling order.
pub fn walk_children<W, F>(walker: &W, root: &W::Node, mut visit: F) -> Result<(), ProviderError>
where
    W: TreeWalker + ?Sized,
    F: FnMut(&W::Node) -> Result<bool, ProviderError>,
{
    let mut child = walker.first_child(root)?;
    while let Some(node) = child {
        if !visit(&node)? {
            return Ok(());
        }
        child = walker.next_sibling(&node)?;
    }
    Ok(())
}

/// Visit every descendant of `root` in level order.
///
/// Two working lists hold the current and the next level and are swapped
/// once a level is done, so depth never grows the call stack and a
/// shallower node is always visited before a deeper one.
pub fn walk_descendants<W, F>(
    walker: &W,
    root: &W::Node,
    mut visit: F,
) -> Result<(), ProviderError>
where
    W: TreeWalker + ?Sized,
    F: FnMut(&W::Node) -> Result<bool, ProviderError>,
{
    let mut current = vec![root.clone()];
    let mut next = Vec::new();

    while !current.is_empty() {
        for parent in current.drain(..) {
            let mut child = walker.first_child(&parent)?;
            while let Some(node) = child {
                if !visit(&node)? {
                    return Ok(());
                }
                child = walker.next_sibling(&node)?;
                next.push(node);
            }
        }
        mem::swap(&mut current, &mut next);
    }
    Ok(())
}
