//! Generic depth-first traversal over anything with children.

/// Capability of enumerating a node's direct children.
pub trait Hierarchy {
    /// Handle used to name nodes.
    type Node: Copy;

    /// Direct children of `node` in their stored order.
    fn child_nodes(&self, node: Self::Node) -> Vec<Self::Node>;
}

/// Visits `root` and every descendant in pre-order.
///
/// Uses an explicit stack, so deep hierarchies cannot overflow the call stack.
/// Siblings are visited in the order [`Hierarchy::child_nodes`] returns them.
pub fn walk_depth_first<H, F>(hierarchy: &H, root: H::Node, mut visit: F)
where
    H: Hierarchy + ?Sized,
    F: FnMut(H::Node),
{
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        visit(node);
        stack.extend(hierarchy.child_nodes(node).into_iter().rev());
    }
}

/// Collects `root` and its descendants in pre-order.
#[must_use]
pub fn depth_first<H>(hierarchy: &H, root: H::Node) -> Vec<H::Node>
where
    H: Hierarchy + ?Sized,
{
    let mut nodes = Vec::new();
    walk_depth_first(hierarchy, root, |node| nodes.push(node));
    nodes
}
