//! Read-only tree traversal.
//!
//! Every lookup is a pre-order, depth-first search returning the first match,
//! built on one iterator so callers never hand-roll recursion. Misses are
//! `None`: callers treat that as "not found, do nothing".

use std::sync::Arc;

use smallvec::SmallVec;

use crate::config::PathMatch;
use crate::dom::{Node, NodeId};

/// Child indices leading from the root to a node.
pub type Route = SmallVec<[usize; 16]>;

/// Pre-order iterator over a subtree, the root included.
pub struct PreOrder<'a> {
    stack: Vec<&'a Arc<Node>>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a Arc<Node>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

pub fn pre_order(root: &Arc<Node>) -> PreOrder<'_> {
    PreOrder { stack: vec![root] }
}

/// Pre-order over a forest of sibling roots.
pub fn pre_order_all(nodes: &[Arc<Node>]) -> PreOrder<'_> {
    PreOrder {
        stack: nodes.iter().rev().collect(),
    }
}

pub fn find_first<'a, P>(root: &'a Arc<Node>, mut predicate: P) -> Option<&'a Arc<Node>>
where
    P: FnMut(&Node) -> bool,
{
    pre_order(root).find(|node| predicate(node))
}

pub fn find_by_id(root: &Arc<Node>, id: NodeId) -> Option<&Arc<Node>> {
    find_first(root, |node| node.id == id)
}

/// Relaxed path lookup: case-insensitive, `[n]` disambiguators ignored.
/// Distinct nodes in parallel subtrees can collide; never use this to pick
/// an edit target.
pub fn find_by_path<'a>(root: &'a Arc<Node>, path: &str) -> Option<&'a Arc<Node>> {
    find_by_path_with(root, path, PathMatch::Relaxed)
}

pub fn find_by_path_with<'a>(
    root: &'a Arc<Node>,
    path: &str,
    mode: PathMatch,
) -> Option<&'a Arc<Node>> {
    let target = mode.key(path);
    find_first(root, |node| mode.key(&node.path) == target)
}

pub fn find_by_name<'a>(nodes: &'a [Arc<Node>], name: &str) -> Option<&'a Arc<Node>> {
    pre_order_all(nodes).find(|node| &*node.name == name)
}

/// Child indices from `root` down to the node with `id`.
pub fn route_to(root: &Arc<Node>, id: NodeId) -> Option<Route> {
    fn walk(node: &Node, id: NodeId, route: &mut Route) -> bool {
        if node.id == id {
            return true;
        }
        for (index, child) in node.children.iter().enumerate() {
            route.push(index);
            if walk(child, id, route) {
                return true;
            }
            route.pop();
        }
        false
    }

    let mut route = Route::new();
    walk(root, id, &mut route).then_some(route)
}

/// Cumulative prefixes of a node's path: `/a`, `/a/b`, `/a/b/c`.
pub fn ancestor_paths(node: &Node) -> Vec<String> {
    let mut paths = Vec::new();
    let mut current = String::new();
    for part in node.path.split('/').filter(|p| !p.is_empty()) {
        current.push('/');
        current.push_str(part);
        paths.push(current.clone());
    }
    paths
}
