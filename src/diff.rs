use std::collections::BTreeSet;

use serde::Serialize;

use crate::ir::HierarchyEdge;
use crate::layout::{Layout, NodeLayout};

/// Moves smaller than this are treated as the node staying put.
const MOVE_EPSILON: f32 = 0.01;

/// What changed between two consecutive layouts, keyed by node id.
///
/// A renderer uses this to animate: `added` nodes enter, `removed` nodes
/// leave, `moved` nodes tween from their old box to the new one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayoutDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub moved: Vec<NodeMove>,
    pub unchanged: Vec<String>,
    pub edges_added: Vec<HierarchyEdge>,
    pub edges_removed: Vec<HierarchyEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeMove {
    pub id: String,
    pub from: (f32, f32),
    pub to: (f32, f32),
}

impl LayoutDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.moved.is_empty()
            && self.edges_added.is_empty()
            && self.edges_removed.is_empty()
    }
}

/// Diff from `previous` (if any) to `next`. With no previous layout every
/// node and edge counts as added.
pub fn diff_layouts(previous: Option<&Layout>, next: &Layout) -> LayoutDiff {
    let mut diff = LayoutDiff::default();
    let Some(previous) = previous else {
        diff.added = next.nodes.keys().cloned().collect();
        diff.edges_added = edge_set(next).into_iter().collect();
        return diff;
    };

    for (id, node) in &next.nodes {
        match previous.nodes.get(id) {
            None => diff.added.push(id.clone()),
            Some(old) if has_moved(old, node) => diff.moved.push(NodeMove {
                id: id.clone(),
                from: (old.x, old.y),
                to: (node.x, node.y),
            }),
            Some(_) => diff.unchanged.push(id.clone()),
        }
    }
    diff.removed = previous
        .nodes
        .keys()
        .filter(|id| !next.nodes.contains_key(*id))
        .cloned()
        .collect();

    let before = edge_set(previous);
    let after = edge_set(next);
    diff.edges_added = after.difference(&before).cloned().collect();
    diff.edges_removed = before.difference(&after).cloned().collect();
    diff
}

fn has_moved(old: &NodeLayout, new: &NodeLayout) -> bool {
    (old.x - new.x).abs() > MOVE_EPSILON
        || (old.y - new.y).abs() > MOVE_EPSILON
        || (old.width - new.width).abs() > MOVE_EPSILON
        || (old.height - new.height).abs() > MOVE_EPSILON
}

fn edge_set(layout: &Layout) -> BTreeSet<HierarchyEdge> {
    layout
        .edges
        .iter()
        .map(|edge| HierarchyEdge::new(edge.from.as_str(), edge.to.as_str()))
        .collect()
}
