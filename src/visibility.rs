use crate::ir::{Hierarchy, HierarchyEdge};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// Ids whose children are hidden. Ordered so iteration is deterministic.
pub type CollapsedSet = BTreeSet<String>;

/// The induced subgraph not hidden beneath a collapsed ancestor.
///
/// `nodes` is the depth-first pre-order from `root`; `edges` lists each
/// parent's visible children in hierarchy order. Two resolutions of the same
/// inputs compare equal, which is what layout memoization keys on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VisibleSubgraph {
    pub root: String,
    pub nodes: Vec<String>,
    pub edges: Vec<HierarchyEdge>,
    /// Visible nodes that are collapsed and actually hide children.
    pub folded: Vec<String>,
}

impl VisibleSubgraph {
    /// A lone root, mostly useful as a starting point for hand-built graphs.
    pub fn single(root: impl Into<String>) -> Self {
        let root = root.into();
        Self {
            nodes: vec![root.clone()],
            root,
            edges: Vec::new(),
            folded: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.iter().any(|node| node == id)
    }

    pub fn node_set(&self) -> HashSet<&str> {
        self.nodes.iter().map(String::as_str).collect()
    }

    pub fn is_folded(&self, id: &str) -> bool {
        self.folded.iter().any(|node| node == id)
    }
}

pub fn resolve(hierarchy: &Hierarchy, collapsed: &CollapsedSet) -> VisibleSubgraph {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    let mut folded = Vec::new();
    let mut stack: Vec<&str> = vec![hierarchy.root()];

    while let Some(id) = stack.pop() {
        nodes.push(id.to_string());
        let children = hierarchy.children(id);
        if children.is_empty() {
            continue;
        }
        if collapsed.contains(id) {
            folded.push(id.to_string());
            continue;
        }
        for child in children {
            edges.push(HierarchyEdge::new(id, child.as_str()));
        }
        for child in children.iter().rev() {
            stack.push(child.as_str());
        }
    }

    VisibleSubgraph {
        root: hierarchy.root().to_string(),
        nodes,
        edges,
        folded,
    }
}

/// Collapsed set that folds every node at `depth` or deeper, leaving the top
/// `depth` ranks expanded.
pub fn collapse_below(hierarchy: &Hierarchy, depth: usize) -> CollapsedSet {
    let mut collapsed = CollapsedSet::new();
    let mut stack: Vec<(&str, usize)> = vec![(hierarchy.root(), 0)];
    while let Some((id, level)) = stack.pop() {
        if !hierarchy.has_children(id) {
            continue;
        }
        if level >= depth {
            collapsed.insert(id.to_string());
            continue;
        }
        for child in hierarchy.children(id) {
            stack.push((child.as_str(), level + 1));
        }
    }
    collapsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_records;

    fn seven() -> Hierarchy {
        parse_records(
            r#"{ "id": "r", "children": [
                { "id": "a", "children": [ { "id": "a1" }, { "id": "a2" } ] },
                { "id": "b", "children": [ { "id": "b1" }, { "id": "b2" } ] }
            ] }"#,
        )
        .expect("valid hierarchy")
    }

    #[test]
    fn resolves_everything_when_nothing_is_collapsed() {
        let hierarchy = seven();
        let visible = resolve(&hierarchy, &CollapsedSet::new());
        assert_eq!(visible.nodes, ["r", "a", "a1", "a2", "b", "b1", "b2"]);
        assert_eq!(visible.edges.len(), 6);
        assert!(visible.folded.is_empty());
    }

    #[test]
    fn collapsing_removes_exactly_the_descendants() {
        let hierarchy = seven();
        let full = resolve(&hierarchy, &CollapsedSet::new());
        let collapsed: CollapsedSet = ["a".to_string()].into();
        let visible = resolve(&hierarchy, &collapsed);
        assert_eq!(visible.len(), 5);
        let removed: Vec<&String> = full
            .nodes
            .iter()
            .filter(|id| !visible.contains(id))
            .collect();
        assert_eq!(removed, hierarchy.descendants("a").iter().collect::<Vec<_>>());
        assert!(visible.contains("a"));
        assert_eq!(visible.folded, ["a"]);
        assert!(visible.edges.iter().all(|edge| edge.parent != "a"));
    }

    #[test]
    fn expanding_restores_the_original_subgraph() {
        let hierarchy = seven();
        let full = resolve(&hierarchy, &CollapsedSet::new());
        let mut collapsed: CollapsedSet = ["a".to_string()].into();
        assert_ne!(resolve(&hierarchy, &collapsed), full);
        collapsed.remove("a");
        assert_eq!(resolve(&hierarchy, &collapsed), full);
    }

    #[test]
    fn resolve_is_idempotent() {
        let hierarchy = seven();
        let collapsed: CollapsedSet = ["b".to_string()].into();
        assert_eq!(resolve(&hierarchy, &collapsed), resolve(&hierarchy, &collapsed));
    }

    #[test]
    fn collapsed_leaf_changes_nothing() {
        let hierarchy = seven();
        let collapsed: CollapsedSet = ["a1".to_string()].into();
        assert_eq!(
            resolve(&hierarchy, &collapsed),
            resolve(&hierarchy, &CollapsedSet::new())
        );
    }

    #[test]
    fn collapsed_ancestor_hides_expanded_descendant() {
        let hierarchy = seven();
        let collapsed: CollapsedSet = ["r".to_string()].into();
        let visible = resolve(&hierarchy, &collapsed);
        assert_eq!(visible.nodes, ["r"]);
        assert!(visible.edges.is_empty());
    }

    #[test]
    fn collapse_below_keeps_top_ranks() {
        let hierarchy = seven();
        let collapsed = collapse_below(&hierarchy, 1);
        assert_eq!(
            collapsed,
            ["a".to_string(), "b".to_string()].into_iter().collect()
        );
        assert_eq!(resolve(&hierarchy, &collapsed).len(), 3);
        assert_eq!(collapse_below(&hierarchy, 0).len(), 1);
    }
}
