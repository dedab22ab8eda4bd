use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    #[default]
    TopDown,
    LeftRight,
}

impl Direction {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "td" | "tb" | "top-down" | "top-to-bottom" => Some(Self::TopDown),
            "lr" | "left-right" | "left-to-right" => Some(Self::LeftRight),
            _ => None,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::LeftRight)
    }
}

/// One person in the chart. Display attributes are opaque strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonNode {
    pub id: String,
    pub name: String,
    pub title: Option<String>,
    pub avatar: Option<String>,
    pub department: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl PersonNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            title: None,
            avatar: None,
            department: None,
            email: None,
            phone: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct HierarchyEdge {
    pub parent: String,
    pub child: String,
}

impl HierarchyEdge {
    pub fn new(parent: impl Into<String>, child: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            child: child.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HierarchyEntry {
    pub(crate) person: PersonNode,
    pub(crate) parent: Option<String>,
    pub(crate) children: Vec<String>,
}

/// Validated reporting tree for one fetch generation.
///
/// Nodes live in an arena keyed by id; parent and children are explicit id
/// lists so traversals never need recursion. Children keep the order in which
/// the records listed them. Only `parser::build` constructs this type, so a
/// `Hierarchy` value always has a single root, no cycles and unique ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hierarchy {
    pub(crate) root: String,
    pub(crate) entries: HashMap<String, HierarchyEntry>,
    pub(crate) order: Vec<String>,
}

impl Hierarchy {
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn person(&self, id: &str) -> Option<&PersonNode> {
        self.entries.get(id).map(|entry| &entry.person)
    }

    pub fn parent(&self, id: &str) -> Option<&str> {
        self.entries.get(id).and_then(|entry| entry.parent.as_deref())
    }

    pub fn children(&self, id: &str) -> &[String] {
        self.entries
            .get(id)
            .map(|entry| entry.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn has_children(&self, id: &str) -> bool {
        !self.children(id).is_empty()
    }

    /// Ids in the order the records declared them.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn edges(&self) -> Vec<HierarchyEdge> {
        let mut edges = Vec::with_capacity(self.order.len().saturating_sub(1));
        for id in &self.order {
            for child in self.children(id) {
                edges.push(HierarchyEdge::new(id.clone(), child.clone()));
            }
        }
        edges
    }

    /// Number of edges between `id` and the root, if `id` exists.
    pub fn depth(&self, id: &str) -> Option<usize> {
        let mut current = self.entries.get(id)?;
        let mut depth = 0;
        while let Some(parent) = current.parent.as_deref() {
            current = self.entries.get(parent)?;
            depth += 1;
        }
        Some(depth)
    }

    /// All nodes strictly beneath `id`, in depth-first pre-order.
    pub fn descendants(&self, id: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack: Vec<&str> = self.children(id).iter().rev().map(String::as_str).collect();
        while let Some(current) = stack.pop() {
            out.push(current.to_string());
            for child in self.children(current).iter().rev() {
                stack.push(child.as_str());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::build_from_parts;

    fn sample() -> Hierarchy {
        let people = ["ceo", "cto", "cpo", "dev1", "dev2", "pm"]
            .iter()
            .map(|id| PersonNode::new(*id, id.to_uppercase()))
            .collect();
        let edges = vec![
            HierarchyEdge::new("ceo", "cto"),
            HierarchyEdge::new("ceo", "cpo"),
            HierarchyEdge::new("cto", "dev1"),
            HierarchyEdge::new("cto", "dev2"),
            HierarchyEdge::new("cpo", "pm"),
        ];
        build_from_parts(people, edges).expect("valid hierarchy")
    }

    #[test]
    fn parses_direction_tokens() {
        assert_eq!(Direction::from_token("TB"), Some(Direction::TopDown));
        assert_eq!(Direction::from_token("left-to-right"), Some(Direction::LeftRight));
        assert_eq!(Direction::from_token("diagonal"), None);
    }

    #[test]
    fn descendants_are_preorder() {
        let hierarchy = sample();
        assert_eq!(
            hierarchy.descendants("ceo"),
            vec!["cto", "dev1", "dev2", "cpo", "pm"]
        );
        assert!(hierarchy.descendants("pm").is_empty());
    }

    #[test]
    fn depth_counts_edges_to_root() {
        let hierarchy = sample();
        assert_eq!(hierarchy.depth("ceo"), Some(0));
        assert_eq!(hierarchy.depth("dev2"), Some(2));
        assert_eq!(hierarchy.depth("nobody"), None);
    }

    #[test]
    fn edges_follow_child_order() {
        let hierarchy = sample();
        let edges = hierarchy.edges();
        assert_eq!(edges.len(), 5);
        assert_eq!(edges[0], HierarchyEdge::new("ceo", "cto"));
        assert_eq!(edges[1], HierarchyEdge::new("ceo", "cpo"));
    }
}
