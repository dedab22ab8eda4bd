use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;
use crate::ir::Direction;

/// How nodes are ordered inside a rank.
///
/// `Preserve` keeps hierarchy insertion order. The sweep variants reorder each
/// rank by the mean (`Barycenter`) or median of neighbour positions for at
/// most `passes` down/up sweeps and keep whichever arrangement crosses least.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum OrderingPolicy {
    #[default]
    Preserve,
    Barycenter {
        passes: usize,
    },
    Median {
        passes: usize,
    },
}

impl OrderingPolicy {
    pub fn from_token(token: &str, passes: usize) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "preserve" | "none" | "input" => Some(Self::Preserve),
            "barycenter" | "mean" => Some(Self::Barycenter { passes }),
            "median" => Some(Self::Median { passes }),
            _ => None,
        }
    }
}

/// Node extents and gaps read at layout time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spacing {
    pub node_width: f32,
    pub node_height: f32,
    /// Gap between neighbouring nodes of one rank.
    pub node_spacing: f32,
    /// Gap between consecutive ranks.
    pub rank_spacing: f32,
    /// Per-node `(width, height)` overrides.
    pub sizes: BTreeMap<String, (f32, f32)>,
}

impl Default for Spacing {
    fn default() -> Self {
        Self::from_config(&LayoutConfig::default())
    }
}

impl Spacing {
    pub fn from_config(config: &LayoutConfig) -> Self {
        Self {
            node_width: config.node_width,
            node_height: config.node_height,
            node_spacing: config.node_spacing,
            rank_spacing: config.rank_spacing,
            sizes: BTreeMap::new(),
        }
    }

    pub fn with_size(mut self, id: impl Into<String>, width: f32, height: f32) -> Self {
        self.sizes.insert(id.into(), (width, height));
        self
    }

    pub fn size_of(&self, id: &str) -> (f32, f32) {
        self.sizes
            .get(id)
            .copied()
            .unwrap_or((self.node_width, self.node_height))
    }

    pub(super) fn sanitized(&self) -> Spacing {
        let clamp = |value: f32| if value.is_finite() { value.max(0.0) } else { 0.0 };
        Spacing {
            node_width: clamp(self.node_width).max(1.0),
            node_height: clamp(self.node_height).max(1.0),
            node_spacing: clamp(self.node_spacing),
            rank_spacing: clamp(self.rank_spacing),
            sizes: self
                .sizes
                .iter()
                .map(|(id, (w, h))| (id.clone(), (clamp(*w).max(1.0), clamp(*h).max(1.0))))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeLayout {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rank: usize,
    /// Index inside the rank after ordering.
    pub order: usize,
}

impl NodeLayout {
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeSide {
    Left,
    Right,
    Top,
    Bottom,
}

impl EdgeSide {
    /// Face a node exits from toward the next rank.
    pub fn exit(direction: Direction) -> Self {
        match direction {
            Direction::TopDown => EdgeSide::Bottom,
            Direction::LeftRight => EdgeSide::Right,
        }
    }

    /// Face a node is entered from by its parent.
    pub fn entry(direction: Direction) -> Self {
        match direction {
            Direction::TopDown => EdgeSide::Top,
            Direction::LeftRight => EdgeSide::Left,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeLayout {
    pub from: String,
    pub to: String,
    pub start_side: EdgeSide,
    pub end_side: EdgeSide,
    pub points: Vec<(f32, f32)>,
}

/// Positions for every visible node plus routed edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layout {
    pub direction: Direction,
    pub nodes: BTreeMap<String, NodeLayout>,
    pub edges: Vec<EdgeLayout>,
    /// Node ids per rank in their final order.
    pub ranks: Vec<Vec<String>>,
    pub width: f32,
    pub height: f32,
}

impl Layout {
    pub fn position(&self, id: &str) -> Option<(f32, f32)> {
        self.nodes.get(id).map(|node| (node.x, node.y))
    }

    pub fn rank_of(&self, id: &str) -> Option<usize> {
        self.nodes.get(id).map(|node| node.rank)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
