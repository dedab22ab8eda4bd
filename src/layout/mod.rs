//! Layered layout for a visible org-chart subgraph.
//!
//! The pipeline is rank assignment, in-rank ordering, coordinate assignment
//! and edge routing, followed by a self-check of the finished layout. Inputs
//! are never mutated and equal inputs always produce equal layouts.

mod position;
mod ranking;
mod routing;
mod text;
mod types;

pub use ranking::count_crossings;
pub use text::fit_node_sizes;
pub use types::*;

use position::assign_coordinates;
use ranking::{compute_ranks, order_rank_nodes};
pub(crate) use routing::anchor_point_for_node;
use routing::route_edges;

use crate::error::{InvariantViolation, LayoutError};
use crate::ir::Direction;
use crate::visibility::VisibleSubgraph;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Overlap below this area is treated as boxes touching.
const OVERLAP_EPSILON: f32 = 0.01;

pub fn compute_layout(
    subgraph: &VisibleSubgraph,
    direction: Direction,
    spacing: &Spacing,
    ordering: OrderingPolicy,
) -> Result<Layout, LayoutError> {
    if subgraph.is_empty() {
        return Err(LayoutError::Empty);
    }
    let node_order: HashMap<String, usize> = subgraph
        .nodes
        .iter()
        .enumerate()
        .map(|(idx, id)| (id.clone(), idx))
        .collect();
    let ranks = compute_ranks(subgraph, &node_order)?;

    let rank_count = ranks.values().copied().max().unwrap_or(0) + 1;
    let mut rank_nodes: Vec<Vec<String>> = vec![Vec::new(); rank_count];
    for id in &subgraph.nodes {
        if let Some(rank) = ranks.get(id) {
            rank_nodes[*rank].push(id.clone());
        }
    }
    order_rank_nodes(&mut rank_nodes, &subgraph.edges, &node_order, ordering);

    let spacing = spacing.sanitized();
    let mut nodes = assign_coordinates(
        &rank_nodes,
        &ranks,
        &subgraph.edges,
        &subgraph.root,
        direction,
        &spacing,
    );
    normalize_layout(&mut nodes);
    let edges = route_edges(&subgraph.edges, &nodes, direction);

    let (width, height) = nodes.values().fold((0.0f32, 0.0f32), |(w, h), node| {
        (w.max(node.x + node.width), h.max(node.y + node.height))
    });
    let layout = Layout {
        direction,
        nodes,
        edges,
        ranks: rank_nodes,
        width,
        height,
    };
    verify_layout(subgraph, &layout)?;
    tracing::debug!(
        nodes = layout.nodes.len(),
        ranks = layout.ranks.len(),
        width = layout.width,
        height = layout.height,
        "computed layout"
    );
    Ok(layout)
}

/// Shifts nodes so the bounding box starts at the origin.
fn normalize_layout(nodes: &mut BTreeMap<String, NodeLayout>) {
    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    for node in nodes.values() {
        min_x = min_x.min(node.x);
        min_y = min_y.min(node.y);
    }
    if nodes.is_empty() || (min_x == 0.0 && min_y == 0.0) {
        return;
    }
    for node in nodes.values_mut() {
        node.x -= min_x;
        node.y -= min_y;
    }
}

/// Checks a finished layout: every visible node is placed, every edge points
/// to a later rank, and no two node boxes overlap.
pub fn verify_layout(subgraph: &VisibleSubgraph, layout: &Layout) -> Result<(), LayoutError> {
    for id in &subgraph.nodes {
        if !layout.nodes.contains_key(id) {
            return Err(InvariantViolation::MissingPosition { id: id.clone() }.into());
        }
    }
    for edge in &subgraph.edges {
        let (Some(parent), Some(child)) = (layout.nodes.get(&edge.parent), layout.nodes.get(&edge.child))
        else {
            continue;
        };
        if child.rank <= parent.rank {
            return Err(InvariantViolation::RankOrder {
                parent: edge.parent.clone(),
                child: edge.child.clone(),
                parent_rank: parent.rank,
                child_rank: child.rank,
            }
            .into());
        }
    }
    if let Some((first, second)) = find_node_overlap(&layout.nodes) {
        return Err(InvariantViolation::Overlap { first, second }.into());
    }
    Ok(())
}

fn find_node_overlap(nodes: &BTreeMap<String, NodeLayout>) -> Option<(String, String)> {
    let mut sorted: Vec<&NodeLayout> = nodes.values().collect();
    if sorted.len() < 2 {
        return None;
    }
    sorted.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));
    for i in 0..sorted.len() {
        let a = sorted[i];
        for b in sorted.iter().skip(i + 1) {
            if b.x >= a.x + a.width - OVERLAP_EPSILON {
                break;
            }
            let overlap_x = (a.x + a.width).min(b.x + b.width) - a.x.max(b.x);
            let overlap_y = (a.y + a.height).min(b.y + b.height) - a.y.max(b.y);
            if overlap_x > OVERLAP_EPSILON && overlap_y > OVERLAP_EPSILON {
                return Some((a.id.clone(), b.id.clone()));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::HierarchyEdge;
    use crate::parser::parse_records;
    use crate::visibility::{CollapsedSet, resolve};

    fn seven() -> VisibleSubgraph {
        let hierarchy = parse_records(
            r#"{ "id": "r", "children": [
                { "id": "a", "children": [ { "id": "a1" }, { "id": "a2" } ] },
                { "id": "b", "children": [ { "id": "b1" }, { "id": "b2" } ] }
            ] }"#,
        )
        .expect("valid hierarchy");
        resolve(&hierarchy, &CollapsedSet::new())
    }

    fn layout_of(subgraph: &VisibleSubgraph, direction: Direction) -> Layout {
        compute_layout(subgraph, direction, &Spacing::default(), OrderingPolicy::Preserve)
            .expect("layout")
    }

    #[test]
    fn seven_nodes_fill_three_ranks() {
        let layout = layout_of(&seven(), Direction::TopDown);
        let sizes: Vec<usize> = layout.ranks.iter().map(Vec::len).collect();
        assert_eq!(sizes, [1, 2, 4]);
        assert_eq!(layout.ranks[2], ["a1", "a2", "b1", "b2"]);

        let center = |id: &str| layout.nodes[id].center();
        let root_x = center("r").0;
        let children_mean = (center("a").0 + center("b").0) / 2.0;
        assert!((root_x - children_mean).abs() < 1e-3);
        assert!((center("a").0 - (center("a1").0 + center("a2").0) / 2.0).abs() < 1e-3);
        assert!(center("r").1 < center("a").1);
        assert!(center("a").1 < center("a1").1);
    }

    #[test]
    fn single_root_lands_at_origin() {
        let layout = layout_of(&VisibleSubgraph::single("solo"), Direction::TopDown);
        assert_eq!(layout.position("solo"), Some((0.0, 0.0)));
        assert!(layout.edges.is_empty());
        let spacing = Spacing::default();
        assert_eq!(layout.width, spacing.node_width);
        assert_eq!(layout.height, spacing.node_height);
    }

    #[test]
    fn bounding_box_starts_at_origin() {
        let layout = layout_of(&seven(), Direction::TopDown);
        let min_x = layout.nodes.values().map(|n| n.x).fold(f32::MAX, f32::min);
        let min_y = layout.nodes.values().map(|n| n.y).fold(f32::MAX, f32::min);
        assert_eq!((min_x, min_y), (0.0, 0.0));
    }

    #[test]
    fn mixed_sizes_never_overlap() {
        let subgraph = seven();
        let spacing = Spacing::default()
            .with_size("a", 600.0, 90.0)
            .with_size("a2", 340.0, 200.0)
            .with_size("b1", 50.0, 30.0);
        for direction in [Direction::TopDown, Direction::LeftRight] {
            let layout = compute_layout(&subgraph, direction, &spacing, OrderingPolicy::Preserve)
                .expect("layout");
            assert_eq!(find_node_overlap(&layout.nodes), None);
        }
    }

    #[test]
    fn left_right_places_ranks_along_x() {
        let layout = layout_of(&seven(), Direction::LeftRight);
        let r = &layout.nodes["r"];
        let a = &layout.nodes["a"];
        let a1 = &layout.nodes["a1"];
        assert!(r.x + r.width <= a.x);
        assert!(a.x + a.width <= a1.x);
        let edge = &layout.edges[0];
        assert_eq!(edge.start_side, EdgeSide::Right);
        assert_eq!(edge.end_side, EdgeSide::Left);
    }

    #[test]
    fn top_down_edges_exit_bottom() {
        let layout = layout_of(&seven(), Direction::TopDown);
        assert_eq!(layout.edges.len(), 6);
        for edge in &layout.edges {
            assert_eq!(edge.start_side, EdgeSide::Bottom);
            assert_eq!(edge.end_side, EdgeSide::Top);
            let parent = &layout.nodes[&edge.from];
            let first = edge.points[0];
            assert_eq!(first.1, parent.y + parent.height);
        }
    }

    #[test]
    fn layout_is_deterministic() {
        let subgraph = seven();
        let first = layout_of(&subgraph, Direction::TopDown);
        for _ in 0..5 {
            assert_eq!(layout_of(&subgraph, Direction::TopDown), first);
        }
    }

    #[test]
    fn collapsing_shrinks_the_layout() {
        let hierarchy = parse_records(
            r#"{ "id": "r", "children": [
                { "id": "a", "children": [ { "id": "a1" }, { "id": "a2" } ] },
                { "id": "b" }
            ] }"#,
        )
        .expect("valid hierarchy");
        let full = layout_of(&resolve(&hierarchy, &CollapsedSet::new()), Direction::TopDown);
        let collapsed: CollapsedSet = ["a".to_string()].into();
        let folded = layout_of(&resolve(&hierarchy, &collapsed), Direction::TopDown);
        assert_eq!(folded.nodes.len(), 3);
        assert!(!folded.nodes.contains_key("a1"));
        assert!(folded.height < full.height);
    }

    #[test]
    fn shared_child_dag_is_laid_out() {
        let subgraph = VisibleSubgraph {
            root: "r".to_string(),
            nodes: ["r", "p", "q", "y", "x"].iter().map(|s| s.to_string()).collect(),
            edges: vec![
                HierarchyEdge::new("r", "p"),
                HierarchyEdge::new("r", "q"),
                HierarchyEdge::new("p", "x"),
                HierarchyEdge::new("q", "y"),
                HierarchyEdge::new("p", "y"),
            ],
            folded: Vec::new(),
        };
        let layout = compute_layout(
            &subgraph,
            Direction::TopDown,
            &Spacing::default(),
            OrderingPolicy::Barycenter { passes: 4 },
        )
        .expect("layout");
        assert_eq!(layout.rank_of("y"), Some(2));
        assert_eq!(layout.edges.len(), 5);
        assert!(verify_layout(&subgraph, &layout).is_ok());
    }

    #[test]
    fn disconnected_node_is_rejected() {
        let subgraph = VisibleSubgraph {
            root: "r".to_string(),
            nodes: vec!["r".to_string(), "island".to_string()],
            edges: Vec::new(),
            folded: Vec::new(),
        };
        let err = compute_layout(&subgraph, Direction::TopDown, &Spacing::default(), OrderingPolicy::Preserve)
            .expect_err("disconnected");
        assert!(matches!(err, LayoutError::Disconnected { ref id, .. } if id == "island"));
    }

    #[test]
    fn empty_subgraph_is_rejected() {
        let subgraph = VisibleSubgraph {
            root: "r".to_string(),
            nodes: Vec::new(),
            edges: Vec::new(),
            folded: Vec::new(),
        };
        assert_eq!(
            compute_layout(&subgraph, Direction::TopDown, &Spacing::default(), OrderingPolicy::Preserve),
            Err(LayoutError::Empty)
        );
    }

    #[test]
    fn verify_flags_overlapping_boxes() {
        let subgraph = seven();
        let mut layout = layout_of(&subgraph, Direction::TopDown);
        let a1 = layout.nodes["a1"].clone();
        if let Some(a2) = layout.nodes.get_mut("a2") {
            a2.x = a1.x + 10.0;
        }
        assert!(matches!(
            verify_layout(&subgraph, &layout),
            Err(LayoutError::InvariantViolation {
                violation: InvariantViolation::Overlap { .. }
            })
        ));
    }

    #[test]
    fn verify_flags_missing_positions() {
        let subgraph = seven();
        let mut layout = layout_of(&subgraph, Direction::TopDown);
        layout.nodes.remove("b2");
        assert_eq!(
            verify_layout(&subgraph, &layout),
            Err(LayoutError::InvariantViolation {
                violation: InvariantViolation::MissingPosition { id: "b2".to_string() }
            })
        );
    }
}
