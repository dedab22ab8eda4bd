use std::collections::BTreeMap;

use crate::ir::{Direction, HierarchyEdge};

use super::{EdgeLayout, EdgeSide, NodeLayout};

/// Midpoint of the given face of a node box.
pub(crate) fn anchor_point_for_node(node: &NodeLayout, side: EdgeSide) -> (f32, f32) {
    let cx = node.x + node.width / 2.0;
    let cy = node.y + node.height / 2.0;
    match side {
        EdgeSide::Left => (node.x, cy),
        EdgeSide::Right => (node.x + node.width, cy),
        EdgeSide::Top => (cx, node.y),
        EdgeSide::Bottom => (cx, node.y + node.height),
    }
}

/// Orthogonal connector from a parent's exit face to a child's entry face.
/// The bend sits halfway between the two faces along the rank axis, so edges
/// leaving one parent share a trunk and fan out over the gap.
pub(super) fn route_edges(
    edges: &[HierarchyEdge],
    nodes: &BTreeMap<String, NodeLayout>,
    direction: Direction,
) -> Vec<EdgeLayout> {
    let start_side = EdgeSide::exit(direction);
    let end_side = EdgeSide::entry(direction);
    let mut routed = Vec::with_capacity(edges.len());
    for edge in edges {
        let (Some(from), Some(to)) = (nodes.get(&edge.parent), nodes.get(&edge.child)) else {
            continue;
        };
        let start = anchor_point_for_node(from, start_side);
        let end = anchor_point_for_node(to, end_side);
        let points = elbow(start, end, direction);
        routed.push(EdgeLayout {
            from: edge.parent.clone(),
            to: edge.child.clone(),
            start_side,
            end_side,
            points,
        });
    }
    routed
}

fn elbow(start: (f32, f32), end: (f32, f32), direction: Direction) -> Vec<(f32, f32)> {
    const ALIGNED: f32 = 0.5;
    if direction.is_horizontal() {
        if (start.1 - end.1).abs() < ALIGNED {
            return vec![start, (end.0, start.1)];
        }
        let mid_x = (start.0 + end.0) / 2.0;
        vec![start, (mid_x, start.1), (mid_x, end.1), end]
    } else {
        if (start.0 - end.0).abs() < ALIGNED {
            return vec![start, (start.0, end.1)];
        }
        let mid_y = (start.1 + end.1) / 2.0;
        vec![start, (start.0, mid_y), (end.0, mid_y), end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, x: f32, y: f32) -> NodeLayout {
        NodeLayout {
            id: id.to_string(),
            x,
            y,
            width: 100.0,
            height: 40.0,
            rank: 0,
            order: 0,
        }
    }

    #[test]
    fn anchors_sit_on_box_faces() {
        let n = node("n", 10.0, 20.0);
        assert_eq!(anchor_point_for_node(&n, EdgeSide::Top), (60.0, 20.0));
        assert_eq!(anchor_point_for_node(&n, EdgeSide::Bottom), (60.0, 60.0));
        assert_eq!(anchor_point_for_node(&n, EdgeSide::Left), (10.0, 40.0));
        assert_eq!(anchor_point_for_node(&n, EdgeSide::Right), (110.0, 40.0));
    }

    #[test]
    fn top_down_edges_leave_bottom_and_enter_top() {
        let nodes = BTreeMap::from([
            ("p".to_string(), node("p", 100.0, 0.0)),
            ("c".to_string(), node("c", 0.0, 100.0)),
        ]);
        let routed = route_edges(&[HierarchyEdge::new("p", "c")], &nodes, Direction::TopDown);
        assert_eq!(routed.len(), 1);
        let edge = &routed[0];
        assert_eq!(edge.start_side, EdgeSide::Bottom);
        assert_eq!(edge.end_side, EdgeSide::Top);
        assert_eq!(
            edge.points,
            vec![(150.0, 40.0), (150.0, 70.0), (50.0, 70.0), (50.0, 100.0)]
        );
    }

    #[test]
    fn aligned_left_right_edge_is_straight() {
        let nodes = BTreeMap::from([
            ("p".to_string(), node("p", 0.0, 0.0)),
            ("c".to_string(), node("c", 200.0, 0.0)),
        ]);
        let routed = route_edges(&[HierarchyEdge::new("p", "c")], &nodes, Direction::LeftRight);
        assert_eq!(routed[0].start_side, EdgeSide::Right);
        assert_eq!(routed[0].end_side, EdgeSide::Left);
        assert_eq!(routed[0].points, vec![(100.0, 20.0), (200.0, 20.0)]);
    }
}
