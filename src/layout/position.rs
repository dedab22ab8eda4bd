use std::collections::{BTreeMap, HashMap};

use crate::ir::{Direction, HierarchyEdge};

use super::{NodeLayout, Spacing};

/// Cross-axis and rank-axis extents of a node for the given direction.
fn extents(spacing: &Spacing, id: &str, direction: Direction) -> (f32, f32) {
    let (width, height) = spacing.size_of(id);
    if direction.is_horizontal() {
        (height, width)
    } else {
        (width, height)
    }
}

/// Places every ranked node.
///
/// Each node owns a slab along the cross axis wide enough for its whole
/// spanning subtree; sibling slabs are packed left to right with
/// `node_spacing` between them and the parent is centred over the centroid of
/// its children. Slabs of different subtrees never intersect, so nodes sharing
/// a rank cannot overlap. Along the rank axis every rank gets a band as deep as
/// its largest node and nodes are centred in their band.
pub(super) fn assign_coordinates(
    rank_nodes: &[Vec<String>],
    ranks: &HashMap<String, usize>,
    edges: &[HierarchyEdge],
    root: &str,
    direction: Direction,
    spacing: &Spacing,
) -> BTreeMap<String, NodeLayout> {
    let mut position: HashMap<&str, usize> = HashMap::new();
    for bucket in rank_nodes {
        for (idx, id) in bucket.iter().enumerate() {
            position.insert(id.as_str(), idx);
        }
    }
    let rank = |id: &str| ranks.get(id).copied().unwrap_or(0);
    let pos = |id: &str| position.get(id).copied().unwrap_or(usize::MAX);

    // Spanning tree: the deepest parent owns the child, earlier position wins ties.
    let mut primary: HashMap<&str, &str> = HashMap::new();
    for edge in edges {
        let child = edge.child.as_str();
        let parent = edge.parent.as_str();
        match primary.get(child) {
            Some(&current)
                if (rank(current), std::cmp::Reverse(pos(current)))
                    >= (rank(parent), std::cmp::Reverse(pos(parent))) => {}
            _ => {
                primary.insert(child, parent);
            }
        }
    }
    let mut tree_children: HashMap<&str, Vec<&str>> = HashMap::new();
    for bucket in rank_nodes {
        for id in bucket {
            if let Some(&parent) = primary.get(id.as_str()) {
                tree_children.entry(parent).or_default().push(id.as_str());
            }
        }
    }

    let mut preorder: Vec<&str> = Vec::with_capacity(position.len());
    let mut stack: Vec<&str> = vec![root];
    while let Some(id) = stack.pop() {
        preorder.push(id);
        if let Some(children) = tree_children.get(id) {
            stack.extend(children.iter().rev());
        }
    }

    let gap = spacing.node_spacing;
    let mut extent: HashMap<&str, f32> = HashMap::new();
    let mut center: HashMap<&str, f32> = HashMap::new();
    let mut offset: HashMap<&str, f32> = HashMap::new();
    for &id in preorder.iter().rev() {
        let (own, _) = extents(spacing, id, direction);
        let children = tree_children.get(id).map(Vec::as_slice).unwrap_or(&[]);
        if children.is_empty() {
            extent.insert(id, own);
            center.insert(id, own / 2.0);
            continue;
        }
        let mut cursor = 0.0;
        let mut centers = 0.0;
        for &child in children {
            offset.insert(child, cursor);
            centers += cursor + center.get(child).copied().unwrap_or(0.0);
            cursor += extent.get(child).copied().unwrap_or(0.0) + gap;
        }
        let span = cursor - gap;
        let mut mid = centers / children.len() as f32;
        let shift = (own / 2.0 - mid).max(0.0);
        if shift > 0.0 {
            for &child in children {
                if let Some(value) = offset.get_mut(child) {
                    *value += shift;
                }
            }
            mid += shift;
        }
        extent.insert(id, (span + shift).max(mid + own / 2.0));
        center.insert(id, mid);
    }

    let mut slab_start: HashMap<&str, f32> = HashMap::from([(root, 0.0)]);
    for &id in &preorder {
        let start = slab_start.get(id).copied().unwrap_or(0.0);
        for &child in tree_children.get(id).map(Vec::as_slice).unwrap_or(&[]) {
            slab_start.insert(child, start + offset.get(child).copied().unwrap_or(0.0));
        }
    }

    let mut band_depth: Vec<f32> = vec![0.0; rank_nodes.len()];
    for (idx, bucket) in rank_nodes.iter().enumerate() {
        for id in bucket {
            let (_, main) = extents(spacing, id, direction);
            band_depth[idx] = band_depth[idx].max(main);
        }
    }
    let mut band_start: Vec<f32> = Vec::with_capacity(band_depth.len());
    let mut main_cursor = 0.0;
    for depth in &band_depth {
        band_start.push(main_cursor);
        main_cursor += depth + spacing.rank_spacing;
    }

    let mut nodes = BTreeMap::new();
    for (rank_idx, bucket) in rank_nodes.iter().enumerate() {
        for (order, id) in bucket.iter().enumerate() {
            let (width, height) = spacing.size_of(id);
            let cross = slab_start.get(id.as_str()).copied().unwrap_or(0.0)
                + center.get(id.as_str()).copied().unwrap_or(0.0);
            let main = band_start[rank_idx] + band_depth[rank_idx] / 2.0;
            let (cx, cy) = if direction.is_horizontal() {
                (main, cross)
            } else {
                (cross, main)
            };
            nodes.insert(
                id.clone(),
                NodeLayout {
                    id: id.clone(),
                    x: cx - width / 2.0,
                    y: cy - height / 2.0,
                    width,
                    height,
                    rank: rank_idx,
                    order,
                },
            );
        }
    }
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn parent_sits_over_its_children() {
        let rank_nodes = vec![strings(&["r"]), strings(&["a", "b", "c"])];
        let ranks: HashMap<String, usize> = [("r", 0), ("a", 1), ("b", 1), ("c", 1)]
            .into_iter()
            .map(|(id, rank)| (id.to_string(), rank))
            .collect();
        let edges = vec![
            HierarchyEdge::new("r", "a"),
            HierarchyEdge::new("r", "b"),
            HierarchyEdge::new("r", "c"),
        ];
        let spacing = Spacing {
            node_width: 100.0,
            node_height: 50.0,
            node_spacing: 20.0,
            rank_spacing: 30.0,
            sizes: BTreeMap::new(),
        };
        let nodes = assign_coordinates(&rank_nodes, &ranks, &edges, "r", Direction::TopDown, &spacing);
        assert_eq!(nodes["a"].x, 0.0);
        assert_eq!(nodes["b"].x, 120.0);
        assert_eq!(nodes["c"].x, 240.0);
        assert_eq!(nodes["r"].center().0, nodes["b"].center().0);
        assert_eq!(nodes["a"].y, 80.0);
    }

    #[test]
    fn wide_parent_pushes_children_inward() {
        let rank_nodes = vec![strings(&["r"]), strings(&["a"])];
        let ranks: HashMap<String, usize> = [("r".to_string(), 0), ("a".to_string(), 1)].into();
        let edges = vec![HierarchyEdge::new("r", "a")];
        let spacing = Spacing {
            node_width: 40.0,
            node_height: 20.0,
            node_spacing: 10.0,
            rank_spacing: 10.0,
            sizes: BTreeMap::from([("r".to_string(), (200.0, 20.0))]),
        };
        let nodes = assign_coordinates(&rank_nodes, &ranks, &edges, "r", Direction::TopDown, &spacing);
        assert_eq!(nodes["r"].x, 0.0);
        assert_eq!(nodes["a"].center().0, 100.0);
    }

    #[test]
    fn horizontal_direction_swaps_axes() {
        let rank_nodes = vec![strings(&["r"]), strings(&["a", "b"])];
        let ranks: HashMap<String, usize> = [("r", 0), ("a", 1), ("b", 1)]
            .into_iter()
            .map(|(id, rank)| (id.to_string(), rank))
            .collect();
        let edges = vec![HierarchyEdge::new("r", "a"), HierarchyEdge::new("r", "b")];
        let spacing = Spacing {
            node_width: 100.0,
            node_height: 40.0,
            node_spacing: 10.0,
            rank_spacing: 50.0,
            sizes: BTreeMap::new(),
        };
        let nodes = assign_coordinates(&rank_nodes, &ranks, &edges, "r", Direction::LeftRight, &spacing);
        assert_eq!(nodes["r"].x, 0.0);
        assert_eq!(nodes["a"].x, 150.0);
        assert_eq!(nodes["a"].y, 0.0);
        assert_eq!(nodes["b"].y, 50.0);
        assert_eq!(nodes["r"].center().1, 45.0);
    }
}
