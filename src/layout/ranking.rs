use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

use crate::error::LayoutError;
use crate::ir::HierarchyEdge;
use crate::visibility::VisibleSubgraph;

use super::OrderingPolicy;

/// Longest-path ranks over a topological order. On a tree this is the plain
/// depth from the root; when a node has several parents it lands one rank
/// below the deepest of them, so every edge points strictly forward.
pub(super) fn compute_ranks(
    subgraph: &VisibleSubgraph,
    node_order: &HashMap<String, usize>,
) -> Result<HashMap<String, usize>, LayoutError> {
    let set: HashSet<&str> = subgraph.node_set();
    let root = subgraph.root.as_str();
    if !set.contains(root) {
        return Err(LayoutError::Disconnected {
            id: root.to_string(),
            root: root.to_string(),
        });
    }

    let mut adj: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut indeg: HashMap<&str, usize> = set.iter().map(|id| (*id, 0)).collect();
    for edge in &subgraph.edges {
        if !set.contains(edge.parent.as_str()) || !set.contains(edge.child.as_str()) {
            return Err(LayoutError::UnknownNode {
                parent: edge.parent.clone(),
                child: edge.child.clone(),
            });
        }
        adj.entry(edge.parent.as_str())
            .or_default()
            .push(edge.child.as_str());
        if let Some(deg) = indeg.get_mut(edge.child.as_str()) {
            *deg += 1;
        }
    }

    let mut reached: HashSet<&str> = HashSet::from([root]);
    let mut queue: VecDeque<&str> = VecDeque::from([root]);
    while let Some(id) = queue.pop_front() {
        for next in adj.get(id).into_iter().flatten() {
            if reached.insert(next) {
                queue.push_back(next);
            }
        }
    }
    if let Some(stray) = subgraph.nodes.iter().find(|id| !reached.contains(id.as_str())) {
        return Err(LayoutError::Disconnected {
            id: stray.clone(),
            root: root.to_string(),
        });
    }

    let order_key = |id: &str| node_order.get(id).copied().unwrap_or(usize::MAX);
    let mut ready: BinaryHeap<Reverse<(usize, &str)>> = BinaryHeap::new();
    for (id, deg) in &indeg {
        if *deg == 0 {
            ready.push(Reverse((order_key(id), *id)));
        }
    }

    let mut ranks: HashMap<String, usize> = HashMap::with_capacity(set.len());
    let mut rank_of: HashMap<&str, usize> = HashMap::with_capacity(set.len());
    while let Some(Reverse((_key, id))) = ready.pop() {
        let rank = rank_of.get(id).copied().unwrap_or(0);
        ranks.insert(id.to_string(), rank);
        for next in adj.get(id).into_iter().flatten() {
            let entry = rank_of.entry(next).or_insert(0);
            *entry = (*entry).max(rank + 1);
            if let Some(deg) = indeg.get_mut(next) {
                *deg = deg.saturating_sub(1);
                if *deg == 0 {
                    ready.push(Reverse((order_key(next), *next)));
                }
            }
        }
    }

    if ranks.len() < set.len() {
        let stuck = subgraph
            .nodes
            .iter()
            .find(|id| !ranks.contains_key(id.as_str()))
            .cloned()
            .unwrap_or_default();
        return Err(LayoutError::Cycle { id: stuck });
    }
    Ok(ranks)
}

pub(super) fn order_rank_nodes(
    rank_nodes: &mut Vec<Vec<String>>,
    edges: &[HierarchyEdge],
    node_order: &HashMap<String, usize>,
    policy: OrderingPolicy,
) {
    let (passes, use_median) = match policy {
        OrderingPolicy::Preserve => return,
        OrderingPolicy::Barycenter { passes } => (passes, false),
        OrderingPolicy::Median { passes } => (passes, true),
    };
    if rank_nodes.len() <= 1 {
        return;
    }
    let mut incoming: HashMap<String, Vec<String>> = HashMap::new();
    let mut outgoing: HashMap<String, Vec<String>> = HashMap::new();

    for edge in edges {
        outgoing
            .entry(edge.parent.clone())
            .or_default()
            .push(edge.child.clone());
        incoming
            .entry(edge.child.clone())
            .or_default()
            .push(edge.parent.clone());
    }

    let mut positions: HashMap<String, usize> = HashMap::new();
    let update_positions = |rank_nodes: &[Vec<String>], positions: &mut HashMap<String, usize>| {
        positions.clear();
        for bucket in rank_nodes.iter() {
            for (idx, node_id) in bucket.iter().enumerate() {
                positions.insert(node_id.clone(), idx);
            }
        }
    };

    update_positions(rank_nodes, &mut positions);

    let sort_bucket = |bucket: &mut Vec<String>,
                       neighbors: &HashMap<String, Vec<String>>,
                       positions: &HashMap<String, usize>| {
        let current_positions: HashMap<String, usize> = bucket
            .iter()
            .enumerate()
            .map(|(idx, id)| (id.clone(), idx))
            .collect();
        let score = |id: &str| {
            if use_median {
                median_position(id, neighbors, positions, &current_positions)
            } else {
                mean_position(id, neighbors, positions, &current_positions)
            }
        };
        bucket.sort_by(|a, b| {
            let a_score = score(a);
            let b_score = score(b);
            match a_score.partial_cmp(&b_score) {
                Some(std::cmp::Ordering::Equal) | None => {
                    let a_pos = current_positions.get(a).copied().unwrap_or(0);
                    let b_pos = current_positions.get(b).copied().unwrap_or(0);
                    match a_pos.cmp(&b_pos) {
                        std::cmp::Ordering::Equal => node_order
                            .get(a)
                            .copied()
                            .unwrap_or(usize::MAX)
                            .cmp(&node_order.get(b).copied().unwrap_or(usize::MAX)),
                        other => other,
                    }
                }
                Some(ordering) => ordering,
            }
        });
    };

    let mut best = rank_nodes.clone();
    let mut best_crossings = count_crossings(rank_nodes, edges);
    for _ in 0..passes {
        if best_crossings == 0 {
            break;
        }
        for rank in 1..rank_nodes.len() {
            if rank_nodes[rank].len() <= 1 {
                continue;
            }
            sort_bucket(&mut rank_nodes[rank], &incoming, &positions);
            update_positions(rank_nodes, &mut positions);
        }
        for rank in (0..rank_nodes.len().saturating_sub(1)).rev() {
            if rank_nodes[rank].len() <= 1 {
                continue;
            }
            sort_bucket(&mut rank_nodes[rank], &outgoing, &positions);
            update_positions(rank_nodes, &mut positions);
        }
        let crossings = count_crossings(rank_nodes, edges);
        if crossings < best_crossings {
            best_crossings = crossings;
            best = rank_nodes.clone();
        }
    }
    *rank_nodes = best;
}

fn neighbor_positions(
    node_id: &str,
    neighbors: &HashMap<String, Vec<String>>,
    positions: &HashMap<String, usize>,
) -> Vec<f32> {
    let Some(list) = neighbors.get(node_id) else {
        return Vec::new();
    };
    list.iter()
        .filter_map(|neighbor| positions.get(neighbor).map(|pos| *pos as f32))
        .collect()
}

pub(super) fn median_position(
    node_id: &str,
    neighbors: &HashMap<String, Vec<String>>,
    positions: &HashMap<String, usize>,
    current_positions: &HashMap<String, usize>,
) -> f32 {
    let mut values = neighbor_positions(node_id, neighbors, positions);
    if values.is_empty() {
        return *current_positions.get(node_id).unwrap_or(&0) as f32;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) * 0.5
    }
}

pub(super) fn mean_position(
    node_id: &str,
    neighbors: &HashMap<String, Vec<String>>,
    positions: &HashMap<String, usize>,
    current_positions: &HashMap<String, usize>,
) -> f32 {
    let values = neighbor_positions(node_id, neighbors, positions);
    if values.is_empty() {
        return *current_positions.get(node_id).unwrap_or(&0) as f32;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

/// Pairwise edge crossings between adjacent ranks.
pub fn count_crossings(rank_nodes: &[Vec<String>], edges: &[HierarchyEdge]) -> usize {
    let mut rank_pos: HashMap<&str, (usize, usize)> = HashMap::new();
    for (rank, bucket) in rank_nodes.iter().enumerate() {
        for (idx, id) in bucket.iter().enumerate() {
            rank_pos.insert(id.as_str(), (rank, idx));
        }
    }
    let mut by_rank: HashMap<usize, Vec<(usize, usize)>> = HashMap::new();
    for edge in edges {
        let (Some(&(from_rank, from_pos)), Some(&(to_rank, to_pos))) = (
            rank_pos.get(edge.parent.as_str()),
            rank_pos.get(edge.child.as_str()),
        ) else {
            continue;
        };
        if to_rank == from_rank + 1 {
            by_rank.entry(from_rank).or_default().push((from_pos, to_pos));
        }
    }
    let mut total = 0usize;
    for segments in by_rank.values() {
        for i in 0..segments.len() {
            for j in (i + 1)..segments.len() {
                let (a0, a1) = segments[i];
                let (b0, b1) = segments[j];
                if (a0 < b0 && a1 > b1) || (a0 > b0 && a1 < b1) {
                    total += 1;
                }
            }
        }
    }
    total
}
