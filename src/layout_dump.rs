use crate::ir::Hierarchy;
use crate::layout::{EdgeSide, Layout};
use crate::visibility::VisibleSubgraph;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Stable JSON view of a layout, used for golden comparisons and debugging.
#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub direction: String,
    pub width: f32,
    pub height: f32,
    pub ranks: Vec<Vec<String>>,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
    pub folded: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub name: String,
    pub rank: usize,
    pub order: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub from: String,
    pub to: String,
    pub start_side: EdgeSide,
    pub end_side: EdgeSide,
    pub points: Vec<[f32; 2]>,
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout, hierarchy: &Hierarchy, visible: &VisibleSubgraph) -> Self {
        let nodes = visible
            .nodes
            .iter()
            .filter_map(|id| layout.nodes.get(id))
            .map(|node| NodeDump {
                id: node.id.clone(),
                name: hierarchy
                    .person(&node.id)
                    .map(|person| person.name.clone())
                    .unwrap_or_default(),
                rank: node.rank,
                order: node.order,
                x: node.x,
                y: node.y,
                width: node.width,
                height: node.height,
            })
            .collect();

        let edges = layout
            .edges
            .iter()
            .map(|edge| EdgeDump {
                from: edge.from.clone(),
                to: edge.to.clone(),
                start_side: edge.start_side,
                end_side: edge.end_side,
                points: edge.points.iter().map(|(x, y)| [*x, *y]).collect(),
            })
            .collect();

        LayoutDump {
            direction: format!("{:?}", layout.direction),
            width: layout.width,
            height: layout.height,
            ranks: layout.ranks.clone(),
            nodes,
            edges,
            folded: visible.folded.clone(),
        }
    }
}

pub fn write_layout_dump(
    path: &Path,
    layout: &Layout,
    hierarchy: &Hierarchy,
    visible: &VisibleSubgraph,
) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout, hierarchy, visible);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
