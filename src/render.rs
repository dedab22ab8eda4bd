use crate::config::RenderConfig;
use crate::ir::{Direction, Hierarchy};
use crate::layout::{EdgeSide, Layout, anchor_point_for_node};
use crate::theme::Theme;
use crate::visibility::VisibleSubgraph;
use anyhow::Result;
use serde::Serialize;
use std::path::Path;

const TOGGLE_RADIUS: f32 = 9.0;
const CARD_PAD: f32 = 12.0;

/// Everything a renderer needs for one frame: boxes with their display
/// attributes and routed connectors. Coordinates are layout coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub direction: Direction,
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<NodeVisual>,
    pub edges: Vec<EdgeVisual>,
    pub selected: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeVisual {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rank: usize,
    pub name: String,
    pub title: Option<String>,
    pub avatar: Option<String>,
    /// Whether a collapse toggle is shown.
    pub has_children: bool,
    pub collapsed: bool,
    pub selected: bool,
    /// Centre of the toggle, on the face children hang from.
    pub toggle: Option<(f32, f32)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeVisual {
    pub from: String,
    pub to: String,
    pub start_side: EdgeSide,
    pub end_side: EdgeSide,
    pub points: Vec<(f32, f32)>,
}

pub fn build_scene(
    layout: &Layout,
    hierarchy: &Hierarchy,
    visible: &VisibleSubgraph,
    selection: Option<&str>,
) -> Scene {
    let exit = EdgeSide::exit(layout.direction);
    let mut nodes = Vec::with_capacity(layout.nodes.len());
    for id in &visible.nodes {
        let Some(node) = layout.nodes.get(id) else {
            continue;
        };
        let person = hierarchy.person(id);
        let has_children = hierarchy.has_children(id);
        nodes.push(NodeVisual {
            id: id.clone(),
            x: node.x,
            y: node.y,
            width: node.width,
            height: node.height,
            rank: node.rank,
            name: person.map(|p| p.name.clone()).unwrap_or_else(|| id.clone()),
            title: person.and_then(|p| p.title.clone()),
            avatar: person.and_then(|p| p.avatar.clone()),
            has_children,
            collapsed: visible.is_folded(id),
            selected: selection == Some(id.as_str()),
            toggle: has_children.then(|| anchor_point_for_node(node, exit)),
        });
    }
    let edges = layout
        .edges
        .iter()
        .map(|edge| EdgeVisual {
            from: edge.from.clone(),
            to: edge.to.clone(),
            start_side: edge.start_side,
            end_side: edge.end_side,
            points: edge.points.clone(),
        })
        .collect();
    Scene {
        direction: layout.direction,
        width: layout.width,
        height: layout.height,
        nodes,
        edges,
        selected: selection
            .filter(|id| visible.contains(id))
            .map(str::to_string),
    }
}

pub fn render_svg(scene: &Scene, theme: &Theme, config: &RenderConfig) -> String {
    let pad = config.padding.max(0.0);
    let width = scene.width + pad * 2.0;
    let height = scene.height + pad * 2.0;
    let mut svg = String::new();

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.2}\" height=\"{height:.2}\" viewBox=\"0 0 {width:.2} {height:.2}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        config.background
    ));
    svg.push_str(&format!("<g transform=\"translate({pad:.2} {pad:.2})\">"));

    for edge in &scene.edges {
        svg.push_str(&format!(
            "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.4\"/>",
            points_to_path(&edge.points),
            theme.line_color
        ));
    }

    for node in &scene.nodes {
        svg.push_str(&node_svg(node, theme));
    }

    svg.push_str("</g></svg>");
    svg
}

fn node_svg(node: &NodeVisual, theme: &Theme) -> String {
    let mut out = String::new();
    let (stroke, stroke_width) = if node.selected {
        (theme.selected_border.as_str(), 3.0)
    } else {
        (theme.card_border.as_str(), 1.4)
    };
    out.push_str(&format!(
        "<g class=\"person\" data-id=\"{}\">",
        escape_xml(&node.id)
    ));
    out.push_str(&format!(
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"{r}\" ry=\"{r}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\"/>",
        node.x,
        node.y,
        node.width,
        node.height,
        theme.card_fill,
        stroke,
        stroke_width,
        r = theme.card_radius
    ));

    let radius = (node.height * 0.3).min(24.0);
    let avatar_x = node.x + CARD_PAD + radius;
    let center_y = node.y + node.height / 2.0;
    out.push_str(&format!(
        "<circle cx=\"{avatar_x:.2}\" cy=\"{center_y:.2}\" r=\"{radius:.2}\" fill=\"{}\"/>",
        theme.avatar_fill
    ));
    out.push_str(&format!(
        "<text x=\"{avatar_x:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
        center_y + theme.title_font_size * 0.35,
        theme.font_family,
        theme.title_font_size,
        theme.avatar_text,
        escape_xml(&initials(&node.name))
    ));

    let text_x = avatar_x + radius + CARD_PAD * 0.75;
    let name_y = match node.title {
        Some(_) => center_y - 2.0,
        None => center_y + theme.font_size * 0.35,
    };
    out.push_str(&format!(
        "<text x=\"{text_x:.2}\" y=\"{name_y:.2}\" font-family=\"{}\" font-size=\"{}\" font-weight=\"600\" fill=\"{}\">{}</text>",
        theme.font_family,
        theme.font_size,
        theme.name_color,
        escape_xml(&node.name)
    ));
    if let Some(title) = &node.title {
        out.push_str(&format!(
            "<text x=\"{text_x:.2}\" y=\"{:.2}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            center_y + theme.title_font_size + 2.0,
            theme.font_family,
            theme.title_font_size,
            theme.title_color,
            escape_xml(title)
        ));
    }

    if let Some((tx, ty)) = node.toggle {
        let glyph = if node.collapsed { "+" } else { "\u{2212}" };
        out.push_str(&format!(
            "<g class=\"toggle\"><circle cx=\"{tx:.2}\" cy=\"{ty:.2}\" r=\"{TOGGLE_RADIUS}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.2\"/><text x=\"{tx:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"14\" fill=\"{}\">{glyph}</text></g>",
            theme.toggle_fill,
            theme.toggle_border,
            ty + 4.5,
            theme.font_family,
            theme.toggle_text
        ));
    }
    out.push_str("</g>");
    out
}

fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect()
}

fn points_to_path(points: &[(f32, f32)]) -> String {
    let mut d = String::new();
    for (idx, point) in points.iter().enumerate() {
        let cmd = if idx == 0 { "M" } else { " L" };
        d.push_str(&format!("{cmd} {:.2} {:.2}", point.0, point.1));
    }
    d
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig, theme: &Theme) -> Result<()> {
    let mut opt = usvg::Options::default();
    if let Some(family) = theme.font_family.split(',').next() {
        opt.font_family = family.trim().trim_matches('"').to_string();
    }
    if let Some(size) = usvg::Size::from_wh(render_cfg.width, render_cfg.height) {
        opt.default_size = size;
    }
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("failed to allocate {}x{} pixmap", size.width(), size.height()))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
