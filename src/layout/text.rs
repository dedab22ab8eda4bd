use crate::config::LayoutConfig;
use crate::ir::Hierarchy;
use crate::text_metrics;
use crate::theme::Theme;
use crate::visibility::VisibleSubgraph;

use super::Spacing;

/// Spacing for `visible`, widening any card whose name or title is wider
/// than the configured node width. Widths never exceed `max_node_width`
/// (or `node_width` when that is larger). Heights are left alone.
pub fn fit_node_sizes(
    hierarchy: &Hierarchy,
    visible: &VisibleSubgraph,
    theme: &Theme,
    config: &LayoutConfig,
) -> Spacing {
    let mut spacing = Spacing::from_config(config);
    if !config.fit_labels {
        return spacing;
    }
    let ceiling = config.max_node_width.max(config.node_width);
    for id in &visible.nodes {
        let Some(person) = hierarchy.person(id) else {
            continue;
        };
        let width = label_width(&person.name, person.title.as_deref(), theme) + config.label_padding_x * 2.0;
        if width > config.node_width {
            spacing
                .sizes
                .insert(id.clone(), (width.min(ceiling), config.node_height));
        }
    }
    spacing
}

fn label_width(name: &str, title: Option<&str>, theme: &Theme) -> f32 {
    let family = theme.font_family.as_str();
    let name_width = text_metrics::text_width(name, theme.font_size, family);
    let title_width = title
        .map(|title| text_metrics::text_width(title, theme.title_font_size, family))
        .unwrap_or(0.0);
    name_width.max(title_width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{HierarchyEdge, PersonNode};
    use crate::parser::build_from_parts;
    use crate::visibility::{CollapsedSet, resolve};

    fn hierarchy() -> Hierarchy {
        build_from_parts(
            vec![
                PersonNode::new("1", "Al"),
                PersonNode::new("2", "Bartholomew Maximilian Fitzgerald-Worthington the Third")
                    .with_title("Vice President of Extremely Long Titles"),
            ],
            vec![HierarchyEdge::new("1", "2")],
        )
        .expect("valid hierarchy")
    }

    #[test]
    fn disabled_fitting_keeps_uniform_sizes() {
        let hierarchy = hierarchy();
        let visible = resolve(&hierarchy, &CollapsedSet::new());
        let spacing = fit_node_sizes(&hierarchy, &visible, &Theme::classic(), &LayoutConfig::default());
        assert!(spacing.sizes.is_empty());
    }

    #[test]
    fn long_labels_widen_up_to_the_ceiling() {
        let hierarchy = hierarchy();
        let visible = resolve(&hierarchy, &CollapsedSet::new());
        let config = LayoutConfig {
            fit_labels: true,
            ..LayoutConfig::default()
        };
        let spacing = fit_node_sizes(&hierarchy, &visible, &Theme::classic(), &config);
        assert_eq!(spacing.size_of("1"), (config.node_width, config.node_height));
        let (width, height) = spacing.size_of("2");
        assert!(width > config.node_width);
        assert!(width <= config.max_node_width);
        assert_eq!(height, config.node_height);
    }
}
