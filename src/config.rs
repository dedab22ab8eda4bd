use crate::ir::Direction;
use crate::layout::OrderingPolicy;
use crate::theme::Theme;
use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What happens to the collapsed set when a new hierarchy arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollapsePolicy {
    /// Keep ids that still exist and still have children.
    #[default]
    PreserveExisting,
    /// Start every generation fully expanded.
    Reset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub direction: Direction,
    pub node_width: f32,
    pub node_height: f32,
    pub node_spacing: f32,
    pub rank_spacing: f32,
    pub ordering: OrderingPolicy,
    /// Widen cards whose name or title would not fit `node_width`.
    pub fit_labels: bool,
    pub max_node_width: f32,
    pub label_padding_x: f32,
    pub collapse_policy: CollapsePolicy,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            direction: Direction::TopDown,
            node_width: 220.0,
            node_height: 96.0,
            node_spacing: 40.0,
            rank_spacing: 60.0,
            ordering: OrderingPolicy::Preserve,
            fit_labels: false,
            max_node_width: 360.0,
            label_padding_x: 16.0,
            collapse_policy: CollapsePolicy::PreserveExisting,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub background: String,
    /// Margin added around the laid-out chart.
    pub padding: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            background: "#FFFFFF".to_string(),
            padding: 24.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::classic();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            layout: LayoutConfig::default(),
            render,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    title_font_size: Option<f32>,
    card_fill: Option<String>,
    card_border: Option<String>,
    card_radius: Option<f32>,
    name_color: Option<String>,
    title_color: Option<String>,
    line_color: Option<String>,
    selected_border: Option<String>,
    toggle_fill: Option<String>,
    toggle_border: Option<String>,
    toggle_text: Option<String>,
    avatar_fill: Option<String>,
    avatar_text: Option<String>,
    background: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    direction: Option<String>,
    node_width: Option<f32>,
    node_height: Option<f32>,
    node_spacing: Option<f32>,
    rank_spacing: Option<f32>,
    ordering: Option<String>,
    order_passes: Option<usize>,
    fit_labels: Option<bool>,
    max_node_width: Option<f32>,
    label_padding_x: Option<f32>,
    collapse_policy: Option<CollapsePolicy>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    width: Option<f32>,
    height: Option<f32>,
    background: Option<String>,
    padding: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
    render: Option<RenderConfigFile>,
}

const DEFAULT_ORDER_PASSES: usize = 4;

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("invalid config {}", path.display()))
}

/// Parses JSON5 config text over the defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let parsed: ConfigFile = json5::from_str(contents)?;
    let mut config = Config::default();

    if let Some(name) = parsed.theme.as_deref() {
        match Theme::by_name(name) {
            Some(theme) => {
                config.render.background = theme.background.clone();
                config.theme = theme;
            }
            None => tracing::warn!(theme = name, "unknown theme; keeping classic"),
        }
    }

    if let Some(vars) = parsed.theme_variables {
        let theme = &mut config.theme;
        if let Some(v) = vars.font_family {
            theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            theme.font_size = v;
        }
        if let Some(v) = vars.title_font_size {
            theme.title_font_size = v;
        }
        if let Some(v) = vars.card_fill {
            theme.card_fill = v;
        }
        if let Some(v) = vars.card_border {
            theme.card_border = v;
        }
        if let Some(v) = vars.card_radius {
            theme.card_radius = v;
        }
        if let Some(v) = vars.name_color {
            theme.name_color = v;
        }
        if let Some(v) = vars.title_color {
            theme.title_color = v;
        }
        if let Some(v) = vars.line_color {
            theme.line_color = v;
        }
        if let Some(v) = vars.selected_border {
            theme.selected_border = v;
        }
        if let Some(v) = vars.toggle_fill {
            theme.toggle_fill = v;
        }
        if let Some(v) = vars.toggle_border {
            theme.toggle_border = v;
        }
        if let Some(v) = vars.toggle_text {
            theme.toggle_text = v;
        }
        if let Some(v) = vars.avatar_fill {
            theme.avatar_fill = v;
        }
        if let Some(v) = vars.avatar_text {
            theme.avatar_text = v;
        }
        if let Some(v) = vars.background {
            config.render.background = v.clone();
            theme.background = v;
        }
    }

    if let Some(layout) = parsed.layout {
        let target = &mut config.layout;
        if let Some(token) = layout.direction.as_deref() {
            let Some(direction) = Direction::from_token(token) else {
                bail!("unknown direction `{token}`");
            };
            target.direction = direction;
        }
        if let Some(v) = layout.node_width {
            target.node_width = v;
        }
        if let Some(v) = layout.node_height {
            target.node_height = v;
        }
        if let Some(v) = layout.node_spacing {
            target.node_spacing = v;
        }
        if let Some(v) = layout.rank_spacing {
            target.rank_spacing = v;
        }
        let passes = layout.order_passes.unwrap_or(DEFAULT_ORDER_PASSES);
        if let Some(token) = layout.ordering.as_deref() {
            let Some(policy) = OrderingPolicy::from_token(token, passes) else {
                bail!("unknown ordering policy `{token}`");
            };
            target.ordering = policy;
        }
        if let Some(v) = layout.fit_labels {
            target.fit_labels = v;
        }
        if let Some(v) = layout.max_node_width {
            target.max_node_width = v;
        }
        if let Some(v) = layout.label_padding_x {
            target.label_padding_x = v;
        }
        if let Some(v) = layout.collapse_policy {
            target.collapse_policy = v;
        }
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.width {
            config.render.width = v;
        }
        if let Some(v) = render.height {
            config.render.height = v;
        }
        if let Some(v) = render.background {
            config.render.background = v;
        }
        if let Some(v) = render.padding {
            config.render.padding = v;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_yields_defaults() {
        let config = load_config(None).expect("defaults");
        assert_eq!(config, Config::default());
        assert_eq!(config.layout.node_width, 220.0);
    }

    #[test]
    fn json5_overlay_touches_only_given_fields() {
        let config = parse_config(
            r#"{
                // comments and trailing commas are fine
                theme: "modern",
                layout: { direction: "LR", rankSpacing: 80, ordering: "median", orderPasses: 2, },
                render: { padding: 8 },
            }"#,
        )
        .expect("valid config");
        assert_eq!(config.theme.font_size, Theme::modern().font_size);
        assert_eq!(config.layout.direction, Direction::LeftRight);
        assert_eq!(config.layout.rank_spacing, 80.0);
        assert_eq!(config.layout.node_spacing, 40.0);
        assert_eq!(config.layout.ordering, OrderingPolicy::Median { passes: 2 });
        assert_eq!(config.render.padding, 8.0);
    }

    #[test]
    fn theme_variables_override_preset() {
        let config = parse_config(r##"{ "themeVariables": { "lineColor": "#000", "background": "#111" } }"##)
            .expect("valid config");
        assert_eq!(config.theme.line_color, "#000");
        assert_eq!(config.render.background, "#111");
    }

    #[test]
    fn collapse_policy_is_configurable() {
        let config = parse_config(r#"{ layout: { collapsePolicy: "reset" } }"#).expect("valid config");
        assert_eq!(config.layout.collapse_policy, CollapsePolicy::Reset);
    }

    #[test]
    fn rejects_unknown_direction() {
        let err = parse_config(r#"{ layout: { direction: "diagonal" } }"#).expect_err("bad direction");
        assert!(err.to_string().contains("diagonal"));
    }
}
