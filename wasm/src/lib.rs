use orgchart_layout::config::Config;
use orgchart_layout::ir::Direction;
use orgchart_layout::layout::OrderingPolicy;
use orgchart_layout::parser::RecordSet;
use orgchart_layout::render::{Scene, render_svg};
use orgchart_layout::state::ChartState;
use orgchart_layout::theme::Theme;
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrgChartOptions {
    theme: Option<String>,
    direction: Option<String>,
    ordering: Option<String>,
    order_passes: Option<usize>,
    font_family: Option<String>,
    font_size: Option<f32>,
    node_width: Option<f32>,
    node_height: Option<f32>,
    fit_labels: Option<bool>,
    #[serde(default)]
    collapsed: Vec<String>,
    collapse_depth: Option<usize>,
    selected: Option<String>,
}

fn build_config(options: &OrgChartOptions) -> Result<Config, String> {
    let mut config = Config::default();
    if let Some(name) = options.theme.as_deref() {
        let theme = Theme::by_name(name).ok_or_else(|| format!("unknown theme `{name}`"))?;
        config.render.background = theme.background.clone();
        config.theme = theme;
    }
    if let Some(token) = options.direction.as_deref() {
        config.layout.direction =
            Direction::from_token(token).ok_or_else(|| format!("unknown direction `{token}`"))?;
    }
    if let Some(token) = options.ordering.as_deref() {
        config.layout.ordering = OrderingPolicy::from_token(token, options.order_passes.unwrap_or(4))
            .ok_or_else(|| format!("unknown ordering `{token}`"))?;
    }
    if let Some(font_family) = options.font_family.clone() {
        config.theme.font_family = font_family;
    }
    if let Some(font_size) = options.font_size {
        config.theme.font_size = font_size;
    }
    if let Some(width) = options.node_width {
        config.layout.node_width = width;
    }
    if let Some(height) = options.node_height {
        config.layout.node_height = height;
    }
    if let Some(fit) = options.fit_labels {
        config.layout.fit_labels = fit;
    }
    Ok(config)
}

fn build_scene(records_json: &str, options: &OrgChartOptions) -> Result<(Scene, Config), String> {
    let config = build_config(options)?;
    let records = RecordSet::from_json(records_json).map_err(|error| error.to_string())?;
    let mut state = ChartState::new(config.clone());
    state.load(records).map_err(|error| error.to_string())?;
    if let Some(depth) = options.collapse_depth {
        state.collapse_below(depth).map_err(|error| error.to_string())?;
    }
    if !options.collapsed.is_empty() {
        let mut ids: Vec<String> = state.collapsed().iter().cloned().collect();
        ids.extend(options.collapsed.iter().cloned());
        state.set_collapsed(ids).map_err(|error| error.to_string())?;
    }
    if let Some(id) = options.selected.as_deref() {
        state.select(Some(id)).map_err(|error| error.to_string())?;
    }
    let scene = state.scene().ok_or_else(|| "nothing to render".to_string())?;
    Ok((scene, config))
}

fn parse_options(options_json: Option<String>) -> Result<OrgChartOptions, JsValue> {
    match options_json {
        Some(raw_options) => serde_json::from_str::<OrgChartOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string())),
        None => Ok(OrgChartOptions::default()),
    }
}

/// Lays out the records and returns the render scene as JSON.
#[wasm_bindgen]
pub fn layout_org_chart(records_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = parse_options(options_json)?;
    let (scene, _) = build_scene(records_json, &options).map_err(|error| JsValue::from_str(&error))?;
    serde_json::to_string(&scene).map_err(|error| JsValue::from_str(&error.to_string()))
}

#[wasm_bindgen]
pub fn render_org_chart_svg(records_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = parse_options(options_json)?;
    let (scene, config) = build_scene(records_json, &options).map_err(|error| JsValue::from_str(&error))?;
    Ok(render_svg(&scene, &config.theme, &config.render))
}

#[cfg(test)]
mod tests {
    use orgchart_layout::render::render_svg;

    use crate::{OrgChartOptions, build_scene};

    const RECORDS: &str = r#"{ "id": "ceo", "name": "Ada", "title": "CEO", "children": [
        { "id": "cto", "name": "Brian", "children": [ { "id": "dev", "name": "Cleo" } ] },
        { "id": "cfo", "name": "Dana" }
    ] }"#;

    #[test]
    fn renders_collapsed_chart() {
        let options: OrgChartOptions =
            serde_json::from_str(r#"{ "collapsed": ["cto"], "selected": "cfo", "direction": "lr" }"#)
                .expect("valid options");
        let (scene, config) = build_scene(RECORDS, &options).expect("chart should lay out");
        assert_eq!(scene.nodes.len(), 3);
        assert_eq!(scene.selected.as_deref(), Some("cfo"));

        let svg = render_svg(&scene, &config.theme, &config.render);
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Ada"));
        assert!(!svg.contains("Cleo"));
    }

    #[test]
    fn rejects_unknown_theme() {
        let options = OrgChartOptions {
            theme: Some("neon".to_string()),
            ..OrgChartOptions::default()
        };
        assert!(build_scene(RECORDS, &options).is_err());
    }
}
