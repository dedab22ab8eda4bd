use crate::config::{Config, load_config};
use crate::ir::Direction;
use crate::layout::OrderingPolicy;
use crate::layout_dump::write_layout_dump;
use crate::parser::RecordSet;
use crate::render::{Scene, render_svg, write_output_svg};
use crate::state::ChartState;
use crate::theme::Theme;
use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "orgchart", version, about = "Lay out and render an org chart from JSON records")]
pub struct Args {
    /// Input records (.json) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout for SVG and JSON.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config file (JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Layout direction: tb or lr
    #[arg(short = 'd', long = "direction")]
    pub direction: Option<String>,

    /// Theme preset: classic or modern
    #[arg(short = 't', long = "theme")]
    pub theme: Option<String>,

    /// Collapse this node (repeatable)
    #[arg(long = "collapse")]
    pub collapse: Vec<String>,

    /// Collapse every node at this depth or deeper
    #[arg(long = "collapse-depth")]
    pub collapse_depth: Option<usize>,

    /// Highlight this node
    #[arg(long = "select")]
    pub select: Option<String>,

    /// In-rank ordering: preserve, barycenter or median
    #[arg(long = "ordering")]
    pub ordering: Option<String>,

    /// Sweep passes for barycenter/median ordering
    #[arg(long = "order-passes", default_value_t = 4)]
    pub order_passes: usize,

    /// Widen cards to fit long names and titles
    #[arg(long = "fit-labels")]
    pub fit_labels: bool,

    /// Also write the computed layout as JSON to this path
    #[arg(long = "dump-layout")]
    pub dump_layout: Option<PathBuf>,

    /// Width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
    /// The render scene as JSON
    Json,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let config = apply_overrides(load_config(args.config.as_deref())?, &args)?;
    let input = read_input(args.input.as_deref())?;
    let records = RecordSet::from_json(&input)?;

    let mut state = ChartState::new(config.clone());
    state.load(records)?;
    if let Some(depth) = args.collapse_depth {
        state.collapse_below(depth)?;
    }
    if !args.collapse.is_empty() {
        if let Some(hierarchy) = state.hierarchy() {
            for id in args.collapse.iter().filter(|id| !hierarchy.contains(id)) {
                tracing::warn!(id = id.as_str(), "--collapse names an unknown node");
            }
        }
        let mut ids: Vec<String> = state.collapsed().iter().cloned().collect();
        ids.extend(args.collapse.iter().cloned());
        state.set_collapsed(ids)?;
    }
    if let Some(id) = args.select.as_deref() {
        state.select(Some(id))?;
    }

    if let Some(path) = args.dump_layout.as_deref()
        && let (Some(layout), Some(hierarchy), Some(visible)) =
            (state.layout(), state.hierarchy(), state.visible())
    {
        write_layout_dump(path, layout, hierarchy, visible)?;
    }

    let Some(scene) = state.scene() else {
        bail!("nothing to render");
    };
    write_scene(&scene, &config, args.output_format, args.output.as_deref())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn apply_overrides(mut config: Config, args: &Args) -> Result<Config> {
    if let Some(name) = args.theme.as_deref() {
        let Some(theme) = Theme::by_name(name) else {
            bail!("unknown theme `{name}`");
        };
        config.render.background = theme.background.clone();
        config.theme = theme;
    }
    if let Some(token) = args.direction.as_deref() {
        let Some(direction) = Direction::from_token(token) else {
            bail!("unknown direction `{token}` (expected tb or lr)");
        };
        config.layout.direction = direction;
    }
    if let Some(token) = args.ordering.as_deref() {
        let Some(policy) = OrderingPolicy::from_token(token, args.order_passes) else {
            bail!("unknown ordering `{token}` (expected preserve, barycenter or median)");
        };
        config.layout.ordering = policy;
    }
    if args.fit_labels {
        config.layout.fit_labels = true;
    }
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }
    Ok(config)
}

fn write_scene(scene: &Scene, config: &Config, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    match format {
        OutputFormat::Svg => {
            let svg = render_svg(scene, &config.theme, &config.render);
            write_output_svg(&svg, output)
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(scene)?;
            match output {
                Some(path) => std::fs::write(path, json)?,
                None => println!("{json}"),
            }
            Ok(())
        }
        OutputFormat::Png => write_png(scene, config, output),
    }
}

#[cfg(feature = "png")]
fn write_png(scene: &Scene, config: &Config, output: Option<&Path>) -> Result<()> {
    let Some(output) = output else {
        bail!("output path required for png output");
    };
    let svg = render_svg(scene, &config.theme, &config.render);
    crate::render::write_output_png(&svg, output, &config.render, &config.theme)
}

#[cfg(not(feature = "png"))]
fn write_png(_scene: &Scene, _config: &Config, _output: Option<&Path>) -> Result<()> {
    bail!("png output requires the `png` feature")
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return std::fs::read_to_string(path)
            .map_err(|err| anyhow::anyhow!("failed to read {}: {err}", path.display()));
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}
