#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod render;
pub mod source;
pub mod state;
pub mod text_metrics;
pub mod theme;
pub mod visibility;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, load_config};
pub use diff::{LayoutDiff, diff_layouts};
pub use error::{DataError, FetchError, LayoutError, StateError};
pub use ir::{Direction, Hierarchy, HierarchyEdge, PersonNode};
pub use layout::{Layout, OrderingPolicy, Spacing, compute_layout};
pub use parser::{RecordSet, parse_records};
pub use render::{Scene, render_svg};
pub use state::ChartState;
pub use visibility::{CollapsedSet, VisibleSubgraph, resolve};
