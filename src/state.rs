//! Interaction state for one chart view.
//!
//! [`ChartState`] owns the current hierarchy, the collapsed set, the selection
//! and the derived visible subgraph and layout. Every mutation goes through a
//! method here; a mutation either commits a fully recomputed view or leaves
//! the previous one untouched.
//!
//! Fetching is modelled as a ticket: [`ChartState::begin_fetch`] bumps the
//! generation and enters `Loading`, and only the response carrying the newest
//! ticket is applied. While a fetch is pending, collapse and selection
//! requests are refused with [`StateError::Busy`].

use serde::Serialize;

use crate::config::{CollapsePolicy, Config};
use crate::diff::{LayoutDiff, diff_layouts};
use crate::error::{DataError, FetchError, LayoutError, StateError};
use crate::ir::{Direction, Hierarchy, PersonNode};
use crate::layout::{Layout, OrderingPolicy, Spacing, compute_layout, fit_node_sizes};
use crate::parser::{self, RecordSet};
use crate::render::{Scene, build_scene};
use crate::source::{HierarchySource, Session};
use crate::visibility::{self, CollapsedSet, VisibleSubgraph};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "error", rename_all = "snake_case")]
pub enum LoadFailure {
    Fetch(FetchError),
    Data(DataError),
    Layout(LayoutError),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "status", content = "failure", rename_all = "snake_case")]
pub enum Status {
    #[default]
    Idle,
    Loading,
    Ready,
    /// The last fetch failed. Any previously loaded chart is still shown.
    Failed(LoadFailure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchTicket {
    generation: u64,
}

impl FetchTicket {
    pub fn generation(self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// A newer fetch was started after this one; the response was dropped.
    Stale,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Collapsed,
    Expanded,
    NoChildren,
}

#[derive(Debug, Clone, PartialEq)]
struct LayoutKey {
    visible: VisibleSubgraph,
    spacing: Spacing,
    direction: Direction,
    ordering: OrderingPolicy,
}

/// A recomputed view waiting to be committed.
struct Planned {
    key: LayoutKey,
    layout: Option<Layout>,
}

#[derive(Debug, Default)]
pub struct ChartState {
    config: Config,
    hierarchy: Option<Hierarchy>,
    collapsed: CollapsedSet,
    selection: Option<String>,
    generation: u64,
    pending: Option<u64>,
    status: Status,
    key: Option<LayoutKey>,
    layout: Option<Layout>,
    last_diff: LayoutDiff,
    relayouts: usize,
}

impl ChartState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn hierarchy(&self) -> Option<&Hierarchy> {
        self.hierarchy.as_ref()
    }

    pub fn collapsed(&self) -> &CollapsedSet {
        &self.collapsed
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn visible(&self) -> Option<&VisibleSubgraph> {
        self.key.as_ref().map(|key| &key.visible)
    }

    pub fn layout(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }

    /// Changes produced by the most recent committed relayout.
    pub fn last_diff(&self) -> &LayoutDiff {
        &self.last_diff
    }

    /// Number of layouts actually computed (memo hits excluded).
    pub fn relayout_count(&self) -> usize {
        self.relayouts
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        self.pending = Some(self.generation);
        self.status = Status::Loading;
        tracing::debug!(generation = self.generation, "fetch started");
        FetchTicket {
            generation: self.generation,
        }
    }

    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<RecordSet, FetchError>,
    ) -> FetchOutcome {
        if !self.accept(ticket) {
            return FetchOutcome::Stale;
        }
        let parsed = result.map(|records| parser::build(&records));
        self.finish(parsed)
    }

    /// Like [`ChartState::complete_fetch`] for a raw JSON body.
    pub fn complete_fetch_json(
        &mut self,
        ticket: FetchTicket,
        result: Result<String, FetchError>,
    ) -> FetchOutcome {
        if !self.accept(ticket) {
            return FetchOutcome::Stale;
        }
        let parsed = result.map(|body| parser::parse_records(&body));
        self.finish(parsed)
    }

    /// Fetches from `source` and applies the response.
    pub fn refresh(&mut self, source: &dyn HierarchySource, session: &Session) -> FetchOutcome {
        let ticket = self.begin_fetch();
        let result = source.fetch(session);
        self.complete_fetch_json(ticket, result)
    }

    pub fn load(&mut self, records: RecordSet) -> Result<(), StateError> {
        let ticket = self.begin_fetch();
        self.complete_fetch(ticket, Ok(records));
        self.failure()
    }

    pub fn load_hierarchy(&mut self, hierarchy: Hierarchy) -> Result<(), StateError> {
        let ticket = self.begin_fetch();
        if self.accept(ticket) {
            self.finish(Ok(Ok(hierarchy)));
        }
        self.failure()
    }

    fn failure(&self) -> Result<(), StateError> {
        match &self.status {
            Status::Failed(LoadFailure::Data(err)) => Err(err.clone().into()),
            Status::Failed(LoadFailure::Fetch(err)) => Err(err.clone().into()),
            Status::Failed(LoadFailure::Layout(err)) => Err(err.clone().into()),
            _ => Ok(()),
        }
    }

    fn accept(&mut self, ticket: FetchTicket) -> bool {
        if self.pending != Some(ticket.generation) {
            tracing::debug!(
                generation = ticket.generation,
                current = self.generation,
                "dropping stale fetch response"
            );
            return false;
        }
        self.pending = None;
        true
    }

    fn finish(&mut self, parsed: Result<Result<Hierarchy, DataError>, FetchError>) -> FetchOutcome {
        let hierarchy = match parsed {
            Err(err) => {
                tracing::warn!(error = %err, "fetch failed; keeping last chart");
                self.status = Status::Failed(LoadFailure::Fetch(err));
                return FetchOutcome::Failed;
            }
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "invalid hierarchy; keeping last chart");
                self.status = Status::Failed(LoadFailure::Data(err));
                return FetchOutcome::Failed;
            }
            Ok(Ok(hierarchy)) => hierarchy,
        };

        let collapsed = match self.config.layout.collapse_policy {
            CollapsePolicy::Reset => CollapsedSet::new(),
            CollapsePolicy::PreserveExisting => self
                .collapsed
                .iter()
                .filter(|id| hierarchy.has_children(id))
                .cloned()
                .collect(),
        };
        let planned = match self.plan(&hierarchy, &collapsed) {
            Ok(planned) => planned,
            Err(err) => {
                tracing::warn!(error = %err, "layout failed; keeping last chart");
                self.status = Status::Failed(LoadFailure::Layout(err));
                return FetchOutcome::Failed;
            }
        };

        if let Some(selected) = self.selection.as_deref()
            && !hierarchy.contains(selected)
        {
            tracing::debug!(id = selected, "selected node vanished; clearing selection");
            self.selection = None;
        }
        tracing::info!(
            generation = self.generation,
            people = hierarchy.len(),
            "hierarchy loaded"
        );
        self.hierarchy = Some(hierarchy);
        self.collapsed = collapsed;
        self.commit(planned);
        self.status = Status::Ready;
        FetchOutcome::Applied
    }

    fn guard(&self) -> Result<&Hierarchy, StateError> {
        if self.pending.is_some() {
            return Err(StateError::Busy);
        }
        self.hierarchy.as_ref().ok_or(StateError::NoHierarchy)
    }

    pub fn toggle_collapse(&mut self, id: &str) -> Result<ToggleOutcome, StateError> {
        let hierarchy = self.guard()?;
        if !hierarchy.contains(id) {
            return Err(StateError::UnknownNode(id.to_string()));
        }
        if !hierarchy.has_children(id) {
            return Ok(ToggleOutcome::NoChildren);
        }
        let mut collapsed = self.collapsed.clone();
        let outcome = if collapsed.remove(id) {
            ToggleOutcome::Expanded
        } else {
            collapsed.insert(id.to_string());
            ToggleOutcome::Collapsed
        };
        self.apply_collapsed(collapsed)?;
        Ok(outcome)
    }

    pub fn expand_all(&mut self) -> Result<(), StateError> {
        self.guard()?;
        self.apply_collapsed(CollapsedSet::new())
    }

    /// Collapses every node at `depth` or deeper.
    pub fn collapse_below(&mut self, depth: usize) -> Result<(), StateError> {
        let collapsed = visibility::collapse_below(self.guard()?, depth);
        self.apply_collapsed(collapsed)
    }

    /// Sets the collapsed set wholesale. Ids that are unknown or childless are
    /// ignored.
    pub fn set_collapsed<I, S>(&mut self, ids: I) -> Result<(), StateError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let hierarchy = self.guard()?;
        let collapsed = ids
            .into_iter()
            .map(Into::into)
            .filter(|id: &String| hierarchy.has_children(id))
            .collect();
        self.apply_collapsed(collapsed)
    }

    pub fn select(&mut self, id: Option<&str>) -> Result<(), StateError> {
        let hierarchy = self.guard()?;
        if let Some(id) = id
            && !hierarchy.contains(id)
        {
            return Err(StateError::UnknownNode(id.to_string()));
        }
        self.selection = id.map(str::to_string);
        Ok(())
    }

    pub fn selected_person(&self) -> Option<&PersonNode> {
        let id = self.selection.as_deref()?;
        self.hierarchy.as_ref()?.person(id)
    }

    /// Replaces the configuration and relayouts if a chart is loaded. The old
    /// configuration stays in place if the new one cannot be laid out.
    pub fn configure(&mut self, config: Config) -> Result<(), StateError> {
        if self.pending.is_some() {
            return Err(StateError::Busy);
        }
        let Some(hierarchy) = self.hierarchy.as_ref() else {
            self.config = config;
            return Ok(());
        };
        let planned = self.plan_with(&config, hierarchy, &self.collapsed)?;
        self.config = config;
        self.commit(planned);
        Ok(())
    }

    pub fn scene(&self) -> Option<Scene> {
        let hierarchy = self.hierarchy.as_ref()?;
        let layout = self.layout.as_ref()?;
        let visible = self.visible()?;
        Some(build_scene(layout, hierarchy, visible, self.selection.as_deref()))
    }

    fn apply_collapsed(&mut self, collapsed: CollapsedSet) -> Result<(), StateError> {
        let hierarchy = self.hierarchy.as_ref().ok_or(StateError::NoHierarchy)?;
        let planned = self.plan(hierarchy, &collapsed)?;
        self.collapsed = collapsed;
        self.commit(planned);
        Ok(())
    }

    fn plan(&self, hierarchy: &Hierarchy, collapsed: &CollapsedSet) -> Result<Planned, LayoutError> {
        self.plan_with(&self.config, hierarchy, collapsed)
    }

    fn plan_with(
        &self,
        config: &Config,
        hierarchy: &Hierarchy,
        collapsed: &CollapsedSet,
    ) -> Result<Planned, LayoutError> {
        let visible = visibility::resolve(hierarchy, collapsed);
        let spacing = fit_node_sizes(hierarchy, &visible, &config.theme, &config.layout);
        let key = LayoutKey {
            visible,
            spacing,
            direction: config.layout.direction,
            ordering: config.layout.ordering,
        };
        if self.layout.is_some() && self.key.as_ref() == Some(&key) {
            tracing::debug!("visible subgraph unchanged; reusing layout");
            return Ok(Planned { key, layout: None });
        }
        let layout = compute_layout(&key.visible, key.direction, &key.spacing, key.ordering)?;
        Ok(Planned {
            key,
            layout: Some(layout),
        })
    }

    fn commit(&mut self, planned: Planned) {
        match planned.layout {
            Some(layout) => {
                self.relayouts += 1;
                self.last_diff = diff_layouts(self.layout.as_ref(), &layout);
                tracing::debug!(
                    added = self.last_diff.added.len(),
                    removed = self.last_diff.removed.len(),
                    moved = self.last_diff.moved.len(),
                    "relayout"
                );
                self.layout = Some(layout);
            }
            None => {
                if let Some(layout) = self.layout.as_ref() {
                    self.last_diff = diff_layouts(Some(layout), layout);
                }
            }
        }
        self.key = Some(planned.key);
    }
}
