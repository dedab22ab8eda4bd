//! Error taxonomy shared by the hierarchy model, the layout engine and the
//! interaction state.
//!
//! * [`DataError`]: the records describe an invalid hierarchy. Fatal to that
//!   fetch generation; no layout is attempted.
//! * [`FetchError`]: the data source could not deliver records. Retryable;
//!   never touches the last good hierarchy.
//! * [`LayoutError`]: the engine was handed a graph it cannot lay out, or a
//!   finished layout broke one of its own invariants.
//! * [`StateError`]: an interaction was refused by [`crate::state::ChartState`].

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataError {
    #[error("no records in hierarchy")]
    Empty,
    #[error("records do not match any known shape: {message}")]
    Decode { message: String },
    #[error("duplicate id `{id}`")]
    DuplicateId { id: String },
    #[error("orphan reference: edge `{parent}` -> `{child}` names unknown id `{missing}`")]
    OrphanReference {
        parent: String,
        child: String,
        missing: String,
    },
    #[error("node `{child}` has multiple parents: {}", .parents.join(", "))]
    MultipleParents { child: String, parents: Vec<String> },
    #[error("cycle detected: {}", .path.join(" -> "))]
    CycleDetected { path: Vec<String> },
    #[error("multiple roots: {}", .roots.join(", "))]
    MultipleRoots { roots: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchError {
    #[error("failed to read `{path}`: {message}")]
    Io { path: String, message: String },
    #[error("data source returned status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("data source unreachable: {message}")]
    Unavailable { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvariantViolation {
    #[error("visible node `{id}` has no position")]
    MissingPosition { id: String },
    #[error("nodes `{first}` and `{second}` overlap")]
    Overlap { first: String, second: String },
    #[error("edge `{parent}` -> `{child}` does not point to a later rank ({parent_rank} -> {child_rank})")]
    RankOrder {
        parent: String,
        child: String,
        parent_rank: usize,
        child_rank: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutError {
    #[error("nothing to lay out")]
    Empty,
    #[error("edge `{parent}` -> `{child}` references a node outside the subgraph")]
    UnknownNode { parent: String, child: String },
    #[error("node `{id}` is not reachable from root `{root}`")]
    Disconnected { id: String, root: String },
    #[error("cycle through `{id}` in visible subgraph")]
    Cycle { id: String },
    #[error("layout invariant violated: {violation}")]
    InvariantViolation { violation: InvariantViolation },
}

impl From<InvariantViolation> for LayoutError {
    fn from(violation: InvariantViolation) -> Self {
        Self::InvariantViolation { violation }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StateError {
    #[error("a fetch is in flight; interaction rejected")]
    Busy,
    #[error("no hierarchy loaded yet")]
    NoHierarchy,
    #[error("unknown node `{0}`")]
    UnknownNode(String),
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
}
