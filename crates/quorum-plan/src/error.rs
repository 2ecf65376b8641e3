use crate::node::{NodeId, QueryKind};

/// Errors that make a plan unusable. All of them are detected before the
/// offending node reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    /// A node names a column its record type does not have.
    #[error("schema mismatch: {kind} has no column `{column}`")]
    SchemaMismatch { kind: QueryKind, column: String },

    /// A node depends on (or references) a node with no earlier result.
    #[error("broken dependency: node {node} refers to node {target}, which has no earlier result")]
    BrokenDependency { node: NodeId, target: NodeId },

    #[error("invalid plan: {0}")]
    Invalid(#[from] InvalidPlan),

    /// The planner's JSON did not match the plan wire form.
    #[error("malformed plan: {0}")]
    Parse(String),
}

/// Structural problems found by [`crate::Plan::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidPlan {
    #[error("plan has no nodes")]
    EmptyPlan,

    #[error("node id {0} appears more than once")]
    DuplicateNodeId(NodeId),

    #[error("node {0} depends on itself")]
    SelfDependency(NodeId),

    #[error("node {node} depends on node {target}, which comes later in the plan")]
    ForwardDependency { node: NodeId, target: NodeId },

    #[error("node {node} is a {kind} query; date ranges only apply to MEETING")]
    DateRangeOnNonMeeting { node: NodeId, kind: QueryKind },

    #[error("node {node} has a date range whose minimum is after its maximum")]
    InvertedDateRange { node: NodeId },

    #[error("node {node} references column `{column}` of node {target}, which does not project it")]
    UnprojectedReference {
        node: NodeId,
        target: NodeId,
        column: String,
    },
}

impl From<serde_json::Error> for PlanError {
    fn from(err: serde_json::Error) -> Self {
        PlanError::Parse(err.to_string())
    }
}
