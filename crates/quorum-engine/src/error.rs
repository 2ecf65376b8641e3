use quorum_plan::{NodeId, PlanError};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A failure reported by the relational store.
#[derive(Debug, thiserror::Error)]
#[error("store error: {message}")]
pub struct StoreError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::with_source(err.to_string(), err)
    }
}

/// Why a plan execution stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The plan itself is wrong: schema mismatch, broken dependency, invalid shape.
    BadPlan,
    /// The store could not run a statement.
    BadConnection,
}

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error("node {node} failed in the store: {source}")]
    Store {
        node: NodeId,
        #[source]
        source: StoreError,
    },
}

impl ExecError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            ExecError::Plan(_) => FailureKind::BadPlan,
            ExecError::Store { .. } => FailureKind::BadConnection,
        }
    }
}

/// Failures of the planner and answer-generation collaborators.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Plan rejected: {0}")]
    Plan(#[from] PlanError),
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("planner failed: {0}")]
    Planner(#[source] LlmError),
    #[error("plan execution failed: {0}")]
    Exec(#[from] ExecError),
    #[error("failed to render results: {0}")]
    Render(#[from] serde_json::Error),
    #[error("answer generation failed: {0}")]
    Answer(#[source] LlmError),
}

impl PipelineError {
    /// `None` for collaborator failures outside plan execution.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            PipelineError::Exec(err) => Some(err.failure_kind()),
            PipelineError::Planner(LlmError::Plan(_)) => Some(FailureKind::BadPlan),
            _ => None,
        }
    }
}
