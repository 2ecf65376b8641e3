//! Per-node record of one plan execution.

use std::time::Duration;

use quorum_plan::{NodeId, QueryKind};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeTrace {
    pub node: NodeId,
    pub kind: QueryKind,
    pub sql: String,
    pub param_count: usize,
    pub rows: usize,
    /// Store round trip, compilation excluded.
    pub elapsed: Duration,
}

/// Executed nodes in execution order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecutionTrace {
    pub nodes: Vec<NodeTrace>,
}

impl ExecutionTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: NodeTrace) {
        self.nodes.push(entry);
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeTrace> {
        self.nodes.iter().find(|n| n.node == id)
    }

    pub fn total_elapsed(&self) -> Duration {
        self.nodes.iter().map(|n| n.elapsed).sum()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
