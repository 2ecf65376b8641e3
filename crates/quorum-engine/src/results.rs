//! The accumulated result table of one plan execution.

use std::collections::BTreeMap;

use quorum_plan::{InvalidPlan, NodeId, PlanError};

use crate::value::{Row, SqlValue};

/// Rows produced by one node, with the names of the projected columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeResult {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl NodeResult {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// The values of column `index` across all rows, in row order.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &SqlValue> {
        self.rows.iter().filter_map(move |row| row.get(index))
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Append-only mapping from node id to that node's rows.
///
/// Keyed by the declared node id, never by plan position. A node's entry is
/// written once and is read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultTable {
    entries: BTreeMap<NodeId, NodeResult>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `node`'s rows. Fails if the node already has an entry.
    pub fn record(&mut self, node: NodeId, result: NodeResult) -> Result<(), PlanError> {
        if self.entries.contains_key(&node) {
            return Err(InvalidPlan::DuplicateNodeId(node).into());
        }
        self.entries.insert(node, result);
        Ok(())
    }

    pub fn get(&self, node: NodeId) -> Option<&NodeResult> {
        self.entries.get(&node)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.entries.contains_key(&node)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &NodeResult)> {
        self.entries.iter().map(|(id, result)| (*id, result))
    }

    /// Ids of recorded nodes that produced no rows, ascending.
    pub fn empty_nodes(&self) -> Vec<NodeId> {
        self.entries
            .iter()
            .filter(|(_, result)| result.is_empty())
            .map(|(id, _)| *id)
            .collect()
    }
}
