//! Plan execution.
//!
//! Nodes run strictly in plan order. Filters are resolved against everything
//! recorded so far, so a node with dependencies may reference any earlier
//! node, not only the ones it lists. A node without dependencies cannot carry
//! references at all; [`Plan::validate`](quorum_plan::Plan::validate) rejects
//! that as a broken dependency. The first failure aborts the plan; nothing is
//! synthesized from a partial result table.

use std::time::Instant;

use quorum_plan::{NodeId, PlanNode, SchemaCatalog, ValidatedPlan};
use tracing::{debug, info, warn};

use crate::compile::SqlCompiler;
use crate::config::PlaceholderStyle;
use crate::error::ExecError;
use crate::results::{NodeResult, ResultTable};
use crate::store::SqlStore;
use crate::trace::{ExecutionTrace, NodeTrace};

/// Whether an executed plan can support an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanOutcome {
    /// Every node produced at least one row.
    Answerable,
    /// At least one node produced no rows.
    Unanswerable { empty_nodes: Vec<NodeId> },
}

/// The result of running a plan to completion.
#[derive(Debug, Clone)]
pub struct Execution {
    pub results: ResultTable,
    pub trace: ExecutionTrace,
}

impl Execution {
    pub fn outcome(&self) -> PlanOutcome {
        let empty_nodes = self.results.empty_nodes();
        if empty_nodes.is_empty() {
            PlanOutcome::Answerable
        } else {
            PlanOutcome::Unanswerable { empty_nodes }
        }
    }

    pub fn is_answerable(&self) -> bool {
        self.outcome() == PlanOutcome::Answerable
    }
}

pub struct PlanExecutor<'a, S: SqlStore + ?Sized> {
    catalog: &'a SchemaCatalog,
    store: &'a S,
    placeholder: PlaceholderStyle,
}

impl<'a, S: SqlStore + ?Sized> PlanExecutor<'a, S> {
    pub fn new(catalog: &'a SchemaCatalog, store: &'a S) -> Self {
        Self {
            catalog,
            store,
            placeholder: PlaceholderStyle::default(),
        }
    }

    pub fn with_placeholder(mut self, placeholder: PlaceholderStyle) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Run every node of `plan` once, in order.
    pub fn execute(&self, plan: &ValidatedPlan) -> Result<Execution, ExecError> {
        let compiler = SqlCompiler::new(self.catalog).with_placeholder(self.placeholder);
        let mut results = ResultTable::new();
        let mut trace = ExecutionTrace::new();

        for node in plan.nodes() {
            let query = compiler.compile_node(node, &results)?;
            debug!(node = node.id, sql = %query.sql, params = query.params.len(), "compiled node");

            let started = Instant::now();
            let rows = self.store.execute(&query.sql, &query.params).map_err(|source| {
                warn!(node = node.id, error = %source, "store call failed, aborting plan");
                ExecError::Store {
                    node: node.id,
                    source,
                }
            })?;
            let elapsed = started.elapsed();

            info!(node = node.id, kind = %node.kind, rows = rows.len(), "executed node");
            trace.push(NodeTrace {
                node: node.id,
                kind: node.kind,
                sql: query.sql,
                param_count: query.params.len(),
                rows: rows.len(),
                elapsed,
            });
            results.record(node.id, NodeResult::new(self.column_names(node), rows))?;
        }

        let execution = Execution { results, trace };
        if let PlanOutcome::Unanswerable { empty_nodes } = execution.outcome() {
            warn!(?empty_nodes, "plan is unanswerable");
        }
        Ok(execution)
    }

    /// The projection, or the table's declared columns for `SELECT *`.
    fn column_names(&self, node: &PlanNode) -> Vec<String> {
        if node.columns.is_empty() {
            self.catalog.columns(node.kind).map(str::to_string).collect()
        } else {
            node.columns.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::value::{Row, SqlValue};
    use parking_lot::Mutex;
    use quorum_plan::{Plan, QueryKind, Reference};

    /// Replays canned rows in call order and records every statement.
    struct Scripted {
        replies: Mutex<Vec<Result<Vec<Row>, StoreError>>>,
        seen: Mutex<Vec<(String, Vec<SqlValue>)>>,
    }

    impl Scripted {
        fn new(mut replies: Vec<Result<Vec<Row>, StoreError>>) -> Self {
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl SqlStore for Scripted {
        fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, StoreError> {
            self.seen.lock().push((sql.to_string(), params.to_vec()));
            self.replies.lock().pop().unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn two_node_plan() -> ValidatedPlan {
        Plan::new(vec![
            PlanNode::new(1, QueryKind::Subject)
                .columns(["meeting_number"])
                .filter("name", "Chapter 6"),
            PlanNode::new(2, QueryKind::Summary)
                .columns(["summary"])
                .depends_on(1)
                .filter("meeting_number", Reference::new(1, "meeting_number")),
        ])
        .validate(&SchemaCatalog::committee())
        .unwrap()
    }

    #[test]
    fn later_nodes_see_earlier_rows() {
        let store = Scripted::new(vec![
            Ok(vec![vec![SqlValue::Integer(4)], vec![SqlValue::Integer(9)]]),
            Ok(vec![vec![SqlValue::from("Discussed chapter 6.")]]),
        ]);
        let catalog = SchemaCatalog::committee();
        let execution = PlanExecutor::new(&catalog, &store).execute(&two_node_plan()).unwrap();

        let seen = store.seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(
            seen[1],
            (
                "SELECT summary FROM meeting_summaries WHERE meeting_number IN (?, ?)".to_string(),
                vec![SqlValue::Integer(4), SqlValue::Integer(9)],
            )
        );
        assert!(execution.is_answerable());
        assert_eq!(execution.trace.len(), 2);
        assert_eq!(execution.trace.node(2).map(|t| t.param_count), Some(2));
        assert_eq!(
            execution.trace.total_elapsed(),
            execution.trace.nodes.iter().map(|t| t.elapsed).sum::<std::time::Duration>()
        );
    }

    #[test]
    fn store_failure_aborts_the_plan() {
        let store = Scripted::new(vec![Err(StoreError::new("connection reset"))]);
        let catalog = SchemaCatalog::committee();
        let err = PlanExecutor::new(&catalog, &store).execute(&two_node_plan()).unwrap_err();

        assert!(matches!(err, ExecError::Store { node: 1, .. }));
        assert_eq!(store.seen.lock().len(), 1);
    }

    #[test]
    fn empty_node_makes_the_plan_unanswerable() {
        let store = Scripted::new(vec![Ok(vec![vec![SqlValue::Integer(4)]]), Ok(vec![])]);
        let catalog = SchemaCatalog::committee();
        let execution = PlanExecutor::new(&catalog, &store).execute(&two_node_plan()).unwrap();
        assert_eq!(
            execution.outcome(),
            PlanOutcome::Unanswerable { empty_nodes: vec![2] }
        );
    }

    #[test]
    fn star_projection_is_named_from_the_catalog() {
        let store = Scripted::new(vec![Ok(vec![vec![
            SqlValue::from("Chapter 6"),
            SqlValue::Integer(4),
        ]])]);
        let catalog = SchemaCatalog::committee();
        let plan = Plan::new(vec![PlanNode::new(1, QueryKind::Subject)])
            .validate(&catalog)
            .unwrap();
        let execution = PlanExecutor::new(&catalog, &store).execute(&plan).unwrap();
        assert_eq!(
            execution.results.get(1).map(|r| r.columns.clone()),
            Some(vec!["name".to_string(), "meeting_number".to_string()])
        );
    }
}
