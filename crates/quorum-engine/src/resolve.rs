//! Reference resolution.
//!
//! Turns each [`FilterClause`] of a node into a concrete predicate shape,
//! reading referenced values out of the [`ResultTable`] accumulated so far:
//!
//! | filter value                         | resolved to          |
//! |--------------------------------------|----------------------|
//! | literal                              | `Equals(literal)`    |
//! | reference, source produced one row   | `Equals(value)`      |
//! | reference, source produced N>1 rows  | `In(distinct values)`|
//! | reference, source produced no rows   | `Never`              |
//!
//! NULL cells never match an equality or membership test, so they are dropped
//! from references; a reference left with no values resolves to `Never`.

use std::collections::HashSet;

use quorum_plan::{FilterClause, FilterValue, InvalidPlan, NodeId, PlanError, PlanNode, Reference};
use tracing::debug;

use crate::results::ResultTable;
use crate::value::SqlValue;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedValue {
    Equals(SqlValue),
    /// Membership in a non-empty list of distinct values.
    In(Vec<SqlValue>),
    /// The referenced node matched nothing; the predicate is always false.
    Never,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFilter {
    pub field: String,
    pub value: ResolvedValue,
}

/// Resolve every filter of `node`, in declaration order.
pub fn resolve_filters(
    node: &PlanNode,
    results: &ResultTable,
) -> Result<Vec<ResolvedFilter>, PlanError> {
    node.filters
        .iter()
        .map(|clause| resolve_filter(node.id, clause, results))
        .collect()
}

/// Resolve one filter of node `node`.
pub fn resolve_filter(
    node: NodeId,
    clause: &FilterClause,
    results: &ResultTable,
) -> Result<ResolvedFilter, PlanError> {
    let value = match &clause.value {
        FilterValue::Literal(literal) => ResolvedValue::Equals(literal.into()),
        FilterValue::Reference(reference) => resolve_reference(node, reference, results)?,
    };
    Ok(ResolvedFilter {
        field: clause.field.clone(),
        value,
    })
}

fn resolve_reference(
    node: NodeId,
    reference: &Reference,
    results: &ResultTable,
) -> Result<ResolvedValue, PlanError> {
    let source = results
        .get(reference.node)
        .ok_or(PlanError::BrokenDependency {
            node,
            target: reference.node,
        })?;
    let index = source
        .column_index(&reference.column)
        .ok_or_else(|| InvalidPlan::UnprojectedReference {
            node,
            target: reference.node,
            column: reference.column.clone(),
        })?;

    let resolved = match source.rows.len() {
        0 => ResolvedValue::Never,
        1 => match source.column_values(index).next() {
            Some(value) if !value.is_null() => ResolvedValue::Equals(value.clone()),
            _ => ResolvedValue::Never,
        },
        _ => {
            let mut seen: HashSet<&SqlValue> = HashSet::new();
            let distinct: Vec<SqlValue> = source
                .column_values(index)
                .filter(|v| !v.is_null() && seen.insert(*v))
                .cloned()
                .collect();
            if distinct.is_empty() {
                ResolvedValue::Never
            } else {
                ResolvedValue::In(distinct)
            }
        }
    };

    debug!(
        node,
        source = reference.node,
        column = %reference.column,
        rows = source.rows.len(),
        "resolved reference"
    );
    Ok(resolved)
}
