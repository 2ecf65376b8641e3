//! Plans and plan validation.
//!
//! A [`Plan`] is what the planner hands over; a [`ValidatedPlan`] is a plan
//! whose ids, dependency order and column names have been checked against a
//! [`SchemaCatalog`]. Only validated plans can be executed.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::SchemaCatalog;
use crate::error::{InvalidPlan, PlanError};
use crate::node::{NodeId, PlanNode, QueryKind};

/// Ordered sequence of plan nodes for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Plan {
    #[serde(rename = "query_plan", alias = "nodes")]
    nodes: Vec<PlanNode>,
}

impl Plan {
    pub fn new(nodes: Vec<PlanNode>) -> Self {
        Self { nodes }
    }

    /// Parse the planner's JSON wire form.
    pub fn from_json(text: &str) -> Result<Self, PlanError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, PlanError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn nodes(&self) -> &[PlanNode] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&PlanNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Check the plan against `catalog`.
    ///
    /// Rejects, in node order:
    /// - empty plans and duplicate ids,
    /// - dependencies on the node itself, on later nodes, or on missing ids,
    /// - references whose source node is not earlier in the plan, or that
    ///   appear on a node with no dependencies,
    /// - unknown columns in projections, filters, sorts and groupings,
    /// - references to columns the source node does not project,
    /// - date ranges on non-MEETING nodes, and inverted date ranges.
    pub fn validate(self, catalog: &SchemaCatalog) -> Result<ValidatedPlan, PlanError> {
        if self.nodes.is_empty() {
            return Err(InvalidPlan::EmptyPlan.into());
        }

        let mut all_ids: BTreeSet<NodeId> = BTreeSet::new();
        for node in &self.nodes {
            if !all_ids.insert(node.id) {
                return Err(InvalidPlan::DuplicateNodeId(node.id).into());
            }
        }

        let mut earlier: BTreeMap<NodeId, &PlanNode> = BTreeMap::new();
        for node in &self.nodes {
            for &dep in &node.depends_on {
                if dep == node.id {
                    return Err(InvalidPlan::SelfDependency(node.id).into());
                }
                if !earlier.contains_key(&dep) {
                    if all_ids.contains(&dep) {
                        return Err(InvalidPlan::ForwardDependency {
                            node: node.id,
                            target: dep,
                        }
                        .into());
                    }
                    return Err(PlanError::BrokenDependency {
                        node: node.id,
                        target: dep,
                    });
                }
            }

            catalog.check_node(node)?;

            for reference in node.references() {
                // A node without dependencies sees no earlier results.
                let visible = if node.depends_on.is_empty() {
                    None
                } else {
                    earlier.get(&reference.node)
                };
                let Some(source) = visible else {
                    return Err(PlanError::BrokenDependency {
                        node: node.id,
                        target: reference.node,
                    });
                };
                check_column(catalog, source.kind, &reference.column)?;
                if !source.columns.is_empty() && !source.columns.contains(&reference.column) {
                    return Err(InvalidPlan::UnprojectedReference {
                        node: node.id,
                        target: source.id,
                        column: reference.column.clone(),
                    }
                    .into());
                }
            }

            if let Some(range) = &node.date_range {
                if node.kind != QueryKind::Meeting {
                    return Err(InvalidPlan::DateRangeOnNonMeeting {
                        node: node.id,
                        kind: node.kind,
                    }
                    .into());
                }
                if range.is_inverted() {
                    return Err(InvalidPlan::InvertedDateRange { node: node.id }.into());
                }
            }

            earlier.insert(node.id, node);
        }

        Ok(ValidatedPlan { plan: self })
    }
}

impl SchemaCatalog {
    /// Every column `node` names (projection, filters, sort, grouping) must
    /// exist on its kind's table.
    pub fn check_node(&self, node: &PlanNode) -> Result<(), PlanError> {
        let named = node
            .columns
            .iter()
            .chain(node.filters.iter().map(|f| &f.field))
            .chain(node.sort.iter().map(|s| &s.field))
            .chain(node.group_by.iter());
        for column in named {
            check_column(self, node.kind, column)?;
        }
        Ok(())
    }
}

fn check_column(catalog: &SchemaCatalog, kind: QueryKind, column: &str) -> Result<(), PlanError> {
    if catalog.is_valid_column(kind, column) {
        Ok(())
    } else {
        Err(PlanError::SchemaMismatch {
            kind,
            column: column.to_string(),
        })
    }
}

/// A plan that passed [`Plan::validate`]. Immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPlan {
    plan: Plan,
}

impl ValidatedPlan {
    pub fn nodes(&self) -> &[PlanNode] {
        self.plan.nodes()
    }

    pub fn node(&self, id: NodeId) -> Option<&PlanNode> {
        self.plan.node(id)
    }

    pub fn as_plan(&self) -> &Plan {
        &self.plan
    }

    pub fn into_plan(self) -> Plan {
        self.plan
    }
}

impl AsRef<Plan> for ValidatedPlan {
    fn as_ref(&self) -> &Plan {
        &self.plan
    }
}
