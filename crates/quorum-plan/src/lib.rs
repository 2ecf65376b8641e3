//! Quorum plans: typed sub-query graphs over committee-meeting records.
//!
//! A question about the committee corpus is decomposed (by an external
//! planner) into a small ordered list of [`PlanNode`]s. Each node targets one
//! logical record type ([`QueryKind`]) and may filter on values produced by
//! earlier nodes through a [`Reference`].
//!
//! ```text
//!   planner JSON ──► Plan::from_json ──► Plan ──► Plan::validate ──► ValidatedPlan
//!                                                     │
//!                                              SchemaCatalog
//!                                   (tables, ordered columns, keys)
//! ```
//!
//! This crate owns the data model, the schema catalog and validation. SQL
//! compilation and execution live in `quorum-engine`.

pub mod catalog;
pub mod error;
pub mod node;
pub mod plan;
pub mod prompt;

pub use catalog::{ColumnDef, ForeignKey, SchemaCatalog, TableDef, COMMITTEE_DDL};
pub use error::{InvalidPlan, PlanError};
pub use node::{
    DateRange, FilterClause, FilterValue, Literal, NodeId, PlanNode, QueryKind, Reference,
    SortClause, SortOrder,
};
pub use plan::{Plan, ValidatedPlan};
pub use prompt::{plan_json_schema, planner_prompt};
