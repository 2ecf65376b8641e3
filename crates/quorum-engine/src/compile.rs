//! SQL compilation of one plan node.
//!
//! Clause order is fixed:
//!
//! ```text
//! SELECT <columns | *> FROM <table>
//!   [WHERE <date range> AND <filter> AND ...]
//!   [GROUP BY <column>]
//!   [ORDER BY <column> ASC|DESC, ...]
//!   [LIMIT <n>]
//! ```
//!
//! Identifiers come from the schema catalog after validation; every value
//! (dates, literals, resolved references) is a bound parameter. The limit is a
//! validated positive integer and is written inline.

use quorum_plan::{InvalidPlan, PlanError, PlanNode, SchemaCatalog};

use crate::config::PlaceholderStyle;
use crate::resolve::{resolve_filters, ResolvedFilter, ResolvedValue};
use crate::results::ResultTable;
use crate::value::SqlValue;

/// Always-false predicate for references that matched nothing.
pub const NEVER_PREDICATE: &str = "1 = 0";

/// A statement plus its positional parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

#[derive(Debug, Clone, Copy)]
pub struct SqlCompiler<'a> {
    catalog: &'a SchemaCatalog,
    placeholder: PlaceholderStyle,
}

impl<'a> SqlCompiler<'a> {
    pub fn new(catalog: &'a SchemaCatalog) -> Self {
        Self {
            catalog,
            placeholder: PlaceholderStyle::default(),
        }
    }

    pub fn with_placeholder(mut self, placeholder: PlaceholderStyle) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Resolve `node`'s filters against `results`, then compile.
    pub fn compile_node(
        &self,
        node: &PlanNode,
        results: &ResultTable,
    ) -> Result<CompiledQuery, PlanError> {
        let filters = resolve_filters(node, results)?;
        self.compile(node, &filters)
    }

    /// Compile `node` with already-resolved `filters`.
    ///
    /// Column names are checked before any text is produced, so a schema
    /// mismatch never yields a partial statement.
    pub fn compile(
        &self,
        node: &PlanNode,
        filters: &[ResolvedFilter],
    ) -> Result<CompiledQuery, PlanError> {
        self.catalog.check_node(node)?;
        for filter in filters {
            if !self.catalog.is_valid_column(node.kind, &filter.field) {
                return Err(PlanError::SchemaMismatch {
                    kind: node.kind,
                    column: filter.field.clone(),
                });
            }
        }

        let mut binder = Binder::new(self.placeholder);
        let mut conjuncts: Vec<String> = Vec::new();

        if let Some(range) = &node.date_range {
            let column = self.catalog.date_column(node.kind).ok_or(
                InvalidPlan::DateRangeOnNonMeeting {
                    node: node.id,
                    kind: node.kind,
                },
            )?;
            let date = |d: chrono::NaiveDate| SqlValue::Text(d.format("%Y-%m-%d").to_string());
            match (range.min_date, range.max_date) {
                (Some(min), Some(max)) => {
                    let lo = binder.bind(date(min));
                    let hi = binder.bind(date(max));
                    conjuncts.push(format!("{column} BETWEEN {lo} AND {hi}"));
                }
                (Some(min), None) => {
                    let lo = binder.bind(date(min));
                    conjuncts.push(format!("{column} >= {lo}"));
                }
                (None, Some(max)) => {
                    let hi = binder.bind(date(max));
                    conjuncts.push(format!("{column} <= {hi}"));
                }
                (None, None) => {}
            }
        }

        for filter in filters {
            let field = &filter.field;
            match &filter.value {
                ResolvedValue::Equals(value) => {
                    let p = binder.bind(value.clone());
                    conjuncts.push(format!("{field} = {p}"));
                }
                ResolvedValue::In(values) => {
                    let list = values
                        .iter()
                        .map(|v| binder.bind(v.clone()))
                        .collect::<Vec<_>>()
                        .join(", ");
                    conjuncts.push(format!("{field} IN ({list})"));
                }
                ResolvedValue::Never => conjuncts.push(NEVER_PREDICATE.to_string()),
            }
        }

        let projection = if node.columns.is_empty() {
            "*".to_string()
        } else {
            node.columns.join(", ")
        };
        let mut sql = format!("SELECT {projection} FROM {}", self.catalog.table_for(node.kind));

        if !conjuncts.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conjuncts.join(" AND "));
        }
        if let Some(group_by) = &node.group_by {
            sql.push_str(&format!(" GROUP BY {group_by}"));
        }
        if !node.sort.is_empty() {
            let keys = node
                .sort
                .iter()
                .map(|s| format!("{} {}", s.field, s.order.as_sql()))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&format!(" ORDER BY {keys}"));
        }
        if let Some(limit) = node.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        Ok(CompiledQuery {
            sql,
            params: binder.params,
        })
    }
}

/// Collects parameters and hands out their placeholder markers.
struct Binder {
    style: PlaceholderStyle,
    params: Vec<SqlValue>,
}

impl Binder {
    fn new(style: PlaceholderStyle) -> Self {
        Self {
            style,
            params: Vec::new(),
        }
    }

    fn bind(&mut self, value: SqlValue) -> String {
        self.params.push(value);
        match self.style {
            PlaceholderStyle::Question => "?".to_string(),
            PlaceholderStyle::Dollar => format!("${}", self.params.len()),
        }
    }
}
