//! Plan node model.
//!
//! The wire form is what a structured-output planner emits; every struct
//! rejects unknown keys so a misspelled parameter fails loudly instead of
//! being ignored.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::num::NonZeroU32;

/// Identity of a node inside one plan.
pub type NodeId = u32;

// ============================================================================
// Query kinds
// ============================================================================

/// The three logical record types a node can query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueryKind {
    #[serde(alias = "MEETINGS", alias = "meeting")]
    Meeting,
    #[serde(alias = "SUMMARIES", alias = "summary")]
    Summary,
    #[serde(alias = "SUBJECTS", alias = "subject")]
    Subject,
}

impl QueryKind {
    pub const ALL: [QueryKind; 3] = [QueryKind::Meeting, QueryKind::Summary, QueryKind::Subject];

    pub fn as_str(self) -> &'static str {
        match self {
            QueryKind::Meeting => "MEETING",
            QueryKind::Summary => "SUMMARY",
            QueryKind::Subject => "SUBJECT",
        }
    }

    /// Lowercase label used when rendering results.
    pub fn label(self) -> &'static str {
        match self {
            QueryKind::Meeting => "meeting",
            QueryKind::Summary => "summary",
            QueryKind::Subject => "subject",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            QueryKind::Meeting => 0,
            QueryKind::Summary => 1,
            QueryKind::Subject => 2,
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Filters
// ============================================================================

/// A literal filter value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Integer(i64),
    Text(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(n) => write!(f, "{n}"),
            Literal::Text(s) => f.write_str(s),
        }
    }
}

/// Pointer into an earlier node's result rows: "the values of `column`
/// produced by node `node`".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Reference {
    #[serde(alias = "source", alias = "sourceNodeId")]
    pub node: NodeId,
    pub column: String,
}

impl Reference {
    pub fn new(node: NodeId, column: impl Into<String>) -> Self {
        Self {
            node,
            column: column.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Literal(Literal),
    Reference(Reference),
}

impl FilterValue {
    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            FilterValue::Reference(r) => Some(r),
            FilterValue::Literal(_) => None,
        }
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Literal(Literal::Integer(value))
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Literal(Literal::Text(value.to_string()))
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Literal(Literal::Text(value))
    }
}

impl From<Reference> for FilterValue {
    fn from(value: Reference) -> Self {
        FilterValue::Reference(value)
    }
}

/// One conjunct of a node's `WHERE` clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterClause {
    pub field: String,
    pub value: FilterValue,
}

impl FilterClause {
    pub fn new(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

// ============================================================================
// Sorting and ranges
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    #[serde(alias = "asc")]
    Asc,
    #[serde(alias = "desc")]
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SortClause {
    pub field: String,
    pub order: SortOrder,
}

/// Inclusive bounds on the meeting date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DateRange {
    #[serde(default, alias = "minDate", skip_serializing_if = "Option::is_none")]
    pub min_date: Option<NaiveDate>,
    #[serde(default, alias = "maxDate", skip_serializing_if = "Option::is_none")]
    pub max_date: Option<NaiveDate>,
}

impl DateRange {
    pub fn between(min: NaiveDate, max: NaiveDate) -> Self {
        Self {
            min_date: Some(min),
            max_date: Some(max),
        }
    }

    pub fn since(min: NaiveDate) -> Self {
        Self {
            min_date: Some(min),
            max_date: None,
        }
    }

    pub fn until(max: NaiveDate) -> Self {
        Self {
            min_date: None,
            max_date: Some(max),
        }
    }

    pub fn is_inverted(&self) -> bool {
        matches!((self.min_date, self.max_date), (Some(min), Some(max)) if min > max)
    }
}

// ============================================================================
// Plan nodes
// ============================================================================

/// One typed, parameterized query unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanNode {
    pub id: NodeId,
    #[serde(alias = "query_type")]
    pub kind: QueryKind,
    /// Projection; empty selects every column of the kind's table.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
    #[serde(default, alias = "filter", skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<FilterClause>,
    #[serde(
        default,
        deserialize_with = "one_or_many_sort",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub sort: Vec<SortClause>,
    #[serde(default, alias = "groupBy", skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<NonZeroU32>,
    #[serde(
        default,
        alias = "daterange",
        alias = "dateRange",
        skip_serializing_if = "Option::is_none"
    )]
    pub date_range: Option<DateRange>,
    #[serde(
        default,
        alias = "dependencies",
        alias = "dependsOn",
        skip_serializing_if = "BTreeSet::is_empty"
    )]
    pub depends_on: BTreeSet<NodeId>,
}

impl PlanNode {
    pub fn new(id: NodeId, kind: QueryKind) -> Self {
        Self {
            id,
            kind,
            columns: Vec::new(),
            filters: Vec::new(),
            sort: Vec::new(),
            group_by: None,
            limit: None,
            date_range: None,
            depends_on: BTreeSet::new(),
        }
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.filters.push(FilterClause::new(field, value));
        self
    }

    pub fn sort_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort.push(SortClause {
            field: field.into(),
            order,
        });
        self
    }

    pub fn group_by(mut self, field: impl Into<String>) -> Self {
        self.group_by = Some(field.into());
        self
    }

    /// Sets the row limit; zero clears it.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = NonZeroU32::new(limit);
        self
    }

    pub fn date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn depends_on(mut self, id: NodeId) -> Self {
        self.depends_on.insert(id);
        self
    }

    pub fn references(&self) -> impl Iterator<Item = &Reference> {
        self.filters.iter().filter_map(|f| f.value.as_reference())
    }
}

/// `sort` may be given as one clause or a list of clauses.
fn one_or_many_sort<'de, D>(deserializer: D) -> Result<Vec<SortClause>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(SortClause),
        Many(Vec<SortClause>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(clause)) => vec![clause],
        Some(OneOrMany::Many(clauses)) => clauses,
    })
}
