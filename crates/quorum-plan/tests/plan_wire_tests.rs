//! Planner JSON → validated plan.

use anyhow::Result;
use chrono::NaiveDate;
use proptest::prelude::*;
use quorum_plan::*;

const SUBJECT_THEN_SUMMARY: &str = r#"
{
  "query_plan": [
    {
      "id": 1,
      "kind": "SUBJECT",
      "columns": ["meeting_number"],
      "filters": [{"field": "name", "value": "Chapter 6"}]
    },
    {
      "id": 2,
      "kind": "SUMMARY",
      "columns": ["speaker", "summary"],
      "filters": [{"field": "meeting_number", "value": {"node": 1, "column": "meeting_number"}}],
      "sort": {"field": "speaker", "order": "ASC"},
      "depends_on": [1]
    }
  ]
}
"#;

#[test]
fn planner_json_parses_and_validates() -> Result<()> {
    let plan = Plan::from_json(SUBJECT_THEN_SUMMARY)?;
    assert_eq!(plan.len(), 2);

    let summary = plan.node(2).expect("node 2");
    assert_eq!(summary.kind, QueryKind::Summary);
    assert_eq!(
        summary.references().collect::<Vec<_>>(),
        vec![&Reference::new(1, "meeting_number")]
    );

    let validated = plan.validate(&SchemaCatalog::committee())?;
    assert_eq!(validated.nodes()[0].id, 1);
    Ok(())
}

#[test]
fn date_range_parses_iso_dates() -> Result<()> {
    let plan = Plan::from_json(
        r#"{"query_plan": [{"id": 1, "kind": "MEETING", "columns": ["number"],
            "date_range": {"min_date": "2023-01-01", "max_date": "2023-12-31"}}]}"#,
    )?;
    let range = plan.nodes()[0].date_range.expect("date range");
    assert_eq!(range.min_date, NaiveDate::from_ymd_opt(2023, 1, 1));
    assert_eq!(range.max_date, NaiveDate::from_ymd_opt(2023, 12, 31));
    Ok(())
}

#[test]
fn malformed_dates_are_parse_errors() {
    let err = Plan::from_json(
        r#"{"query_plan": [{"id": 1, "kind": "MEETING", "date_range": {"min_date": "20/02/2023"}}]}"#,
    )
    .unwrap_err();
    assert!(matches!(err, PlanError::Parse(_)));
}

#[test]
fn unknown_top_level_keys_are_rejected() {
    let err = Plan::from_json(r#"{"query_plan": [], "explanation": "because"}"#).unwrap_err();
    assert!(matches!(err, PlanError::Parse(msg) if msg.contains("explanation")));
}

#[test]
fn empty_plan_fails_validation() -> Result<()> {
    let plan = Plan::from_json(r#"{"query_plan": []}"#)?;
    assert_eq!(
        plan.validate(&SchemaCatalog::committee()),
        Err(PlanError::Invalid(InvalidPlan::EmptyPlan))
    );
    Ok(())
}

#[test]
fn date_range_on_summary_is_rejected() {
    let plan = Plan::new(vec![PlanNode::new(1, QueryKind::Summary).date_range(DateRange::since(
        NaiveDate::from_ymd_opt(2023, 1, 1).expect("date"),
    ))]);
    assert_eq!(
        plan.validate(&SchemaCatalog::committee()),
        Err(PlanError::Invalid(InvalidPlan::DateRangeOnNonMeeting {
            node: 1,
            kind: QueryKind::Summary,
        }))
    );
}

#[test]
fn duplicate_ids_are_rejected() {
    let plan = Plan::new(vec![
        PlanNode::new(4, QueryKind::Meeting),
        PlanNode::new(4, QueryKind::Subject),
    ]);
    assert_eq!(
        plan.validate(&SchemaCatalog::committee()),
        Err(PlanError::Invalid(InvalidPlan::DuplicateNodeId(4)))
    );
}

#[test]
fn plan_json_survives_serialization() -> Result<()> {
    let plan = Plan::from_json(SUBJECT_THEN_SUMMARY)?;
    let again = Plan::from_json(&plan.to_json()?)?;
    assert_eq!(plan, again);
    Ok(())
}

// ============================================================================
// Ordering properties
// ============================================================================

fn chain(ids: &[NodeId]) -> Vec<PlanNode> {
    ids.iter()
        .enumerate()
        .map(|(i, &id)| {
            let node = PlanNode::new(id, QueryKind::Meeting).columns(["number"]);
            if i == 0 {
                node
            } else {
                node.depends_on(ids[i - 1])
                    .filter("number", Reference::new(ids[i - 1], "number"))
            }
        })
        .collect()
}

proptest! {
    #[test]
    fn chained_plans_validate_in_order(ids in prop::collection::btree_set(0u32..1000, 1..8)) {
        let ids: Vec<NodeId> = ids.into_iter().collect();
        let plan = Plan::new(chain(&ids));
        prop_assert!(plan.validate(&SchemaCatalog::committee()).is_ok());
    }

    #[test]
    fn reversed_chains_are_rejected(ids in prop::collection::btree_set(0u32..1000, 2..8)) {
        let ids: Vec<NodeId> = ids.into_iter().collect();
        let mut nodes = chain(&ids);
        nodes.reverse();
        let err = Plan::new(nodes).validate(&SchemaCatalog::committee()).unwrap_err();
        let is_forward = matches!(err, PlanError::Invalid(InvalidPlan::ForwardDependency { .. }));
        prop_assert!(is_forward);
    }
}
