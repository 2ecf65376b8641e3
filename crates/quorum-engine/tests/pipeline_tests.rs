//! Question → answer through fake collaborators and an in-memory store.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveTime;
use parking_lot::Mutex;
use quorum_engine::*;
use quorum_plan::{Plan, SchemaCatalog};

/// Always answers with the same plan JSON.
struct FixedPlanner(&'static str);

#[async_trait]
impl Planner for FixedPlanner {
    async fn plan(&self, _question: &str, _catalog: &SchemaCatalog) -> Result<Plan, LlmError> {
        Ok(Plan::from_json(self.0)?)
    }
}

/// Echoes the prompt back and remembers it.
#[derive(Default)]
struct EchoAnswerer {
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl AnswerGenerator for EchoAnswerer {
    async fn answer(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().push(prompt.to_string());
        Ok(format!("answer to: {prompt}"))
    }
}

struct FailingAnswerer;

#[async_trait]
impl AnswerGenerator for FailingAnswerer {
    async fn answer(&self, _prompt: &str) -> Result<String, LlmError> {
        Err(LlmError::Api("quota exceeded".into()))
    }
}

fn seeded_store() -> Result<SqliteStore> {
    let store = SqliteStore::in_memory()?;
    store.init_schema(&SchemaCatalog::committee())?;
    for (number, date) in [(1, "2023-01-10"), (2, "2023-02-14")] {
        store.insert_meeting(&MeetingRecord {
            number,
            date: date.parse()?,
            start_time: NaiveTime::from_hms_opt(9, 30, 0).expect("valid time"),
            end_time: NaiveTime::from_hms_opt(11, 0, 0).expect("valid time"),
            time_zone: "EST".into(),
        })?;
    }
    store.insert_subject(&SubjectRecord {
        name: "Chapter 6".into(),
        meeting_number: 2,
    })?;
    store.insert_summary(&SummaryRecord {
        id: Some(1),
        vector_id: Some(100),
        summary: "Reviewed the chapter 6 amendments.".into(),
        meeting_number: 2,
        speaker: Some("Chair".into()),
    })?;
    Ok(store)
}

const CHAPTER_SIX_SPEAKERS: &str = r#"{"query_plan": [
    {"id": 1, "kind": "SUBJECT", "columns": ["meeting_number"],
     "filters": [{"field": "name", "value": "Chapter 6"}]},
    {"id": 2, "kind": "SUMMARY", "columns": ["speaker"], "depends_on": [1],
     "filters": [{"field": "meeting_number", "value": {"node": 1, "column": "meeting_number"}}]}
]}"#;

#[tokio::test]
async fn answered_questions_carry_their_context() -> Result<()> {
    let pipeline = Pipeline::new(FixedPlanner(CHAPTER_SIX_SPEAKERS), seeded_store()?, EchoAnswerer::default());
    let answer = pipeline.ask("Who spoke about chapter 6?").await?;

    assert!(answer.text().starts_with("answer to: Given the following data:\n"));
    match &answer {
        Answer::Answered { context, text } => {
            assert_eq!(context, "subject meeting_numbers: 2\nsummary speakers: Chair");
            assert!(text.contains("Answer the following question in plain English: Who spoke about chapter 6?"));
        }
        other => panic!("expected an answer, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn empty_nodes_skip_answer_generation() -> Result<()> {
    let plan = r#"{"query_plan": [
        {"id": 1, "kind": "SUBJECT", "columns": ["meeting_number"],
         "filters": [{"field": "name", "value": "Chapter 9"}]},
        {"id": 2, "kind": "SUMMARY", "columns": ["speaker"], "depends_on": [1],
         "filters": [{"field": "meeting_number", "value": {"node": 1, "column": "meeting_number"}}]}
    ]}"#;
    let pipeline = Pipeline::new(FixedPlanner(plan), seeded_store()?, EchoAnswerer::default());
    let answer = pipeline.ask("Who spoke about chapter 9?").await?;

    assert_eq!(
        answer,
        Answer::NoResults {
            message: "No results found for the question: Who spoke about chapter 9?".into(),
        }
    );
    assert_eq!(answer.text(), "No results found for the question: Who spoke about chapter 9?");
    assert!(pipeline.answerer().prompts.lock().is_empty());

    let subjects = pipeline.store().execute("SELECT name FROM meeting_subjects", &[])?;
    assert_eq!(subjects, vec![vec![SqlValue::from("Chapter 6")]]);
    Ok(())
}

#[tokio::test]
async fn json_context_uses_the_json_template() -> Result<()> {
    let config = EngineConfig {
        context_format: ContextFormat::Json,
        ..EngineConfig::default()
    };
    let pipeline = Pipeline::new(FixedPlanner(CHAPTER_SIX_SPEAKERS), seeded_store()?, EchoAnswerer::default())
        .with_config(config);
    let answer = pipeline.ask("Who spoke?").await?;

    let Answer::Answered { context, text } = answer else {
        panic!("expected an answer");
    };
    let parsed: serde_json::Value = serde_json::from_str(&context)?;
    assert_eq!(parsed["summary"][0]["speaker"], "Chair");
    assert!(text.starts_with("answer to: Given the following json data:\n"));
    Ok(())
}

#[tokio::test]
async fn invalid_plans_are_bad_plans() -> Result<()> {
    let plan = r#"{"query_plan": [{"id": 1, "kind": "SUBJECT", "columns": ["speaker"]}]}"#;
    let pipeline = Pipeline::new(FixedPlanner(plan), seeded_store()?, EchoAnswerer::default());
    let err = pipeline.ask("?").await.unwrap_err();
    assert_eq!(err.failure_kind(), Some(FailureKind::BadPlan));
    Ok(())
}

#[tokio::test]
async fn references_need_declared_dependencies() -> Result<()> {
    let plan = r#"{"query_plan": [
        {"id": 1, "kind": "SUBJECT", "columns": ["meeting_number"]},
        {"id": 2, "kind": "SUMMARY", "columns": ["summary"],
         "filters": [{"field": "meeting_number", "value": {"node": 1, "column": "meeting_number"}}]}
    ]}"#;
    let pipeline = Pipeline::new(FixedPlanner(plan), seeded_store()?, EchoAnswerer::default());
    let err = pipeline.ask("?").await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Planner(LlmError::Plan(quorum_plan::PlanError::BrokenDependency { node: 2, target: 1 }))
    ));
    assert_eq!(err.failure_kind(), Some(FailureKind::BadPlan));
    assert!(pipeline.answerer().prompts.lock().is_empty());
    Ok(())
}

#[tokio::test]
async fn store_failures_are_bad_connections() -> Result<()> {
    // No schema: every statement fails in the store.
    let store = SqliteStore::in_memory()?;
    let pipeline = Pipeline::new(FixedPlanner(CHAPTER_SIX_SPEAKERS), store, EchoAnswerer::default());
    let err = pipeline.ask("?").await.unwrap_err();
    assert!(matches!(err, PipelineError::Exec(ExecError::Store { node: 1, .. })));
    assert_eq!(err.failure_kind(), Some(FailureKind::BadConnection));
    Ok(())
}

#[tokio::test]
async fn answer_failures_surface_as_answer_errors() -> Result<()> {
    let pipeline = Pipeline::new(FixedPlanner(CHAPTER_SIX_SPEAKERS), seeded_store()?, FailingAnswerer);
    let err = pipeline.ask("Who spoke?").await.unwrap_err();
    assert!(matches!(err, PipelineError::Answer(LlmError::Api(_))));
    assert_eq!(err.failure_kind(), None);
    Ok(())
}
