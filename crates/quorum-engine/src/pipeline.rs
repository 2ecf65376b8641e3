//! Question answering: plan, execute, render, answer.
//!
//! ```text
//!   question ──► Planner ──► Plan ──► validate ──► PlanExecutor ──► Execution
//!                                                                      │
//!                          Answer::NoResults ◄── any node empty? ──────┤
//!                                                                      ▼
//!   Answer::Answered ◄── AnswerGenerator ◄── answer prompt ◄── render_context
//! ```

use async_trait::async_trait;
use quorum_plan::{Plan, SchemaCatalog};
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::error::{LlmError, PipelineError};
use crate::execute::{PlanExecutor, PlanOutcome};
use crate::format::{answer_prompt, no_results_message, render_context};
use crate::store::SqlStore;

/// Turns a question into a plan. Implementations see the catalog so they can
/// describe the schema to whatever produces the plan.
#[async_trait]
pub trait Planner: Send + Sync {
    async fn plan(&self, question: &str, catalog: &SchemaCatalog) -> Result<Plan, LlmError>;
}

/// Turns an answer prompt into prose.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn answer(&self, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Answered {
        text: String,
        /// The rendered results the answer was generated from.
        context: String,
    },
    /// Some node matched nothing; no answer was generated.
    NoResults { message: String },
}

impl Answer {
    pub fn text(&self) -> &str {
        match self {
            Answer::Answered { text, .. } => text,
            Answer::NoResults { message } => message,
        }
    }
}

pub struct Pipeline<P, S, A> {
    planner: P,
    store: S,
    answerer: A,
    catalog: SchemaCatalog,
    config: EngineConfig,
}

impl<P: Planner, S: SqlStore, A: AnswerGenerator> Pipeline<P, S, A> {
    pub fn new(planner: P, store: S, answerer: A) -> Self {
        Self {
            planner,
            store,
            answerer,
            catalog: SchemaCatalog::committee(),
            config: EngineConfig::default(),
        }
    }

    pub fn with_catalog(mut self, catalog: SchemaCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn answerer(&self) -> &A {
        &self.answerer
    }

    /// Answer `question`.
    ///
    /// Plan execution calls the store synchronously on the current task. Use a
    /// store whose calls are short (in-process SQLite, a pooled client), or
    /// drive `ask` from a blocking-capable context such as
    /// `tokio::task::spawn_blocking` with a runtime handle.
    pub async fn ask(&self, question: &str) -> Result<Answer, PipelineError> {
        let plan = self
            .planner
            .plan(question, &self.catalog)
            .await
            .map_err(PipelineError::Planner)?;
        let plan = plan
            .validate(&self.catalog)
            .map_err(|err| PipelineError::Planner(LlmError::Plan(err)))?;
        info!(nodes = plan.nodes().len(), "plan accepted");

        let execution = PlanExecutor::new(&self.catalog, &self.store)
            .with_placeholder(self.config.placeholder)
            .execute(&plan)?;

        if let PlanOutcome::Unanswerable { empty_nodes } = execution.outcome() {
            warn!(?empty_nodes, question, "no results");
            return Ok(Answer::NoResults {
                message: no_results_message(&self.config, question),
            });
        }

        let context = render_context(&self.config, &plan, &execution.results)?;
        let prompt = answer_prompt(&self.config, &context, question);
        let text = self
            .answerer
            .answer(&prompt)
            .await
            .map_err(PipelineError::Answer)?;
        Ok(Answer::Answered { text, context })
    }
}
