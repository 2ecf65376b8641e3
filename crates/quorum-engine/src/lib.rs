//! Quorum engine: runs validated plans against a relational store.
//!
//! ```text
//!   ValidatedPlan ──► PlanExecutor ──┬─► resolve (ResultTable so far)
//!                                    ├─► SqlCompiler (statement + params)
//!                                    └─► SqlStore::execute ──► ResultTable
//!                                                                 │
//!                                           format_results ◄──────┘
//! ```
//!
//! Values never enter statement text; every literal and resolved reference
//! is a bound parameter. The [`Pipeline`] wires a [`Planner`] and an
//! [`AnswerGenerator`] around the executor.

pub mod compile;
pub mod config;
pub mod error;
pub mod execute;
pub mod format;
pub mod llm;
pub mod pipeline;
pub mod resolve;
pub mod results;
pub mod store;
pub mod trace;
pub mod value;

pub use compile::{CompiledQuery, SqlCompiler, NEVER_PREDICATE};
pub use config::{ContextFormat, EngineConfig, PlaceholderStyle};
pub use error::{ExecError, FailureKind, LlmError, PipelineError, StoreError};
pub use execute::{Execution, PlanExecutor, PlanOutcome};
pub use format::{answer_prompt, format_results, format_results_json, render_context};
pub use llm::{CompletionRequest, CompletionResponse, LlmAnswerer, LlmPlanner, LlmProvider, Message, Role};
pub use pipeline::{Answer, AnswerGenerator, Pipeline, Planner};
pub use resolve::{resolve_filters, ResolvedFilter, ResolvedValue};
pub use results::{NodeResult, ResultTable};
pub use store::{MeetingRecord, SqlStore, SqliteStore, SubjectRecord, SummaryRecord};
pub use trace::{ExecutionTrace, NodeTrace};
pub use value::{Row, SqlValue};
