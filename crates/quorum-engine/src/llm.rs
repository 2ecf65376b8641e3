//! Language-model backed planner and answer generator.
//!
//! [`LlmProvider`] is the seam to a concrete API client; the engine ships no
//! client of its own. [`LlmPlanner`] asks for a plan in the JSON wire form
//! and [`LlmAnswerer`] turns an answer prompt into prose.

use async_trait::async_trait;
use quorum_plan::{plan_json_schema, planner_prompt, Plan, SchemaCatalog};
use tracing::debug;

use crate::error::LlmError;
use crate::pipeline::{AnswerGenerator, Planner};

// ============================================================================
// Provider interface
// ============================================================================

#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
    /// Structured-output schema, for providers that support it.
    pub json_schema: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResponse {
    pub content: String,
}

// ============================================================================
// Planner
// ============================================================================

const PLANNER_MAX_TOKENS: usize = 1000;

pub struct LlmPlanner<P> {
    provider: P,
}

impl<P: LlmProvider> LlmPlanner<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn request(question: &str, catalog: &SchemaCatalog) -> CompletionRequest {
        CompletionRequest {
            messages: vec![
                Message::system(planner_prompt(catalog)),
                Message::user(format!("Consider: {question}\n Generate the correct query plan.")),
            ],
            max_tokens: Some(PLANNER_MAX_TOKENS),
            temperature: Some(0.0),
            json_schema: Some(plan_json_schema()),
        }
    }
}

#[async_trait]
impl<P: LlmProvider> Planner for LlmPlanner<P> {
    async fn plan(&self, question: &str, catalog: &SchemaCatalog) -> Result<Plan, LlmError> {
        let response = self.provider.complete(Self::request(question, catalog)).await?;
        let body = strip_code_fence(&response.content);
        debug!(bytes = body.len(), "planner responded");
        if body.is_empty() {
            return Err(LlmError::InvalidResponse("empty plan response".to_string()));
        }
        Ok(Plan::from_json(body)?)
    }
}

/// Strip a surrounding Markdown code fence (```json ... ```), if any.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    // Drop the info string ("json") on the opening line.
    match inner.find('\n') {
        Some(newline) if !inner[..newline].contains('{') => inner[newline + 1..].trim(),
        _ => inner.trim(),
    }
}

// ============================================================================
// Answer generation
// ============================================================================

pub struct LlmAnswerer<P> {
    provider: P,
    max_tokens: Option<usize>,
}

impl<P: LlmProvider> LlmAnswerer<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            max_tokens: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

#[async_trait]
impl<P: LlmProvider> AnswerGenerator for LlmAnswerer<P> {
    async fn answer(&self, prompt: &str) -> Result<String, LlmError> {
        let request = CompletionRequest {
            messages: vec![Message::user(prompt)],
            max_tokens: self.max_tokens,
            temperature: None,
            json_schema: None,
        };
        Ok(self.provider.complete(request).await?.content)
    }
}
