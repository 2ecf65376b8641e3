use serde::{Deserialize, Serialize};

/// Marker used for bound parameters in compiled statements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderStyle {
    /// `?` for every parameter (SQLite, MySQL).
    #[default]
    Question,
    /// `$1, $2, ...` (PostgreSQL).
    Dollar,
}

/// How the result table is rendered for the answer generator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextFormat {
    #[default]
    Text,
    Json,
}

pub const DEFAULT_ANSWER_TEMPLATE: &str =
    "Given the following data:\n{results}\nAnswer the following question in plain English: {question}";

pub const DEFAULT_JSON_ANSWER_TEMPLATE: &str =
    "Given the following json data:\n{results}\nAnswer the following question in plain English: {question}";

pub const DEFAULT_NO_RESULTS_MESSAGE: &str = "No results found for the question: {question}";

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub placeholder: PlaceholderStyle,
    pub context_format: ContextFormat,
    /// Prompt for text context; `{results}` and `{question}` are substituted.
    pub answer_template: String,
    /// Prompt for JSON context.
    pub json_answer_template: String,
    /// Returned instead of an answer when the plan is unanswerable.
    pub no_results_message: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            placeholder: PlaceholderStyle::Question,
            context_format: ContextFormat::Text,
            answer_template: DEFAULT_ANSWER_TEMPLATE.to_string(),
            json_answer_template: DEFAULT_JSON_ANSWER_TEMPLATE.to_string(),
            no_results_message: DEFAULT_NO_RESULTS_MESSAGE.to_string(),
        }
    }
}

impl EngineConfig {
    /// The template matching `context_format`.
    pub fn template(&self) -> &str {
        match self.context_format {
            ContextFormat::Text => &self.answer_template,
            ContextFormat::Json => &self.json_answer_template,
        }
    }
}
