//! Rendering of a completed result table for the answer generator.
//!
//! Both renderers walk the plan in node order and read each node's own
//! column names, so the same plan and result table always render to the same
//! bytes.

use serde::Serialize;
use serde_json::{Map, Value};

use quorum_plan::ValidatedPlan;

use crate::config::{ContextFormat, EngineConfig};
use crate::results::ResultTable;

/// One line per projected column: `<kind> <column>s: v1,v2,...`.
pub fn format_results(plan: &ValidatedPlan, results: &ResultTable) -> String {
    let mut lines = Vec::new();
    for node in plan.nodes() {
        let Some(result) = results.get(node.id) else {
            continue;
        };
        for (index, column) in result.columns.iter().enumerate() {
            let values = result
                .column_values(index)
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            lines.push(format!("{} {column}s: {values}", node.kind.label()));
        }
    }
    lines.join("\n")
}

/// `{kind: [{column: value}, ...]}` with sorted keys, indented by four spaces.
///
/// Nodes of the same kind share one array, in plan order.
pub fn format_results_json(
    plan: &ValidatedPlan,
    results: &ResultTable,
) -> Result<String, serde_json::Error> {
    let mut dump: Map<String, Value> = Map::new();
    for node in plan.nodes() {
        let Some(result) = results.get(node.id) else {
            continue;
        };
        let entry = dump
            .entry(node.kind.label().to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(items) = entry {
            for row in &result.rows {
                for (column, value) in result.columns.iter().zip(row) {
                    let mut item = Map::new();
                    item.insert(column.clone(), serde_json::to_value(value)?);
                    items.push(Value::Object(item));
                }
            }
        }
    }

    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    Value::Object(dump).serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Render the results in the configured format.
pub fn render_context(
    config: &EngineConfig,
    plan: &ValidatedPlan,
    results: &ResultTable,
) -> Result<String, serde_json::Error> {
    match config.context_format {
        ContextFormat::Text => Ok(format_results(plan, results)),
        ContextFormat::Json => format_results_json(plan, results),
    }
}

/// Substitute `{name}` markers in one pass.
///
/// Substituted text is never rescanned, so a question containing `{results}`
/// stays verbatim. Unknown markers are left as written.
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let replaced = tail.find('}').and_then(|close| {
            let name = &tail[1..close];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match replaced {
            Some((value, close)) => {
                out.push_str(value);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// The answer-generation prompt for `question` over `context`.
pub fn answer_prompt(config: &EngineConfig, context: &str, question: &str) -> String {
    render_template(config.template(), &[("results", context), ("question", question)])
}

/// The unanswerable-plan message for `question`.
pub fn no_results_message(config: &EngineConfig, question: &str) -> String {
    render_template(&config.no_results_message, &[("question", question)])
}
