//! Planner-facing description of the plan wire form.
//!
//! Structured-output planners get two artifacts:
//! - a system prompt stating the planning rules over the catalog, and
//! - a JSON schema of the plan wire form.
//!
//! The schema is hand-written and conservative. It biases the planner toward
//! well-formed output; it is not what enforces correctness (that is serde with
//! `deny_unknown_fields` plus [`crate::Plan::validate`]).

use serde_json::json;

use crate::catalog::SchemaCatalog;

/// System prompt for a planner over `catalog`.
pub fn planner_prompt(catalog: &SchemaCatalog) -> String {
    let mut out = String::new();
    out.push_str(
        "You break a question about committee meetings into a small graph of dependent \
         queries whose results together answer it. Do not answer the question yourself.\n\n",
    );
    out.push_str("Record types and their tables:\n");
    out.push_str(&catalog.describe());
    out.push_str(
        "\nRules:\n\
         1. Every query has a `kind`: MEETING, SUMMARY or SUBJECT.\n\
         2. SUMMARY and SUBJECT rows point at a MEETING through `meeting_number`.\n\
         3. List the relevant output columns in `columns`, using only the columns above.\n\
         4. `filters` is a list of {\"field\": ..., \"value\": ...}; all filters must hold.\n\
         5. To filter on the result of an earlier query, use a reference value \
            {\"node\": <earlier id>, \"column\": <column it projects>} and list that id in `depends_on`.\n\
         6. MEETING queries may carry `date_range` with `min_date` and/or `max_date` (YYYY-MM-DD).\n\
         7. Sort with `sort`: {\"field\": ..., \"order\": \"ASC\"|\"DESC\"} or a list of those.\n\
         8. Use `limit` for \"last N\" / \"top N\" questions and `group_by` to group rows.\n\
         9. What a speaker said is found in SUMMARY via the `speaker` field; mentioned terms are in `summary`.\n\
         10. Merge queries against the same table into one query.\n\
         11. Ids are unique and a query may only depend on queries listed before it.\n",
    );
    out
}

/// JSON schema of the plan wire form.
pub fn plan_json_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["query_plan"],
        "properties": {
            "query_plan": {
                "type": "array",
                "minItems": 1,
                "items": { "$ref": "#/$defs/node" }
            }
        },
        "$defs": {
            "node": {
                "type": "object",
                "additionalProperties": false,
                "required": ["id", "kind"],
                "properties": {
                    "id": { "type": "integer", "minimum": 0 },
                    "kind": { "enum": ["MEETING", "SUMMARY", "SUBJECT"] },
                    "columns": { "type": "array", "items": { "type": "string" } },
                    "filters": { "type": "array", "items": { "$ref": "#/$defs/filter" } },
                    "sort": {
                        "oneOf": [
                            { "$ref": "#/$defs/sort" },
                            { "type": "array", "items": { "$ref": "#/$defs/sort" } }
                        ]
                    },
                    "group_by": { "type": "string" },
                    "limit": { "type": "integer", "minimum": 1 },
                    "date_range": {
                        "type": "object",
                        "additionalProperties": false,
                        "properties": {
                            "min_date": { "type": "string", "format": "date" },
                            "max_date": { "type": "string", "format": "date" }
                        }
                    },
                    "depends_on": {
                        "type": "array",
                        "items": { "type": "integer", "minimum": 0 },
                        "uniqueItems": true
                    }
                }
            },
            "filter": {
                "type": "object",
                "additionalProperties": false,
                "required": ["field", "value"],
                "properties": {
                    "field": { "type": "string" },
                    "value": {
                        "oneOf": [
                            { "type": "integer" },
                            { "type": "string" },
                            { "$ref": "#/$defs/reference" }
                        ]
                    }
                }
            },
            "reference": {
                "type": "object",
                "additionalProperties": false,
                "required": ["node", "column"],
                "properties": {
                    "node": { "type": "integer", "minimum": 0 },
                    "column": { "type": "string" }
                }
            },
            "sort": {
                "type": "object",
                "additionalProperties": false,
                "required": ["field", "order"],
                "properties": {
                    "field": { "type": "string" },
                    "order": { "enum": ["ASC", "DESC"] }
                }
            }
        }
    })
}
