//! Tool registry.
//!
//! Tracks every tool the agent may call: its name, description, and
//! JSON-Schema for its arguments, plus an async handler.  Every tool in
//! this crate takes a single string `input` argument and produces a
//! tagged [`ToolOutcome`]; the conversion to the plain string the model
//! sees happens once, in [`ToolOutcome::into_agent_text`].

pub mod builtins;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::ToolsConfig;

// ── Tool metadata ───────────────────────────────────────────

/// Metadata describing a tool available to the agent.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolMeta {
    /// Short machine-friendly name (e.g. `"calculator"`).
    pub name: String,
    /// Human-readable one-liner describing what the tool does.
    pub description: String,
    /// JSON Schema object describing the expected arguments.
    pub args_schema: Value,
}

impl ToolMeta {
    /// Metadata for a tool taking one free-form string `input`.
    pub fn string_input(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            args_schema: json!({
                "type": "object",
                "properties": {
                    "input": { "type": "string" }
                },
                "required": ["input"],
                "additionalProperties": false
            }),
        }
    }
}

// ── Outcomes ────────────────────────────────────────────────

/// Failure of a single tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    #[error("could not evaluate {expression:?}: {reason}")]
    Evaluation { expression: String, reason: String },

    #[error("job search failed: {0}")]
    JobSearch(String),

    #[error("web search failed: {0}")]
    WebSearch(String),

    #[error("unknown tool: {0}")]
    UnknownTool(String),
}

impl ToolError {
    /// Text handed to the model in place of a result.
    pub fn apology(&self) -> String {
        match self {
            ToolError::Evaluation { .. } => "Sorry, I could not perform the calculation.".into(),
            ToolError::JobSearch(_) => "Sorry, I could not find a job.".into(),
            ToolError::WebSearch(_) => "Sorry, I could not search the web.".into(),
            ToolError::UnknownTool(name) => format!("Error: unknown tool '{name}'"),
        }
    }
}

/// Result of a tool invocation before it is flattened to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    Success(String),
    Failure(ToolError),
}

impl From<Result<String, ToolError>> for ToolOutcome {
    fn from(r: Result<String, ToolError>) -> Self {
        match r {
            Ok(text) => ToolOutcome::Success(text),
            Err(e) => ToolOutcome::Failure(e),
        }
    }
}

impl ToolOutcome {
    /// Flatten to the string the agent sees.  Failures are logged here and
    /// replaced by their apology text.
    pub fn into_agent_text(self, tool: &str) -> String {
        match self {
            ToolOutcome::Success(text) => text,
            ToolOutcome::Failure(err) => {
                warn!(tool, error = %err, "tool call failed");
                err.apology()
            }
        }
    }
}

// ── Registry ────────────────────────────────────────────────

/// Async handler a tool registers for dispatch.
pub type ToolHandler =
    Arc<dyn Fn(String) -> Pin<Box<dyn Future<Output = ToolOutcome> + Send>> + Send + Sync>;

struct ToolEntry {
    meta: ToolMeta,
    handler: ToolHandler,
}

/// Ordered set of callable tools.
#[derive(Default)]
pub struct ToolRegistry {
    entries: Vec<ToolEntry>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the calculator, job search and web search tools.
    pub fn with_builtins(cfg: &ToolsConfig, client: reqwest::Client) -> Self {
        let mut reg = Self::new();
        builtins::calculator::register(&mut reg);
        builtins::job_search::register(&mut reg, client.clone(), cfg.job_search_base_url.clone());
        builtins::web_search::register(&mut reg, client, cfg.web_search.clone());
        reg
    }

    /// Register a tool.  Duplicate names are ignored (first-registration wins).
    pub fn register(&mut self, meta: ToolMeta, handler: ToolHandler) {
        if self.entries.iter().any(|e| e.meta.name == meta.name) {
            debug!(tool = %meta.name, "duplicate tool registration ignored");
            return;
        }
        self.entries.push(ToolEntry { meta, handler });
    }

    pub fn list(&self) -> Vec<ToolMeta> {
        self.entries.iter().map(|e| e.meta.clone()).collect()
    }

    /// OpenAI `tools` array for every registered tool.
    pub fn function_defs(&self) -> Vec<Value> {
        self.entries
            .iter()
            .map(|e| {
                json!({
                    "type": "function",
                    "function": {
                        "name": e.meta.name,
                        "description": e.meta.description,
                        "parameters": e.meta.args_schema,
                    }
                })
            })
            .collect()
    }

    /// Invoke `name` with the raw JSON argument string from the model.
    pub async fn call(&self, name: &str, arguments: &str) -> ToolOutcome {
        let Some(entry) = self.entries.iter().find(|e| e.meta.name == name) else {
            return ToolOutcome::Failure(ToolError::UnknownTool(name.to_string()));
        };
        let input = extract_input(arguments);
        debug!(tool = name, input = %crate::utils::truncate_str(&input, 200), "calling tool");
        (entry.handler)(input).await
    }
}

/// Pull the `input` string out of the model's arguments.
///
/// Models occasionally send the bare string, or an object whose `input`
/// is itself an object; both are tolerated.
fn extract_input(arguments: &str) -> String {
    match serde_json::from_str::<Value>(arguments) {
        Ok(Value::Object(map)) => match map.get("input") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => Value::Object(map).to_string(),
        },
        Ok(Value::String(s)) => s,
        _ => arguments.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_handler() -> ToolHandler {
        Arc::new(|input: String| {
            Box::pin(async move { ToolOutcome::Success(format!("echo:{input}")) })
        })
    }

    #[test]
    fn apology_texts() {
        let eval = ToolError::Evaluation {
            expression: "x".into(),
            reason: "bad".into(),
        };
        assert_eq!(eval.apology(), "Sorry, I could not perform the calculation.");
        assert_eq!(
            ToolError::JobSearch("500".into()).apology(),
            "Sorry, I could not find a job."
        );
    }

    #[test]
    fn failure_flattens_to_apology() {
        let outcome = ToolOutcome::Failure(ToolError::JobSearch("timeout".into()));
        assert_eq!(outcome.into_agent_text("jobSearch"), "Sorry, I could not find a job.");
        let ok = ToolOutcome::Success("42".into());
        assert_eq!(ok.into_agent_text("calculator"), "42");
    }

    #[test]
    fn extract_input_variants() {
        assert_eq!(extract_input(r#"{"input":"2+2"}"#), "2+2");
        assert_eq!(extract_input(r#""3*3""#), "3*3");
        assert_eq!(extract_input("1+1"), "1+1");
        assert_eq!(
            extract_input(r#"{"input":{"tag":"rust"}}"#),
            r#"{"tag":"rust"}"#
        );
        assert_eq!(extract_input(r#"{"tag":"go"}"#), r#"{"tag":"go"}"#);
    }

    #[tokio::test]
    async fn registry_dispatches_and_dedupes() {
        let mut reg = ToolRegistry::new();
        reg.register(ToolMeta::string_input("echo", "Echo input."), echo_handler());
        reg.register(ToolMeta::string_input("echo", "Shadow."), echo_handler());
        assert_eq!(reg.list().len(), 1);
        assert_eq!(reg.list()[0].description, "Echo input.");

        let out = reg.call("echo", r#"{"input":"hi"}"#).await;
        assert_eq!(out, ToolOutcome::Success("echo:hi".into()));
    }

    #[tokio::test]
    async fn unknown_tool_is_a_failure() {
        let reg = ToolRegistry::new();
        let out = reg.call("nope", "{}").await;
        assert_eq!(out, ToolOutcome::Failure(ToolError::UnknownTool("nope".into())));
    }

    #[test]
    fn function_defs_shape() {
        let mut reg = ToolRegistry::new();
        reg.register(ToolMeta::string_input("echo", "Echo input."), echo_handler());
        let defs = reg.function_defs();
        assert_eq!(defs[0]["type"], "function");
        assert_eq!(defs[0]["function"]["name"], "echo");
        assert_eq!(
            defs[0]["function"]["parameters"]["required"],
            json!(["input"])
        );
    }
}
