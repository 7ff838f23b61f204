//! Model provider abstractions.
//!
//! Defines the [`ModelProvider`] trait, the [`ChatMessage`] type and the
//! OpenAI-compatible implementation ([`OpenAIProvider`]).

pub mod openai;

use async_trait::async_trait;

pub use openai::OpenAIProvider;

// ---------------------------------------------------------------------------
// ChatMessage – shared message representation
// ---------------------------------------------------------------------------

/// A single chat message with a role and content.
///
/// Optionally carries OpenAI tool-calling metadata so that
/// `tool` role messages and assistant `tool_calls` responses
/// are serialised correctly for the API.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    /// For assistant messages that invoke tools: the raw
    /// OpenAI-format `tool_calls` array.
    pub tool_calls: Option<Vec<serde_json::Value>>,
    /// For `role: "tool"` messages: the id of the tool call
    /// this result corresponds to.
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    /// Plain message (no tool metadata).
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Assistant message that requested `calls`.
    pub fn assistant_tool_calls(calls: &[ToolCall]) -> Self {
        Self {
            role: "assistant".into(),
            content: String::new(),
            tool_calls: Some(calls.iter().map(ToolCall::to_api).collect()),
            tool_call_id: None,
        }
    }

    /// Result of one tool call.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: "tool".into(),
            content: content.into(),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// Serialise a slice of [`ChatMessage`]s into the OpenAI-compatible
/// JSON array format, including `tool_calls` and `tool_call_id` when
/// present.
pub fn serialize_messages(messages: &[ChatMessage]) -> Vec<serde_json::Value> {
    messages
        .iter()
        .map(|m| {
            let mut msg = serde_json::json!({ "role": m.role });
            if let Some(ref tcs) = m.tool_calls {
                msg["tool_calls"] = serde_json::json!(tcs);
                // content must be null on assistant messages carrying tool_calls
                if m.content.is_empty() {
                    msg["content"] = serde_json::Value::Null;
                } else {
                    msg["content"] = serde_json::json!(m.content);
                }
            } else {
                msg["content"] = serde_json::json!(m.content);
            }
            if let Some(ref tcid) = m.tool_call_id {
                msg["tool_call_id"] = serde_json::json!(tcid);
            }
            msg
        })
        .collect()
}

// ---------------------------------------------------------------------------
// ProviderResponse – function-calling aware response
// ---------------------------------------------------------------------------

/// A single tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    /// Tool call id (from the API).
    pub id: String,
    pub name: String,
    /// Raw JSON argument string.
    pub arguments: String,
}

impl ToolCall {
    fn to_api(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "type": "function",
            "function": { "name": self.name, "arguments": self.arguments },
        })
    }
}

/// Response from a model that may be a final text reply or tool calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderResponse {
    /// Plain text reply from the model.
    Final(String),
    /// The model wants to invoke one or more tools, in order.
    ToolCalls(Vec<ToolCall>),
}

/// Parse `tool_calls` from an OpenAI-style chat completion response.
///
/// Returns `None` when the first choice carries no usable tool call.
pub fn parse_tool_calls(json: &serde_json::Value) -> Option<ProviderResponse> {
    let message = json.get("choices")?.get(0)?.get("message")?;
    let tool_calls = message.get("tool_calls")?.as_array()?;

    let items: Vec<ToolCall> = tool_calls
        .iter()
        .enumerate()
        .filter_map(|(i, tc)| {
            let func = tc.get("function")?;
            let name = func.get("name")?.as_str()?.to_string();
            let arguments = func
                .get("arguments")
                .and_then(|a| a.as_str())
                .unwrap_or("{}")
                .to_string();
            let id = tc
                .get("id")
                .and_then(|i| i.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| format!("call_{i}"));
            Some(ToolCall { id, name, arguments })
        })
        .collect();

    if items.is_empty() {
        None
    } else {
        Some(ProviderResponse::ToolCalls(items))
    }
}

// ---------------------------------------------------------------------------
// ModelProvider trait
// ---------------------------------------------------------------------------

/// Trait implemented by every LLM backend.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Send chat messages with an array of OpenAI `tools` definitions and
    /// return either the final reply or the requested tool calls.
    async fn send_chat_with_tools(
        &self,
        messages: &[ChatMessage],
        tools: &[serde_json::Value],
    ) -> Result<ProviderResponse, anyhow::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serialize_tool_round() {
        let calls = vec![ToolCall {
            id: "call_1".into(),
            name: "calculator".into(),
            arguments: r#"{"input":"2+2"}"#.into(),
        }];
        let msgs = vec![
            ChatMessage::new("user", "what is 2+2"),
            ChatMessage::assistant_tool_calls(&calls),
            ChatMessage::tool_result("call_1", "The result of 2+2 is 4"),
        ];
        let out = serialize_messages(&msgs);
        assert_eq!(out[0], json!({"role": "user", "content": "what is 2+2"}));
        assert!(out[1]["content"].is_null());
        assert_eq!(out[1]["tool_calls"][0]["function"]["name"], "calculator");
        assert_eq!(out[2]["tool_call_id"], "call_1");
        assert_eq!(out[2]["role"], "tool");
    }

    #[test]
    fn parse_multiple_tool_calls() {
        let resp = json!({
            "choices": [{ "message": { "content": null, "tool_calls": [
                { "id": "a", "type": "function",
                  "function": { "name": "calculator", "arguments": "{\"input\":\"1+1\"}" } },
                { "type": "function",
                  "function": { "name": "jobSearch", "arguments": "{}" } }
            ]}}]
        });
        let Some(ProviderResponse::ToolCalls(calls)) = parse_tool_calls(&resp) else {
            panic!("expected tool calls");
        };
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id, "a");
        assert_eq!(calls[1].id, "call_1");
        assert_eq!(calls[1].name, "jobSearch");
    }

    #[test]
    fn plain_reply_has_no_tool_calls() {
        let resp = json!({ "choices": [{ "message": { "content": "hi" } }] });
        assert!(parse_tool_calls(&resp).is_none());
        let empty = json!({ "choices": [{ "message": { "tool_calls": [] } }] });
        assert!(parse_tool_calls(&empty).is_none());
    }
}
