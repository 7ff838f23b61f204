//! Agent gateway.
//!
//! [`AgentGateway`] is the single seam between request orchestration and
//! response generation: given the new user message and the prior turns,
//! produce one reply string.  [`ToolAgent`] is the production
//! implementation; it forwards the conversation plus tool definitions to
//! a [`ModelProvider`] and executes whatever tool calls come back until
//! the model answers in plain text.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::ChatError;
use crate::models::{ChatMessage, ModelProvider, ProviderResponse};
use crate::store::{HistoryEntry, MessageType};
use crate::tools::ToolRegistry;

/// Produces one assistant reply for a conversation turn.
#[async_trait]
pub trait AgentGateway: Send + Sync {
    async fn invoke(&self, message: &str, history: &[HistoryEntry]) -> Result<String, ChatError>;
}

/// Build the model transcript: system prompt, prior turns, then the new
/// user message.  Stored `ai` turns become `assistant` messages.
pub fn build_messages(system_prompt: &str, history: &[HistoryEntry], message: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    if !system_prompt.is_empty() {
        messages.push(ChatMessage::new("system", system_prompt));
    }
    messages.extend(history.iter().map(|h| {
        let role = match h.kind {
            MessageType::User => "user",
            MessageType::Ai => "assistant",
        };
        ChatMessage::new(role, h.text.clone())
    }));
    messages.push(ChatMessage::new("user", message));
    messages
}

/// Function-calling agent over a [`ModelProvider`] and a [`ToolRegistry`].
pub struct ToolAgent {
    provider: Arc<dyn ModelProvider>,
    tools: Arc<ToolRegistry>,
    system_prompt: String,
    max_iterations: usize,
}

impl ToolAgent {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        tools: Arc<ToolRegistry>,
        system_prompt: impl Into<String>,
        max_iterations: usize,
    ) -> Self {
        Self {
            provider,
            tools,
            system_prompt: system_prompt.into(),
            max_iterations: max_iterations.max(1),
        }
    }
}

#[async_trait]
impl AgentGateway for ToolAgent {
    async fn invoke(&self, message: &str, history: &[HistoryEntry]) -> Result<String, ChatError> {
        let mut messages = build_messages(&self.system_prompt, history, message);
        let tool_defs = self.tools.function_defs();

        for iteration in 0..self.max_iterations {
            let response = self
                .provider
                .send_chat_with_tools(&messages, &tool_defs)
                .await
                .map_err(|e| ChatError::Agent(format!("model call failed: {e:#}")))?;

            let calls = match response {
                ProviderResponse::Final(text) => {
                    debug!(iteration, reply_len = text.len(), "agent produced final reply");
                    return Ok(text);
                }
                ProviderResponse::ToolCalls(calls) => calls,
            };

            messages.push(ChatMessage::assistant_tool_calls(&calls));
            for call in &calls {
                info!(tool = %call.name, iteration, "executing tool call");
                let outcome = self.tools.call(&call.name, &call.arguments).await;
                let text = outcome.into_agent_text(&call.name);
                messages.push(ChatMessage::tool_result(call.id.clone(), text));
            }
        }

        warn!(max = self.max_iterations, "agent exhausted tool iterations");
        Err(ChatError::Agent(format!(
            "no final reply after {} tool iterations",
            self.max_iterations
        )))
    }
}
