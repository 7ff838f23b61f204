//! OpenAI chat-completions provider with tool calling.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::{ChatMessage, ModelProvider, ProviderResponse};

/// Default endpoint for OpenAI chat completions.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Shared HTTP client used for the model and the tool adapters.
pub fn http_client() -> anyhow::Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(90))
        .connect_timeout(Duration::from_secs(10))
        .build()?)
}

/// Provider that talks to the OpenAI-compatible chat completions API.
pub struct OpenAIProvider {
    api_key: Option<String>,
    endpoint: String,
    client: Client,
    /// Model name sent in the request body (e.g. "gpt-4o-mini").
    model: String,
    temperature: f32,
}

impl OpenAIProvider {
    /// Provider with explicit configuration.  A missing key sends no
    /// `Authorization` header (useful against local endpoints).
    pub fn with_config(
        client: Client,
        api_key: Option<String>,
        endpoint: String,
        model: String,
        temperature: f32,
    ) -> Self {
        Self {
            api_key,
            endpoint,
            client,
            model,
            temperature,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ModelProvider for OpenAIProvider {
    /// Returns [`ProviderResponse::ToolCalls`] when the model wants to
    /// invoke tools, or [`ProviderResponse::Final`] for a normal reply.
    async fn send_chat_with_tools(
        &self,
        messages: &[ChatMessage],
        tools: &[serde_json::Value],
    ) -> Result<ProviderResponse, anyhow::Error> {
        let mut body = json!({
            "model": self.model,
            "messages": super::serialize_messages(messages),
            "temperature": self.temperature,
        });

        if !tools.is_empty() {
            body["tools"] = serde_json::Value::Array(tools.to_vec());
            body["tool_choice"] = json!("auto");
        }

        let mut req = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!(
                "OpenAI API returned {status}: {}",
                crate::utils::truncate_str(&text, 500)
            );
        }

        let json: serde_json::Value = resp.json().await?;

        if let Some(pr) = super::parse_tool_calls(&json) {
            return Ok(pr);
        }

        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("OpenAI API response has no message content"))?
            .to_string();

        Ok(ProviderResponse::Final(content))
    }
}
