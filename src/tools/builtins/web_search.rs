//! Built-in `tavily_search_results_json` tool: proxies a query to the
//! Tavily search API and returns the `results` array as JSON text.

use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use crate::config::WebSearchConfig;
use crate::tools::{ToolError, ToolMeta, ToolOutcome, ToolRegistry};

pub const NAME: &str = "tavily_search_results_json";

const DESCRIPTION: &str = "A search engine optimized for comprehensive, accurate, and trusted \
results. Useful for when you need to answer questions about current events. Input should be \
a search query.";

/// Run one search query.
pub async fn web_search(
    client: &reqwest::Client,
    cfg: &WebSearchConfig,
    query: &str,
) -> Result<String, ToolError> {
    let api_key = cfg
        .api_key
        .as_deref()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ToolError::WebSearch("no API key configured".into()))?;

    debug!(query, "web search");
    let body = json!({
        "api_key": api_key,
        "query": query,
        "max_results": cfg.max_results,
    });

    let resp = client
        .post(&cfg.endpoint)
        .json(&body)
        .send()
        .await
        .map_err(|e| ToolError::WebSearch(format!("request failed: {e}")))?;

    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        return Err(ToolError::WebSearch(format!(
            "search API returned {status}: {}",
            crate::utils::truncate_str(&text, 200)
        )));
    }

    let json: serde_json::Value = resp
        .json()
        .await
        .map_err(|e| ToolError::WebSearch(format!("invalid response body: {e}")))?;

    match json.get("results") {
        Some(results) if results.is_array() => Ok(results.to_string()),
        _ => Err(ToolError::WebSearch("response has no results array".into())),
    }
}

pub fn register(reg: &mut ToolRegistry, client: reqwest::Client, cfg: WebSearchConfig) {
    let cfg = Arc::new(cfg);
    reg.register(
        ToolMeta::string_input(NAME, DESCRIPTION),
        Arc::new(move |input: String| {
            let client = client.clone();
            let cfg = Arc::clone(&cfg);
            Box::pin(async move { ToolOutcome::from(web_search(&client, &cfg, &input).await) })
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let cfg = WebSearchConfig {
            endpoint: "http://127.0.0.1:9/search".into(),
            api_key: None,
            max_results: 1,
        };
        let err = web_search(&reqwest::Client::new(), &cfg, "rust jobs")
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::WebSearch(_)));
        assert_eq!(err.apology(), "Sorry, I could not search the web.");
    }
}
