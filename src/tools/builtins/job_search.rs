//! Built-in `jobSearch` tool: looks up listings on the Jobicy API.
//!
//! Input is a JSON-encoded criteria object; the response body is handed
//! back to the agent unshaped.

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::tools::{ToolError, ToolMeta, ToolOutcome, ToolRegistry};

pub const NAME: &str = "jobSearch";
pub const DEFAULT_BASE_URL: &str = "https://jobicy.com/api/v2";

const DESCRIPTION: &str = "Finds jobs that match the user's jobCriteria input that is a \
stringified json object that should be in this format: {tag: string, location: string, \
geo: string, industry: string, remote: boolean}";

/// Search criteria produced by the agent.  Only `tag`, `location` and
/// `remote` influence the request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobCriteria {
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub geo: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub remote: bool,
}

impl JobCriteria {
    pub fn parse(input: &str) -> Result<Self, ToolError> {
        serde_json::from_str(input)
            .map_err(|e| ToolError::JobSearch(format!("invalid job criteria: {e}")))
    }
}

/// Listing URL for `criteria`.  Missing values render empty.
pub fn job_search_url(base: &str, criteria: &JobCriteria) -> String {
    let base = base.trim_end_matches('/');
    let tag = criteria.tag.as_deref().unwrap_or("");
    if criteria.remote {
        format!("{base}/remote-jobs?&tag={tag}&count=3")
    } else {
        let location = criteria.location.as_deref().unwrap_or("");
        format!("{base}/jobs?location={location}&tag={tag}&count=3")
    }
}

/// Run one search.  Returns the response JSON re-encoded as a string.
pub async fn search_jobs(
    client: &reqwest::Client,
    base: &str,
    input: &str,
) -> Result<String, ToolError> {
    let criteria = JobCriteria::parse(input)?;
    let url = job_search_url(base, &criteria);
    debug!(%url, "searching jobs");

    let resp = client
        .get(&url)
        .send()
        .await
        .map_err(|e| ToolError::JobSearch(format!("request failed: {e}")))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(ToolError::JobSearch(format!("listing API returned {status}")));
    }

    let body: serde_json::Value = resp
        .json()
        .await
        .map_err(|e| ToolError::JobSearch(format!("invalid response body: {e}")))?;
    Ok(body.to_string())
}

pub fn register(reg: &mut ToolRegistry, client: reqwest::Client, base_url: String) {
    let base_url = Arc::new(base_url);
    reg.register(
        ToolMeta::string_input(NAME, DESCRIPTION),
        Arc::new(move |input: String| {
            let client = client.clone();
            let base_url = Arc::clone(&base_url);
            Box::pin(async move { ToolOutcome::from(search_jobs(&client, &base_url, &input).await) })
        }),
    );
}
