//! Job search and web search adapters against a wiremock upstream.

use recruit_chat::config::WebSearchConfig;
use recruit_chat::tools::builtins::{job_search, web_search};
use recruit_chat::tools::{ToolError, ToolRegistry};
use serde_json::json;
use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn job_search_remote_hits_remote_jobs() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("GET"))
        .and(matchers::path("/remote-jobs"))
        .and(matchers::query_param("tag", "rust"))
        .and(matchers::query_param("count", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jobs": [{ "jobTitle": "Rust Engineer" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let out = job_search::search_jobs(
        &reqwest::Client::new(),
        &server.uri(),
        r#"{"tag":"rust","remote":true}"#,
    )
    .await
    .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed["jobs"][0]["jobTitle"], "Rust Engineer");
}

#[tokio::test]
async fn job_search_on_site_passes_location() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("GET"))
        .and(matchers::path("/jobs"))
        .and(matchers::query_param("location", "berlin"))
        .and(matchers::query_param("tag", "go"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "jobs": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let out = job_search::search_jobs(
        &reqwest::Client::new(),
        &server.uri(),
        r#"{"tag":"go","location":"berlin","remote":false}"#,
    )
    .await
    .unwrap();
    assert_eq!(out, r#"{"jobs":[]}"#);
}

#[tokio::test]
async fn job_search_upstream_error_becomes_apology() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = job_search::search_jobs(&reqwest::Client::new(), &server.uri(), r#"{"tag":"x"}"#)
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::JobSearch(_)));

    let mut reg = ToolRegistry::new();
    job_search::register(&mut reg, reqwest::Client::new(), server.uri());
    let text = reg
        .call(job_search::NAME, &json!({ "input": r#"{"tag":"x"}"# }).to_string())
        .await
        .into_agent_text(job_search::NAME);
    assert_eq!(text, "Sorry, I could not find a job.");
}

#[tokio::test]
async fn job_search_non_json_body_is_failure() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
        .mount(&server)
        .await;

    let err = job_search::search_jobs(&reqwest::Client::new(), &server.uri(), "{}")
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::JobSearch(_)));
}

fn tavily_cfg(server: &MockServer, key: Option<&str>) -> WebSearchConfig {
    WebSearchConfig {
        endpoint: format!("{}/search", server.uri()),
        api_key: key.map(str::to_string),
        max_results: 1,
    }
}

#[tokio::test]
async fn web_search_returns_results_array() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/search"))
        .and(matchers::body_partial_json(json!({
            "api_key": "tvly-test",
            "query": "rust salaries",
            "max_results": 1
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": "rust salaries",
            "results": [{ "title": "Salaries", "url": "https://example.com", "content": "high" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let out = web_search::web_search(
        &reqwest::Client::new(),
        &tavily_cfg(&server, Some("tvly-test")),
        "rust salaries",
    )
    .await
    .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert!(parsed.is_array());
    assert_eq!(parsed[0]["url"], "https://example.com");
}

#[tokio::test]
async fn web_search_upstream_error_is_failure() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let err = web_search::web_search(
        &reqwest::Client::new(),
        &tavily_cfg(&server, Some("wrong")),
        "anything",
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ToolError::WebSearch(_)));
}
