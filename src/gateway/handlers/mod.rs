pub(crate) mod chat;
pub(crate) mod conversation;
pub(crate) mod health;

use axum::{
    http::{header, HeaderMap, Method, StatusCode},
    response::IntoResponse,
};

/// Any non-POST request to a POST-only endpoint.
pub(crate) async fn method_not_allowed(method: Method) -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST")],
        format!("Method {method} Not Allowed"),
    )
}

/// All `Cookie` headers joined into one `a=b; c=d` string.
pub(crate) fn cookie_header(headers: &HeaderMap) -> Option<String> {
    let parts: Vec<&str> = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}
