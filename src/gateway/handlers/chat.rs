use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::gateway::AppState;

const GENERIC_ERROR: &str = "An error occurred while processing your request.";

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
}

/// `POST /api/chat`
pub(crate) async fn api_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let req: ChatRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "chat request body rejected");
            return generic_error();
        }
    };

    let cookies = super::cookie_header(&headers);
    match state.chat.handle_message(cookies.as_deref(), &req.message).await {
        Ok(reply) => {
            let mut resp = (StatusCode::OK, Json(json!({ "message": reply.reply }))).into_response();
            if let Some(cookie) = reply.set_cookie {
                match HeaderValue::from_str(&cookie.header_value()) {
                    Ok(v) => {
                        resp.headers_mut().insert(header::SET_COOKIE, v);
                    }
                    Err(e) => error!(error = %e, "failed to encode session cookie"),
                }
            }
            resp
        }
        Err(e) => {
            error!(kind = e.kind(), error = %e, "error handling chat");
            generic_error()
        }
    }
}

fn generic_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": GENERIC_ERROR })),
    )
        .into_response()
}
