use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::error;

use crate::gateway::AppState;

/// `conversationId` from the request body, if it is a positive integer.
fn requested_id(body: &[u8]) -> Option<i64> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value.get("conversationId")?.as_i64().filter(|id| *id > 0)
}

/// `POST /api/conversation`
pub(crate) async fn api_conversation(State(state): State<AppState>, body: Bytes) -> Response {
    let Some(id) = requested_id(&body) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid or missing conversationId" })),
        )
            .into_response();
    };

    match state.chat.history(id).await {
        Ok(messages) => (StatusCode::OK, Json(json!({ "messages": messages }))).into_response(),
        Err(e) => {
            error!(conversation_id = id, error = %e, "error fetching conversation history");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "An error occurred while fetching conversation history." })),
            )
                .into_response()
        }
    }
}
