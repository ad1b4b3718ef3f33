//! Axum handlers for `/api/*` routes.
//!
//! Every body is JSON with a `status` of `"success"` or `"error"`. Validation
//! failures are HTTP 400; chat failures (unknown model, upstream error,
//! unknown conversation) are HTTP 200 with an error body carrying both the
//! free-text `message` and a typed `code`.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::AxumState;
use crate::subsystems::chat::ChatError;

// ── Request types ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct ChatRequest {
    #[serde(default)]
    conversation_id: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Deserialize)]
pub(super) struct ClearRequest {
    #[serde(default)]
    conversation_id: Option<String>,
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn error_response(status: StatusCode, code: &str, msg: impl std::fmt::Display) -> Response {
    (
        status,
        Json(json!({ "status": "error", "message": msg.to_string(), "code": code })),
    )
        .into_response()
}

fn bad_request(msg: impl std::fmt::Display) -> Response {
    error_response(StatusCode::BAD_REQUEST, "invalid_request", msg)
}

fn chat_error(e: &ChatError) -> Response {
    error_response(StatusCode::OK, e.code(), e)
}

/// Fallback conversation id: current Unix time as `<seconds>.<microseconds>`.
///
/// Not unique across concurrent first requests; clients that care send
/// their own id.
pub(crate) fn fallback_conversation_id() -> String {
    let now = chrono::Utc::now();
    format!("{}.{:06}", now.timestamp(), now.timestamp_subsec_micros())
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// POST /api/chat
pub(super) async fn chat(
    State(state): State<AxumState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(rejection) => {
            warn!(channel_id = %state.channel_id, "rejected chat body: {rejection}");
            return bad_request(rejection.body_text());
        }
    };

    let Some(message) = req.message.filter(|m| !m.is_empty()) else {
        return bad_request("No message provided");
    };
    let conversation_id = req.conversation_id.unwrap_or_else(fallback_conversation_id);
    let model = req
        .model
        .unwrap_or_else(|| state.chat.default_model().to_string());

    debug!(
        channel_id = %state.channel_id,
        %conversation_id,
        %model,
        message_len = message.len(),
        "chat request"
    );

    match state.chat.respond(&conversation_id, &message, &model).await {
        Ok(reply) => (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "message": reply.message,
                "conversation_id": reply.conversation_id,
            })),
        )
            .into_response(),
        Err(e) => {
            warn!(channel_id = %state.channel_id, %conversation_id, code = e.code(), "chat failed: {e}");
            chat_error(&e)
        }
    }
}

/// POST /api/clear
pub(super) async fn clear(
    State(state): State<AxumState>,
    payload: Result<Json<ClearRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(rejection) => {
            warn!(channel_id = %state.channel_id, "rejected clear body: {rejection}");
            return bad_request(rejection.body_text());
        }
    };

    let Some(conversation_id) = req.conversation_id.filter(|id| !id.is_empty()) else {
        return bad_request("No conversation ID provided");
    };

    match state.chat.reset(&conversation_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "success", "message": "Conversation cleared" })),
        )
            .into_response(),
        Err(e) => chat_error(&e),
    }
}

/// GET /api/models
pub(super) async fn models(State(state): State<AxumState>) -> Response {
    (StatusCode::OK, Json(json!({ "models": state.chat.models().keys() }))).into_response()
}

/// GET /api/health
pub(super) async fn health(State(state): State<AxumState>) -> Response {
    let body = json!({
        "status": "ok",
        "provider": state.chat.provider().name(),
        "conversations": state.chat.store().len().await,
    });
    (StatusCode::OK, Json(body)).into_response()
}
