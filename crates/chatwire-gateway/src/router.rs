//! Axum router wiring: WebSocket upgrade plus the small HTTP API
//! (presence status, message send, history).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use chatwire_core::error::{ChatWireError, ClientCode};
use chatwire_core::protocol::SendMessagePayload;

use crate::{app_state::AppState, transport};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/ws", get(transport::ws::ws_upgrade))
        .route("/online/:user_id/status", get(online_status))
        .route("/chat/message", post(send_message))
        .route("/chat/messages/:sender_id/:receiver_id", get(history))
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

/// Point-in-time query, equivalent to an OnlineSet membership test.
async fn online_status(State(app): State<AppState>, Path(user_id): Path<String>) -> Response {
    let is_online = app.tracker().is_online(&user_id).await;
    Json(json!({ "isOnline": is_online })).into_response()
}

/// HTTP message send; same router path as the WebSocket event.
async fn send_message(
    State(app): State<AppState>,
    Json(req): Json<SendMessagePayload>,
) -> Response {
    match app.messages().send_message(req).await {
        Ok(msg) => (
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "message": "message sent",
                "data": msg,
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

async fn history(
    State(app): State<AppState>,
    Path((sender_id, receiver_id)): Path<(String, String)>,
) -> Response {
    match app.messages().history(&sender_id, &receiver_id).await {
        Ok(messages) => Json(json!({
            "success": true,
            "message": "Successfully fetched the messages.",
            "data": messages,
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

fn error_response(e: ChatWireError) -> Response {
    let code = e.client_code();
    let status = match code {
        ClientCode::BadRequest | ClientCode::UnsupportedVersion => StatusCode::BAD_REQUEST,
        ClientCode::NotFound => StatusCode::NOT_FOUND,
        ClientCode::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ClientCode::PersistFailed => StatusCode::BAD_GATEWAY,
        ClientCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(json!({
            "success": false,
            "code": code.as_str(),
            "message": e.to_string(),
        })),
    )
        .into_response()
}
