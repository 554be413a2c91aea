use axum::extract::State;
use validator::Validate;

use crate::api::v1::dto::{SendMessageRequest, SendMessageResponse};
use crate::api::v1::response::{ApiError, ApiResponse};
use crate::api::{AppJson, AppState};
use crate::error::BitesError;
use crate::services::ChatView;

/// `POST /api/v1/chat`
///
/// Appends the user message, waits for the assistant and returns the reply
/// with the updated transcript. Rejected with `409 conflict` while a reply
/// is pending.
#[utoipa::path(
    post,
    path = "/api/v1/chat",
    tag = "chat",
    operation_id = "chat.send",
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Assistant reply", body = SendMessageResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 409, description = "A reply is still pending", body = ApiError),
    )
)]
pub async fn send_message(
    State(state): State<AppState>,
    AppJson(req): AppJson<SendMessageRequest>,
) -> ApiResponse<SendMessageResponse> {
    if let Err(e) = req.validate() {
        return BitesError::from(e).into();
    }

    match state.chat.send(&req.message).await {
        Ok(exchange) => ApiResponse::success(SendMessageResponse {
            reply: exchange.reply,
            failed: exchange.failed,
            transcript: state.chat.view().await,
        }),
        Err(e) => e.into(),
    }
}

/// `GET /api/v1/chat`
#[utoipa::path(
    get,
    path = "/api/v1/chat",
    tag = "chat",
    operation_id = "chat.transcript",
    responses(
        (status = 200, description = "Transcript and pending flag", body = ChatView),
    )
)]
pub async fn get_transcript(State(state): State<AppState>) -> ApiResponse<ChatView> {
    ApiResponse::success(state.chat.view().await)
}

/// `POST /api/v1/chat:reset`
#[utoipa::path(
    post,
    path = "/api/v1/chat:reset",
    tag = "chat",
    operation_id = "chat.reset",
    responses(
        (status = 200, description = "Fresh transcript", body = ChatView),
    )
)]
pub async fn reset_chat(State(state): State<AppState>) -> ApiResponse<ChatView> {
    state.chat.reset().await;
    ApiResponse::success(state.chat.view().await)
}
