//! Chat request/response DTOs for the v1 API.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::ChatMessage;
use crate::services::ChatView;

/// Request body for `POST /v1/chat`.
#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = 4000, message = "must be 1-4000 characters"))]
    pub message: String,
}

/// Response for `POST /v1/chat`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct SendMessageResponse {
    pub reply: ChatMessage,
    /// `true` when `reply` is the connection apology.
    pub failed: bool,
    pub transcript: ChatView,
}
