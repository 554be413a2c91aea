use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::markup::Block;

/// Request body for `POST /v1/render`.
#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
pub struct RenderRequest {
    #[validate(length(max = 20000, message = "must be at most 20000 characters"))]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct RenderResponse {
    pub blocks: Vec<Block>,
    /// Escaped HTML rendering of `blocks`.
    pub html: String,
}
