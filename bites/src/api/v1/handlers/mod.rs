pub mod chat;
pub(crate) mod health;
pub mod render;
pub mod search;

pub use health::health_check;

use crate::api::v1::response::{ApiResponse, ErrorCode};

/// Fallback for unknown routes.
pub async fn not_found() -> ApiResponse<()> {
    ApiResponse::error(ErrorCode::NotFound, "Route not found")
}
