use validator::Validate;

use crate::api::v1::dto::{RenderRequest, RenderResponse};
use crate::api::v1::response::{ApiError, ApiResponse};
use crate::api::AppJson;
use crate::error::BitesError;
use crate::markup;

/// `POST /api/v1/render`
#[utoipa::path(
    post,
    path = "/api/v1/render",
    tag = "render",
    operation_id = "render.markup",
    request_body = RenderRequest,
    responses(
        (status = 200, description = "Display blocks and HTML", body = RenderResponse),
        (status = 400, description = "Invalid request", body = ApiError),
    )
)]
pub async fn render_markup(AppJson(req): AppJson<RenderRequest>) -> ApiResponse<RenderResponse> {
    if let Err(e) = req.validate() {
        return BitesError::from(e).into();
    }

    let blocks = markup::render(&req.text);
    let html = markup::to_html(&blocks);
    ApiResponse::success(RenderResponse { blocks, html })
}
