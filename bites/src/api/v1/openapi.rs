use axum::Json;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

use super::dto;
use super::handlers;
use super::response;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bites API",
        version = "1.0.0",
        description = "Seoul restaurant discovery and dining chat on top of a grounded language model.",
    ),
    paths(
        handlers::health::health_check,
        handlers::search::search,
        handlers::search::quick_search,
        handlers::search::get_snapshot,
        handlers::search::list_quick_filters,
        handlers::chat::send_message,
        handlers::chat::get_transcript,
        handlers::chat::reset_chat,
        handlers::render::render_markup,
    ),
    components(schemas(
        // Response envelope
        response::ErrorCode,
        response::ApiError,
        // Search
        dto::search::SearchRequest,
        dto::search::QuickSearchRequest,
        dto::search::SearchResponse,
        dto::search::QuickFilterResponse,
        dto::search::QuickFiltersResponse,
        crate::services::SearchOutcome,
        crate::services::SearchSnapshot,
        crate::services::SearchPhase,
        crate::services::SearchStatus,
        crate::location::ReportedLocation,
        crate::map::MapScene,
        crate::map::MapMarker,
        crate::map::Bounds,
        crate::models::PlaceRecord,
        crate::models::GeoPoint,
        crate::models::Citation,
        crate::models::CitationMetadata,
        // Chat
        dto::chat::SendMessageRequest,
        dto::chat::SendMessageResponse,
        crate::services::ChatView,
        crate::models::ChatMessage,
        crate::models::ChatRole,
        // Render
        dto::render::RenderRequest,
        dto::render::RenderResponse,
        crate::markup::Block,
        crate::markup::Span,
        // Health (handler-local types)
        handlers::health::HealthData,
        handlers::health::LlmStatus,
        handlers::health::LocaleStatus,
    )),
    tags(
        (name = "health", description = "Health check"),
        (name = "search", description = "Grounded place search and quick filters"),
        (name = "chat", description = "Dining assistant conversation"),
        (name = "render", description = "Markup rendering for assistant text"),
    ),
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn redoc_router<S: Clone + Send + Sync + 'static>() -> axum::Router<S> {
    Redoc::with_url("/docs", ApiDoc::openapi()).into()
}
