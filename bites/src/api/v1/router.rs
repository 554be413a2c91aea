use axum::{
    routing::{get, post},
    Router,
};

use crate::api::state::AppState;

use super::handlers;

pub fn v1_router() -> Router<AppState> {
    let docs = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/openapi.json", get(super::openapi::openapi_json))
        .merge(super::openapi::redoc_router());

    let search = Router::new()
        .route(
            "/search",
            get(handlers::search::get_snapshot).post(handlers::search::search),
        )
        .route("/search:quick", post(handlers::search::quick_search))
        .route(
            "/quick-filters",
            get(handlers::search::list_quick_filters),
        );

    let chat = Router::new()
        .route(
            "/chat",
            get(handlers::chat::get_transcript).post(handlers::chat::send_message),
        )
        .route("/chat:reset", post(handlers::chat::reset_chat));

    Router::new()
        .merge(docs)
        .merge(search)
        .merge(chat)
        .route("/render", post(handlers::render::render_markup))
}
