//! v1 place search handlers.
//!
//! Backend failures never surface here: the orchestrator turns them into an
//! apology narrative, so only request validation produces error envelopes.

use axum::extract::State;
use validator::Validate;

use crate::api::v1::dto::{
    QuickFilterResponse, QuickFiltersResponse, QuickSearchRequest, SearchRequest, SearchResponse,
};
use crate::api::v1::response::{ApiError, ApiResponse};
use crate::api::{AppJson, AppState};
use crate::error::{BitesError, Result};
use crate::location::LocationSource;
use crate::services::{SearchOutcome, QUICK_FILTERS};

/// `POST /api/v1/search`
#[utoipa::path(
    post,
    path = "/api/v1/search",
    tag = "search",
    operation_id = "search.search",
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Search outcome and display state", body = SearchResponse),
        (status = 400, description = "Invalid request", body = ApiError),
    )
)]
pub async fn search(
    State(state): State<AppState>,
    AppJson(req): AppJson<SearchRequest>,
) -> ApiResponse<SearchResponse> {
    if let Err(e) = req.validate() {
        return BitesError::from(e).into();
    }

    let location = req.location.as_ref().map(|l| l as &dyn LocationSource);
    respond(&state, state.search.search(&req.query, location).await).await
}

/// `POST /api/v1/search:quick`
#[utoipa::path(
    post,
    path = "/api/v1/search:quick",
    tag = "search",
    operation_id = "search.quick",
    request_body = QuickSearchRequest,
    responses(
        (status = 200, description = "Search outcome and display state", body = SearchResponse),
        (status = 400, description = "Unknown filter", body = ApiError),
    )
)]
pub async fn quick_search(
    State(state): State<AppState>,
    AppJson(req): AppJson<QuickSearchRequest>,
) -> ApiResponse<SearchResponse> {
    if let Err(e) = req.validate() {
        return BitesError::from(e).into();
    }

    let location = req.location.as_ref().map(|l| l as &dyn LocationSource);
    respond(
        &state,
        state.search.quick_search(&req.filter, location).await,
    )
    .await
}

/// `GET /api/v1/search`
#[utoipa::path(
    get,
    path = "/api/v1/search",
    tag = "search",
    operation_id = "search.snapshot",
    responses(
        (status = 200, description = "Current display state", body = crate::services::SearchSnapshot),
    )
)]
pub async fn get_snapshot(
    State(state): State<AppState>,
) -> ApiResponse<crate::services::SearchSnapshot> {
    ApiResponse::success(state.search.snapshot().await)
}

/// `GET /api/v1/quick-filters`
#[utoipa::path(
    get,
    path = "/api/v1/quick-filters",
    tag = "search",
    operation_id = "search.quickFilters",
    responses(
        (status = 200, description = "Predefined query shortcuts", body = QuickFiltersResponse),
    )
)]
pub async fn list_quick_filters() -> ApiResponse<QuickFiltersResponse> {
    ApiResponse::success(QuickFiltersResponse {
        filters: QUICK_FILTERS.iter().map(QuickFilterResponse::from).collect(),
    })
}

async fn respond(state: &AppState, result: Result<SearchOutcome>) -> ApiResponse<SearchResponse> {
    match result {
        Ok(outcome) => ApiResponse::success(SearchResponse {
            outcome,
            snapshot: state.search.snapshot().await,
        }),
        Err(e) => e.into(),
    }
}
