//! Search request/response DTOs for the v1 API.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::location::ReportedLocation;
use crate::services::{QuickFilter, SearchOutcome, SearchSnapshot};

/// Request body for `POST /v1/search`.
#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
pub struct SearchRequest {
    /// Free-text query, e.g. "cheap noodles".
    #[validate(length(min = 1, max = 500, message = "must be 1-500 characters"))]
    pub query: String,
    /// Outcome of the browser geolocation request. Omit when not requested.
    #[serde(default)]
    pub location: Option<ReportedLocation>,
}

/// Request body for `POST /v1/search:quick`.
#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
pub struct QuickSearchRequest {
    /// Quick filter id from `GET /v1/quick-filters`.
    #[validate(length(min = 1, max = 32, message = "must be 1-32 characters"))]
    pub filter: String,
    #[serde(default)]
    pub location: Option<ReportedLocation>,
}

/// Response for both search endpoints.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct SearchResponse {
    /// This request's own result, published or not.
    pub outcome: SearchOutcome,
    /// Display state after this request finished.
    pub snapshot: SearchSnapshot,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct QuickFilterResponse {
    pub id: String,
    pub label: String,
    pub query: String,
}

impl From<&QuickFilter> for QuickFilterResponse {
    fn from(filter: &QuickFilter) -> Self {
        Self {
            id: filter.id.to_string(),
            label: filter.label.to_string(),
            query: filter.query.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct QuickFiltersResponse {
    pub filters: Vec<QuickFilterResponse>,
}
