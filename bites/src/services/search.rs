use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::config::LocaleConfig;
use crate::decoding::decode;
use crate::error::{BitesError, Result};
use crate::llm::{prompts, GenerativeBackend, SearchPrompt};
use crate::location::{resolve_location, LocationResolution, LocationSource};
use crate::map::{MapPresenter, MapScene, SceneCanvas};
use crate::markup::{render, Block};
use crate::models::{CitationMetadata, DecodedResponse, GeoPoint, PlaceRecord};

pub const SEARCH_FAILURE_APOLOGY: &str =
    "Sorry, I encountered an error while searching for places. Please try again.";
pub const NO_PLACES_FOUND: &str = "I couldn't find any specific places matching that request.";

/// A predefined query shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuickFilter {
    pub id: &'static str,
    pub label: &'static str,
    pub query: &'static str,
}

pub const QUICK_FILTERS: &[QuickFilter] = &[
    QuickFilter {
        id: "ramen",
        label: "Best Rated Ramen",
        query: "Best rated Ramen places",
    },
    QuickFilter {
        id: "bbq",
        label: "K-BBQ",
        query: "Top Korean BBQ restaurants",
    },
    QuickFilter {
        id: "cheap",
        label: "Cheap Eats",
        query: "Cheapest good food",
    },
    QuickFilter {
        id: "lunch",
        label: "Nearest Lunch",
        query: "Best lunch spots near me",
    },
    QuickFilter {
        id: "cafes",
        label: "Trendy Cafes",
        query: "Most trendy cafes",
    },
];

pub fn quick_filter(id: &str) -> Option<&'static QuickFilter> {
    QUICK_FILTERS
        .iter()
        .find(|filter| filter.id.eq_ignore_ascii_case(id.trim()))
}

/// Append the locale qualifier unless the query already names the city.
pub fn localize_query(query: &str, locale: &LocaleConfig) -> String {
    let query = query.trim();
    if query
        .to_lowercase()
        .contains(&locale.city.to_lowercase())
    {
        query.to_string()
    } else {
        format!("{query} in {}, {}", locale.city, locale.country)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
    #[default]
    Idle,
    Searching,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    Succeeded,
    Failed,
}

/// What the display currently shows.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct SearchSnapshot {
    pub phase: SearchPhase,
    pub last_status: Option<SearchStatus>,
    pub query: Option<String>,
    pub places: Vec<PlaceRecord>,
    pub narrative: String,
    pub blocks: Vec<Block>,
    pub citations: Option<CitationMetadata>,
    pub map: MapScene,
    pub location_advisory: Option<String>,
    pub request_id: u64,
}

/// Result of one search, returned to its caller whether or not it was
/// published to the shared display state.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct SearchOutcome {
    pub request_id: u64,
    pub status: SearchStatus,
    /// A newer search was issued before this one resolved; nothing was published.
    pub superseded: bool,
    pub query: String,
    pub dispatched_query: String,
    pub places: Vec<PlaceRecord>,
    pub narrative: String,
    pub blocks: Vec<Block>,
    pub citations: Option<CitationMetadata>,
    pub map: MapScene,
    pub location_advisory: Option<String>,
}

/// Runs place searches against the backend and owns the display state.
///
/// Every search gets a monotonically increasing request id. Only the most
/// recently issued search may publish its result; older ones still return
/// their outcome to the caller but leave the shared state alone.
#[derive(Clone)]
pub struct SearchOrchestrator {
    backend: Arc<dyn GenerativeBackend>,
    locale: LocaleConfig,
    presenter: MapPresenter,
    state: Arc<Mutex<SearchSnapshot>>,
    latest_request: Arc<AtomicU64>,
}

impl SearchOrchestrator {
    pub fn new(backend: Arc<dyn GenerativeBackend>, locale: LocaleConfig) -> Self {
        let presenter = MapPresenter::new(&locale);
        let initial = SearchSnapshot {
            phase: SearchPhase::Idle,
            last_status: None,
            query: None,
            places: Vec::new(),
            narrative: String::new(),
            blocks: Vec::new(),
            citations: None,
            map: Self::scene(&presenter, &[], None),
            location_advisory: None,
            request_id: 0,
        };

        Self {
            backend,
            locale,
            presenter,
            state: Arc::new(Mutex::new(initial)),
            latest_request: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn snapshot(&self) -> SearchSnapshot {
        self.state.lock().await.clone()
    }

    /// Run a quick filter by id.
    pub async fn quick_search(
        &self,
        filter_id: &str,
        location: Option<&dyn LocationSource>,
    ) -> Result<SearchOutcome> {
        let filter = quick_filter(filter_id)
            .ok_or_else(|| BitesError::Validation(format!("Unknown quick filter: {filter_id}")))?;
        self.search(filter.query, location).await
    }

    /// Run one search.
    ///
    /// `location` is `None` when no position was requested at all; a source
    /// that fails degrades to no hint plus an advisory. Backend failures are
    /// turned into the apology narrative, so the only error is an empty query.
    /// Once the location is resolved the search runs on its own task, so a
    /// dropped caller never leaves the display stuck in `Searching`.
    pub async fn search(
        &self,
        query: &str,
        location: Option<&dyn LocationSource>,
    ) -> Result<SearchOutcome> {
        let query = query.trim();
        if query.is_empty() {
            return Err(BitesError::Validation("Query cannot be empty".to_string()));
        }

        let resolution = match location {
            Some(source) => resolve_location(source).await,
            None => LocationResolution::default(),
        };

        // No await between taking the id and spawning the run.
        let request_id = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;

        let run = tokio::spawn({
            let orchestrator = self.clone();
            let query = query.to_string();
            async move { orchestrator.run(request_id, query, resolution).await }
        });

        match run.await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                tracing::error!(request_id, error = %e, "Search task failed");
                let mut state = self.state.lock().await;
                if self.is_latest(request_id) {
                    state.phase = SearchPhase::Idle;
                    state.last_status = Some(SearchStatus::Failed);
                }
                Err(BitesError::Internal("Search did not complete".to_string()))
            }
        }
    }

    async fn run(
        &self,
        request_id: u64,
        query: String,
        resolution: LocationResolution,
    ) -> SearchOutcome {
        {
            let mut state = self.state.lock().await;
            if self.is_latest(request_id) {
                *state = SearchSnapshot {
                    phase: SearchPhase::Searching,
                    last_status: state.last_status,
                    query: Some(query.clone()),
                    places: Vec::new(),
                    narrative: String::new(),
                    blocks: Vec::new(),
                    citations: None,
                    map: Self::scene(&self.presenter, &[], resolution.point),
                    location_advisory: resolution.advisory.clone(),
                    request_id,
                };
            }
        }

        let dispatched_query = localize_query(&query, &self.locale);
        let prompt = SearchPrompt {
            system_instruction: prompts::search_system_prompt(
                &self.locale.city,
                &self.locale.country,
            ),
            query: dispatched_query.clone(),
            location: resolution.point,
        };

        tracing::info!(
            request_id,
            backend = self.backend.name(),
            query = %dispatched_query,
            has_location = prompt.location.is_some(),
            "Dispatching place search"
        );

        let (status, decoded) = match self.backend.search(&prompt).await {
            Ok(reply) => {
                let text = if reply.text.trim().is_empty() {
                    NO_PLACES_FOUND
                } else {
                    reply.text.as_str()
                };
                (SearchStatus::Succeeded, decode(text, reply.citations))
            }
            Err(e) => {
                tracing::error!(request_id, error = %e, "Place search failed");
                (
                    SearchStatus::Failed,
                    DecodedResponse {
                        place_records: Vec::new(),
                        narrative_text: SEARCH_FAILURE_APOLOGY.to_string(),
                        citations: None,
                    },
                )
            }
        };

        let blocks = render(&decoded.narrative_text);
        let map = Self::scene(&self.presenter, &decoded.place_records, resolution.point);

        let mut outcome = SearchOutcome {
            request_id,
            status,
            superseded: false,
            query,
            dispatched_query,
            places: decoded.place_records,
            narrative: decoded.narrative_text,
            blocks,
            citations: decoded.citations,
            map,
            location_advisory: resolution.advisory,
        };

        let mut state = self.state.lock().await;
        if !self.is_latest(request_id) {
            tracing::debug!(
                request_id,
                latest_request = self.latest_request.load(Ordering::SeqCst),
                "Discarding superseded search result"
            );
            outcome.superseded = true;
            return outcome;
        }

        *state = SearchSnapshot {
            phase: SearchPhase::Idle,
            last_status: Some(outcome.status),
            query: Some(outcome.query.clone()),
            places: outcome.places.clone(),
            narrative: outcome.narrative.clone(),
            blocks: outcome.blocks.clone(),
            citations: outcome.citations.clone(),
            map: outcome.map.clone(),
            location_advisory: outcome.location_advisory.clone(),
            request_id,
        };

        tracing::info!(
            request_id,
            places = outcome.places.len(),
            status = ?outcome.status,
            "Search result published"
        );

        outcome
    }

    fn is_latest(&self, request_id: u64) -> bool {
        self.latest_request.load(Ordering::SeqCst) == request_id
    }

    fn scene(
        presenter: &MapPresenter,
        places: &[PlaceRecord],
        user_location: Option<GeoPoint>,
    ) -> MapScene {
        let mut canvas = SceneCanvas::default();
        presenter.present(places, user_location, &mut canvas);
        canvas.into_scene()
    }
}
