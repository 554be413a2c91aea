mod chat;
mod search;

pub use chat::{ChatExchange, ChatOrchestrator, ChatView, CHAT_FAILURE_APOLOGY, CHAT_GREETING};
pub use search::{
    localize_query, quick_filter, QuickFilter, SearchOrchestrator, SearchOutcome, SearchPhase,
    SearchSnapshot, SearchStatus, NO_PLACES_FOUND, QUICK_FILTERS, SEARCH_FAILURE_APOLOGY,
};
