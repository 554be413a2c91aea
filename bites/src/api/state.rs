use std::sync::Arc;

use crate::config::Config;
use crate::llm::{GenerativeBackend, LlmProvider};
use crate::services::{ChatOrchestrator, SearchOrchestrator};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Configured provider, kept for health reporting.
    pub llm: LlmProvider,
    pub search: SearchOrchestrator,
    pub chat: ChatOrchestrator,
}

impl AppState {
    pub fn new(config: Config, llm: LlmProvider) -> Self {
        let backend: Arc<dyn GenerativeBackend> = Arc::new(llm.clone());
        Self::with_backend(config, llm, backend)
    }

    /// Build the state around an explicit backend, e.g. a scripted one.
    pub fn with_backend(
        config: Config,
        llm: LlmProvider,
        backend: Arc<dyn GenerativeBackend>,
    ) -> Self {
        let config = Arc::new(config);
        let search = SearchOrchestrator::new(backend.clone(), config.locale.clone());
        let chat = ChatOrchestrator::new(backend, &config.locale);

        Self {
            config,
            llm,
            search,
            chat,
        }
    }
}
