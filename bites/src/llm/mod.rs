mod api;
mod backend;
mod gemini;
pub mod prompts;
mod provider;

pub use api::LlmApiClient;
pub use backend::{BackendReply, ChatRequest, GenerativeBackend, SearchPrompt};
pub use gemini::{GeminiClient, GeminiReply, GEMINI_BASE_URL};
pub use provider::{LlmBackend, LlmProvider};
