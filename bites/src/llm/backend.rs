use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ChatMessage, CitationMetadata, GeoPoint};

/// A place-search request for the language backend.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPrompt {
    /// Instruction that pins the reply format (leading fenced JSON block).
    pub system_instruction: String,
    pub query: String,
    /// Device location, when the user shared it.
    pub location: Option<GeoPoint>,
}

/// Raw reply to a [`SearchPrompt`]. `text` may be empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackendReply {
    pub text: String,
    pub citations: Option<CitationMetadata>,
}

/// A chat turn. `history` is the whole transcript before `message`; the
/// adapter decides how to replay it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system_instruction: String,
    pub history: Vec<ChatMessage>,
    pub message: String,
}

/// The generative-language service the orchestrators talk to.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn search(&self, prompt: &SearchPrompt) -> Result<BackendReply>;

    async fn chat(&self, request: &ChatRequest) -> Result<String>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}
