use chrono::{DateTime, Utc};
use nanoid::nanoid;
use serde::{Deserialize, Serialize};

use super::CitationMetadata;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

impl std::str::FromStr for ChatRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Self::User),
            // Gemini calls the assistant side "model"
            "assistant" | "model" => Ok(Self::Assistant),
            _ => Err(format!("Unknown chat role: {s}")),
        }
    }
}

/// One turn of a conversation. Never mutated once appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub text: String,
    #[schema(value_type = String)]
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citations: Option<CitationMetadata>,
}

/// Ordered, append-only conversation log.
///
/// Insertion order is display order, and timestamps never decrease along it:
/// a message created "before" its predecessor (clock skew) inherits the
/// predecessor's timestamp.
#[derive(Debug, Clone, Default, Serialize, utoipa::ToSchema)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transcript that opens with a fixed assistant greeting under id `init`.
    pub fn with_greeting(greeting: &str) -> Self {
        let mut transcript = Self::new();
        transcript.push_with_id("init".to_string(), ChatRole::Assistant, greeting.to_string());
        transcript
    }

    pub fn push(&mut self, role: ChatRole, text: impl Into<String>) -> &ChatMessage {
        self.push_with_id(nanoid!(), role, text.into())
    }

    fn push_with_id(&mut self, id: String, role: ChatRole, text: String) -> &ChatMessage {
        let now = Utc::now();
        let timestamp = match self.messages.last() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        };

        self.messages.push(ChatMessage {
            id,
            role,
            text,
            timestamp,
            citations: None,
        });
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}
