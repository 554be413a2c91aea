use thiserror::Error;

#[derive(Error, Debug)]
pub enum BitesError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Geolocation error: {0}")]
    Geolocation(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),

    #[error("LLM rate limit exceeded, retry after {retry_after:?} seconds")]
    LlmRateLimit { retry_after: Option<u64> },

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl BitesError {
    /// Whether retrying the same backend call could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            BitesError::Http(e) => e.status().map(|s| s.is_server_error()).unwrap_or(true),
            BitesError::Llm(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, BitesError>;
