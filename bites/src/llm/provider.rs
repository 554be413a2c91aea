use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{parse_llm_provider_model, LlmConfig};
use crate::error::{BitesError, Result};
use crate::llm::api::LlmApiClient;
use crate::llm::backend::{BackendReply, ChatRequest, GenerativeBackend, SearchPrompt};
use crate::llm::gemini::GeminiClient;
use crate::llm::prompts;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmBackend {
    Gemini,
    OpenAI,
    OpenRouter,
    Ollama,
    LmStudio,
    OpenAICompatible { base_url: String },
    Unavailable { reason: String },
}

impl LlmBackend {
    fn from_model(model: &str, config: &LlmConfig) -> Self {
        let (provider, _model) = parse_llm_provider_model(model);

        match provider.to_lowercase().as_str() {
            "gemini" => LlmBackend::Gemini,
            "openai" => LlmBackend::OpenAI,
            "openrouter" => LlmBackend::OpenRouter,
            "ollama" => LlmBackend::Ollama,
            "lmstudio" => LlmBackend::LmStudio,
            _ => {
                if let Some(base_url) = &config.base_url {
                    LlmBackend::OpenAICompatible {
                        base_url: base_url.clone(),
                    }
                } else {
                    LlmBackend::Unavailable {
                        reason: format!("Unknown provider in model: {model}"),
                    }
                }
            }
        }
    }
}

/// Dispatches search and chat calls to the configured provider. Search and
/// chat may use different models, and therefore different backends.
#[derive(Debug, Clone)]
pub struct LlmProvider {
    backend: LlmBackend,
    chat_backend: LlmBackend,
    config: Option<Arc<LlmConfig>>,
}

impl LlmProvider {
    pub fn new(config: Option<&LlmConfig>) -> Self {
        let Some(config) = config else {
            return Self::unavailable("No LLM configuration provided");
        };

        Self {
            backend: LlmBackend::from_model(&config.model, config),
            chat_backend: LlmBackend::from_model(config.chat_model(), config),
            config: Some(Arc::new(config.clone())),
        }
    }

    pub fn unavailable(reason: &str) -> Self {
        let backend = LlmBackend::Unavailable {
            reason: reason.to_string(),
        };
        Self {
            chat_backend: backend.clone(),
            backend,
            config: None,
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.backend, LlmBackend::Unavailable { .. })
    }

    pub fn backend(&self) -> &LlmBackend {
        &self.backend
    }

    pub fn chat_backend(&self) -> &LlmBackend {
        &self.chat_backend
    }

    pub fn config(&self) -> Option<&LlmConfig> {
        self.config.as_deref()
    }

    fn require(&self, backend: &LlmBackend) -> Result<&LlmConfig> {
        if let LlmBackend::Unavailable { reason } = backend {
            return Err(BitesError::LlmUnavailable(reason.clone()));
        }

        self.config()
            .ok_or_else(|| BitesError::LlmUnavailable("No config available".to_string()))
    }
}

#[async_trait]
impl GenerativeBackend for LlmProvider {
    async fn search(&self, prompt: &SearchPrompt) -> Result<BackendReply> {
        let config = self.require(&self.backend)?;

        if self.backend == LlmBackend::Gemini {
            let client = GeminiClient::new(config, &config.model)?;
            let reply = client
                .search(
                    &prompt.system_instruction,
                    &prompt.query,
                    prompt.location.as_ref(),
                )
                .await?;
            return Ok(BackendReply {
                text: reply.text,
                citations: reply.citations,
            });
        }

        let client = LlmApiClient::new(config, &config.model)?;
        let user_prompt = prompts::search_user_prompt(&prompt.query, prompt.location.as_ref());
        let text = client
            .complete(&user_prompt, Some(&prompt.system_instruction))
            .await?;

        Ok(BackendReply {
            text,
            citations: None,
        })
    }

    async fn chat(&self, request: &ChatRequest) -> Result<String> {
        let config = self.require(&self.chat_backend)?;
        let model = config.chat_model();

        if self.chat_backend == LlmBackend::Gemini {
            let client = GeminiClient::new(config, model)?;
            let reply = client
                .chat(&request.system_instruction, &request.history, &request.message)
                .await?;
            return Ok(reply.text);
        }

        let client = LlmApiClient::new(config, model)?;
        client
            .chat(
                Some(&request.system_instruction),
                &request.history,
                &request.message,
            )
            .await
    }

    fn name(&self) -> &str {
        match &self.backend {
            LlmBackend::Gemini => "gemini",
            LlmBackend::OpenAI => "openai",
            LlmBackend::OpenRouter => "openrouter",
            LlmBackend::Ollama => "ollama",
            LlmBackend::LmStudio => "lmstudio",
            LlmBackend::OpenAICompatible { .. } => "openai-compatible",
            LlmBackend::Unavailable { .. } => "unavailable",
        }
    }
}
