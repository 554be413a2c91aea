use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::{ApiError, OpenAIError},
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
    },
    Client,
};

use crate::{
    config::{parse_llm_provider_model, LlmConfig},
    error::{BitesError, Result},
    models::{ChatMessage, ChatRole},
};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";
const LMSTUDIO_BASE_URL: &str = "http://localhost:1234/v1";

#[derive(Debug, Clone)]
struct ApiConfig {
    base_url: String,
    api_key: Option<String>,
    model: String,
    timeout_secs: u64,
    max_retries: u32,
}

/// Client for OpenAI-compatible chat completion endpoints.
#[derive(Clone)]
pub struct LlmApiClient {
    client: Client<OpenAIConfig>,
    config: ApiConfig,
}

impl LlmApiClient {
    /// `model` is a `provider/model` string; the provider picks the default
    /// base URL and whether an API key is required.
    pub fn new(config: &LlmConfig, model: &str) -> Result<Self> {
        let api_config = ApiConfig::from_llm_config(config, model);

        let (provider, _) = parse_llm_provider_model(model);
        let needs_api_key = !matches!(
            provider.to_lowercase().as_str(),
            "ollama" | "local" | "lmstudio"
        );

        if needs_api_key && api_config.api_key.is_none() {
            return Err(BitesError::Llm(
                "API key required for this provider".to_string(),
            ));
        }

        let openai_config = OpenAIConfig::new()
            .with_api_base(api_config.base_url.clone())
            .with_api_key(api_config.api_key.clone().unwrap_or_default());

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(api_config.timeout_secs))
            .build()
            .map_err(|error| {
                BitesError::Llm(format!("Failed to create LLM HTTP client: {error}"))
            })?;

        // async-openai retries 5xx internally; cap that at our own timeout.
        let backoff = backoff::ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(api_config.timeout_secs)),
            ..Default::default()
        };

        let client = Client::with_config(openai_config)
            .with_http_client(http_client)
            .with_backoff(backoff);

        Ok(Self {
            client,
            config: api_config,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Single-turn completion. The reply may be empty.
    pub async fn complete(&self, prompt: &str, system_prompt: Option<&str>) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(BitesError::Validation("Prompt cannot be empty".to_string()));
        }

        self.send(|| self.build_request(&[], prompt, system_prompt))
            .await
    }

    /// Multi-turn completion replaying `history` before `message`.
    pub async fn chat(
        &self,
        system_prompt: Option<&str>,
        history: &[ChatMessage],
        message: &str,
    ) -> Result<String> {
        if message.trim().is_empty() {
            return Err(BitesError::Validation("Message cannot be empty".to_string()));
        }

        self.send(|| self.build_request(history, message, system_prompt))
            .await
    }

    async fn send<F>(&self, build: F) -> Result<String>
    where
        F: Fn() -> Result<CreateChatCompletionRequest>,
    {
        let mut last_error: Option<BitesError> = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay_ms = 100 * 2_u64.pow(attempt - 1);
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }

            let request = build()?;

            match self.client.chat().create(request).await {
                Ok(response) => return Self::extract_content(response),
                Err(error) => {
                    if let Some(rate_limit_error) = Self::rate_limit_error(&error) {
                        return Err(rate_limit_error);
                    }

                    if let Some(auth_error) = Self::auth_error(&error) {
                        return Err(auth_error);
                    }

                    let retryable = Self::is_retryable(&error);
                    let mapped_error = Self::map_openai_error(error);

                    if retryable && attempt < self.config.max_retries {
                        tracing::debug!(attempt, error = %mapped_error, "Retrying LLM request");
                        last_error = Some(mapped_error);
                        continue;
                    }

                    return Err(mapped_error);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| BitesError::Llm("LLM completion failed after retries".to_string())))
    }

    fn build_request(
        &self,
        history: &[ChatMessage],
        prompt: &str,
        system_prompt: Option<&str>,
    ) -> Result<CreateChatCompletionRequest> {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::new();

        if let Some(system_prompt) = system_prompt.filter(|value| !value.trim().is_empty()) {
            messages.push(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system_prompt)
                    .build()
                    .map_err(|error| {
                        BitesError::Validation(format!("Invalid system prompt: {error}"))
                    })?
                    .into(),
            );
        }

        for turn in history {
            messages.push(Self::history_message(turn)?);
        }

        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|error| BitesError::Validation(format!("Invalid user prompt: {error}")))?
                .into(),
        );

        let mut request = CreateChatCompletionRequestArgs::default();
        request.model(self.config.model.clone()).messages(messages);

        request.build().map_err(|error| {
            BitesError::Validation(format!("Invalid LLM completion request: {error}"))
        })
    }

    fn history_message(turn: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
        let message = match turn.role {
            ChatRole::User => ChatCompletionRequestUserMessageArgs::default()
                .content(turn.text.as_str())
                .build()
                .map_err(|error| BitesError::Validation(format!("Invalid history turn: {error}")))?
                .into(),
            ChatRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                .content(turn.text.as_str())
                .build()
                .map_err(|error| BitesError::Validation(format!("Invalid history turn: {error}")))?
                .into(),
        };
        Ok(message)
    }

    fn extract_content(response: CreateChatCompletionResponse) -> Result<String> {
        let message = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| BitesError::Llm("LLM response contained no choices".to_string()))?
            .message
            .content
            .unwrap_or_default();

        if message.trim().is_empty() {
            tracing::debug!("LLM response contained empty content");
        }

        Ok(message)
    }

    fn is_retryable(error: &OpenAIError) -> bool {
        match error {
            OpenAIError::ApiError(api_error) => {
                api_error.r#type.is_none() && api_error.code.is_none()
            }
            OpenAIError::Reqwest(reqwest_error) => reqwest_error
                .status()
                .map(|status| status.is_server_error())
                .unwrap_or(true),
            _ => false,
        }
    }

    fn rate_limit_error(error: &OpenAIError) -> Option<BitesError> {
        match error {
            OpenAIError::Reqwest(reqwest_error)
                if reqwest_error.status() == Some(reqwest::StatusCode::TOO_MANY_REQUESTS) =>
            {
                Some(BitesError::LlmRateLimit { retry_after: None })
            }
            OpenAIError::ApiError(api_error) if Self::is_rate_limit_api_error(api_error) => {
                Some(BitesError::LlmRateLimit { retry_after: None })
            }
            _ => None,
        }
    }

    fn auth_error(error: &OpenAIError) -> Option<BitesError> {
        match error {
            OpenAIError::Reqwest(reqwest_error)
                if reqwest_error.status() == Some(reqwest::StatusCode::UNAUTHORIZED)
                    || reqwest_error.status() == Some(reqwest::StatusCode::FORBIDDEN) =>
            {
                Some(BitesError::Llm(format!(
                    "LLM authentication failed: {reqwest_error}"
                )))
            }
            OpenAIError::ApiError(api_error) if Self::is_auth_api_error(api_error) => Some(
                BitesError::Llm(format!("LLM authentication failed: {api_error}")),
            ),
            _ => None,
        }
    }

    fn is_rate_limit_api_error(api_error: &ApiError) -> bool {
        let message = api_error.message.to_lowercase();
        let error_type = api_error.r#type.clone().unwrap_or_default().to_lowercase();
        let code = api_error.code.clone().unwrap_or_default().to_lowercase();

        message.contains("rate limit")
            || message.contains("too many requests")
            || error_type.contains("rate_limit")
            || code.contains("rate_limit")
            || code == "insufficient_quota"
    }

    fn is_auth_api_error(api_error: &ApiError) -> bool {
        let message = api_error.message.to_lowercase();
        let error_type = api_error.r#type.clone().unwrap_or_default().to_lowercase();
        let code = api_error.code.clone().unwrap_or_default().to_lowercase();

        message.contains("unauthorized")
            || message.contains("forbidden")
            || message.contains("authentication")
            || message.contains("invalid api key")
            || code.contains("invalid_api_key")
            || code.contains("authentication")
            || error_type.contains("authentication")
    }

    fn map_openai_error(error: OpenAIError) -> BitesError {
        match error {
            OpenAIError::Reqwest(reqwest_error) => {
                BitesError::Llm(format!("LLM request failed: {reqwest_error}"))
            }
            OpenAIError::ApiError(api_error) => {
                BitesError::Llm(format!("LLM API error: {api_error}"))
            }
            OpenAIError::JSONDeserialize(err) => {
                BitesError::Llm(format!("Failed to parse LLM response: {err}"))
            }
            OpenAIError::InvalidArgument(message) => BitesError::Validation(message),
            other => BitesError::Llm(other.to_string()),
        }
    }
}

impl ApiConfig {
    fn from_llm_config(config: &LlmConfig, model: &str) -> Self {
        let (provider, bare_model) = parse_llm_provider_model(model);

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url(provider).to_string());

        let normalized_model = if provider.eq_ignore_ascii_case("local") {
            model.to_string()
        } else {
            bare_model.to_string()
        };

        Self {
            base_url,
            api_key: config.api_key.clone(),
            model: normalized_model,
            timeout_secs: config.timeout_secs,
            max_retries: config.max_retries,
        }
    }
}

fn default_base_url(provider: &str) -> &'static str {
    match provider.to_lowercase().as_str() {
        "openai" => OPENAI_BASE_URL,
        "openrouter" => OPENROUTER_BASE_URL,
        "ollama" => OLLAMA_BASE_URL,
        "lmstudio" => LMSTUDIO_BASE_URL,
        _ => OPENAI_BASE_URL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Transcript;

    fn test_llm_config() -> LlmConfig {
        LlmConfig {
            model: "ollama/llama3".to_string(),
            chat_model: None,
            api_key: None,
            base_url: None,
            timeout_secs: 30,
            max_retries: 0,
        }
    }

    #[test]
    fn test_provider_prefix_is_stripped_from_model() {
        let client = LlmApiClient::new(&test_llm_config(), "ollama/llama3").expect("client");
        assert_eq!(client.model(), "llama3");
        assert_eq!(client.config.base_url, OLLAMA_BASE_URL);
    }

    #[test]
    fn test_hosted_provider_requires_api_key() {
        let result = LlmApiClient::new(&test_llm_config(), "openai/gpt-4o-mini");
        assert!(matches!(result, Err(BitesError::Llm(_))));
    }

    #[test]
    fn test_request_replays_history_in_order() {
        let client = LlmApiClient::new(&test_llm_config(), "ollama/llama3").expect("client");
        let mut transcript = Transcript::with_greeting("Hello!");
        transcript.push(ChatRole::User, "What is bibimbap?");
        transcript.push(ChatRole::Assistant, "A mixed rice bowl.");

        let request = client
            .build_request(transcript.messages(), "Where to eat it?", Some("Be nice"))
            .expect("request should build");

        // system + 3 history turns + new message
        assert_eq!(request.messages.len(), 5);
        assert!(matches!(
            request.messages[0],
            ChatCompletionRequestMessage::System(_)
        ));
        assert!(matches!(
            request.messages[1],
            ChatCompletionRequestMessage::Assistant(_)
        ));
        assert!(matches!(
            request.messages[2],
            ChatCompletionRequestMessage::User(_)
        ));
        assert!(matches!(
            request.messages[4],
            ChatCompletionRequestMessage::User(_)
        ));
    }

    #[test]
    fn test_blank_system_prompt_is_skipped() {
        let client = LlmApiClient::new(&test_llm_config(), "ollama/llama3").expect("client");
        let request = client
            .build_request(&[], "hi", Some("   "))
            .expect("request should build");
        assert_eq!(request.messages.len(), 1);
    }
}
