//! Native Gemini `generateContent` client with Search and Maps grounding.

use std::time::Duration;

use reqwest::{header::RETRY_AFTER, Client, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{parse_llm_provider_model, LlmConfig};
use crate::error::{BitesError, Result};
use crate::models::{ChatMessage, ChatRole, Citation, CitationMetadata, GeoPoint};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const API_KEY_HEADER: &str = "x-goog-api-key";

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_config: Option<ToolConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum Tool {
    GoogleSearch {},
    GoogleMaps {},
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolConfig {
    retrieval_config: RetrievalConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrievalConfig {
    lat_lng: LatLng,
}

#[derive(Debug, Serialize)]
struct LatLng {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Default, Deserialize)]
struct GroundingChunk {
    #[serde(default)]
    web: Option<WebChunk>,
    #[serde(default)]
    maps: Option<MapsChunk>,
}

#[derive(Debug, Default, Deserialize)]
struct WebChunk {
    #[serde(default)]
    uri: String,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapsChunk {
    #[serde(default)]
    uri: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    place_answer_sources: Option<PlaceAnswerSources>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaceAnswerSources {
    #[serde(default)]
    review_snippets: Vec<ReviewSnippet>,
}

#[derive(Debug, Default, Deserialize)]
struct ReviewSnippet {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: Option<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    code: u16,
    message: String,
}

/// Text and grounding citations from one `generateContent` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeminiReply {
    pub text: String,
    pub citations: Option<CitationMetadata>,
}

// ============================================================================
// Client
// ============================================================================

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_retries: u32,
}

impl GeminiClient {
    /// `model` is a `gemini/<model>` string.
    pub fn new(config: &LlmConfig, model: &str) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| BitesError::Llm("API key required for Gemini".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| {
                BitesError::Llm(format!("Failed to create Gemini HTTP client: {error}"))
            })?;

        let (_, bare_model) = parse_llm_provider_model(model);

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| GEMINI_BASE_URL.to_string());
        Url::parse(&base_url)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: bare_model.to_string(),
            max_retries: config.max_retries,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Grounded search with Google Search and Google Maps tools enabled.
    pub async fn search(
        &self,
        system_instruction: &str,
        query: &str,
        location: Option<&GeoPoint>,
    ) -> Result<GeminiReply> {
        let request = GenerateContentRequest {
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part {
                    text: system_instruction,
                }],
            }),
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: query }],
            }],
            tools: vec![Tool::GoogleSearch {}, Tool::GoogleMaps {}],
            tool_config: location.map(|point| ToolConfig {
                retrieval_config: RetrievalConfig {
                    lat_lng: LatLng {
                        latitude: point.latitude,
                        longitude: point.longitude,
                    },
                },
            }),
        };

        self.generate(&request).await
    }

    /// Ungrounded multi-turn conversation replaying `history`.
    pub async fn chat(
        &self,
        system_instruction: &str,
        history: &[ChatMessage],
        message: &str,
    ) -> Result<GeminiReply> {
        let mut contents: Vec<Content<'_>> = history
            .iter()
            .map(|turn| Content {
                role: Some(match turn.role {
                    ChatRole::User => "user",
                    ChatRole::Assistant => "model",
                }),
                parts: vec![Part { text: &turn.text }],
            })
            .collect();
        contents.push(Content {
            role: Some("user"),
            parts: vec![Part { text: message }],
        });

        let request = GenerateContentRequest {
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part {
                    text: system_instruction,
                }],
            }),
            contents,
            tools: Vec::new(),
            tool_config: None,
        };

        self.generate(&request).await
    }

    async fn generate(&self, request: &GenerateContentRequest<'_>) -> Result<GeminiReply> {
        let mut last_error: Option<BitesError> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay_ms = 100 * 2_u64.pow(attempt - 1);
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }

            match self.generate_once(request).await {
                Ok(reply) => return Ok(reply),
                Err(error) if error.is_transient() && attempt < self.max_retries => {
                    tracing::debug!(attempt, error = %error, "Retrying Gemini request");
                    last_error = Some(error);
                }
                Err(error) => return Err(error),
            }
        }

        Err(last_error
            .unwrap_or_else(|| BitesError::Llm("Gemini request failed after retries".to_string())))
    }

    async fn generate_once(&self, request: &GenerateContentRequest<'_>) -> Result<GeminiReply> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| BitesError::Http(e.without_url()))?;

        let status = response.status();

        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok());

            let error_body = response.text().await.unwrap_or_default();
            let error_detail = serde_json::from_str::<GeminiErrorResponse>(&error_body)
                .ok()
                .and_then(|e| e.error);

            let (code, message) = error_detail
                .map(|e| (e.code, e.message))
                .unwrap_or((status.as_u16(), error_body));

            tracing::error!(code = code, message = %message, "Gemini API error");

            return Err(Self::map_status(status, retry_after, message));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| BitesError::Http(e.without_url()))?;
        Ok(Self::into_reply(body))
    }

    fn map_status(status: StatusCode, retry_after: Option<u64>, message: String) -> BitesError {
        match status {
            StatusCode::TOO_MANY_REQUESTS => BitesError::LlmRateLimit { retry_after },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                BitesError::LlmUnavailable(format!("Gemini authentication failed: {message}"))
            }
            s if s.is_server_error() => BitesError::Llm(format!("Gemini API error ({s}): {message}")),
            s => BitesError::Validation(format!("Gemini rejected the request ({s}): {message}")),
        }
    }

    fn into_reply(body: GenerateContentResponse) -> GeminiReply {
        let Some(candidate) = body.candidates.into_iter().next() else {
            tracing::debug!("Gemini response contained no candidates");
            return GeminiReply::default();
        };

        let text = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        let entries: Vec<Citation> = candidate
            .grounding_metadata
            .map(|metadata| {
                metadata
                    .grounding_chunks
                    .into_iter()
                    .filter_map(chunk_to_citation)
                    .collect()
            })
            .unwrap_or_default();

        GeminiReply {
            text,
            citations: (!entries.is_empty()).then(|| CitationMetadata::new(entries)),
        }
    }
}

fn chunk_to_citation(chunk: GroundingChunk) -> Option<Citation> {
    if let Some(web) = chunk.web {
        return Some(Citation::Web {
            uri: web.uri,
            title: web.title,
        });
    }

    chunk.maps.map(|maps| Citation::Maps {
        uri: maps.uri,
        title: maps.title,
        review_snippets: maps
            .place_answer_sources
            .map(|sources| {
                sources
                    .review_snippets
                    .into_iter()
                    .map(|snippet| snippet.content)
                    .filter(|content| !content.is_empty())
                    .collect()
            })
            .unwrap_or_default(),
    })
}
