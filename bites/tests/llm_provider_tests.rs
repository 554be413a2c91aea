mod common;

use serde_json::json;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use bites::error::BitesError;
use bites::llm::{
    ChatRequest, GenerativeBackend, LlmApiClient, LlmBackend, LlmProvider, SearchPrompt,
};
use bites::models::{GeoPoint, Transcript, ChatRole};

use common::{llm_config, llm_config_with_base_url};

fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1,
        "model": "gpt-4o-mini",
        "choices": [
            {
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": content
                },
                "finish_reason": "stop"
            }
        ],
        "usage": {
            "prompt_tokens": 1,
            "completion_tokens": 1,
            "total_tokens": 2
        }
    })
}

fn api_error_body(message: &str, error_type: &str, code: &str) -> serde_json::Value {
    json!({
        "error": {
            "message": message,
            "type": error_type,
            "param": serde_json::Value::Null,
            "code": code
        }
    })
}

fn search_prompt(query: &str, location: Option<GeoPoint>) -> SearchPrompt {
    SearchPrompt {
        system_instruction: "Reply with a json block".to_string(),
        query: query.to_string(),
        location,
    }
}

fn request_messages(request: &Request) -> Vec<serde_json::Value> {
    let body: serde_json::Value = serde_json::from_slice(&request.body).expect("json body");
    body["messages"].as_array().cloned().unwrap_or_default()
}

#[test]
fn test_openai_provider_detection() {
    let config = llm_config("openai/gpt-4o");
    let provider = LlmProvider::new(Some(&config));

    assert!(matches!(provider.backend(), LlmBackend::OpenAI));
    assert!(provider.is_available());
}

#[test]
fn test_gemini_provider_detection() {
    let config = llm_config("gemini/gemini-2.5-flash");
    let provider = LlmProvider::new(Some(&config));

    assert!(matches!(provider.backend(), LlmBackend::Gemini));
    assert!(matches!(provider.chat_backend(), LlmBackend::Gemini));
}

#[test]
fn test_unavailable_provider() {
    let provider = LlmProvider::new(None);

    assert!(matches!(provider.backend(), LlmBackend::Unavailable { .. }));
    assert!(!provider.is_available());
}

#[test]
fn test_api_client_uses_provider_default_base_url() {
    let config = llm_config("openrouter/openai/gpt-4o-mini");
    let client = LlmApiClient::new(&config, &config.model);

    match client {
        Ok(value) => {
            assert_eq!(value.base_url(), "https://openrouter.ai/api/v1");
            assert_eq!(value.model(), "openai/gpt-4o-mini");
        }
        Err(error) => panic!("Expected API client creation to succeed, got: {error}"),
    }
}

#[tokio::test]
async fn test_search_sends_system_prompt_and_location_hint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Hello from mock")))
        .expect(1)
        .mount(&server)
        .await;

    let config = llm_config_with_base_url("openai/gpt-4o-mini", format!("{}/v1", server.uri()), 1);
    let provider = LlmProvider::new(Some(&config));

    let reply = provider
        .search(&search_prompt(
            "ramen in Seoul, Korea",
            Some(GeoPoint {
                latitude: 37.5,
                longitude: 127.0,
            }),
        ))
        .await
        .expect("search should succeed");

    assert_eq!(reply.text, "Hello from mock");
    assert!(reply.citations.is_none());

    let requests = server.received_requests().await.expect("recorded requests");
    let messages = request_messages(&requests[0]);
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[0]["content"], "Reply with a json block");
    assert_eq!(messages[1]["role"], "user");
    let user = messages[1]["content"].as_str().expect("user content");
    assert!(user.starts_with("ramen in Seoul, Korea"));
    assert!(user.contains("latitude 37.500000"));
}

#[tokio::test]
async fn test_empty_content_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("")))
        .mount(&server)
        .await;

    let config = llm_config_with_base_url("openai/gpt-4o-mini", format!("{}/v1", server.uri()), 0);
    let provider = LlmProvider::new(Some(&config));

    let reply = provider
        .search(&search_prompt("anything", None))
        .await
        .expect("empty replies are passed through");
    assert_eq!(reply.text, "");
}

#[tokio::test]
async fn test_retry_on_server_error() {
    let server = MockServer::start().await;
    let attempts = Arc::new(AtomicUsize::new(0));
    let attempts_for_mock = Arc::clone(&attempts);

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(move |_request: &Request| {
            if attempts_for_mock.fetch_add(1, Ordering::SeqCst) == 0 {
                ResponseTemplate::new(500).set_body_string("upstream temporary failure")
            } else {
                ResponseTemplate::new(200).set_body_json(completion_body("Recovered response"))
            }
        })
        .mount(&server)
        .await;

    let config = llm_config_with_base_url("openai/gpt-4o-mini", format!("{}/v1", server.uri()), 2);
    let provider = LlmProvider::new(Some(&config));

    let result = provider.search(&search_prompt("Retry test", None)).await;

    match result {
        Ok(value) => assert_eq!(value.text, "Recovered response"),
        Err(error) => panic!("Expected retry completion to succeed, got: {error}"),
    }
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_rate_limit_handling() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "7")
                .set_body_json(api_error_body(
                    "Rate limit exceeded",
                    "insufficient_quota",
                    "insufficient_quota",
                )),
        )
        .mount(&server)
        .await;

    let config = llm_config_with_base_url("openai/gpt-4o-mini", format!("{}/v1", server.uri()), 1);
    let provider = LlmProvider::new(Some(&config));

    let result = provider.search(&search_prompt("Rate limit test", None)).await;

    assert!(matches!(
        result,
        Err(BitesError::LlmRateLimit { retry_after: None })
    ));
}

#[tokio::test]
async fn test_auth_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(api_error_body(
            "Invalid API key",
            "invalid_request_error",
            "invalid_api_key",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let config = llm_config_with_base_url("openai/gpt-4o-mini", format!("{}/v1", server.uri()), 3);
    let provider = LlmProvider::new(Some(&config));

    let result = provider.search(&search_prompt("Auth test", None)).await;

    match result {
        Err(BitesError::Llm(message)) => assert!(message.contains("authentication")),
        other => panic!("Expected authentication error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_chat_replays_transcript_with_roles() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Try Tosokchon.")))
        .expect(1)
        .mount(&server)
        .await;

    let mut config =
        llm_config_with_base_url("gemini/gemini-2.5-flash", format!("{}/v1", server.uri()), 0);
    config.chat_model = Some("openai/gpt-4o-mini".to_string());
    let provider = LlmProvider::new(Some(&config));

    let mut transcript = Transcript::with_greeting("Annyeong!");
    transcript.push(ChatRole::User, "What is samgyetang?");
    transcript.push(ChatRole::Assistant, "Ginseng chicken soup.");

    let reply = provider
        .chat(&ChatRequest {
            system_instruction: "You know Seoul.".to_string(),
            history: transcript.messages().to_vec(),
            message: "Where should I eat it?".to_string(),
        })
        .await
        .expect("chat should succeed");
    assert_eq!(reply, "Try Tosokchon.");

    let requests = server.received_requests().await.expect("recorded requests");
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).expect("json");
    assert_eq!(body["model"], "gpt-4o-mini");
    let roles: Vec<&str> = body["messages"]
        .as_array()
        .expect("messages")
        .iter()
        .map(|m| m["role"].as_str().unwrap_or_default())
        .collect();
    assert_eq!(roles, vec!["system", "assistant", "user", "assistant", "user"]);
}
