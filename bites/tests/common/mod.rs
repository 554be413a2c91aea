// Shared helpers for integration tests
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use tokio::sync::Notify;

use bites::config::LlmConfig;
use bites::error::{BitesError, Result};
use bites::llm::{BackendReply, ChatRequest, GenerativeBackend, SearchPrompt};

static INIT: Once = Once::new();

/// Initialize tracing subscriber once for tests
pub fn init_test_logger() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn llm_config(model: &str) -> LlmConfig {
    LlmConfig {
        model: model.to_string(),
        chat_model: None,
        api_key: Some("test-key".to_string()),
        base_url: None,
        timeout_secs: 30,
        max_retries: 3,
    }
}

pub fn llm_config_with_base_url(model: &str, base_url: String, max_retries: u32) -> LlmConfig {
    LlmConfig {
        model: model.to_string(),
        chat_model: None,
        api_key: Some("test-key".to_string()),
        base_url: Some(base_url),
        timeout_secs: 5,
        max_retries,
    }
}

/// A reply in the format the search prompt asks for.
pub const GWANGJANG_REPLY: &str = "```json\n[\n  {\"name\": \"Gwangjang Market\", \"latitude\": 37.5701, \"longitude\": 126.9996, \"description\": \"Bindaetteok and mayak gimbap\", \"price\": \"$\"},\n  {\"name\": \"Secret Stall\", \"description\": \"No address given\"}\n]\n```\n\n## Why these\n* **Gwangjang Market** is the classic cheap eat.";

/// One scripted step of a [`ScriptedBackend`].
pub enum Step {
    Reply(String),
    Fail,
    /// Wait for the notify, then reply.
    Gated(Arc<Notify>, String),
}

/// Backend that plays back scripted steps in call order and records what it
/// was asked.
#[derive(Default)]
pub struct ScriptedBackend {
    steps: Mutex<VecDeque<Step>>,
    pub searches: Mutex<Vec<SearchPrompt>>,
    pub chats: Mutex<Vec<ChatRequest>>,
}

impl ScriptedBackend {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            ..Default::default()
        })
    }

    pub fn replying(text: &str) -> Arc<Self> {
        Self::new(vec![Step::Reply(text.to_string())])
    }

    pub fn search_count(&self) -> usize {
        self.searches.lock().unwrap().len()
    }

    async fn next(&self) -> Result<String> {
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Step::Reply("(no more scripted replies)".to_string()));

        match step {
            Step::Reply(text) => Ok(text),
            Step::Fail => Err(BitesError::Llm("scripted failure".to_string())),
            Step::Gated(gate, text) => {
                gate.notified().await;
                Ok(text)
            }
        }
    }
}

#[async_trait]
impl GenerativeBackend for ScriptedBackend {
    async fn search(&self, prompt: &SearchPrompt) -> Result<BackendReply> {
        self.searches.lock().unwrap().push(prompt.clone());
        let text = self.next().await?;
        Ok(BackendReply {
            text,
            citations: None,
        })
    }

    async fn chat(&self, request: &ChatRequest) -> Result<String> {
        self.chats.lock().unwrap().push(request.clone());
        self.next().await
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
