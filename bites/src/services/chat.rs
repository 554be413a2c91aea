use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::config::LocaleConfig;
use crate::error::{BitesError, Result};
use crate::llm::{prompts, ChatRequest, GenerativeBackend};
use crate::models::{ChatMessage, ChatRole, Transcript};

pub const CHAT_GREETING: &str = "Annyeonghaseyo! I'm your Seoul dining expert. Ask me anything about Korean cuisine, dining etiquette, or food history!";
pub const CHAT_FAILURE_APOLOGY: &str =
    "I'm having trouble connecting right now. Please try again later.";

/// Transcript plus the "assistant is typing" flag.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ChatView {
    pub messages: Vec<ChatMessage>,
    pub pending: bool,
}

/// One completed turn.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ChatExchange {
    pub user: ChatMessage,
    pub reply: ChatMessage,
    /// The reply is the connection apology, not backend output.
    pub failed: bool,
}

#[derive(Debug)]
struct ChatState {
    transcript: Transcript,
    pending: bool,
    session: u64,
}

/// Owns the conversation and forwards each turn, with the full transcript,
/// to the backend.
#[derive(Clone)]
pub struct ChatOrchestrator {
    backend: Arc<dyn GenerativeBackend>,
    system_instruction: String,
    state: Arc<Mutex<ChatState>>,
}

impl ChatOrchestrator {
    pub fn new(backend: Arc<dyn GenerativeBackend>, locale: &LocaleConfig) -> Self {
        Self {
            backend,
            system_instruction: prompts::chat_system_prompt(&locale.city, &locale.country),
            state: Arc::new(Mutex::new(ChatState {
                transcript: Transcript::with_greeting(CHAT_GREETING),
                pending: false,
                session: 0,
            })),
        }
    }

    pub async fn view(&self) -> ChatView {
        let state = self.state.lock().await;
        ChatView {
            messages: state.transcript.messages().to_vec(),
            pending: state.pending,
        }
    }

    /// Start over with only the greeting. A reply still in flight for the
    /// old conversation is dropped when it arrives.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.transcript = Transcript::with_greeting(CHAT_GREETING);
        state.pending = false;
        state.session += 1;
    }

    /// Append the user turn, ask the backend, append its reply.
    ///
    /// Fails only for blank messages or while another reply is pending;
    /// backend errors become the apology message. The backend call runs on
    /// its own task, so dropping the returned future still completes the
    /// turn and clears the pending flag.
    pub async fn send(&self, message: &str) -> Result<ChatExchange> {
        let message = message.trim();
        if message.is_empty() {
            return Err(BitesError::Validation("Message cannot be empty".to_string()));
        }

        let (user, history, session) = {
            let mut state = self.state.lock().await;
            if state.pending {
                return Err(BitesError::Conflict(
                    "A reply is still pending for the previous message".to_string(),
                ));
            }

            let history = state.transcript.messages().to_vec();
            let user = state.transcript.push(ChatRole::User, message).clone();
            state.pending = true;
            (user, history, state.session)
        };

        let request = ChatRequest {
            system_instruction: self.system_instruction.clone(),
            history,
            message: message.to_string(),
        };

        let turn = tokio::spawn({
            let orchestrator = self.clone();
            async move { orchestrator.complete_turn(request, session).await }
        });

        match turn.await {
            Ok((reply, failed)) => Ok(ChatExchange {
                user,
                reply,
                failed,
            }),
            Err(e) => {
                tracing::error!(error = %e, "Chat turn task failed");
                let mut state = self.state.lock().await;
                if state.session == session {
                    state.pending = false;
                }
                Err(BitesError::Internal("Chat turn did not complete".to_string()))
            }
        }
    }

    async fn complete_turn(&self, request: ChatRequest, session: u64) -> (ChatMessage, bool) {
        tracing::debug!(
            backend = self.backend.name(),
            turns = request.history.len(),
            "Sending chat turn"
        );

        let (text, failed) = match self.backend.chat(&request).await {
            Ok(text) => (text, false),
            Err(e) => {
                tracing::error!(error = %e, "Chat backend failed");
                (CHAT_FAILURE_APOLOGY.to_string(), true)
            }
        };

        let mut state = self.state.lock().await;
        if state.session != session {
            tracing::debug!("Chat was reset while waiting, dropping reply");
            let mut detached = Transcript::new();
            let reply = detached.push(ChatRole::Assistant, text).clone();
            return (reply, failed);
        }

        let reply = state.transcript.push(ChatRole::Assistant, text).clone();
        state.pending = false;
        (reply, failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{BackendReply, SearchPrompt};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct EchoBackend {
        fail: bool,
        gate: Option<Arc<Notify>>,
        requests: StdMutex<Vec<ChatRequest>>,
    }

    #[async_trait]
    impl GenerativeBackend for EchoBackend {
        async fn search(&self, _prompt: &SearchPrompt) -> Result<BackendReply> {
            unreachable!("chat tests never search")
        }

        async fn chat(&self, request: &ChatRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail {
                return Err(BitesError::Llm("unreachable host".into()));
            }
            Ok(format!("You said: {}", request.message))
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    fn chat(backend: Arc<EchoBackend>) -> ChatOrchestrator {
        ChatOrchestrator::new(backend, &LocaleConfig::default())
    }

    #[tokio::test]
    async fn transcript_starts_with_greeting() {
        let view = chat(Arc::new(EchoBackend::default())).view().await;
        assert_eq!(view.messages.len(), 1);
        assert_eq!(view.messages[0].id, "init");
        assert_eq!(view.messages[0].role, ChatRole::Assistant);
        assert_eq!(view.messages[0].text, CHAT_GREETING);
        assert!(!view.pending);
    }

    #[tokio::test]
    async fn turn_appends_user_then_assistant_and_replays_history() {
        let backend = Arc::new(EchoBackend::default());
        let chat = chat(backend.clone());

        chat.send("What is tteokbokki?").await.expect("first turn");
        let exchange = chat.send("Is it spicy?").await.expect("second turn");

        assert_eq!(exchange.reply.text, "You said: Is it spicy?");
        assert!(!exchange.failed);

        let view = chat.view().await;
        let roles: Vec<ChatRole> = view.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                ChatRole::Assistant,
                ChatRole::User,
                ChatRole::Assistant,
                ChatRole::User,
                ChatRole::Assistant,
            ]
        );

        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests[1].history.len(), 3);
        assert_eq!(requests[1].message, "Is it spicy?");
    }

    #[tokio::test]
    async fn backend_failure_becomes_apology_message() {
        let chat = chat(Arc::new(EchoBackend {
            fail: true,
            ..Default::default()
        }));
        let exchange = chat.send("hello").await.expect("turn");
        assert!(exchange.failed);
        assert_eq!(exchange.reply.text, CHAT_FAILURE_APOLOGY);
        assert!(!chat.view().await.pending);
    }

    #[tokio::test]
    async fn blank_message_is_rejected() {
        let chat = chat(Arc::new(EchoBackend::default()));
        assert!(matches!(
            chat.send("  \n").await,
            Err(BitesError::Validation(_))
        ));
        assert_eq!(chat.view().await.messages.len(), 1);
    }

    #[tokio::test]
    async fn second_send_while_pending_is_rejected() {
        let gate = Arc::new(Notify::new());
        let chat = chat(Arc::new(EchoBackend {
            gate: Some(gate.clone()),
            ..Default::default()
        }));

        let first = tokio::spawn({
            let chat = chat.clone();
            async move { chat.send("first").await }
        });

        while !chat.view().await.pending {
            tokio::task::yield_now().await;
        }

        // user message is visible before the reply arrives
        assert_eq!(chat.view().await.messages.len(), 2);
        assert!(matches!(
            chat.send("second").await,
            Err(BitesError::Conflict(_))
        ));

        gate.notify_one();
        first.await.expect("join").expect("first turn");
        let view = chat.view().await;
        assert!(!view.pending);
        assert_eq!(view.messages.len(), 3);
    }

    #[tokio::test]
    async fn abandoned_send_still_completes_the_turn() {
        let gate = Arc::new(Notify::new());
        let chat = chat(Arc::new(EchoBackend {
            gate: Some(gate.clone()),
            ..Default::default()
        }));

        let caller = tokio::spawn({
            let chat = chat.clone();
            async move { chat.send("hello").await }
        });
        while !chat.view().await.pending {
            tokio::task::yield_now().await;
        }

        caller.abort();
        assert!(caller.await.expect_err("aborted").is_cancelled());

        gate.notify_one();
        while chat.view().await.pending {
            tokio::task::yield_now().await;
        }

        let view = chat.view().await;
        assert_eq!(view.messages.len(), 3);
        assert_eq!(view.messages[2].text, "You said: hello");

        gate.notify_one();
        let exchange = chat.send("second").await.expect("next turn is accepted");
        assert_eq!(exchange.reply.text, "You said: second");
    }

    #[tokio::test]
    async fn reset_reseeds_greeting() {
        let chat = chat(Arc::new(EchoBackend::default()));
        chat.send("hi").await.expect("turn");
        chat.reset().await;
        let view = chat.view().await;
        assert_eq!(view.messages.len(), 1);
        assert_eq!(view.messages[0].id, "init");
    }
}
