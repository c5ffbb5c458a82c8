use std::sync::{Arc, RwLock};

use super::models::Transcript;
use crate::openai::{FALLBACK_RESPONSE, Message, PromptClient};

/// Drives a single chat session: takes user input, records it in the
/// transcript and records the reply once the LLM responds.
///
/// Cheap to clone, clones share the same transcript.
///
/// Use `ChatBuilder::new()` to construct a `Chat`.
#[derive(Clone)]
pub struct Chat {
    client: Arc<PromptClient>,
    transcript: Arc<RwLock<Transcript>>,
}

impl Chat {
    /// Runs the next turn in the chat. Blank input is ignored and
    /// returns `None` without touching the transcript. Otherwise the
    /// user message is appended right away and the assistant message
    /// is appended when the reply arrives.
    ///
    /// Both appends go onto whatever the transcript holds at that
    /// moment so overlapping turns never drop each other's messages.
    /// The lock is never held while waiting on the LLM.
    ///
    /// The request and the second append run in their own task so a
    /// turn always finishes, even if the caller stops waiting on it
    /// (e.g. the HTTP client disconnects).
    pub async fn submit(&self, input: &str) -> Option<Message> {
        if input.trim().is_empty() {
            return None;
        }

        self.push(Message::user(input));

        let chat = self.clone();
        let question = input.to_string();
        let turn = tokio::spawn(async move {
            let reply = chat.client.send_prompt(&question).await;
            let assistant_msg = Message::assistant(&reply);
            chat.push(assistant_msg.clone());
            assistant_msg
        });

        match turn.await {
            Ok(assistant_msg) => Some(assistant_msg),
            Err(e) => {
                // Still owe the transcript a reply for the user message
                tracing::error!("Chat turn failed: {}", e);
                let assistant_msg = Message::assistant(FALLBACK_RESPONSE);
                self.push(assistant_msg.clone());
                Some(assistant_msg)
            }
        }
    }

    pub fn messages(&self) -> Vec<Message> {
        self.transcript
            .read()
            .expect("Unable to read transcript")
            .messages()
    }

    fn push(&self, msg: Message) {
        self.transcript
            .write()
            .expect("Unable to write transcript")
            .push(msg);
    }
}

pub struct ChatBuilder {
    client: Arc<PromptClient>,
    transcript: Transcript,
}

impl ChatBuilder {
    pub fn new(client: Arc<PromptClient>) -> Self {
        Self {
            client,
            transcript: Transcript::new(),
        }
    }

    pub fn build(self) -> Chat {
        Chat {
            client: self.client,
            transcript: Arc::new(RwLock::new(self.transcript)),
        }
    }

    pub fn transcript(mut self, messages: Vec<Message>) -> Self {
        self.transcript = Transcript::new_with_messages(messages);
        self
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use http::StatusCode;

    use super::*;
    use crate::openai::{CompletionApi, CompletionError, Role};

    /// Echoes the prompt back. Prompts starting with "slow" take a
    /// while to answer.
    #[derive(Default)]
    struct EchoApi {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CompletionApi for EchoApi {
        async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if prompt.starts_with("slow") {
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
            Ok(format!("echo: {}", prompt))
        }
    }

    struct FailingApi;

    #[async_trait]
    impl CompletionApi for FailingApi {
        async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
            Err(CompletionError::Status(StatusCode::UNAUTHORIZED))
        }
    }

    fn echo_chat() -> (Chat, Arc<AtomicUsize>) {
        let api = EchoApi::default();
        let calls = Arc::clone(&api.calls);
        let client = Arc::new(PromptClient::new(Box::new(api)));
        (ChatBuilder::new(client).build(), calls)
    }

    #[tokio::test]
    async fn test_submit_appends_user_then_assistant() {
        let (chat, calls) = echo_chat();

        let reply = chat.submit("What is Rust?").await.expect("Should reply");

        assert_eq!(reply.role(), Role::Assistant);
        assert_eq!(reply.content(), "echo: What is Rust?");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let messages = chat.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], Message::user("What is Rust?"));
        assert_eq!(messages[1], reply);
    }

    #[tokio::test]
    async fn test_submit_ignores_blank_input() {
        let (chat, calls) = echo_chat();

        assert!(chat.submit("").await.is_none());
        assert!(chat.submit("   \t\n").await.is_none());

        assert!(chat.messages().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_submit_sends_raw_input() {
        let (chat, _calls) = echo_chat();

        let reply = chat.submit("  padded  ").await.unwrap();

        assert_eq!(reply.content(), "echo:   padded  ");
        assert_eq!(chat.messages()[0].content(), "  padded  ");
    }

    #[tokio::test]
    async fn test_submit_failure_becomes_fallback_message() {
        let client = Arc::new(PromptClient::new(Box::new(FailingApi)));
        let chat = ChatBuilder::new(client).build();

        let reply = chat.submit("Hi").await.unwrap();

        assert_eq!(reply.content(), FALLBACK_RESPONSE);
        assert_eq!(chat.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_builder_transcript() {
        let (chat, _calls) = echo_chat();
        let client = Arc::clone(&chat.client);
        let chat = ChatBuilder::new(client)
            .transcript(vec![Message::user("earlier"), Message::assistant("reply")])
            .build();

        chat.submit("later").await;

        let contents: Vec<String> = chat
            .messages()
            .iter()
            .map(|m| m.content().to_string())
            .collect();
        assert_eq!(contents, vec!["earlier", "reply", "later", "echo: later"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_submits_keep_every_message() {
        let (chat, calls) = echo_chat();

        let (slow, fast) = tokio::join!(chat.submit("slow question"), chat.submit("quick question"));

        assert_eq!(slow.unwrap().content(), "echo: slow question");
        assert_eq!(fast.unwrap().content(), "echo: quick question");
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let messages = chat.messages();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], Message::user("slow question"));
        assert_eq!(messages[1], Message::user("quick question"));
        assert_eq!(messages[2], Message::assistant("echo: quick question"));
        assert_eq!(messages[3], Message::assistant("echo: slow question"));
    }

    async fn wait_for_messages(chat: &Chat, n: usize) {
        while chat.messages().len() < n {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_user_message_appended_before_reply() {
        let (chat, _calls) = echo_chat();

        let pending = tokio::spawn({
            let chat = chat.clone();
            async move { chat.submit("slow question").await }
        });
        wait_for_messages(&chat, 1).await;

        // Reply is still sleeping, only the user message is there
        assert_eq!(chat.messages(), vec![Message::user("slow question")]);

        let reply = pending.await.unwrap().unwrap();
        assert_eq!(
            chat.messages(),
            vec![Message::user("slow question"), reply]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_turn_finishes_when_caller_goes_away() {
        let (chat, calls) = echo_chat();

        let pending = tokio::spawn({
            let chat = chat.clone();
            async move { chat.submit("slow question").await }
        });
        wait_for_messages(&chat, 1).await;

        // Drop the waiting caller mid-request
        pending.abort();
        let _ = pending.await;
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            chat.messages(),
            vec![
                Message::user("slow question"),
                Message::assistant("echo: slow question")
            ]
        );
    }

    #[tokio::test]
    async fn test_clones_share_transcript() {
        let (chat, _calls) = echo_chat();
        let other = chat.clone();

        other.submit("Hi").await;

        assert_eq!(chat.messages().len(), 2);
    }
}
