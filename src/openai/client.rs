use std::fmt;

use async_trait::async_trait;

use super::{CompletionError, Message, RetryPolicy, completion};
use crate::core::AppConfig;

/// Returned in place of a reply whenever the completion API can't be
/// reached or keeps rate limiting us.
pub const FALLBACK_RESPONSE: &str = "Error: Unable to get a response due to rate limit.";

/// One attempt at getting a completion for a single-turn prompt.
#[async_trait]
pub trait CompletionApi {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

pub type BoxedCompletionApi = Box<dyn CompletionApi + Send + Sync + 'static>;

/// `CompletionApi` backed by an OpenAI compatible chat completions
/// endpoint.
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_hostname: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl OpenAiClient {
    pub fn new(api_hostname: &str, api_key: &str, model: &str, max_tokens: u32) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_hostname: api_hostname.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            max_tokens,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            &config.openai_api_hostname,
            &config.openai_api_key,
            &config.openai_model,
            config.max_tokens,
        )
    }
}

impl fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("api_hostname", &self.api_hostname)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[async_trait]
impl CompletionApi for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let messages = [Message::user(prompt)];
        completion(
            &self.http,
            &messages,
            &self.api_hostname,
            &self.api_key,
            &self.model,
            self.max_tokens,
        )
        .await
    }
}

/// Sends prompts to a `CompletionApi`, backing off and retrying when
/// rate limited. Always resolves to some text: failures turn into
/// `FALLBACK_RESPONSE` instead of an error.
pub struct PromptClient {
    api: BoxedCompletionApi,
    retry: RetryPolicy,
}

impl PromptClient {
    pub fn new(api: BoxedCompletionApi) -> Self {
        Self {
            api,
            retry: RetryPolicy::default(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(Box::new(OpenAiClient::from_config(config))).retry_policy(config.retry_policy())
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub async fn send_prompt(&self, question: &str) -> String {
        let mut delays = self.retry.delays();

        loop {
            let err = match self.api.complete(question).await {
                Ok(content) => return content,
                Err(err) => err,
            };

            if !err.is_rate_limited() {
                tracing::error!("Completion request failed: {}", err);
                return FALLBACK_RESPONSE.to_string();
            }

            let Some(delay) = delays.next() else {
                tracing::error!(
                    "Giving up after {} retries: {}",
                    self.retry.max_retries(),
                    err
                );
                return FALLBACK_RESPONSE.to_string();
            };

            tracing::warn!(
                "Too many requests. Retrying in {} seconds...",
                delay.as_secs_f64()
            );
            tokio::time::sleep(delay).await;
        }
    }
}
