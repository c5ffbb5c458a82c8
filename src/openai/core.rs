use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "user")]
    User,
}

/// A single chat message. Fields are private so a message can't be
/// edited once it's been created.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Self {
        Message {
            role,
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: &str) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Rate limited by completion API (429 Too Many Requests)")]
    RateLimited,

    #[error("Completion API returned status {0}")]
    Status(StatusCode),

    #[error("Completion request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed completion response: {0}")]
    MalformedResponse(String),
}

impl CompletionError {
    /// The only kind of failure that's worth retrying
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, CompletionError::RateLimited)
    }
}

#[derive(Serialize, Debug)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    pub max_tokens: u32,
}

// Only the parts of the response body that are used. Everything else
// in the payload (id, usage, finish_reason, etc.) is ignored.
#[derive(Deserialize, Debug)]
pub struct CompletionResponse {
    pub choices: Vec<CompletionChoice>,
}

#[derive(Deserialize, Debug)]
pub struct CompletionChoice {
    pub message: ChoiceMessage,
}

#[derive(Deserialize, Debug)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

impl CompletionResponse {
    /// Text of the first choice
    pub fn into_content(self) -> Result<String, CompletionError> {
        self.choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::MalformedResponse("no choices".to_string()))?
            .message
            .content
            .ok_or_else(|| CompletionError::MalformedResponse("missing content".to_string()))
    }
}

/// Makes a single chat completion request and returns the content of
/// the first choice. No retries happen here, see `PromptClient`.
pub async fn completion(
    client: &reqwest::Client,
    messages: &[Message],
    api_hostname: &str,
    api_key: &str,
    model: &str,
    max_tokens: u32,
) -> Result<String, CompletionError> {
    let payload = CompletionRequest {
        model,
        messages,
        max_tokens,
    };
    let url = format!("{}/v1/chat/completions", api_hostname.trim_end_matches("/"));
    let response = client
        .post(url)
        .bearer_auth(api_key)
        .header("Content-Type", "application/json")
        .json(&payload)
        .send()
        .await?;

    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(CompletionError::RateLimited);
    }
    if !status.is_success() {
        return Err(CompletionError::Status(status));
    }

    let body = response.text().await?;
    let parsed: CompletionResponse = serde_json::from_str(&body)
        .map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;

    parsed.into_content()
}
