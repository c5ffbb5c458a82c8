mod client;
mod core;
mod retry;

pub use client::{
    BoxedCompletionApi, CompletionApi, FALLBACK_RESPONSE, OpenAiClient, PromptClient,
};
pub use self::core::{CompletionError, Message, Role, completion};
pub use retry::RetryPolicy;
