use std::sync::Arc;

use crate::chat::{Chat, ChatBuilder};
use crate::core::AppConfig;
use crate::openai::PromptClient;

pub struct AppState {
    // The one chat session served by this process. It's dropped with
    // the server, nothing is persisted.
    pub chat: Chat,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let client = Arc::new(PromptClient::from_config(&config));
        let chat = ChatBuilder::new(client).build();
        Self::new_with_chat(chat, config)
    }

    pub fn new_with_chat(chat: Chat, config: AppConfig) -> Self {
        Self { chat, config }
    }
}
