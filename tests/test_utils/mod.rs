//! Test utilities for integration tests
#![allow(dead_code)]

use std::sync::{Arc, RwLock};

use axum::{Router, body::Body};

use chatbot::api::AppState;
use chatbot::api::app;
use chatbot::core::AppConfig;

/// Config pointing the completion client at `openai_api_hostname`
/// (usually a `mockito` server) with retry delays short enough for
/// tests.
pub fn test_config(openai_api_hostname: &str) -> AppConfig {
    AppConfig {
        openai_api_hostname: openai_api_hostname.to_string(),
        openai_api_key: String::from("test-api-key"),
        openai_model: String::from("gpt-3.5-turbo"),
        max_tokens: 500,
        max_retries: 2,
        retry_delay_ms: 1,
        static_dir: format!("{}/web-ui/src", env!("CARGO_MANIFEST_DIR")),
    }
}

/// Creates a test application router with a fresh, empty transcript.
pub fn test_app(openai_api_hostname: &str) -> Router {
    test_app_with_config(test_config(openai_api_hostname))
}

pub fn test_app_with_config(config: AppConfig) -> Router {
    let app_state = AppState::new(config);
    app(Arc::new(RwLock::new(app_state)))
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not utf8")
}

pub fn completion_body(content: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "created": 1694268190,
        "model": "gpt-3.5-turbo",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": content
            },
            "finish_reason": "stop"
        }]
    })
    .to_string()
}
