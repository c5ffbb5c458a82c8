//! Router for the chat API

use std::sync::{Arc, RwLock};

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use super::public;
use crate::api::state::AppState;

type SharedState = Arc<RwLock<AppState>>;

/// Send the next message in the chat and wait for the reply
async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<public::ChatRequest>,
) -> Json<public::ChatResponse> {
    // Clone the handle out so the shared state lock isn't held while
    // waiting on the LLM
    let chat = state.read().expect("Unable to read share state").chat.clone();

    let reply = chat.submit(&payload.message).await;
    if reply.is_none() {
        tracing::debug!("Ignoring blank chat message");
    }

    Json(public::ChatResponse {
        reply,
        transcript: chat.messages(),
    })
}

/// Get the full transcript of the chat so far
async fn chat_transcript(State(state): State<SharedState>) -> Json<public::ChatTranscriptResponse> {
    let chat = state.read().expect("Unable to read share state").chat.clone();

    Json(public::ChatTranscriptResponse {
        transcript: chat.messages(),
    })
}

/// Create the chat router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", post(chat_handler))
        .route("/transcript", get(chat_transcript))
}
