use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use switchboard::models::message::Message;

#[derive(Debug, Deserialize)]
struct IncomingMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    history: Vec<IncomingMessage>,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    reply: Option<String>,
    messages: Vec<Message>,
}

// Chat front ends send plain role/content pairs; anything else is dropped
fn convert_history(incoming: Vec<IncomingMessage>) -> Vec<Message> {
    incoming
        .into_iter()
        .filter_map(|msg| match msg.role.as_str() {
            "user" => Some(Message::user().with_text(msg.content)),
            "assistant" => Some(Message::assistant().with_text(msg.content)),
            _ => {
                tracing::warn!("Unknown role: {}", msg.role);
                None
            }
        })
        .collect()
}

async fn handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, StatusCode> {
    let agent = state.services.chat_agent().map_err(|e| {
        tracing::error!("Failed to set up chat: {:#}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let history = convert_history(request.history);
    let outcome = agent.reply(&history, &request.message).await.map_err(|e| {
        tracing::error!("Chat turn failed: {:#}", e);
        StatusCode::BAD_GATEWAY
    })?;

    Ok(Json(ChatResponse {
        reply: outcome.reply,
        messages: outcome.messages,
    }))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(handler))
        .with_state(state)
}
