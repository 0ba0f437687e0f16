use crate::state::AppState;
use axum::{
    extract::State,
    http::{self, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use futures::{stream::StreamExt, Stream};
use serde::Deserialize;
use serde_json::json;
use std::{
    convert::Infallible,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_stream::wrappers::ReceiverStream;

#[derive(Debug, Deserialize)]
struct ResearchRequest {
    query: String,
}

/// Streams protocol lines to the client as they are produced
pub struct SseResponse {
    rx: ReceiverStream<String>,
}

impl SseResponse {
    fn new(rx: ReceiverStream<String>) -> Self {
        Self { rx }
    }
}

impl Stream for SseResponse {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.rx)
            .poll_next(cx)
            .map(|opt| opt.map(|s| Ok(Bytes::from(s))))
    }
}

impl IntoResponse for SseResponse {
    fn into_response(self) -> axum::response::Response {
        let body = axum::body::Body::from_stream(self);

        http::Response::builder()
            .header("Content-Type", "text/event-stream")
            .header("Cache-Control", "no-cache")
            .header("Connection", "keep-alive")
            .header("x-vercel-ai-data-stream", "v1")
            .body(body)
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
    }
}

struct ProtocolFormatter;

impl ProtocolFormatter {
    fn format_text(text: &str) -> String {
        let encoded_text = serde_json::to_string(text).unwrap_or_else(|_| String::new());
        format!("0:{}\n", encoded_text)
    }

    fn format_error(error: &str) -> String {
        let encoded_error = serde_json::to_string(error).unwrap_or_else(|_| String::new());
        format!("3:{}\n", encoded_error)
    }

    fn format_finish(reason: &str) -> String {
        let finish = json!({
            "finishReason": reason,
            "usage": {
                "promptTokens": 0,
                "completionTokens": 0
            }
        });
        format!("d:{}\n", finish)
    }
}

async fn handler(
    State(state): State<AppState>,
    Json(request): Json<ResearchRequest>,
) -> Result<SseResponse, StatusCode> {
    let manager = state.services.research_manager().map_err(|e| {
        tracing::error!("Failed to set up research: {:#}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let (tx, rx) = mpsc::channel(100);
    let stream = ReceiverStream::new(rx);

    tokio::spawn(async move {
        let mut progress = manager.run(&request.query);
        let mut reason = "stop";

        loop {
            match timeout(Duration::from_millis(500), progress.next()).await {
                Ok(Some(Ok(item))) => {
                    if let Err(e) = tx.send(ProtocolFormatter::format_text(&item)).await {
                        tracing::error!("Error sending progress through channel: {}", e);
                        return;
                    }
                }
                Ok(Some(Err(e))) => {
                    tracing::error!("Research pipeline failed: {:#}", e);
                    let _ = tx.send(ProtocolFormatter::format_error(&e.to_string())).await;
                    reason = "error";
                    break;
                }
                Ok(None) => break,
                // Heartbeat, used to stop the pipeline once the client disconnects
                Err(_) => {
                    if tx.is_closed() {
                        return;
                    }
                }
            }
        }

        let _ = tx.send(ProtocolFormatter::format_finish(reason)).await;
    });

    Ok(SseResponse::new(stream))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/research", post(handler))
        .with_state(state)
}
