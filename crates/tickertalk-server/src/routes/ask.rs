use crate::error::ApiError;
use crate::sse::SseResponse;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use futures::stream::StreamExt;
use serde::Deserialize;
use tickertalk::{models::stream::StreamChunk, transcript::build_transcript};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info, warn};

#[derive(Debug, Deserialize)]
struct AskRequest {
    prompt: String,
    /// Markup of the reply this prompt follows up on, if any
    #[serde(default, rename = "previousC1Response")]
    previous_c1_response: Option<String>,
}

async fn handler(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<SseResponse, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected ask request: {}", rejection.body_text());
        ApiError::BadRequest(rejection.body_text())
    })?;

    if request.prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("prompt must not be empty".to_string()));
    }

    let transcript = build_transcript(
        &state.instruction,
        &request.prompt,
        request.previous_c1_response.as_deref(),
    );
    info!(turns = transcript.len(), "starting completion");

    let mut stream = state
        .orchestrator
        .stream_complete(transcript, state.tools.clone())
        .await
        .map_err(|e| {
            error!("Failed to start completion: {:#}", e);
            ApiError::Upstream(e)
        })?;

    // Create channel for streaming
    let (tx, rx) = mpsc::channel(100);
    let framing = state.framing;

    // Spawn task to forward text deltas until the stream ends or the client leaves
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => {
                    info!("Client disconnected, abandoning completion");
                    break;
                }
                item = stream.next() => match item {
                    Some(Ok(StreamChunk::Text(text))) => {
                        if text.is_empty() {
                            continue;
                        }
                        if let Err(e) = tx.send(framing.frame(&text)).await {
                            debug!("Error sending text through channel: {}", e);
                            break;
                        }
                    }
                    Some(Ok(StreamChunk::ToolCall(call))) => {
                        debug!(id = %call.id, tool = %call.name, "tool requested");
                    }
                    Some(Ok(StreamChunk::ToolResult { id, name, ok })) => {
                        debug!(%id, tool = %name, ok, "tool finished");
                    }
                    Some(Err(e)) => {
                        error!("Error processing completion stream: {:#}", e);
                        break;
                    }
                    None => break,
                },
            }
        }
    });

    Ok(SseResponse::new(ReceiverStream::new(rx)))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/ask", post(handler))
        .with_state(state)
}
