use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::conversation_service::{comedy_show, ConversationRequest, Transcript};
use crate::services::report_renderer::render_transcript;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:id/conversation", post(run_conversation))
}

/// Transcript plus the same exchange rendered as markdown.
#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    #[serde(flatten)]
    pub transcript: Transcript,
    pub markdown: String,
}

/// POST /api/sessions/:id/conversation
pub async fn run_conversation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ConversationRequest>,
) -> Result<Json<ConversationResponse>, AppError> {
    info!("POST /api/sessions/{}/conversation", id);
    let transcript = comedy_show(
        &state.sessions,
        &state.llm,
        id,
        req,
        state.config.conversation_max_turns,
    )
    .await?;

    if let Some(error) = &transcript.error {
        warn!("Conversation in session {} stopped early: {}", id, error);
    }
    let markdown = render_transcript(&transcript.turns);
    Ok(Json(ConversationResponse { transcript, markdown }))
}
