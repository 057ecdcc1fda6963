use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::chat_service::{handle_chat, ChatReply};
use crate::services::onboarding_service::{onboarding_progress, StageProgress};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:id/chat", post(chat))
        .route("/:id/onboarding/progress", get(get_onboarding_progress))
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// POST /api/sessions/:id/chat
/// Model failures come back as a 200 with `is_error` set; only a missing
/// session or an empty message is an HTTP error.
pub async fn chat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatReply>, AppError> {
    info!("POST /api/sessions/{}/chat", id);
    handle_chat(&state.sessions, &state.llm, id, &req.message)
        .await
        .map(Json)
}

pub async fn get_onboarding_progress(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<StageProgress>>, AppError> {
    info!("GET /api/sessions/{}/onboarding/progress", id);
    state
        .sessions
        .read(id, |s| onboarding_progress(&s.messages))
        .map(Json)
}
