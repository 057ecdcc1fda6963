use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use http::StatusCode;
use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{CreateSession, Message, SessionConfig, SessionView, UpdateSessionConfig};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session))
        .route("/:id", get(get_session).delete(delete_session))
        .route("/:id/config", put(update_config))
        .route("/:id/api-key", put(set_api_key))
        .route("/:id/messages", get(get_messages).delete(clear_messages))
}

/// POST /api/sessions
/// Falls back to the server-wide key when the body carries none.
pub async fn create_session(
    State(state): State<AppState>,
    Json(data): Json<CreateSession>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let mut config = SessionConfig::default();
    if let Some(update) = data.config {
        config.apply(update);
    }
    let api_key = data
        .api_key
        .filter(|k| !k.trim().is_empty())
        .or_else(|| state.config.llm.default_api_key.clone());

    let id = state.sessions.create(api_key, config);
    info!("POST /api/sessions - Created session {}", id);

    let view = state.sessions.read(id, |s| s.view())?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    info!("GET /api/sessions/{}", id);
    state.sessions.read(id, |s| s.view()).map(Json)
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    info!("DELETE /api/sessions/{} - Ending session", id);
    state.sessions.remove(id).map_err(|e| {
        error!("Failed to end session {}: {}", id, e);
        e
    })?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_config(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<UpdateSessionConfig>,
) -> Result<Json<SessionView>, AppError> {
    info!("PUT /api/sessions/{}/config", id);
    state
        .sessions
        .update(id, |s| {
            s.config.apply(update);
            s.updated_at = chrono::Utc::now();
            s.view()
        })
        .map(Json)
}

#[derive(Debug, Deserialize)]
pub struct SetApiKey {
    pub api_key: String,
}

pub async fn set_api_key(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(data): Json<SetApiKey>,
) -> Result<Json<SessionView>, AppError> {
    info!("PUT /api/sessions/{}/api-key", id);
    let key = data.api_key.trim().to_string();
    if key.is_empty() {
        return Err(AppError::Validation("API key must not be empty".to_string()));
    }
    state
        .sessions
        .update(id, |s| {
            s.api_key = Some(key);
            s.updated_at = chrono::Utc::now();
            s.view()
        })
        .map(Json)
}

pub async fn get_messages(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Message>>, AppError> {
    info!("GET /api/sessions/{}/messages", id);
    state.sessions.read(id, |s| s.messages.clone()).map(Json)
}

pub async fn clear_messages(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    info!("DELETE /api/sessions/{}/messages - Clearing history", id);
    state.sessions.update(id, |s| s.clear_history())?;
    Ok(StatusCode::NO_CONTENT)
}
