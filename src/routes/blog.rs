use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::routes::attachment;
use crate::services::blog_service::{self, BlogStepResult, BlogView, SetTopic};
use crate::services::report_renderer::blog_download;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:id/blog", get(get_blog))
        .route("/:id/blog/topic", post(set_topic))
        .route("/:id/blog/research", post(research))
        .route("/:id/blog/outline", post(outline))
        .route("/:id/blog/write", post(write))
        .route("/:id/blog/seo", post(seo))
        .route("/:id/blog/edit", post(edit))
        .route("/:id/blog/complete", post(complete))
        .route("/:id/blog/reset", post(reset))
        .route("/:id/blog/download", get(download))
}

pub async fn get_blog(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BlogView>, AppError> {
    info!("GET /api/sessions/{}/blog", id);
    blog_service::view(&state.sessions, id).map(Json)
}

pub async fn set_topic(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(data): Json<SetTopic>,
) -> Result<Json<BlogView>, AppError> {
    info!("POST /api/sessions/{}/blog/topic", id);
    blog_service::set_topic(&state.sessions, id, data).map(Json)
}

pub async fn research(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BlogStepResult>, AppError> {
    info!("POST /api/sessions/{}/blog/research", id);
    blog_service::research(&state.sessions, &state.llm, id).await.map(Json)
}

pub async fn outline(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BlogStepResult>, AppError> {
    info!("POST /api/sessions/{}/blog/outline", id);
    blog_service::outline(&state.sessions, &state.llm, id).await.map(Json)
}

pub async fn write(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BlogStepResult>, AppError> {
    info!("POST /api/sessions/{}/blog/write", id);
    blog_service::write(&state.sessions, &state.llm, id).await.map(Json)
}

pub async fn seo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BlogStepResult>, AppError> {
    info!("POST /api/sessions/{}/blog/seo", id);
    blog_service::seo(&state.sessions, &state.llm, id).await.map(Json)
}

pub async fn edit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BlogStepResult>, AppError> {
    info!("POST /api/sessions/{}/blog/edit", id);
    blog_service::edit(&state.sessions, &state.llm, id).await.map(Json)
}

pub async fn complete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BlogView>, AppError> {
    info!("POST /api/sessions/{}/blog/complete", id);
    blog_service::complete(&state.sessions, id).map(Json)
}

pub async fn reset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BlogView>, AppError> {
    info!("POST /api/sessions/{}/blog/reset", id);
    blog_service::reset(&state.sessions, id).map(Json)
}

/// GET /api/sessions/:id/blog/download
pub async fn download(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    info!("GET /api/sessions/{}/blog/download", id);
    let file = state.sessions.read(id, |s| blog_download(&s.blog))?;
    match file {
        Some(file) => Ok(attachment(file)),
        None => {
            warn!("Session {} has no blog content to download", id);
            Err(AppError::NotFound("No blog content has been written yet".to_string()))
        }
    }
}
