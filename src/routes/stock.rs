use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::ReportPayload;
use crate::routes::attachment;
use crate::services::report_renderer::stock_report_download;
use crate::services::report_service::{self, StockReportOutcome, StockReportRequest};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:id/stock-report", post(generate_report).get(get_report))
        .route("/:id/stock-report/edit", post(edit_report))
        .route("/:id/stock-report/download", get(download_report))
}

/// POST /api/sessions/:id/stock-report
/// Body is optional; without one the session's symbol and period are used.
pub async fn generate_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    req: Option<Json<StockReportRequest>>,
) -> Result<Json<StockReportOutcome>, AppError> {
    info!("POST /api/sessions/{}/stock-report", id);
    let req = req.map(|Json(r)| r).unwrap_or_default();
    report_service::generate_stock_report(
        &state.sessions,
        &state.llm,
        state.price_provider.as_ref(),
        &state.config,
        id,
        req,
    )
    .await
    .map(Json)
    .map_err(|e| {
        error!("Stock report for session {} failed: {}", id, e);
        e
    })
}

pub async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReportPayload>, AppError> {
    info!("GET /api/sessions/{}/stock-report", id);
    report_service::current_report(&state.sessions, id).map(Json)
}

pub async fn edit_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReportPayload>, AppError> {
    info!("POST /api/sessions/{}/stock-report/edit", id);
    report_service::edit_stock_report(&state.sessions, &state.llm, id)
        .await
        .map(Json)
}

/// GET /api/sessions/:id/stock-report/download
pub async fn download_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    info!("GET /api/sessions/{}/stock-report/download", id);
    let report = report_service::current_report(&state.sessions, id)?;
    Ok(attachment(stock_report_download(&report)))
}
