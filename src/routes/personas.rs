use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::{PersonaConfig, Persona, PersonaSet};
use crate::services::dispatcher::RoleDispatcher;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/personas", get(list_personas))
        .route("/dispatch", post(dispatch))
}

/// GET /api/personas
async fn list_personas() -> Json<Vec<&'static PersonaConfig>> {
    info!("GET /api/personas");
    Json(Persona::ALL.iter().map(|p| p.config()).collect())
}

#[derive(Debug, Deserialize)]
struct DispatchRequest {
    text: String,
    #[serde(default)]
    persona_set: PersonaSet,
}

#[derive(Debug, Serialize)]
struct DispatchResponse {
    persona: Persona,
}

/// POST /api/dispatch
/// Which persona a message would be routed to, without calling the model.
async fn dispatch(Json(req): Json<DispatchRequest>) -> Json<DispatchResponse> {
    let persona = RoleDispatcher::for_set(req.persona_set).dispatch(&req.text);
    info!("POST /api/dispatch - routed to {}", persona);
    Json(DispatchResponse { persona })
}
