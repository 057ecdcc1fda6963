use axum::Router;
use tower_http::cors::CorsLayer;

use crate::routes::{blog, chat, conversation, health, personas, sessions, stock};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    let session_routes = Router::<AppState>::new()
        .merge(sessions::router())
        .merge(chat::router())
        .merge(blog::router())
        .merge(conversation::router())
        .merge(stock::router());

    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/api", personas::router())
        .nest("/api/sessions", session_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
