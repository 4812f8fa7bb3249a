use crate::api::handlers::{agents, chat, health, sessions};
use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/agents", get(agents::list_agents))
        .route("/agents/{name}/run", post(agents::run_agent))
        .route("/chat", post(chat::chat))
        .route("/sessions/{id}", get(sessions::get_session))
        .route("/openapi.json", get(crate::api::openapi_json))
}
