use crate::{
    memory::Session,
    types::{AppError, Result},
    AppState,
};
use axum::{
    extract::{Path, State},
    Json,
};

/// Session history and state
#[utoipa::path(
    get,
    path = "/api/sessions/{id}",
    responses(
        (status = 200, description = "Session", body = Session),
        (status = 404, description = "Unknown session")
    ),
    params(
        ("id" = String, Path, description = "Session id returned by /api/chat")
    ),
    tag = "sessions"
)]
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Session>> {
    state
        .sessions
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Session not found: {}", id)))
}
