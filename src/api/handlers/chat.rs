use crate::{
    api::handlers::require_message,
    types::{ChatRequest, ChatResponse, Message, Result},
    AppState,
};
use axum::{extract::State, Json};
use tracing::debug;

/// Chat with the professional development assistant
///
/// The request is classified and handed to exactly one agent. Requests about
/// a specific employee are answered with a request for the employee email
/// until one is known for the session.
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Chat response", body = ChatResponse),
        (status = 400, description = "Invalid input"),
        (status = 502, description = "LLM, warehouse or search backend failed")
    ),
    tag = "chat"
)]
pub async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let message = require_message(&payload.message)?;

    let mut context = state
        .sessions
        .context_for(payload.session_id.as_deref(), payload.email);
    let initial_state = context.state.clone();

    debug!(session_id = %context.session_id, "Chat request");
    let outcome = state.agents.router().route(message, &mut context).await?;

    state.sessions.record_exchange(
        &context,
        &initial_state,
        Message::user(message),
        Message::assistant(&outcome.agent, &outcome.response),
    );

    Ok(Json(ChatResponse {
        response: outcome.response,
        agent: outcome.agent,
        intent: outcome.intent,
        session_id: context.session_id,
    }))
}
