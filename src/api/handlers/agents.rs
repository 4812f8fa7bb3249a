use crate::{
    agents::AgentInfo,
    api::handlers::require_message,
    types::{AgentRunRequest, AgentRunResponse, Message, Result},
    AppState,
};
use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

/// List every agent in the graph
#[utoipa::path(
    get,
    path = "/api/agents",
    responses(
        (status = 200, description = "Declared agents", body = Vec<AgentInfo>)
    ),
    tag = "agents"
)]
pub async fn list_agents(State(state): State<AppState>) -> Json<Vec<AgentInfo>> {
    Json(state.agents.descriptors())
}

/// Run one named agent directly, bypassing intent detection
#[utoipa::path(
    post,
    path = "/api/agents/{name}/run",
    request_body = AgentRunRequest,
    responses(
        (status = 200, description = "Agent response", body = AgentRunResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Agent not found")
    ),
    params(
        ("name" = String, Path, description = "Agent name, e.g. TrainingFinderAgent")
    ),
    tag = "agents"
)]
pub async fn run_agent(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(payload): Json<AgentRunRequest>,
) -> Result<Json<AgentRunResponse>> {
    let agent = state.agents.get(&name)?;
    let message = require_message(&payload.message)?;

    let mut context = state
        .sessions
        .context_for(payload.session_id.as_deref(), payload.email);
    let initial_state = context.state.clone();

    info!(agent = %name, session_id = %context.session_id, "Direct agent run");
    let response = agent.execute(message, &mut context).await?;

    state.sessions.record_exchange(
        &context,
        &initial_state,
        Message::user(message),
        Message::assistant(agent.name(), &response),
    );

    Ok(Json(AgentRunResponse {
        response,
        agent: agent.name().to_string(),
        session_id: context.session_id,
    }))
}
