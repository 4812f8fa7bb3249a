//! HTTP API Handlers and Routes
//!
//! This module provides the REST API layer for Mentor, built on the Axum web framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # API Endpoints
//!
//! - `GET /api/health` - Liveness and version
//! - `GET /api/agents` - Agents in the graph with their tools
//! - `POST /api/chat` - Intent detection, then exactly one agent
//! - `POST /api/agents/{name}/run` - Run one agent directly
//! - `GET /api/sessions/{id}` - Session history and state
//! - `GET /api/openapi.json` - OpenAPI document

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

use crate::AppState;
use axum::{Json, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(title = "Mentor", description = "Professional development agent server"),
    paths(
        handlers::health::health,
        handlers::agents::list_agents,
        handlers::agents::run_agent,
        handlers::chat::chat,
        handlers::sessions::get_session,
    ),
    components(schemas(
        crate::types::ChatRequest,
        crate::types::ChatResponse,
        crate::types::AgentRunRequest,
        crate::types::AgentRunResponse,
        crate::types::Intent,
        crate::types::Message,
        crate::types::MessageRole,
        crate::agents::AgentInfo,
        crate::memory::Session,
        handlers::health::HealthResponse,
    )),
    tags(
        (name = "health", description = "Liveness"),
        (name = "agents", description = "Agent catalog and direct runs"),
        (name = "chat", description = "Intent-routed chat"),
        (name = "sessions", description = "Session inspection")
    )
)]
pub struct ApiDoc;

pub(crate) async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// The complete application: `/api` routes with CORS and request tracing.
///
/// Any origin is allowed, which also covers `http://localhost` and
/// `http://localhost:8080`.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", routes::create_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
