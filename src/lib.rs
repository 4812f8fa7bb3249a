//! # Mentor - Professional Development Agent Server
//!
//! An agent server that answers employee questions about professional
//! development: skills development needs, training history, remaining
//! training budget, company policy, and finding and registering training.
//!
//! ## Overview
//!
//! Mentor can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `mentor-server` binary
//! 2. **As a library** - Build the agent graph into your own Rust project
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use mentor::{AgentRegistry, Config, ToolRegistry};
//! use mentor::db::BigQueryClient;
//! use mentor::llm::{LLMClientFactory, ToolCallingConfig};
//! use mentor::rag::VertexSearchClient;
//! use mentor::types::AgentContext;
//! use mentor::utils::credentials::token_source_from_config;
//! use std::sync::Arc;
//!
//! let config = Config::from_env()?;
//! let credentials = token_source_from_config(&config.google).await?;
//! let tools = ToolRegistry::with_domain_tools(
//!     Arc::new(BigQueryClient::from_config(&config, credentials.clone())),
//!     Arc::new(VertexSearchClient::from_config(&config, credentials)),
//! );
//! let llm = LLMClientFactory::from_config(&config.llm).create_default().await?;
//! let agents = AgentRegistry::build(llm.into(), &tools, ToolCallingConfig::from(&config.agents));
//!
//! let mut context = AgentContext::new("session-1").with_email(Some("john.doe@amazincorp.com".into()));
//! let outcome = agents.router().route("What is my remaining training budget?", &mut context).await?;
//! println!("{} answered: {}", outcome.agent, outcome.response);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `openai` | OpenAI-compatible endpoints, including Gemini (default) |
//! | `ollama` | Ollama local inference |
//!
//! ## Modules
//!
//! - [`agents`] - Agent declarations, intent routing and the agent graph
//! - [`api`] - REST API handlers and routes
//! - [`db`] - BigQuery warehouse access
//! - [`llm`] - LLM client implementations and the tool calling loop
//! - [`memory`] - In-process session store
//! - [`rag`] - Vertex AI Search over company documentation
//! - [`tools`] - Tool definitions and registry
//! - [`types`] - Common types and error handling

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// Agent declarations, routing and the agent graph.
pub mod agents;
/// HTTP API handlers and routes.
pub mod api;
/// Command line interface.
pub mod cli;
/// Warehouse access (BigQuery).
pub mod db;
/// LLM provider clients and abstractions.
pub mod llm;
/// Session history and state.
pub mod memory;
/// Semantic search over company documentation.
pub mod rag;
/// Domain tools and agent tools.
pub mod tools;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use agents::{AgentRegistry, IntentRouter};
pub use llm::{LLMClient, LLMClientFactory, LLMResponse, Provider};
pub use memory::SessionStore;
pub use tools::registry::ToolRegistry;
pub use types::{AppError, Result};
pub use utils::config::Config;

use crate::db::BigQueryClient;
use crate::llm::ToolCallingConfig;
use crate::rag::VertexSearchClient;
use crate::utils::credentials::token_source_from_config;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Validated startup configuration
    pub config: Arc<Config>,
    /// Agent graph, including the intent router
    pub agents: Arc<AgentRegistry>,
    /// Per-session history and state
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(config: Config, agents: AgentRegistry) -> Self {
        let sessions = SessionStore::with_capacity(config.server.session_capacity);
        Self {
            config: Arc::new(config),
            agents: Arc::new(agents),
            sessions: Arc::new(sessions),
        }
    }

    /// Connect the warehouse, search and LLM clients and build the agent graph.
    pub async fn from_config(config: Config) -> Result<Self> {
        let credentials = token_source_from_config(&config.google)
            .await
            .map_err(|e| AppError::Configuration(e.to_string()))?;
        let warehouse = Arc::new(BigQueryClient::from_config(&config, credentials.clone()));
        let search = Arc::new(VertexSearchClient::from_config(&config, credentials));
        let tools = ToolRegistry::with_domain_tools(warehouse, search);

        let llm: Arc<dyn LLMClient> = LLMClientFactory::from_config(&config.llm)
            .create_default()
            .await?
            .into();

        let agents = AgentRegistry::build(llm, &tools, ToolCallingConfig::from(&config.agents));
        Ok(Self::new(config, agents))
    }
}
