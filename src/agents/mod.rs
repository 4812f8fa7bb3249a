//! Agents and the graph that connects them
//!
//! - [`catalog`] - static declarations (name, description, instruction, tools)
//! - [`configurable`] - an LLM agent driven by a declaration
//! - [`router`] - intent detection and dispatch to exactly one agent
//! - [`workflow`] - sequential composition of agents
//! - [`registry`] - builds the agent graph and looks agents up by name

pub mod catalog;
pub mod configurable;
pub mod registry;
pub mod router;
pub mod workflow;

use crate::types::{AgentContext, Result};
use async_trait::async_trait;

pub use catalog::AgentDeclaration;
pub use configurable::ConfigurableAgent;
pub use registry::{AgentInfo, AgentRegistry};
pub use router::{IntentClassifier, IntentRouter, LlmIntentClassifier, RoutingOutcome};
pub use workflow::SequentialAgent;

/// Base trait for all agents
#[async_trait]
pub trait Agent: Send + Sync {
    /// Execute the agent with given input and context.
    ///
    /// Agents with an output key store their answer in `context.state`.
    async fn execute(&self, input: &str, context: &mut AgentContext) -> Result<String>;

    /// Wire-visible agent name
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Get the agent's system prompt
    fn system_prompt(&self) -> String;

    /// State key this agent writes its final answer to
    fn output_key(&self) -> Option<&str> {
        None
    }

    /// Tools and agent tools this agent can call
    fn tool_names(&self) -> Vec<String> {
        Vec::new()
    }
}
