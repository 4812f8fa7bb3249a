//! Agents exposed as tools.
//!
//! An agent tool runs another agent on a single `request` string and returns
//! its final answer. The wrapped agent gets a fresh context of its own.

use crate::agents::Agent;
use crate::tools::registry::{required_str, Tool};
use crate::types::{AgentContext, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub const COMPANY_INFORMATION_TOOL: &str = "company_information_tool";
pub const TRAINING_FINDER_TOOL: &str = "training_finder_tool";

pub struct AgentTool {
    name: String,
    agent: Arc<dyn Agent>,
}

impl AgentTool {
    pub fn new(name: impl Into<String>, agent: Arc<dyn Agent>) -> Self {
        Self {
            name: name.into(),
            agent,
        }
    }

    pub fn agent_name(&self) -> &str {
        self.agent.name()
    }
}

#[async_trait]
impl Tool for AgentTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        self.agent.description()
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "request": {
                    "type": "string",
                    "description": format!("The request to send to {}", self.agent.name())
                }
            },
            "required": ["request"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let request = required_str(&args, "request")?;
        debug!(tool = %self.name, agent = %self.agent.name(), "Delegating to agent");

        let mut context = AgentContext::new(uuid::Uuid::new_v4().to_string());
        let response = self.agent.execute(request, &mut context).await?;

        Ok(json!({ "response": response }))
    }
}
