//! Sequential agent workflows
//!
//! A [`SequentialAgent`] runs its sub-agents one after another on the same
//! input and context. Later agents see the state earlier ones wrote through
//! their output keys; the workflow answers with the last agent's output.

use crate::agents::{catalog::AgentDeclaration, Agent};
use crate::types::{AgentContext, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

pub struct SequentialAgent {
    name: String,
    description: String,
    sub_agents: Vec<Arc<dyn Agent>>,
}

impl SequentialAgent {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        sub_agents: Vec<Arc<dyn Agent>>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            sub_agents,
        }
    }

    pub fn from_declaration(declaration: &AgentDeclaration, sub_agents: Vec<Arc<dyn Agent>>) -> Self {
        Self::new(declaration.name, declaration.description, sub_agents)
    }

    pub fn sub_agent_names(&self) -> Vec<&str> {
        self.sub_agents.iter().map(|a| a.name()).collect()
    }
}

#[async_trait]
impl Agent for SequentialAgent {
    async fn execute(&self, input: &str, context: &mut AgentContext) -> Result<String> {
        let mut output = String::new();

        for (step, agent) in self.sub_agents.iter().enumerate() {
            debug!(workflow = %self.name, step, agent = %agent.name(), "Running workflow step");
            output = agent.execute(input, context).await?;
        }

        info!(workflow = %self.name, steps = self.sub_agents.len(), "Workflow completed");
        Ok(output)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn system_prompt(&self) -> String {
        String::new()
    }

    fn tool_names(&self) -> Vec<String> {
        self.sub_agents.iter().map(|a| a.name().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AppError;
    use serde_json::Value;

    struct Writer;

    #[async_trait]
    impl Agent for Writer {
        async fn execute(&self, _input: &str, context: &mut AgentContext) -> Result<String> {
            context
                .state
                .insert("chosen_training".to_string(), Value::String("Go Fundamentals".into()));
            Ok("found Go Fundamentals".to_string())
        }
        fn name(&self) -> &str {
            "Writer"
        }
        fn description(&self) -> &str {
            ""
        }
        fn system_prompt(&self) -> String {
            String::new()
        }
    }

    struct Reader;

    #[async_trait]
    impl Agent for Reader {
        async fn execute(&self, _input: &str, context: &mut AgentContext) -> Result<String> {
            match context.state.get("chosen_training").and_then(Value::as_str) {
                Some(training) => Ok(format!("registered {}", training)),
                None => Err(AppError::InvalidInput("nothing chosen".to_string())),
            }
        }
        fn name(&self) -> &str {
            "Reader"
        }
        fn description(&self) -> &str {
            ""
        }
        fn system_prompt(&self) -> String {
            String::new()
        }
    }

    #[tokio::test]
    async fn test_state_flows_between_steps() {
        let steps: Vec<Arc<dyn Agent>> = vec![Arc::new(Writer), Arc::new(Reader)];
        let workflow = SequentialAgent::new("Flow", "find then register", steps);
        let mut context = AgentContext::new("s1");

        let output = workflow.execute("find and register", &mut context).await.unwrap();
        assert_eq!(output, "registered Go Fundamentals");
        assert_eq!(workflow.sub_agent_names(), vec!["Writer", "Reader"]);
    }

    #[tokio::test]
    async fn test_failing_step_stops_workflow() {
        let steps: Vec<Arc<dyn Agent>> = vec![Arc::new(Reader), Arc::new(Writer)];
        let workflow = SequentialAgent::new("Flow", "", steps);
        let mut context = AgentContext::new("s1");

        let result = workflow.execute("register", &mut context).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
        assert!(context.state.is_empty());
    }
}
