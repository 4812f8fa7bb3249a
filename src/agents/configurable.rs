//! Configurable Agent implementation
//!
//! A generic LLM agent whose behavior comes from an [`AgentDeclaration`].
//! Each run builds a conversation from the declaration's instruction, the
//! session state and recent history, then hands it to the tool calling loop
//! restricted to the declared tools.

use crate::agents::catalog::AgentDeclaration;
use crate::agents::Agent;
use crate::llm::coordinator::{ConversationMessage, ToolCallingConfig, ToolCoordinator};
use crate::llm::LLMClient;
use crate::memory::{format_state_for_prompt, recent_history, DEFAULT_HISTORY_WINDOW};
use crate::tools::registry::ToolRegistry;
use crate::types::{AgentContext, MessageRole, Result, ToolDefinition};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// An LLM agent configured from a static declaration
pub struct ConfigurableAgent {
    declaration: AgentDeclaration,
    llm: Arc<dyn LLMClient>,
    /// Tools available to this agent
    tool_registry: Arc<ToolRegistry>,
    tool_config: ToolCallingConfig,
    history_window: usize,
}

impl ConfigurableAgent {
    pub fn new(
        declaration: AgentDeclaration,
        llm: Arc<dyn LLMClient>,
        tool_registry: Arc<ToolRegistry>,
        tool_config: ToolCallingConfig,
    ) -> Self {
        Self {
            declaration,
            llm,
            tool_registry,
            tool_config,
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }

    /// Number of earlier session messages replayed to the model
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    pub fn declaration(&self) -> &AgentDeclaration {
        &self.declaration
    }

    /// Get the list of allowed tool names for this agent
    pub fn allowed_tools(&self) -> &[&'static str] {
        self.declaration.tools
    }

    /// Tool definitions for only this agent's declared tools
    pub fn get_filtered_tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tool_registry
            .get_tool_definitions_for(self.declaration.tools)
    }

    /// Check if a specific tool is both declared and registered
    pub fn can_use_tool(&self, tool_name: &str) -> bool {
        self.declaration.tools.iter().any(|t| *t == tool_name)
            && self.tool_registry.has_tool(tool_name)
    }

    fn build_system_prompt(&self, context: &AgentContext) -> String {
        let mut prompt = self.declaration.instruction.to_string();

        if let Some(email) = &context.email {
            prompt.push_str(&format!("\n\nEmployee email: {}", email));
        }

        let state = format_state_for_prompt(&context.state);
        if !state.is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(&state);
        }

        prompt
    }

    fn build_messages(&self, input: &str, context: &AgentContext) -> Vec<ConversationMessage> {
        let mut messages = vec![ConversationMessage::system(
            self.build_system_prompt(context),
        )];

        for msg in recent_history(&context.conversation_history, self.history_window) {
            messages.push(match msg.role {
                MessageRole::User => ConversationMessage::user(&msg.content),
                MessageRole::Assistant => ConversationMessage::assistant(&msg.content, Vec::new()),
                MessageRole::System => ConversationMessage::system(&msg.content),
            });
        }

        messages.push(ConversationMessage::user(input));
        messages
    }
}

#[async_trait]
impl Agent for ConfigurableAgent {
    async fn execute(&self, input: &str, context: &mut AgentContext) -> Result<String> {
        debug!(agent = %self.declaration.name, session = %context.session_id, "Running agent");

        let coordinator = ToolCoordinator::new(
            self.llm.clone(),
            self.tool_registry.clone(),
            self.tool_config.clone(),
        )
        .with_tools(self.declaration.tools.iter().copied());

        let result = coordinator
            .execute_conversation(self.build_messages(input, context))
            .await?;

        info!(
            agent = %self.declaration.name,
            iterations = result.iterations,
            tool_calls = result.tool_calls.len(),
            finish_reason = %result.finish_reason,
            "Agent finished"
        );

        if let Some(key) = self.declaration.output_key {
            context
                .state
                .insert(key.to_string(), Value::String(result.content.clone()));
        }

        Ok(result.content)
    }

    fn name(&self) -> &str {
        self.declaration.name
    }

    fn description(&self) -> &str {
        self.declaration.description
    }

    fn system_prompt(&self) -> String {
        self.declaration.instruction.to_string()
    }

    fn output_key(&self) -> Option<&str> {
        self.declaration.output_key
    }

    fn tool_names(&self) -> Vec<String> {
        self.declaration.tool_names()
    }
}
