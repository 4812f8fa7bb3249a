//! Tool Coordinator for Multi-Turn Tool Calling
//!
//! Runs the tool calling loop for one agent:
//!
//! 1. Send the conversation with the agent's tools to the LLM
//! 2. If the model requests tool calls, execute them
//! 3. Send tool results back to the model
//! 4. Repeat until completion or max iterations
//!
//! Tool failures, timeouts and unknown tool names are reported back to the
//! model as `{"error": ...}` results. Errors from the LLM itself end the run.
//!
//! # Example
//!
//! ```rust,ignore
//! use mentor::llm::coordinator::{ToolCoordinator, ToolCallingConfig};
//!
//! let coordinator = ToolCoordinator::new(client, registry, ToolCallingConfig::default())
//!     .with_tools(["get_employee_profile", "get_project_portfolio"]);
//!
//! let result = coordinator
//!     .execute(Some("You help employees grow."), "What should I learn next?")
//!     .await?;
//! ```

use crate::llm::client::LLMClient;
use crate::tools::registry::ToolRegistry;
use crate::types::{Result, ToolCall, ToolDefinition};
use crate::utils::config::AgentRuntimeConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Configuration for tool calling coordination behavior.
#[derive(Debug, Clone)]
pub struct ToolCallingConfig {
    /// Maximum number of LLM round-trips before stopping.
    pub max_iterations: usize,

    /// Timeout for individual tool execution.
    pub tool_timeout: Duration,
}

impl Default for ToolCallingConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            tool_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&AgentRuntimeConfig> for ToolCallingConfig {
    fn from(config: &AgentRuntimeConfig) -> Self {
        Self {
            max_iterations: config.max_tool_iterations,
            tool_timeout: Duration::from_secs(config.tool_timeout_secs),
        }
    }
}

/// Record of a single tool call execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// Identifier of this call, as issued by the LLM.
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
    /// Result returned by the tool (or error object).
    pub result: serde_json::Value,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Reason why a tool coordination session ended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum FinishReason {
    /// Model decided to stop (no more tool calls).
    Stop,
    /// Hit the maximum iterations limit.
    MaxIterations,
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FinishReason::Stop => write!(f, "stop"),
            FinishReason::MaxIterations => write!(f, "max_iterations"),
        }
    }
}

/// A message in a tool-calling conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: MessageRole,
    pub content: String,
    /// Tool calls requested by the assistant (only for Assistant role).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Call this message answers (only for Tool role).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

/// Role of a message sender in a tool-calling conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl ConversationMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create an assistant message with optional tool calls.
    pub fn assistant(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            tool_calls,
            tool_call_id: None,
        }
    }

    /// Create a tool result message.
    pub fn tool_result(tool_call_id: impl Into<String>, result: &serde_json::Value) -> Self {
        Self {
            role: MessageRole::Tool,
            content: serde_json::to_string(result).unwrap_or_else(|_| "{}".to_string()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// Result of a complete tool coordination session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorResult {
    /// Final text response from the model.
    pub content: String,
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of LLM round-trips performed.
    pub iterations: usize,
    pub finish_reason: FinishReason,
    pub message_history: Vec<ConversationMessage>,
}

/// Tool coordinator bound to one LLM client and a subset of the registry.
pub struct ToolCoordinator {
    client: Arc<dyn LLMClient>,
    registry: Arc<ToolRegistry>,
    allowed_tools: Option<Vec<String>>,
    config: ToolCallingConfig,
}

impl ToolCoordinator {
    pub fn new(
        client: Arc<dyn LLMClient>,
        registry: Arc<ToolRegistry>,
        config: ToolCallingConfig,
    ) -> Self {
        Self {
            client,
            registry,
            allowed_tools: None,
            config,
        }
    }

    /// Restrict the model to the named tools.
    pub fn with_tools<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_tools = Some(names.into_iter().map(Into::into).collect());
        self
    }

    fn tool_definitions(&self) -> Vec<ToolDefinition> {
        match &self.allowed_tools {
            Some(names) => self.registry.get_tool_definitions_for(names),
            None => self.registry.get_tool_definitions(),
        }
    }

    fn is_allowed(&self, name: &str) -> bool {
        let listed = match &self.allowed_tools {
            Some(names) => names.iter().any(|n| n == name),
            None => true,
        };
        listed && self.registry.has_tool(name)
    }

    /// Execute a complete tool-calling loop for a single prompt.
    pub async fn execute(&self, system: Option<&str>, prompt: &str) -> Result<CoordinatorResult> {
        let mut messages = Vec::new();
        if let Some(sys) = system {
            messages.push(ConversationMessage::system(sys));
        }
        messages.push(ConversationMessage::user(prompt));
        self.execute_conversation(messages).await
    }

    /// Execute the loop starting from an existing conversation.
    pub async fn execute_conversation(
        &self,
        mut messages: Vec<ConversationMessage>,
    ) -> Result<CoordinatorResult> {
        let tools = self.tool_definitions();
        let mut all_tool_calls: Vec<ToolCallRecord> = Vec::new();

        for iteration in 0..self.config.max_iterations {
            let response = self
                .client
                .generate_with_tools_and_history(&messages, &tools)
                .await?;

            messages.push(ConversationMessage::assistant(
                &response.content,
                response.tool_calls.clone(),
            ));

            if response.tool_calls.is_empty() {
                return Ok(CoordinatorResult {
                    content: response.content,
                    tool_calls: all_tool_calls,
                    iterations: iteration + 1,
                    finish_reason: FinishReason::Stop,
                    message_history: messages,
                });
            }

            for call in &response.tool_calls {
                let record = self.execute_single_tool(call).await;
                messages.push(ConversationMessage::tool_result(&record.id, &record.result));
                all_tool_calls.push(record);
            }
        }

        warn!(
            max_iterations = self.config.max_iterations,
            "Tool calling loop hit the iteration limit"
        );

        let content = messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant && !m.content.is_empty())
            .map(|m| m.content.clone())
            .unwrap_or_default();

        Ok(CoordinatorResult {
            content,
            tool_calls: all_tool_calls,
            iterations: self.config.max_iterations,
            finish_reason: FinishReason::MaxIterations,
            message_history: messages,
        })
    }

    /// Execute a single tool call with timeout. Failures become error records.
    async fn execute_single_tool(&self, call: &ToolCall) -> ToolCallRecord {
        let start = Instant::now();
        let failed = |error: String, duration_ms: u64| ToolCallRecord {
            id: call.id.clone(),
            name: call.name.clone(),
            arguments: call.arguments.clone(),
            result: serde_json::json!({ "error": error }),
            success: false,
            duration_ms,
            error: Some(error),
        };

        if !self.is_allowed(&call.name) {
            warn!(tool = %call.name, "Model requested a tool it does not have");
            return failed(format!("Unknown tool: {}", call.name), 0);
        }

        debug!(tool = %call.name, "Executing tool call");
        let result = timeout(
            self.config.tool_timeout,
            self.registry.execute(&call.name, call.arguments.clone()),
        )
        .await;

        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(value)) => ToolCallRecord {
                id: call.id.clone(),
                name: call.name.clone(),
                arguments: call.arguments.clone(),
                result: value,
                success: true,
                duration_ms,
                error: None,
            },
            Ok(Err(e)) => failed(e.to_string(), duration_ms),
            Err(_) => failed("Tool execution timed out".to_string(), duration_ms),
        }
    }

    pub fn client(&self) -> &Arc<dyn LLMClient> {
        &self.client
    }

    pub fn config(&self) -> &ToolCallingConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::{LLMResponse, MockLLMClient};
    use crate::tools::registry::Tool;
    use crate::types::AppError;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echo the input"
        }
        fn parameters_schema(&self) -> Value {
            json!({"type": "object", "properties": {"text": {"type": "string"}}})
        }
        async fn execute(&self, args: Value) -> Result<Value> {
            Ok(json!({"echo": args["text"]}))
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str {
            "fail"
        }
        fn description(&self) -> &str {
            "Always fails"
        }
        fn parameters_schema(&self) -> Value {
            json!({"type": "object"})
        }
        async fn execute(&self, _args: Value) -> Result<Value> {
            Err(AppError::Warehouse("boom".to_string()))
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        registry.register(Arc::new(FailingTool));
        Arc::new(registry)
    }

    fn call(id: &str, name: &str, arguments: Value) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments,
        }
    }

    #[test]
    fn test_tool_calling_config_from_runtime() {
        let config = ToolCallingConfig::from(&AgentRuntimeConfig {
            max_tool_iterations: 3,
            tool_timeout_secs: 5,
        });
        assert_eq!(config.max_iterations, 3);
        assert_eq!(config.tool_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_conversation_message_tool_result() {
        let msg = ConversationMessage::tool_result("call_1", &json!({"result": 42}));
        assert_eq!(msg.role, MessageRole::Tool);
        assert_eq!(msg.tool_call_id, Some("call_1".to_string()));
        assert!(msg.content.contains("42"));
    }

    #[tokio::test]
    async fn test_loop_runs_tool_then_answers() {
        let mut client = MockLLMClient::new();
        let mut seq = mockall::Sequence::new();
        client
            .expect_generate_with_tools_and_history()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|_, tools| tools.len() == 1 && tools[0].name == "echo")
            .returning(|_, _| {
                Ok(LLMResponse::tool_calls(vec![call(
                    "call_1",
                    "echo",
                    json!({"text": "hi"}),
                )]))
            });
        client
            .expect_generate_with_tools_and_history()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|messages, _| {
                messages
                    .last()
                    .map(|m| m.role == MessageRole::Tool && m.content.contains("hi"))
                    .unwrap_or(false)
            })
            .returning(|_, _| Ok(LLMResponse::text("done")));

        let coordinator =
            ToolCoordinator::new(Arc::new(client), registry(), ToolCallingConfig::default())
                .with_tools(["echo"]);
        let result = coordinator.execute(Some("system"), "hello").await.unwrap();

        assert_eq!(result.content, "done");
        assert_eq!(result.iterations, 2);
        assert_eq!(result.finish_reason, FinishReason::Stop);
        assert_eq!(result.tool_calls.len(), 1);
        assert!(result.tool_calls[0].success);
    }

    #[tokio::test]
    async fn test_tool_error_is_reported_to_model() {
        let mut client = MockLLMClient::new();
        let mut seq = mockall::Sequence::new();
        client
            .expect_generate_with_tools_and_history()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(LLMResponse::tool_calls(vec![call("c", "fail", json!({}))])));
        client
            .expect_generate_with_tools_and_history()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(LLMResponse::text("sorry")));

        let coordinator =
            ToolCoordinator::new(Arc::new(client), registry(), ToolCallingConfig::default());
        let result = coordinator.execute(None, "go").await.unwrap();

        assert_eq!(result.content, "sorry");
        let record = &result.tool_calls[0];
        assert!(!record.success);
        assert!(record.result["error"].as_str().unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn test_tool_outside_subset_is_rejected() {
        let mut client = MockLLMClient::new();
        let mut seq = mockall::Sequence::new();
        client
            .expect_generate_with_tools_and_history()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(LLMResponse::tool_calls(vec![call("c", "fail", json!({}))])));
        client
            .expect_generate_with_tools_and_history()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(LLMResponse::text("ok")));

        let coordinator =
            ToolCoordinator::new(Arc::new(client), registry(), ToolCallingConfig::default())
                .with_tools(["echo"]);
        let result = coordinator.execute(None, "go").await.unwrap();

        assert_eq!(
            result.tool_calls[0].error.as_deref(),
            Some("Unknown tool: fail")
        );
    }

    #[tokio::test]
    async fn test_iteration_limit() {
        let mut client = MockLLMClient::new();
        client
            .expect_generate_with_tools_and_history()
            .times(2)
            .returning(|_, _| {
                Ok(LLMResponse::tool_calls(vec![call(
                    "c",
                    "echo",
                    json!({"text": "again"}),
                )]))
            });

        let config = ToolCallingConfig {
            max_iterations: 2,
            ..Default::default()
        };
        let coordinator = ToolCoordinator::new(Arc::new(client), registry(), config);
        let result = coordinator.execute(None, "loop").await.unwrap();

        assert_eq!(result.finish_reason, FinishReason::MaxIterations);
        assert_eq!(result.iterations, 2);
        assert_eq!(result.tool_calls.len(), 2);
    }

    #[tokio::test]
    async fn test_llm_error_aborts_run() {
        let mut client = MockLLMClient::new();
        client
            .expect_generate_with_tools_and_history()
            .returning(|_, _| Err(AppError::LLM("quota".to_string())));

        let coordinator =
            ToolCoordinator::new(Arc::new(client), registry(), ToolCallingConfig::default());
        assert!(matches!(
            coordinator.execute(None, "hi").await,
            Err(AppError::LLM(_))
        ));
    }
}
