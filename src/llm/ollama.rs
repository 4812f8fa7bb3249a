use crate::llm::client::{LLMClient, LLMResponse};
use crate::llm::coordinator::{ConversationMessage, MessageRole};
use crate::types::{AppError, Result, ToolCall, ToolDefinition};
use async_trait::async_trait;
use ollama_rs::{
    generation::{
        chat::{request::ChatMessageRequest, ChatMessage},
        tools::ToolInfo,
    },
    Ollama,
};
use serde_json::json;

const DEFAULT_OLLAMA_PORT: u16 = 11434;

pub struct OllamaClient {
    client: Ollama,
    model: String,
}

impl OllamaClient {
    pub async fn new(base_url: String, model: String) -> Result<Self> {
        let (host, port) = split_base_url(&base_url);
        let client = Ollama::new(host, port);

        Ok(Self { client, model })
    }

    async fn chat(&self, messages: Vec<ChatMessage>, tools: Vec<ToolInfo>) -> Result<ChatMessage> {
        let mut request = ChatMessageRequest::new(self.model.clone(), messages);
        if !tools.is_empty() {
            request = request.tools(tools);
        }

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| AppError::LLM(format!("Ollama error: {}", e)))?;

        Ok(response.message)
    }
}

/// Split `scheme://host:port` into the `scheme://host` and port pair the
/// Ollama client expects.
fn split_base_url(base_url: &str) -> (String, u16) {
    let trimmed = base_url.trim_end_matches('/');
    let (scheme, rest) = trimmed.split_once("://").unwrap_or(("http", trimmed));
    match rest.rsplit_once(':') {
        Some((host, port)) => (
            format!("{}://{}", scheme, host),
            port.parse().unwrap_or(DEFAULT_OLLAMA_PORT),
        ),
        None => (format!("{}://{}", scheme, rest), DEFAULT_OLLAMA_PORT),
    }
}

fn to_ollama_message(message: &ConversationMessage) -> Result<ChatMessage> {
    match message.role {
        MessageRole::System => Ok(ChatMessage::system(message.content.clone())),
        MessageRole::User => Ok(ChatMessage::user(message.content.clone())),
        MessageRole::Tool => Ok(ChatMessage::tool(message.content.clone())),
        MessageRole::Assistant if message.tool_calls.is_empty() => {
            Ok(ChatMessage::assistant(message.content.clone()))
        }
        MessageRole::Assistant => {
            let calls: Vec<serde_json::Value> = message
                .tool_calls
                .iter()
                .map(|call| json!({"function": {"name": call.name, "arguments": call.arguments}}))
                .collect();
            serde_json::from_value(json!({
                "role": "assistant",
                "content": message.content,
                "tool_calls": calls,
            }))
            .map_err(|e| AppError::LLM(format!("Failed to build assistant message: {}", e)))
        }
    }
}

fn to_ollama_tools(tools: &[ToolDefinition]) -> Result<Vec<ToolInfo>> {
    tools
        .iter()
        .map(|tool| {
            serde_json::from_value(json!({
                "type": "function",
                "function": {
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": tool.parameters,
                }
            }))
            .map_err(|e| AppError::LLM(format!("Invalid tool schema for {}: {}", tool.name, e)))
        })
        .collect()
}

#[async_trait]
impl LLMClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let message = self
            .chat(vec![ChatMessage::user(prompt.to_string())], Vec::new())
            .await?;
        Ok(message.content)
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        let messages = vec![
            ChatMessage::system(system.to_string()),
            ChatMessage::user(prompt.to_string()),
        ];
        Ok(self.chat(messages, Vec::new()).await?.content)
    }

    async fn generate_with_history(&self, messages: &[(String, String)]) -> Result<String> {
        let chat_messages: Vec<ChatMessage> = messages
            .iter()
            .map(|(role, content)| match role.as_str() {
                "system" => ChatMessage::system(content.clone()),
                "assistant" => ChatMessage::assistant(content.clone()),
                _ => ChatMessage::user(content.clone()),
            })
            .collect();

        Ok(self.chat(chat_messages, Vec::new()).await?.content)
    }

    async fn generate_with_tools_and_history(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        let chat_messages = messages
            .iter()
            .map(to_ollama_message)
            .collect::<Result<Vec<_>>>()?;

        let message = self.chat(chat_messages, to_ollama_tools(tools)?).await?;

        // Ollama does not assign call ids
        let tool_calls: Vec<ToolCall> = message
            .tool_calls
            .iter()
            .enumerate()
            .map(|(i, call)| ToolCall {
                id: format!("call_{}", i),
                name: call.function.name.clone(),
                arguments: call.function.arguments.clone(),
            })
            .collect();

        let finish_reason = if tool_calls.is_empty() { "stop" } else { "tool_calls" };

        Ok(LLMResponse {
            content: message.content,
            tool_calls,
            finish_reason: finish_reason.to_string(),
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
