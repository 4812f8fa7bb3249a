use crate::llm::client::{LLMClient, LLMResponse};
use crate::llm::coordinator::{ConversationMessage, MessageRole};
use crate::types::{AppError, Result, ToolCall, ToolDefinition};
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessage,
        ChatCompletionTool, ChatCompletionToolChoiceOption, ChatCompletionToolType,
        CreateChatCompletionRequestArgs, CreateChatCompletionResponse, FunctionCall,
        FunctionObject,
    },
    Client,
};
use async_trait::async_trait;

pub struct OpenAIClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAIClient {
    pub fn new(api_key: String, api_base: String, model: String) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base);

        Self {
            client: Client::with_config(config),
            model,
        }
    }

    async fn complete(
        &self,
        messages: Vec<ChatCompletionRequestMessage>,
        tools: Vec<ChatCompletionTool>,
    ) -> Result<CreateChatCompletionResponse> {
        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(&self.model).messages(messages);
        if !tools.is_empty() {
            builder
                .tools(tools)
                .tool_choice(ChatCompletionToolChoiceOption::Auto);
        }
        let request = builder
            .build()
            .map_err(|e| AppError::LLM(format!("Failed to build request: {}", e)))?;

        self.client
            .chat()
            .create(request)
            .await
            .map_err(|e| AppError::LLM(format!("OpenAI API error: {}", e)))
    }

    async fn complete_text(&self, messages: Vec<ChatCompletionRequestMessage>) -> Result<String> {
        let response = self.complete(messages, Vec::new()).await?;
        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| AppError::LLM("No response from OpenAI".to_string()))
    }
}

fn system_message(content: &str) -> ChatCompletionRequestMessage {
    ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage::from(
        content.to_string(),
    ))
}

fn user_message(content: &str) -> ChatCompletionRequestMessage {
    ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage::from(content.to_string()))
}

fn to_request_message(message: &ConversationMessage) -> Result<ChatCompletionRequestMessage> {
    match message.role {
        MessageRole::System => Ok(system_message(&message.content)),
        MessageRole::User => Ok(user_message(&message.content)),
        MessageRole::Assistant => {
            let mut builder = ChatCompletionRequestAssistantMessageArgs::default();
            if !message.content.is_empty() {
                builder.content(message.content.clone());
            }
            if !message.tool_calls.is_empty() {
                let calls: Vec<ChatCompletionMessageToolCall> = message
                    .tool_calls
                    .iter()
                    .map(|call| ChatCompletionMessageToolCall {
                        id: call.id.clone(),
                        r#type: ChatCompletionToolType::Function,
                        function: FunctionCall {
                            name: call.name.clone(),
                            arguments: call.arguments.to_string(),
                        },
                    })
                    .collect();
                builder.tool_calls(calls);
            }
            builder
                .build()
                .map(Into::into)
                .map_err(|e| AppError::LLM(format!("Failed to build assistant message: {}", e)))
        }
        MessageRole::Tool => ChatCompletionRequestToolMessageArgs::default()
            .tool_call_id(message.tool_call_id.clone().unwrap_or_default())
            .content(message.content.clone())
            .build()
            .map(Into::into)
            .map_err(|e| AppError::LLM(format!("Failed to build tool message: {}", e))),
    }
}

fn to_openai_tools(tools: &[ToolDefinition]) -> Vec<ChatCompletionTool> {
    tools
        .iter()
        .map(|tool| ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: tool.name.clone(),
                description: Some(tool.description.clone()),
                parameters: Some(tool.parameters.clone()),
                strict: None,
            },
        })
        .collect()
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.complete_text(vec![user_message(prompt)]).await
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.complete_text(vec![system_message(system), user_message(prompt)])
            .await
    }

    async fn generate_with_history(&self, messages: &[(String, String)]) -> Result<String> {
        let chat_messages: Vec<ChatCompletionRequestMessage> = messages
            .iter()
            .map(|(role, content)| match role.as_str() {
                "system" => system_message(content),
                "assistant" => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(content.clone())
                    .build()
                    .map(Into::into)
                    .unwrap_or_else(|_| user_message(content)),
                _ => user_message(content),
            })
            .collect();

        self.complete_text(chat_messages).await
    }

    async fn generate_with_tools_and_history(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        let chat_messages = messages
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let response = self.complete(chat_messages, to_openai_tools(tools)).await?;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| AppError::LLM("No response from OpenAI".to_string()))?;

        let content = choice.message.content.clone().unwrap_or_default();
        let finish_reason = choice
            .finish_reason
            .as_ref()
            .map(|r| format!("{:?}", r).to_lowercase())
            .unwrap_or_else(|| "unknown".to_string());

        let tool_calls = choice
            .message
            .tool_calls
            .as_ref()
            .map(|calls| {
                calls
                    .iter()
                    .map(|call| ToolCall {
                        id: call.id.clone(),
                        name: call.function.name.clone(),
                        arguments: serde_json::from_str(&call.function.arguments)
                            .unwrap_or(serde_json::json!({})),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(LLMResponse {
            content,
            tool_calls,
            finish_reason,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_definitions_become_functions() {
        let tools = vec![ToolDefinition {
            name: "get_employee_profile".to_string(),
            description: "Look up an employee".to_string(),
            parameters: serde_json::json!({"type": "object"}),
            long_running: false,
        }];

        let converted = to_openai_tools(&tools);
        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0].function.name, "get_employee_profile");
        assert_eq!(
            converted[0].function.description.as_deref(),
            Some("Look up an employee")
        );
    }

    #[test]
    fn test_assistant_tool_calls_are_forwarded() {
        let message = ConversationMessage::assistant(
            "",
            vec![ToolCall {
                id: "call_1".to_string(),
                name: "web_search".to_string(),
                arguments: serde_json::json!({"query": "rust course"}),
            }],
        );

        match to_request_message(&message).unwrap() {
            ChatCompletionRequestMessage::Assistant(msg) => {
                let calls = msg.tool_calls.unwrap();
                assert_eq!(calls[0].id, "call_1");
                assert!(calls[0].function.arguments.contains("rust course"));
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_tool_result_keeps_call_id() {
        let message =
            ConversationMessage::tool_result("call_7", &serde_json::json!({"status": "ok"}));
        match to_request_message(&message).unwrap() {
            ChatCompletionRequestMessage::Tool(msg) => assert_eq!(msg.tool_call_id, "call_7"),
            other => panic!("unexpected message: {:?}", other),
        }
    }
}
