//! LLM client abstractions and provider selection
//!
//! Every agent talks to its model through [`LLMClient`]:
//! - **OpenAI-compatible** endpoints (Gemini's compatibility layer by default)
//! - **Ollama** for local inference

use crate::llm::coordinator::ConversationMessage;
use crate::types::{AppError, Result, ToolCall, ToolDefinition};
use crate::utils::config::{LLMConfig, LLMProviderKind};
use async_trait::async_trait;

/// Generic LLM client trait for provider abstraction
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a completion from a prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate with system prompt
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Generate with conversation history
    async fn generate_with_history(
        &self,
        messages: &[(String, String)], // (role, content) pairs
    ) -> Result<String>;

    /// One model turn over a tool-calling conversation.
    ///
    /// The model either answers or asks for tool calls; the caller runs the
    /// tools and sends the results back in the next turn.
    async fn generate_with_tools_and_history(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Response from an LLM generation request
#[derive(Debug, Clone, Default)]
pub struct LLMResponse {
    /// The text content of the response
    pub content: String,
    /// Any tool calls requested by the model
    pub tool_calls: Vec<ToolCall>,
    /// The reason generation stopped (e.g., "stop", "tool_calls", "length")
    pub finish_reason: String,
}

impl LLMResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
            finish_reason: "stop".to_string(),
        }
    }

    pub fn tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: String::new(),
            tool_calls,
            finish_reason: "tool_calls".to_string(),
        }
    }
}

/// Provider enum for runtime selection
///
/// | Provider | Tool Calling | Notes |
/// |----------|--------------|-------|
/// | OpenAI | ✅ | Any OpenAI-compatible endpoint, Gemini included |
/// | Ollama | ✅ | Local models with function calling support |
#[derive(Debug, Clone)]
pub enum Provider {
    /// OpenAI API provider (and compatible APIs)
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::OpenAI {
    ///     api_key: "...".to_string(),
    ///     api_base: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
    ///     model: "gemini-2.0-flash".to_string(),
    /// };
    /// ```
    OpenAI {
        api_key: String,
        api_base: String,
        model: String,
    },

    /// Ollama local LLM provider
    ///
    /// Pick a model with function calling support (`llama3.1`, `qwen2.5`).
    Ollama { base_url: String, model: String },
}

impl Provider {
    /// Provider described by the LLM section of the configuration.
    pub fn from_config(config: &LLMConfig) -> Self {
        match config.provider {
            LLMProviderKind::OpenAI => Provider::OpenAI {
                api_key: config.api_key.clone().unwrap_or_default(),
                api_base: config.api_base.clone(),
                model: config.model.clone(),
            },
            LLMProviderKind::Ollama => Provider::Ollama {
                base_url: config.api_base.clone(),
                model: config.model.clone(),
            },
        }
    }

    /// Create a client instance for this provider
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the provider's Cargo feature is
    /// not compiled in.
    pub async fn create_client(&self) -> Result<Box<dyn LLMClient>> {
        match self {
            #[cfg(feature = "openai")]
            Provider::OpenAI {
                api_key,
                api_base,
                model,
            } => Ok(Box::new(super::openai::OpenAIClient::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
            ))),

            #[cfg(feature = "ollama")]
            Provider::Ollama { base_url, model } => Ok(Box::new(
                super::ollama::OllamaClient::new(base_url.clone(), model.clone()).await?,
            )),

            #[allow(unreachable_patterns)]
            other => Err(AppError::Configuration(format!(
                "{} provider is not enabled. Rebuild with `--features {}`",
                other.name(),
                other.name().to_lowercase()
            ))),
        }
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAI { .. } => "OpenAI",
            Provider::Ollama { .. } => "Ollama",
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Provider::OpenAI { model, .. } | Provider::Ollama { model, .. } => model,
        }
    }
}

/// Configuration-based client factory
///
/// ```rust,ignore
/// let factory = LLMClientFactory::new(Provider::from_config(&config.llm));
/// let client = factory.create_default().await?;
/// ```
pub struct LLMClientFactory {
    default_provider: Provider,
}

impl LLMClientFactory {
    pub fn new(default_provider: Provider) -> Self {
        Self { default_provider }
    }

    pub fn from_config(config: &LLMConfig) -> Self {
        Self::new(Provider::from_config(config))
    }

    /// Create a client using the default provider
    pub async fn create_default(&self) -> Result<Box<dyn LLMClient>> {
        self.default_provider.create_client().await
    }

    pub fn default_provider(&self) -> &Provider {
        &self.default_provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn llm_config(provider: LLMProviderKind) -> LLMConfig {
        LLMConfig {
            provider,
            model: "gemini-2.0-flash".to_string(),
            api_base: "http://localhost:11434".to_string(),
            api_key: Some("key".to_string()),
        }
    }

    #[test]
    fn test_provider_from_config() {
        let provider = Provider::from_config(&llm_config(LLMProviderKind::OpenAI));
        assert_eq!(provider.name(), "OpenAI");
        assert_eq!(provider.model(), "gemini-2.0-flash");

        let provider = Provider::from_config(&llm_config(LLMProviderKind::Ollama));
        assert_eq!(provider.name(), "Ollama");
    }

    #[test]
    fn test_factory_default_provider() {
        let factory = LLMClientFactory::from_config(&llm_config(LLMProviderKind::Ollama));
        assert_eq!(factory.default_provider().name(), "Ollama");
    }

    #[test]
    fn test_response_constructors() {
        let response = LLMResponse::text("done");
        assert_eq!(response.finish_reason, "stop");
        assert!(response.tool_calls.is_empty());

        let response = LLMResponse::tool_calls(vec![ToolCall {
            id: "call_1".to_string(),
            name: "get_employee_profile".to_string(),
            arguments: serde_json::json!({"email": "a@b.com"}),
        }]);
        assert_eq!(response.finish_reason, "tool_calls");
        assert_eq!(response.tool_calls.len(), 1);
    }

    #[cfg(not(feature = "ollama"))]
    #[tokio::test]
    async fn test_disabled_provider_returns_helpful_error() {
        let provider = Provider::Ollama {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.1".to_string(),
        };

        let err = match provider.create_client().await {
            Ok(_) => panic!("Expected error"),
            Err(e) => e.to_string(),
        };
        assert!(err.contains("--features ollama"));
    }
}
