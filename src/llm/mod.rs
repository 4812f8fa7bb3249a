//! LLM Provider Clients and Abstractions
//!
//! Every agent reasons through an [`LLMClient`]. The provider is picked once
//! at startup from the configuration:
//! - `openai` - any OpenAI-compatible endpoint (Gemini's compatibility layer by default)
//! - `ollama` - local Ollama server
//!
//! The [`coordinator`] module runs the multi-turn tool calling loop on top of
//! a client.
//!
//! # Example
//!
//! ```ignore
//! use mentor::llm::{LLMClientFactory, Provider};
//!
//! let factory = LLMClientFactory::from_config(&config.llm);
//! let client = factory.create_default().await?;
//! let answer = client.generate("What is 2+2?").await?;
//! ```

/// Core LLM client trait and provider selection.
pub mod client;
/// Multi-turn tool calling loop.
pub mod coordinator;

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "openai")]
pub mod openai;

pub use client::{LLMClient, LLMClientFactory, LLMResponse, Provider};
pub use coordinator::{
    ConversationMessage, CoordinatorResult, MessageRole, ToolCallingConfig, ToolCoordinator,
};
