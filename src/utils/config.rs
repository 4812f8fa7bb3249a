//! Environment-based configuration.
//!
//! A single [`Config`] is built once at process start, validated, and then
//! handed to each component at construction. Validation reports every missing
//! required variable at once instead of failing on the first.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Default OpenAI-compatible endpoint for hosted Gemini models.
pub const DEFAULT_OPENAI_COMPAT_BASE: &str =
    "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_BIGQUERY_API_BASE: &str = "https://bigquery.googleapis.com";

#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub google: GoogleCloudConfig,
    pub bigquery: BigQueryConfig,
    pub search: SearchConfig,
    pub llm: LLMConfig,
    pub agents: AgentRuntimeConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Sessions kept in memory before the least recently used is evicted
    pub session_capacity: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("expected pretty, compact or json, got '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GoogleCloudConfig {
    pub project: String,
    /// Location for BigQuery jobs
    pub location: String,
    /// Bearer token for Google APIs
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BigQueryConfig {
    pub dataset_id: String,
    pub api_base: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchConfig {
    pub data_store_id: String,
    pub data_store_location: String,
    /// Overrides the regional Discovery Engine endpoint
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LLMConfig {
    pub provider: LLMProviderKind,
    pub model: String,
    pub api_base: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LLMProviderKind {
    OpenAI,
    Ollama,
}

impl FromStr for LLMProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "gemini" => Ok(LLMProviderKind::OpenAI),
            "ollama" => Ok(LLMProviderKind::Ollama),
            other => Err(format!("expected openai or ollama, got '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentRuntimeConfig {
    pub max_tool_iterations: usize,
    pub tool_timeout_secs: u64,
}

impl Default for AgentRuntimeConfig {
    fn default() -> Self {
        Self {
            max_tool_iterations: 10,
            tool_timeout_secs: 30,
        }
    }
}

/// Errors that can occur while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingVars(Vec<String>),

    #[error("Invalid value '{value}' for {var}: {reason}")]
    InvalidValue {
        var: String,
        value: String,
        reason: String,
    },
}

impl Config {
    /// Load configuration from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// Variables that are set but empty count as missing when required.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());
        let optional = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let project = var_or("GOOGLE_CLOUD_PROJECT", "");
        let dataset_id = var_or("BIGQUERY_DATASET_ID", "amazincorp");
        let data_store_id = var_or("VERTEX_AI_SEARCH_DATA_STORE_ID", "");
        let model = var_or("MODEL_NAME", "gemini-2.0-flash");

        let provider: LLMProviderKind = parse_var(&lookup, "LLM_PROVIDER", "openai")?;
        let api_key = optional("LLM_API_KEY");

        let mut missing = Vec::new();
        if project.trim().is_empty() {
            missing.push("GOOGLE_CLOUD_PROJECT".to_string());
        }
        if dataset_id.trim().is_empty() {
            missing.push("BIGQUERY_DATASET_ID".to_string());
        }
        if data_store_id.trim().is_empty() {
            missing.push("VERTEX_AI_SEARCH_DATA_STORE_ID".to_string());
        }
        if model.trim().is_empty() {
            missing.push("MODEL_NAME".to_string());
        }
        if provider == LLMProviderKind::OpenAI && api_key.is_none() {
            missing.push("LLM_API_KEY".to_string());
        }
        if !missing.is_empty() {
            return Err(ConfigError::MissingVars(missing));
        }

        let default_llm_base = match provider {
            LLMProviderKind::OpenAI => DEFAULT_OPENAI_COMPAT_BASE,
            LLMProviderKind::Ollama => DEFAULT_OLLAMA_URL,
        };

        Ok(Config {
            server: ServerConfig {
                host: var_or("HOST", "0.0.0.0"),
                port: parse_var(&lookup, "PORT", "8080")?,
                session_capacity: parse_var(&lookup, "SESSION_CAPACITY", "10000")?,
            },
            logging: LoggingConfig {
                level: var_or("LOG_LEVEL", "info"),
                format: parse_var(&lookup, "LOG_FORMAT", "pretty")?,
            },
            google: GoogleCloudConfig {
                project,
                location: var_or("GOOGLE_CLOUD_LOCATION", "US"),
                access_token: optional("GOOGLE_OAUTH_ACCESS_TOKEN"),
            },
            bigquery: BigQueryConfig {
                dataset_id,
                api_base: var_or("BIGQUERY_API_BASE", DEFAULT_BIGQUERY_API_BASE),
            },
            search: SearchConfig {
                data_store_id,
                data_store_location: var_or("VERTEX_AI_SEARCH_DATA_STORE_LOCATION", "global"),
                api_base: optional("DISCOVERY_ENGINE_API_BASE"),
            },
            llm: LLMConfig {
                provider,
                model,
                api_base: var_or("LLM_API_BASE", default_llm_base),
                api_key,
            },
            agents: AgentRuntimeConfig {
                max_tool_iterations: parse_var(&lookup, "MAX_TOOL_ITERATIONS", "10")?,
                tool_timeout_secs: parse_var(&lookup, "TOOL_TIMEOUT_SECS", "30")?,
            },
        })
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let value = lookup(name)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string());
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue {
            var: name.to_string(),
            value: value.clone(),
            reason: e.to_string(),
        })
}
