use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

/// Employee, training and project record shapes read from the warehouse.
pub mod records;

pub use records::{EmployeeProfile, ProjectPortfolioEntry, TrainingRecord};

// ============= API Request/Response Types =============

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    pub response: String,
    pub agent: String,
    pub intent: Intent,
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AgentRunRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AgentRunResponse {
    pub response: String,
    pub agent: String,
    pub session_id: String,
}

// ============= Intents =============

/// Coarse category of a user request, used to pick the handling agent.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    SkillsDevelopment,
    TrainingHistoryAndBudget,
    ProfessionalDevelopmentPolicy,
    RegisterTraining,
    FindTraining,
    CompanyInformation,
    Unknown,
}

impl Intent {
    /// Every intent the classifier may emit, in prompt order.
    pub const ALL: [Intent; 7] = [
        Intent::SkillsDevelopment,
        Intent::TrainingHistoryAndBudget,
        Intent::ProfessionalDevelopmentPolicy,
        Intent::RegisterTraining,
        Intent::FindTraining,
        Intent::CompanyInformation,
        Intent::Unknown,
    ];

    /// Wire label, as emitted by the classifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::SkillsDevelopment => "SKILLS_DEVELOPMENT",
            Intent::TrainingHistoryAndBudget => "TRAINING_HISTORY_AND_BUDGET",
            Intent::ProfessionalDevelopmentPolicy => "PROFESSIONAL_DEVELOPMENT_POLICY",
            Intent::RegisterTraining => "REGISTER_TRAINING",
            Intent::FindTraining => "FIND_TRAINING",
            Intent::CompanyInformation => "COMPANY_INFORMATION",
            Intent::Unknown => "UNKNOWN",
        }
    }

    /// Parse a wire label (case-insensitive, `-` and spaces accepted for `_`).
    pub fn from_label(label: &str) -> Option<Intent> {
        let normalized = label.trim().to_uppercase().replace(['-', ' '], "_");
        Intent::ALL
            .iter()
            .copied()
            .find(|intent| intent.as_str() == normalized)
    }

    /// Whether the request must carry an employee email before it is delegated.
    ///
    /// Policy and general company questions are answerable anonymously.
    pub fn requires_email(&self) -> bool {
        !matches!(
            self,
            Intent::ProfessionalDevelopmentPolicy
                | Intent::CompanyInformation
                | Intent::FindTraining
                | Intent::Unknown
        )
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============= Agent Context =============

#[derive(Debug, Clone, Default)]
pub struct AgentContext {
    pub session_id: String,
    /// Employee email the request is about, when known
    pub email: Option<String>,
    pub conversation_history: Vec<Message>,
    /// Session state visible to the agent (output keys of earlier agents)
    pub state: HashMap<String, serde_json::Value>,
}

impl AgentContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            ..Default::default()
        }
    }

    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            agent: None,
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(agent: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            agent: Some(agent.into()),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

// ============= Tool Types =============

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
    /// The call may take a while; callers await it like any other tool
    #[serde(default)]
    pub long_running: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Warehouse error: {0}")]
    Warehouse(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let (status, message) = match self {
            AppError::LLM(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Warehouse(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Search(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Tool(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Configuration(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_label_roundtrip() {
        for intent in Intent::ALL {
            assert_eq!(Intent::from_label(intent.as_str()), Some(intent));
        }
        assert_eq!(
            Intent::from_label(" find-training "),
            Some(Intent::FindTraining)
        );
        assert_eq!(Intent::from_label("something else"), None);
    }

    #[test]
    fn test_intent_serializes_as_label() {
        let json = serde_json::to_string(&Intent::TrainingHistoryAndBudget).unwrap();
        assert_eq!(json, "\"TRAINING_HISTORY_AND_BUDGET\"");
    }

    #[test]
    fn test_policy_questions_do_not_need_email() {
        assert!(!Intent::ProfessionalDevelopmentPolicy.requires_email());
        assert!(!Intent::CompanyInformation.requires_email());
        assert!(Intent::SkillsDevelopment.requires_email());
        assert!(Intent::TrainingHistoryAndBudget.requires_email());
        assert!(Intent::RegisterTraining.requires_email());
    }

    #[test]
    fn test_app_error_status_codes() {
        use axum::http::StatusCode;
        use axum::response::IntoResponse;

        let response = AppError::InvalidInput("bad".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = AppError::NotFound("missing".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = AppError::Warehouse("boom".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
