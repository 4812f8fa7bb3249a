//! Tools the agents can call
//!
//! # Module Structure
//!
//! - [`registry`](crate::tools::registry) - `Tool` trait, registration and lookup
//! - [`employee`](crate::tools::employee) - employee profile lookup
//! - [`training`](crate::tools::training) - training history, remaining budget, registration
//! - [`portfolio`](crate::tools::portfolio) - company project portfolio
//! - [`company_search`](crate::tools::company_search) - semantic search over company documentation
//! - [`search`](crate::tools::search) - public web search (DuckDuckGo)
//! - [`agent_tool`](crate::tools::agent_tool) - another agent wrapped as a tool
//!
//! Warehouse-backed tools that may take a while (history, budget, portfolio,
//! registration) carry a long-running hint in their definition. They are
//! awaited like any other tool.
//!
//! # Example
//!
//! ```ignore
//! let registry = ToolRegistry::with_domain_tools(warehouse, search);
//! let result = registry
//!     .execute("get_employee_profile", json!({"email": "john.doe@amazincorp.com"}))
//!     .await?;
//! ```

/// Agents wrapped as tools.
pub mod agent_tool;
/// Company documentation search.
pub mod company_search;
/// Employee profile lookup.
pub mod employee;
/// Project portfolio.
pub mod portfolio;
/// Tool registry for managing available tools.
pub mod registry;
/// Web search tool using DuckDuckGo.
pub mod search;
/// Training history, budget and registration.
pub mod training;

use crate::db::Warehouse;
use crate::rag::SemanticSearch;
use std::sync::Arc;

pub use agent_tool::AgentTool;
pub use registry::{Tool, ToolRegistry};

impl ToolRegistry {
    /// Registry holding every warehouse, search and web tool.
    pub fn with_domain_tools(
        warehouse: Arc<dyn Warehouse>,
        search: Arc<dyn SemanticSearch>,
    ) -> Self {
        let mut registry = Self::new();

        registry.register(Arc::new(employee::EmployeeProfileTool::new(warehouse.clone())));
        registry.register(Arc::new(training::TrainingHistoryTool::new(warehouse.clone())));
        registry.register(Arc::new(training::RemainingBudgetTool::new(warehouse.clone())));
        registry.register(Arc::new(training::RegisterTrainingTool::new(warehouse.clone())));
        registry.register(Arc::new(portfolio::ProjectPortfolioTool::new(warehouse)));
        registry.register(Arc::new(company_search::CompanyInformationSearchTool::new(search)));
        registry.register(Arc::new(search::WebSearchTool::new()));

        registry
    }
}
