//! Warehouse abstraction
//!
//! The `Warehouse` trait is the seam between tools and the managed SQL
//! warehouse. Implementations forward to the external service: no retries,
//! no pagination, no batching, no transactions. Every failure is logged and
//! handed back to the caller unchanged.
//!
//! # Example
//!
//! ```rust,ignore
//! use mentor::db::{QueryParameter, Warehouse};
//!
//! let sql = format!(
//!     "SELECT name, email FROM `{}` WHERE email = @email",
//!     warehouse.table_ref("employee_profiles")
//! );
//! let row = warehouse
//!     .query_single_row(&sql, &[QueryParameter::string("email", "jane@amazincorp.com")])
//!     .await?;
//! ```

use crate::types::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One result row, keyed by column name
pub type Row = serde_json::Map<String, Value>;

/// Table holding employee profiles
pub const EMPLOYEE_PROFILES_TABLE: &str = "employee_profiles";
/// Table holding one row per training registration
pub const EMPLOYEE_TRAININGS_TABLE: &str = "employee_trainings";
/// Table holding the company's project portfolio
pub const PROJECT_PORTFOLIO_TABLE: &str = "project_portfolio";

/// Scalar type of a named query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ParameterType {
    String,
    Int64,
    Float64,
    Bool,
    Date,
}

impl ParameterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterType::String => "STRING",
            ParameterType::Int64 => "INT64",
            ParameterType::Float64 => "FLOAT64",
            ParameterType::Bool => "BOOL",
            ParameterType::Date => "DATE",
        }
    }
}

/// A named (`@name`) scalar query parameter
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParameter {
    pub name: String,
    pub param_type: ParameterType,
    pub value: Value,
}

impl QueryParameter {
    pub fn new(name: impl Into<String>, param_type: ParameterType, value: Value) -> Self {
        Self {
            name: name.into(),
            param_type,
            value,
        }
    }

    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, ParameterType::String, Value::String(value.into()))
    }

    /// The parameter value as the warehouse expects it on the wire (a string)
    pub fn wire_value(&self) -> Option<String> {
        match &self.value {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Fully-qualified table reference: `project.dataset.table`.
pub fn table_ref(project_id: &str, dataset_id: &str, table_id: &str) -> String {
    format!("{}.{}.{}", project_id, dataset_id, table_id)
}

/// Parameterized read and append-only write access to the warehouse.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Fully-qualified reference for a table in the configured dataset
    fn table_ref(&self, table_id: &str) -> String;

    /// Execute a query and return its first row, or `None` when it yields no rows
    async fn query_single_row(&self, sql: &str, params: &[QueryParameter]) -> Result<Option<Row>>;

    /// Execute a query and return every row
    async fn query_multiple_rows(&self, sql: &str, params: &[QueryParameter]) -> Result<Vec<Row>>;

    /// Append one row to a table of the configured dataset
    async fn insert_json_row(&self, table_id: &str, row: &Row) -> Result<()>;
}
