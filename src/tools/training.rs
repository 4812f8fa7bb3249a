//! Training history, remaining budget and registration.

use crate::db::{QueryParameter, Row, Warehouse, EMPLOYEE_TRAININGS_TABLE};
use crate::tools::registry::{required_str, Tool};
use crate::types::records::{format_training_date, parse_training_date};
use crate::types::{AppError, Result, TrainingRecord};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

pub const GET_EMPLOYEE_TRAINING_HISTORY: &str = "get_employee_training_history";
pub const GET_EMPLOYEE_REMAINING_TRAINING_BUDGET: &str = "get_employee_remaining_training_budget";
pub const REGISTER_NEW_TRAINING: &str = "register_new_training";

/// Annual training budget per employee, in USD.
pub const ANNUAL_TRAINING_BUDGET_USD: f64 = 3500.0;

/// Budget left after spending `total_cost_usd`. No spend means the full budget.
///
/// Overspending yields a negative amount; it is not clamped.
pub fn remaining_budget(total_cost_usd: Option<f64>) -> f64 {
    ANNUAL_TRAINING_BUDGET_USD - total_cost_usd.unwrap_or(0.0)
}

/// Every training registered for an employee.
pub async fn get_employee_training_history(
    warehouse: &dyn Warehouse,
    email: &str,
) -> Result<Vec<TrainingRecord>> {
    info!("Getting employee training history for {}...", email);

    let sql = format!(
        "SELECT name, email, description, skills, date, cost_usd, url FROM `{}` WHERE email = @email",
        warehouse.table_ref(EMPLOYEE_TRAININGS_TABLE)
    );
    let rows = warehouse
        .query_multiple_rows(&sql, &[QueryParameter::string("email", email)])
        .await?;

    rows.into_iter()
        .map(|row| {
            serde_json::from_value(Value::Object(row))
                .map_err(|e| AppError::Warehouse(format!("Unexpected training row: {}", e)))
        })
        .collect()
}

/// Remaining annual training budget for an employee.
pub async fn get_employee_remaining_training_budget(
    warehouse: &dyn Warehouse,
    email: &str,
) -> Result<f64> {
    info!("Getting remaining training budget for {}...", email);

    let sql = format!(
        "SELECT SUM(cost_usd) AS total_cost_usd FROM `{}` WHERE email = @email",
        warehouse.table_ref(EMPLOYEE_TRAININGS_TABLE)
    );
    let row = warehouse
        .query_single_row(&sql, &[QueryParameter::string("email", email)])
        .await?;

    let total = row
        .as_ref()
        .and_then(|r| r.get("total_cost_usd"))
        .and_then(Value::as_f64);
    if total.is_none() {
        warn!("No training records found for email: {}", email);
    }

    Ok(remaining_budget(total))
}

/// Append one training registration.
pub async fn register_new_training(warehouse: &dyn Warehouse, record: &TrainingRecord) -> Result<()> {
    info!("Registering new training for {}...", record.email);

    let row: Row = match serde_json::to_value(record) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return Err(AppError::Internal("Training record is not an object".into())),
        Err(e) => return Err(AppError::Internal(e.to_string())),
    };
    warehouse.insert_json_row(EMPLOYEE_TRAININGS_TABLE, &row).await?;

    info!("Training registration completed successfully");
    Ok(())
}

fn email_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "email": {
                "type": "string",
                "description": "The email address of the employee"
            }
        },
        "required": ["email"]
    })
}

pub struct TrainingHistoryTool {
    warehouse: Arc<dyn Warehouse>,
}

impl TrainingHistoryTool {
    pub fn new(warehouse: Arc<dyn Warehouse>) -> Self {
        Self { warehouse }
    }
}

#[async_trait]
impl Tool for TrainingHistoryTool {
    fn name(&self) -> &str {
        GET_EMPLOYEE_TRAINING_HISTORY
    }

    fn description(&self) -> &str {
        "Retrieve every training an employee registered for: name, description, skills, date (YYYY-MM-DD), cost in USD and URL."
    }

    fn parameters_schema(&self) -> Value {
        email_schema()
    }

    fn is_long_running(&self) -> bool {
        true
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let email = required_str(&args, "email")?;
        let history = get_employee_training_history(self.warehouse.as_ref(), email).await?;
        serde_json::to_value(history).map_err(|e| AppError::Internal(e.to_string()))
    }
}

pub struct RemainingBudgetTool {
    warehouse: Arc<dyn Warehouse>,
}

impl RemainingBudgetTool {
    pub fn new(warehouse: Arc<dyn Warehouse>) -> Self {
        Self { warehouse }
    }
}

#[async_trait]
impl Tool for RemainingBudgetTool {
    fn name(&self) -> &str {
        GET_EMPLOYEE_REMAINING_TRAINING_BUDGET
    }

    fn description(&self) -> &str {
        "Calculate an employee's remaining annual training budget in USD: 3500 minus the cost of every registered training."
    }

    fn parameters_schema(&self) -> Value {
        email_schema()
    }

    fn is_long_running(&self) -> bool {
        true
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let email = required_str(&args, "email")?;
        let remaining = get_employee_remaining_training_budget(self.warehouse.as_ref(), email).await?;
        Ok(json!({
            "email": email,
            "annual_training_budget_usd": ANNUAL_TRAINING_BUDGET_USD,
            "remaining_training_budget_usd": remaining,
        }))
    }
}

pub struct RegisterTrainingTool {
    warehouse: Arc<dyn Warehouse>,
}

impl RegisterTrainingTool {
    pub fn new(warehouse: Arc<dyn Warehouse>) -> Self {
        Self { warehouse }
    }

    fn record_from_args(args: &Value) -> Result<TrainingRecord> {
        let optional = |key: &str| {
            args.get(key)
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string())
                .unwrap_or_default()
        };

        let raw_date = required_str(args, "date")?;
        let date = parse_training_date(raw_date).ok_or_else(|| {
            AppError::InvalidInput(format!("Invalid date '{}', expected YYYY-MM-DD", raw_date))
        })?;

        let cost_usd = match args.get("cost_usd") {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().trim_start_matches('$').parse::<f64>().ok(),
            _ => None,
        }
        .ok_or_else(|| AppError::InvalidInput("Missing or invalid 'cost_usd' parameter".into()))?;

        Ok(TrainingRecord {
            email: required_str(args, "email")?.to_string(),
            name: required_str(args, "name")?.to_string(),
            description: optional("description"),
            skills: optional("skills"),
            date: Some(date),
            cost_usd: Some(cost_usd),
            url: optional("url"),
        })
    }
}

#[async_trait]
impl Tool for RegisterTrainingTool {
    fn name(&self) -> &str {
        REGISTER_NEW_TRAINING
    }

    fn description(&self) -> &str {
        "Register a new training for an employee. Stores the training name, description, comma-separated skills, start date (YYYY-MM-DD), cost in USD and URL."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "email": {"type": "string", "description": "Employee's email address"},
                "name": {"type": "string", "description": "Name of the training course"},
                "description": {"type": "string", "description": "Course description"},
                "skills": {"type": "string", "description": "Comma-separated list of skills covered"},
                "date": {"type": "string", "description": "Course date in YYYY-MM-DD format"},
                "cost_usd": {"type": "number", "description": "Course cost in USD"},
                "url": {"type": "string", "description": "Course URL or registration link"}
            },
            "required": ["email", "name", "description", "skills", "date", "cost_usd", "url"]
        })
    }

    fn is_long_running(&self) -> bool {
        true
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let record = Self::record_from_args(&args)?;
        register_new_training(self.warehouse.as_ref(), &record).await?;
        Ok(json!({
            "status": "registered",
            "email": record.email,
            "name": record.name,
            "date": record.date.map(|d| format_training_date(&d)),
            "cost_usd": record.cost_usd,
        }))
    }
}
