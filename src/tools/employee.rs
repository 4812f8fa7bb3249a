//! Employee profile lookup.

use crate::db::{QueryParameter, Warehouse, EMPLOYEE_PROFILES_TABLE};
use crate::tools::registry::{required_str, Tool};
use crate::types::{AppError, EmployeeProfile, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

pub const GET_EMPLOYEE_PROFILE: &str = "get_employee_profile";

/// Fetch one employee's profile by email. `None` when no profile matches.
pub async fn get_employee_profile(
    warehouse: &dyn Warehouse,
    email: &str,
) -> Result<Option<EmployeeProfile>> {
    info!("Getting employee profile for {}...", email);

    let sql = format!(
        "SELECT name, email, department, role, skills FROM `{}` WHERE email = @email",
        warehouse.table_ref(EMPLOYEE_PROFILES_TABLE)
    );
    let row = warehouse
        .query_single_row(&sql, &[QueryParameter::string("email", email)])
        .await?;

    match row {
        Some(row) => serde_json::from_value(Value::Object(row))
            .map(Some)
            .map_err(|e| AppError::Warehouse(format!("Unexpected employee profile row: {}", e))),
        None => {
            warn!("No profile found for email: {}", email);
            Ok(None)
        }
    }
}

pub struct EmployeeProfileTool {
    warehouse: Arc<dyn Warehouse>,
}

impl EmployeeProfileTool {
    pub fn new(warehouse: Arc<dyn Warehouse>) -> Self {
        Self { warehouse }
    }
}

#[async_trait]
impl Tool for EmployeeProfileTool {
    fn name(&self) -> &str {
        GET_EMPLOYEE_PROFILE
    }

    fn description(&self) -> &str {
        "Retrieve an employee's profile (name, email, department, role and list of current skills) by email address. Returns null when no profile exists."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "email": {
                    "type": "string",
                    "description": "The email address of the employee to look up"
                }
            },
            "required": ["email"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let email = required_str(&args, "email")?;
        let profile = get_employee_profile(self.warehouse.as_ref(), email).await?;
        serde_json::to_value(profile).map_err(|e| AppError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MockWarehouse, Row};

    fn profile_row() -> Row {
        let value = json!({
            "name": "John Doe",
            "email": "john.doe@amazincorp.com",
            "department": "IT",
            "role": "Senior Software Engineer",
            "skills": "Python, Java,  Google Cloud"
        });
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn warehouse_returning(row: Option<Row>) -> MockWarehouse {
        let mut warehouse = MockWarehouse::new();
        warehouse
            .expect_table_ref()
            .returning(|table| format!("p.d.{}", table));
        warehouse
            .expect_query_single_row()
            .withf(|sql, params| {
                sql.contains("`p.d.employee_profiles`")
                    && sql.contains("@email")
                    && params.len() == 1
                    && params[0].name == "email"
            })
            .times(1)
            .returning(move |_, _| Ok(row.clone()));
        warehouse
    }

    #[tokio::test]
    async fn test_profile_skills_are_split() {
        let warehouse = warehouse_returning(Some(profile_row()));
        let profile = get_employee_profile(&warehouse, "john.doe@amazincorp.com")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(profile.name, "John Doe");
        assert_eq!(profile.skills, vec!["Python", "Java", "Google Cloud"]);
    }

    #[tokio::test]
    async fn test_missing_profile_is_null() {
        let tool = EmployeeProfileTool::new(Arc::new(warehouse_returning(None)));
        let value = tool
            .execute(json!({"email": "nobody@amazincorp.com"}))
            .await
            .unwrap();
        assert!(value.is_null());
    }

    #[tokio::test]
    async fn test_warehouse_error_propagates() {
        let mut warehouse = MockWarehouse::new();
        warehouse
            .expect_table_ref()
            .returning(|table| table.to_string());
        warehouse
            .expect_query_single_row()
            .returning(|_, _| Err(AppError::Warehouse("denied".to_string())));

        let result = get_employee_profile(&warehouse, "a@b.com").await;
        assert!(matches!(result, Err(AppError::Warehouse(msg)) if msg == "denied"));
    }

    #[tokio::test]
    async fn test_email_is_required() {
        let tool = EmployeeProfileTool::new(Arc::new(MockWarehouse::new()));
        assert!(matches!(
            tool.execute(json!({})).await,
            Err(AppError::InvalidInput(_))
        ));
    }
}
