use crate::db::{Warehouse, PROJECT_PORTFOLIO_TABLE};
use crate::tools::registry::Tool;
use crate::types::{AppError, ProjectPortfolioEntry, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

pub const GET_PROJECT_PORTFOLIO: &str = "get_project_portfolio";

/// All current and upcoming projects with their required skills.
pub async fn get_project_portfolio(warehouse: &dyn Warehouse) -> Result<Vec<ProjectPortfolioEntry>> {
    info!("Getting project portfolio...");

    let sql = format!(
        "SELECT name, customer, customer_profile, customer_location, description, skills_needed, status FROM `{}`",
        warehouse.table_ref(PROJECT_PORTFOLIO_TABLE)
    );
    let rows = warehouse.query_multiple_rows(&sql, &[]).await?;

    rows.into_iter()
        .map(|row| {
            serde_json::from_value(Value::Object(row))
                .map_err(|e| AppError::Warehouse(format!("Unexpected portfolio row: {}", e)))
        })
        .collect()
}

pub struct ProjectPortfolioTool {
    warehouse: Arc<dyn Warehouse>,
}

impl ProjectPortfolioTool {
    pub fn new(warehouse: Arc<dyn Warehouse>) -> Self {
        Self { warehouse }
    }
}

#[async_trait]
impl Tool for ProjectPortfolioTool {
    fn name(&self) -> &str {
        GET_PROJECT_PORTFOLIO
    }

    fn description(&self) -> &str {
        "Retrieve the company's project portfolio: project name, customer, customer profile and location, description, skills needed and status."
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    fn is_long_running(&self) -> bool {
        true
    }

    async fn execute(&self, _args: Value) -> Result<Value> {
        let projects = get_project_portfolio(self.warehouse.as_ref()).await?;
        serde_json::to_value(projects).map_err(|e| AppError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MockWarehouse;

    #[tokio::test]
    async fn test_portfolio_reads_all_projects_without_parameters() {
        let mut warehouse = MockWarehouse::new();
        warehouse
            .expect_table_ref()
            .returning(|table| format!("p.d.{}", table));
        warehouse
            .expect_query_multiple_rows()
            .withf(|sql, params| sql.contains("`p.d.project_portfolio`") && params.is_empty())
            .returning(|_, _| {
                let row = json!({
                    "name": "Cloud Migration",
                    "customer": "Acme",
                    "customer_profile": "Retail",
                    "customer_location": "Berlin",
                    "description": "Move workloads to GCP",
                    "skills_needed": "Google Cloud, Terraform",
                    "status": "upcoming"
                });
                match row {
                    Value::Object(map) => Ok(vec![map]),
                    _ => unreachable!(),
                }
            });

        let tool = ProjectPortfolioTool::new(Arc::new(warehouse));
        let value = tool.execute(json!({})).await.unwrap();

        assert_eq!(value.as_array().map(Vec::len), Some(1));
        assert_eq!(value[0]["skills_needed"], "Google Cloud, Terraform");
        assert!(tool.is_long_running());
    }
}
