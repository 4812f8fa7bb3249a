use crate::rag::search::{SemanticSearch, DEFAULT_PAGE_SIZE};
use crate::tools::registry::{required_str, Tool};
use crate::types::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub const COMPANY_INFORMATION_SEARCH: &str = "company_information_search";

/// Semantic search over company documentation (policies, history, mission, benefits).
pub struct CompanyInformationSearchTool {
    search: Arc<dyn SemanticSearch>,
}

impl CompanyInformationSearchTool {
    pub fn new(search: Arc<dyn SemanticSearch>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl Tool for CompanyInformationSearchTool {
    fn name(&self) -> &str {
        COMPANY_INFORMATION_SEARCH
    }

    fn description(&self) -> &str {
        "Search the company's documentation (professional development policy, history, mission, values, benefits) and return the most relevant passages."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Natural language search query"
                },
                "num_results": {
                    "type": "integer",
                    "description": "Maximum number of documents to return (default: 5)",
                    "default": DEFAULT_PAGE_SIZE
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let query = required_str(&args, "query")?;
        let page_size = args
            .get("num_results")
            .and_then(Value::as_u64)
            .map(|n| n.clamp(1, 20) as usize)
            .unwrap_or(DEFAULT_PAGE_SIZE);

        let hits = self.search.search(query, page_size).await?;

        Ok(json!({
            "query": query,
            "results": hits,
            "count": hits.len()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::search::{MockSemanticSearch, SearchHit};
    use crate::types::AppError;

    #[tokio::test]
    async fn test_search_results_are_returned() {
        let mut search = MockSemanticSearch::new();
        search
            .expect_search()
            .withf(|query, page_size| query == "training policy" && *page_size == DEFAULT_PAGE_SIZE)
            .returning(|_, _| {
                Ok(vec![SearchHit {
                    title: "Professional Development Policy".to_string(),
                    link: Some("gs://docs/policy.pdf".to_string()),
                    snippets: vec!["Annual budget of 3500 USD".to_string()],
                    extractive_answer: None,
                }])
            });

        let tool = CompanyInformationSearchTool::new(Arc::new(search));
        let value = tool.execute(json!({"query": "training policy"})).await.unwrap();

        assert_eq!(value["count"], 1);
        assert_eq!(value["results"][0]["title"], "Professional Development Policy");
    }

    #[tokio::test]
    async fn test_search_error_propagates() {
        let mut search = MockSemanticSearch::new();
        search
            .expect_search()
            .returning(|_, _| Err(AppError::Search("unavailable".to_string())));

        let tool = CompanyInformationSearchTool::new(Arc::new(search));
        assert!(matches!(
            tool.execute(json!({"query": "x"})).await,
            Err(AppError::Search(_))
        ));
    }
}
