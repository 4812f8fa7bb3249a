//! Public web search using daedra
//!
//! The training finder uses this to look up courses, certifications and
//! workshops. daedra queries DuckDuckGo.

use crate::tools::registry::{required_str, Tool};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::error;

pub const WEB_SEARCH: &str = "web_search";

const DEFAULT_NUM_RESULTS: usize = 10;

const MAX_NUM_RESULTS: u64 = 25;

/// DuckDuckGo search for the training finder
#[derive(Default)]
pub struct WebSearchTool;

impl WebSearchTool {
    pub fn new() -> Self {
        Self
    }
}

fn result_count(args: &Value) -> usize {
    args.get("num_results")
        .and_then(Value::as_u64)
        .map_or(DEFAULT_NUM_RESULTS, |n| n.clamp(1, MAX_NUM_RESULTS) as usize)
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        WEB_SEARCH
    }

    fn description(&self) -> &str {
        "Search the internet for training opportunities (courses, certifications, workshops) and return titles, URLs and descriptions"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What to look for, e.g. 'Kubernetes certification course 2025'"
                },
                "num_results": {
                    "type": "integer",
                    "description": "How many results to return, between 1 and 25",
                    "default": DEFAULT_NUM_RESULTS
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let query = required_str(&args, "query")?;
        let options = daedra::SearchOptions {
            num_results: result_count(&args),
            ..Default::default()
        };

        let search_args = daedra::SearchArgs {
            query: query.to_string(),
            options: Some(options),
        };
        let response = daedra::tools::search::perform_search(&search_args)
            .await
            .map_err(|e| {
                error!("Web search failed: {}", e);
                AppError::Tool(format!("Search failed: {}", e))
            })?;

        let results: Vec<Value> = response
            .data
            .iter()
            .map(|r| {
                json!({
                    "title": r.title,
                    "url": r.url,
                    "description": r.description
                })
            })
            .collect();

        Ok(json!({
            "query": query,
            "results": results,
            "count": results.len()
        }))
    }
}
