//! Test doubles shared by the integration tests.
//!
//! - [`ScriptedLLMClient`] answers intent classification with a fixed label
//!   and plays back a script of tool-calling turns
//! - [`FakeWarehouse`] keeps tables in memory and understands the handful of
//!   queries the tools issue
//! - [`FakeSearch`] returns canned company documentation passages

#![allow(dead_code)]

use async_trait::async_trait;
use mentor::db::{QueryParameter, Row, Warehouse};
use mentor::llm::{ConversationMessage, LLMClient, LLMResponse};
use mentor::rag::{SearchHit, SemanticSearch};
use mentor::types::{AppError, Result, ToolCall, ToolDefinition};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};

// ============= LLM =============

/// LLM double driven by a script.
///
/// Classification calls (`generate_with_system`) return `label`. Each
/// tool-calling turn pops the next scripted response; an exhausted script is
/// an LLM error.
pub struct ScriptedLLMClient {
    label: String,
    turns: Mutex<VecDeque<LLMResponse>>,
    fail: bool,
    /// Conversations sent to the model, one entry per turn
    pub requests: Mutex<Vec<(Vec<ConversationMessage>, Vec<String>)>>,
}

impl ScriptedLLMClient {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            turns: Mutex::new(VecDeque::new()),
            fail: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A client whose every call fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new("")
        }
    }

    pub fn then_text(self, content: &str) -> Self {
        self.turns.lock().push_back(LLMResponse::text(content));
        self
    }

    pub fn then_tool_call(self, name: &str, arguments: Value) -> Self {
        let id = format!("call_{}", self.turns.lock().len());
        self.turns.lock().push_back(LLMResponse::tool_calls(vec![ToolCall {
            id,
            name: name.to_string(),
            arguments,
        }]));
        self
    }

    /// Names of the tools offered on each turn
    pub fn offered_tools(&self) -> Vec<Vec<String>> {
        self.requests.lock().iter().map(|(_, tools)| tools.clone()).collect()
    }

    fn check(&self) -> Result<()> {
        if self.fail {
            return Err(AppError::LLM("Mock LLM failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LLMClient for ScriptedLLMClient {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        self.check()?;
        Ok(self.label.clone())
    }

    async fn generate_with_system(&self, _system: &str, _prompt: &str) -> Result<String> {
        self.check()?;
        Ok(self.label.clone())
    }

    async fn generate_with_history(&self, _messages: &[(String, String)]) -> Result<String> {
        self.check()?;
        Ok(self.label.clone())
    }

    async fn generate_with_tools_and_history(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        self.check()?;
        self.requests.lock().push((
            messages.to_vec(),
            tools.iter().map(|t| t.name.clone()).collect(),
        ));
        self.turns
            .lock()
            .pop_front()
            .ok_or_else(|| AppError::LLM("script exhausted".to_string()))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

// ============= Warehouse =============

/// In-memory warehouse.
///
/// Tables are found by name in the SQL text; `@email` filters on the email
/// column and `SUM(cost_usd)` aggregates like the warehouse does (NULL when
/// there are no rows).
#[derive(Default)]
pub struct FakeWarehouse {
    tables: Mutex<HashMap<String, Vec<Row>>>,
    fail: bool,
}

impl FakeWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// A warehouse whose every call fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_rows(self, table: &str, rows: Vec<Value>) -> Self {
        {
            let mut tables = self.tables.lock();
            let entry = tables.entry(table.to_string()).or_default();
            for row in rows {
                if let Value::Object(map) = row {
                    entry.push(map);
                }
            }
        }
        self
    }

    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables.lock().get(table).cloned().unwrap_or_default()
    }

    fn select(&self, sql: &str, params: &[QueryParameter]) -> Result<Vec<Row>> {
        if self.fail {
            return Err(AppError::Warehouse("warehouse unavailable".to_string()));
        }

        let tables = self.tables.lock();
        let rows = tables
            .iter()
            .find(|(name, _)| sql.contains(&format!(".{}`", name)))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default();

        let email = params
            .iter()
            .find(|p| p.name == "email")
            .and_then(|p| p.value.as_str().map(str::to_string));

        Ok(match email {
            Some(email) => rows
                .into_iter()
                .filter(|row| row.get("email").and_then(Value::as_str) == Some(email.as_str()))
                .collect(),
            None => rows,
        })
    }
}

#[async_trait]
impl Warehouse for FakeWarehouse {
    fn table_ref(&self, table_id: &str) -> String {
        format!("test-project.amazincorp.{}", table_id)
    }

    async fn query_single_row(&self, sql: &str, params: &[QueryParameter]) -> Result<Option<Row>> {
        let rows = self.select(sql, params)?;

        if sql.contains("SUM(cost_usd)") {
            let total = if rows.is_empty() {
                Value::Null
            } else {
                json!(rows
                    .iter()
                    .filter_map(|row| row.get("cost_usd").and_then(Value::as_f64))
                    .sum::<f64>())
            };
            let mut row = Row::new();
            row.insert("total_cost_usd".to_string(), total);
            return Ok(Some(row));
        }

        Ok(rows.into_iter().next())
    }

    async fn query_multiple_rows(&self, sql: &str, params: &[QueryParameter]) -> Result<Vec<Row>> {
        self.select(sql, params)
    }

    async fn insert_json_row(&self, table_id: &str, row: &Row) -> Result<()> {
        if self.fail {
            return Err(AppError::Warehouse("warehouse unavailable".to_string()));
        }
        self.tables
            .lock()
            .entry(table_id.to_string())
            .or_default()
            .push(row.clone());
        Ok(())
    }
}

/// A training row as stored in `employee_trainings`.
pub fn training_row(email: &str, name: &str, date: &str, cost_usd: f64) -> Value {
    json!({
        "email": email,
        "name": name,
        "description": format!("{} course", name),
        "skills": "Cloud, Kubernetes",
        "date": date,
        "cost_usd": cost_usd,
        "url": "https://training.example.com/course"
    })
}

// ============= Search =============

/// Semantic search double returning the same passages for every query.
#[derive(Default)]
pub struct FakeSearch {
    pub queries: Mutex<Vec<String>>,
}

impl FakeSearch {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SemanticSearch for FakeSearch {
    async fn search(&self, query: &str, page_size: usize) -> Result<Vec<SearchHit>> {
        self.queries.lock().push(query.to_string());
        let hits = vec![SearchHit {
            title: "Professional Development Policy".to_string(),
            link: Some("gs://amazincorp-docs/professional_development_policy.pdf".to_string()),
            snippets: vec!["Each employee has an annual training budget of 3500 USD.".to_string()],
            extractive_answer: None,
        }];
        Ok(hits.into_iter().take(page_size).collect())
    }
}
