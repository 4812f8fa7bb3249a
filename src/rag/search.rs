//! Semantic search over the company documentation data store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, instrument};

use crate::types::{AppError, Result};
use crate::utils::config::Config;
use crate::utils::credentials::{StaticToken, TokenSource};
use std::sync::Arc;

/// Default number of hits returned per query
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// One document returned by the data store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub snippets: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extractive_answer: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SemanticSearch: Send + Sync {
    async fn search(&self, query: &str, page_size: usize) -> Result<Vec<SearchHit>>;
}

/// Resource path of a data store in the default collection.
pub fn data_store_path(project: &str, location: &str, data_store_id: &str) -> String {
    format!(
        "projects/{}/locations/{}/collections/default_collection/dataStores/{}",
        project, location, data_store_id
    )
}

/// Regional endpoint for a data store location; `global` uses the bare host.
pub fn default_api_base(location: &str) -> String {
    if location.is_empty() || location == "global" {
        "https://discoveryengine.googleapis.com".to_string()
    } else {
        format!("https://{}-discoveryengine.googleapis.com", location)
    }
}

/// Discovery Engine `servingConfigs.search` client.
pub struct VertexSearchClient {
    http: reqwest::Client,
    api_base: String,
    data_store: String,
    credentials: Arc<dyn TokenSource>,
}

impl VertexSearchClient {
    pub fn new(api_base: impl Into<String>, data_store: String, access_token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            data_store,
            credentials: Arc::new(StaticToken::new(access_token)),
        }
    }

    /// Fetch a bearer token from `credentials` before every request.
    pub fn with_credentials(mut self, credentials: Arc<dyn TokenSource>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn from_config(config: &Config, credentials: Arc<dyn TokenSource>) -> Self {
        let location = &config.search.data_store_location;
        let api_base = config
            .search
            .api_base
            .clone()
            .unwrap_or_else(|| default_api_base(location));
        Self::new(
            api_base,
            data_store_path(&config.google.project, location, &config.search.data_store_id),
            None,
        )
        .with_credentials(credentials)
    }

    pub fn data_store(&self) -> &str {
        &self.data_store
    }

    fn search_url(&self) -> String {
        format!(
            "{}/v1/{}/servingConfigs/default_search:search",
            self.api_base, self.data_store
        )
    }

    async fn run_search(&self, query: &str, page_size: usize) -> Result<Vec<SearchHit>> {
        let body = json!({
            "query": query,
            "pageSize": page_size,
            "contentSearchSpec": {
                "snippetSpec": { "returnSnippet": true },
                "extractiveContentSpec": { "maxExtractiveAnswerCount": 1 }
            }
        });

        let mut request = self.http.post(self.search_url()).json(&body);
        let token = self
            .credentials
            .token()
            .await
            .map_err(|e| AppError::Search(e.to_string()))?;
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Search(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Search(format!(
                "Search request failed ({}): {}",
                status, text
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::Search(format!("Failed to parse response: {}", e)))?;

        Ok(parsed.results.into_iter().filter_map(hit_from_result).collect())
    }
}

#[async_trait]
impl SemanticSearch for VertexSearchClient {
    #[instrument(skip(self))]
    async fn search(&self, query: &str, page_size: usize) -> Result<Vec<SearchHit>> {
        self.run_search(query, page_size)
            .await
            .inspect_err(|e| error!("Company information search failed: {}", e))
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    document: Option<SearchDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchDocument {
    #[serde(default)]
    derived_struct_data: Value,
}

fn hit_from_result(result: SearchResult) -> Option<SearchHit> {
    let data = result.document?.derived_struct_data;
    let title = data.get("title").and_then(Value::as_str).unwrap_or_default();
    let link = data.get("link").and_then(Value::as_str).map(String::from);

    let snippets: Vec<String> = data
        .get("snippets")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|s| s.get("snippet").and_then(Value::as_str))
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    let extractive_answer = data
        .get("extractive_answers")
        .and_then(Value::as_array)
        .and_then(|answers| answers.first())
        .and_then(|a| a.get("content").and_then(Value::as_str))
        .map(String::from);

    if title.is_empty() && link.is_none() && snippets.is_empty() && extractive_answer.is_none() {
        return None;
    }

    Some(SearchHit {
        title: title.to_string(),
        link,
        snippets,
        extractive_answer,
    })
}
