//! BigQuery REST client.
//!
//! Reads go through `jobs.query` with named parameters in GoogleSQL, polling
//! `jobs.getQueryResults` until the job completes. Appends go through a
//! multipart load job carrying a single newline-delimited JSON record, which
//! is awaited until the job reaches `DONE`. Only the first page of a result
//! set is read.

use crate::db::traits::{table_ref, QueryParameter, Row, Warehouse};
use crate::types::{AppError, Result};
use crate::utils::config::Config;
use crate::utils::credentials::{StaticToken, TokenSource};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, instrument};

const MULTIPART_BOUNDARY: &str = "mentor_load_job_boundary";
const DEFAULT_QUERY_TIMEOUT_MS: u64 = 10_000;
const JOB_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct BigQueryClient {
    http: reqwest::Client,
    api_base: String,
    project_id: String,
    dataset_id: String,
    location: String,
    credentials: Arc<dyn TokenSource>,
    query_timeout_ms: u64,
}

impl BigQueryClient {
    pub fn new(
        api_base: impl Into<String>,
        project_id: impl Into<String>,
        dataset_id: impl Into<String>,
        location: impl Into<String>,
        access_token: Option<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            dataset_id: dataset_id.into(),
            location: location.into(),
            credentials: Arc::new(StaticToken::new(access_token)),
            query_timeout_ms: DEFAULT_QUERY_TIMEOUT_MS,
        }
    }

    pub fn from_config(config: &Config, credentials: Arc<dyn TokenSource>) -> Self {
        Self::new(
            config.bigquery.api_base.clone(),
            config.google.project.clone(),
            config.bigquery.dataset_id.clone(),
            config.google.location.clone(),
            None,
        )
        .with_credentials(credentials)
    }

    /// Fetch a bearer token from `credentials` before every request.
    pub fn with_credentials(mut self, credentials: Arc<dyn TokenSource>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn dataset_id(&self) -> &str {
        &self.dataset_id
    }

    async fn authorized(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder> {
        let token = self
            .credentials
            .token()
            .await
            .map_err(|e| AppError::Warehouse(e.to_string()))?;
        Ok(match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    async fn send<T: for<'de> Deserialize<'de>>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = self
            .authorized(request)
            .await?
            .send()
            .await
            .map_err(|e| AppError::Warehouse(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Warehouse(format!(
                "BigQuery request failed ({}): {}",
                status, text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Warehouse(format!("Failed to parse response: {}", e)))
    }

    /// Run a query to completion and decode the first page of rows.
    async fn run_query(&self, sql: &str, params: &[QueryParameter]) -> Result<Vec<Row>> {
        let url = format!(
            "{}/bigquery/v2/projects/{}/queries",
            self.api_base, self.project_id
        );
        let body = query_request_body(sql, params, &self.location, self.query_timeout_ms);

        let mut response: QueryResponse = self.send(self.http.post(&url).json(&body)).await?;

        while !response.job_complete {
            let job_id = response
                .job_reference
                .as_ref()
                .map(|r| r.job_id.clone())
                .ok_or_else(|| {
                    AppError::Warehouse("Incomplete query returned no job reference".to_string())
                })?;
            debug!(job_id = %job_id, "Query still running, polling for results");

            let url = format!(
                "{}/bigquery/v2/projects/{}/queries/{}",
                self.api_base, self.project_id, job_id
            );
            let timeout = self.query_timeout_ms.to_string();
            response = self
                .send(self.http.get(&url).query(&[
                    ("location", self.location.as_str()),
                    ("timeoutMs", timeout.as_str()),
                ]))
                .await?;
        }

        if let Some(errors) = response.errors.filter(|e| !e.is_empty()) {
            return Err(AppError::Warehouse(format_errors(&errors)));
        }

        let fields = response.schema.map(|s| s.fields).unwrap_or_default();
        Ok(response
            .rows
            .unwrap_or_default()
            .into_iter()
            .map(|row| decode_row(&fields, row))
            .collect())
    }

    async fn run_load_job(&self, table_id: &str, row: &Row) -> Result<()> {
        let url = format!(
            "{}/upload/bigquery/v2/projects/{}/jobs",
            self.api_base, self.project_id
        );
        let metadata = load_job_metadata(&self.project_id, &self.dataset_id, table_id, &self.location);
        let body = multipart_body(&metadata, &ndjson_line(row)?);

        let mut job: JobResponse = self
            .send(
                self.http
                    .post(&url)
                    .query(&[("uploadType", "multipart")])
                    .header(
                        reqwest::header::CONTENT_TYPE,
                        format!("multipart/related; boundary={}", MULTIPART_BOUNDARY),
                    )
                    .body(body),
            )
            .await?;

        loop {
            if let Some(status) = &job.status {
                if status.state == "DONE" {
                    if let Some(err) = &status.error_result {
                        return Err(AppError::Warehouse(format!(
                            "Load job failed: {}",
                            err.message
                        )));
                    }
                    return Ok(());
                }
            }

            let job_id = job.job_reference.job_id.clone();
            let location = job
                .job_reference
                .location
                .clone()
                .unwrap_or_else(|| self.location.clone());
            debug!(job_id = %job_id, "Load job running, polling status");
            tokio::time::sleep(JOB_POLL_INTERVAL).await;

            let url = format!(
                "{}/bigquery/v2/projects/{}/jobs/{}",
                self.api_base, self.project_id, job_id
            );
            job = self
                .send(self.http.get(&url).query(&[("location", location.as_str())]))
                .await?;
        }
    }
}

#[async_trait]
impl Warehouse for BigQueryClient {
    fn table_ref(&self, table_id: &str) -> String {
        table_ref(&self.project_id, &self.dataset_id, table_id)
    }

    #[instrument(skip(self, params), fields(params = params.len()))]
    async fn query_single_row(&self, sql: &str, params: &[QueryParameter]) -> Result<Option<Row>> {
        self.run_query(sql, params)
            .await
            .map(|rows| rows.into_iter().next())
            .inspect_err(|e| error!("Error executing single row query: {}", e))
    }

    #[instrument(skip(self, params), fields(params = params.len()))]
    async fn query_multiple_rows(&self, sql: &str, params: &[QueryParameter]) -> Result<Vec<Row>> {
        self.run_query(sql, params)
            .await
            .inspect_err(|e| error!("Error executing multiple rows query: {}", e))
    }

    #[instrument(skip(self, row))]
    async fn insert_json_row(&self, table_id: &str, row: &Row) -> Result<()> {
        self.run_load_job(table_id, row)
            .await
            .inspect_err(|e| error!("Error inserting row into {}: {}", table_id, e))
    }
}

// ============= Wire formats =============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    job_complete: bool,
    job_reference: Option<JobReference>,
    schema: Option<TableSchema>,
    rows: Option<Vec<TableRow>>,
    errors: Option<Vec<ErrorProto>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobReference {
    job_id: String,
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobResponse {
    job_reference: JobReference,
    status: Option<JobStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobStatus {
    state: String,
    error_result: Option<ErrorProto>,
}

#[derive(Debug, Deserialize)]
struct ErrorProto {
    #[serde(default)]
    reason: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize, Default)]
struct TableSchema {
    #[serde(default)]
    fields: Vec<FieldSchema>,
}

#[derive(Debug, Clone, Deserialize)]
struct FieldSchema {
    name: String,
    #[serde(rename = "type")]
    field_type: String,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    fields: Vec<FieldSchema>,
}

#[derive(Debug, Deserialize)]
struct TableRow {
    #[serde(default)]
    f: Vec<TableCell>,
}

#[derive(Debug, Deserialize)]
struct TableCell {
    #[serde(default)]
    v: Value,
}

fn format_errors(errors: &[ErrorProto]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.reason, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

fn query_request_body(sql: &str, params: &[QueryParameter], location: &str, timeout_ms: u64) -> Value {
    let query_parameters: Vec<Value> = params
        .iter()
        .map(|p| {
            json!({
                "name": p.name,
                "parameterType": { "type": p.param_type.as_str() },
                "parameterValue": { "value": p.wire_value() },
            })
        })
        .collect();

    json!({
        "query": sql,
        "useLegacySql": false,
        "parameterMode": "NAMED",
        "queryParameters": query_parameters,
        "location": location,
        "timeoutMs": timeout_ms,
    })
}

fn load_job_metadata(project_id: &str, dataset_id: &str, table_id: &str, location: &str) -> Value {
    json!({
        "jobReference": {
            "projectId": project_id,
            "location": location,
        },
        "configuration": {
            "load": {
                "destinationTable": {
                    "projectId": project_id,
                    "datasetId": dataset_id,
                    "tableId": table_id,
                },
                "sourceFormat": "NEWLINE_DELIMITED_JSON",
                "writeDisposition": "WRITE_APPEND",
            }
        }
    })
}

/// Encode one row as a newline-terminated JSON record.
fn ndjson_line(row: &Row) -> Result<String> {
    let mut line = serde_json::to_string(row)
        .map_err(|e| AppError::Warehouse(format!("Failed to encode row: {}", e)))?;
    line.push('\n');
    Ok(line)
}

fn multipart_body(metadata: &Value, data: &str) -> String {
    format!(
        "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{meta}\r\n\
         --{b}\r\nContent-Type: application/octet-stream\r\n\r\n{data}\r\n--{b}--\r\n",
        b = MULTIPART_BOUNDARY,
        meta = metadata,
        data = data,
    )
}

fn decode_row(fields: &[FieldSchema], row: TableRow) -> Row {
    fields
        .iter()
        .zip(row.f)
        .map(|(field, cell)| (field.name.clone(), decode_field(field, cell.v)))
        .collect()
}

fn decode_field(field: &FieldSchema, value: Value) -> Value {
    if field.mode.as_deref() == Some("REPEATED") {
        return match value {
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| decode_scalar(field, unwrap_cell(item)))
                    .collect(),
            ),
            Value::Null => Value::Array(Vec::new()),
            other => decode_scalar(field, other),
        };
    }
    decode_scalar(field, value)
}

fn unwrap_cell(item: Value) -> Value {
    match item {
        Value::Object(mut map) if map.contains_key("v") => map.remove("v").unwrap_or(Value::Null),
        other => other,
    }
}

/// Cells arrive as strings; convert by column type.
fn decode_scalar(field: &FieldSchema, value: Value) -> Value {
    let raw = match value {
        Value::Null => return Value::Null,
        Value::String(s) => s,
        Value::Object(mut map) if matches!(field.field_type.as_str(), "RECORD" | "STRUCT") => {
            let cells = match map.remove("f") {
                Some(Value::Array(cells)) => cells,
                _ => return Value::Object(map),
            };
            return Value::Object(
                field
                    .fields
                    .iter()
                    .zip(cells)
                    .map(|(sub, cell)| (sub.name.clone(), decode_field(sub, unwrap_cell(cell))))
                    .collect(),
            );
        }
        other => return other,
    };

    match field.field_type.as_str() {
        "INTEGER" | "INT64" => raw
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or(Value::String(raw)),
        "FLOAT" | "FLOAT64" | "NUMERIC" | "BIGNUMERIC" => raw
            .parse::<f64>()
            .map(Value::from)
            .unwrap_or(Value::String(raw)),
        "BOOLEAN" | "BOOL" => match raw.as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(raw),
        },
        "TIMESTAMP" => raw
            .parse::<f64>()
            .ok()
            .and_then(|secs| {
                let whole = secs.trunc() as i64;
                let nanos = ((secs - secs.trunc()) * 1e9).round() as u32;
                chrono::DateTime::from_timestamp(whole, nanos)
            })
            .map(|ts| Value::String(ts.to_rfc3339()))
            .unwrap_or(Value::String(raw)),
        _ => Value::String(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::traits::ParameterType;

    fn field(name: &str, field_type: &str) -> FieldSchema {
        FieldSchema {
            name: name.to_string(),
            field_type: field_type.to_string(),
            mode: None,
            fields: Vec::new(),
        }
    }

    #[test]
    fn test_decode_row_by_schema_type() {
        let fields = vec![
            field("name", "STRING"),
            field("cost_usd", "FLOAT"),
            field("seats", "INTEGER"),
            field("active", "BOOLEAN"),
            field("date", "DATE"),
            field("url", "STRING"),
        ];
        let row: TableRow = serde_json::from_value(json!({
            "f": [
                {"v": "Advanced Python"},
                {"v": "299.99"},
                {"v": "12"},
                {"v": "true"},
                {"v": "2024-04-15"},
                {"v": null}
            ]
        }))
        .unwrap();

        let decoded = decode_row(&fields, row);
        assert_eq!(decoded["name"], "Advanced Python");
        assert_eq!(decoded["cost_usd"], 299.99);
        assert_eq!(decoded["seats"], 12);
        assert_eq!(decoded["active"], true);
        assert_eq!(decoded["date"], "2024-04-15");
        assert!(decoded["url"].is_null());
    }

    #[test]
    fn test_decode_repeated_field() {
        let mut tags = field("tags", "STRING");
        tags.mode = Some("REPEATED".to_string());

        let value = decode_field(&tags, json!([{"v": "a"}, {"v": "b"}]));
        assert_eq!(value, json!(["a", "b"]));
    }

    #[test]
    fn test_decode_timestamp_to_rfc3339() {
        let value = decode_scalar(&field("created", "TIMESTAMP"), json!("1.7131392E9"));
        assert_eq!(value, json!("2024-04-15T00:00:00+00:00"));
    }

    #[test]
    fn test_ndjson_line_is_single_terminated_record() {
        let mut row = Row::new();
        row.insert("email".into(), json!("a@b.com"));
        row.insert("cost_usd".into(), json!(12.5));

        let line = ndjson_line(&row).unwrap();
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);
        let parsed: Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(parsed["email"], "a@b.com");
    }

    #[test]
    fn test_query_body_uses_named_parameters() {
        let params = [
            QueryParameter::string("email", "a@b.com"),
            QueryParameter::new("limit", ParameterType::Int64, json!(5)),
        ];
        let body = query_request_body("SELECT 1", &params, "US", 1000);

        assert_eq!(body["useLegacySql"], false);
        assert_eq!(body["parameterMode"], "NAMED");
        assert_eq!(body["location"], "US");
        assert_eq!(body["queryParameters"][0]["name"], "email");
        assert_eq!(body["queryParameters"][0]["parameterType"]["type"], "STRING");
        assert_eq!(body["queryParameters"][0]["parameterValue"]["value"], "a@b.com");
        assert_eq!(body["queryParameters"][1]["parameterValue"]["value"], "5");
    }

    #[test]
    fn test_load_job_appends_ndjson() {
        let meta = load_job_metadata("p", "d", "employee_trainings", "US");
        let load = &meta["configuration"]["load"];
        assert_eq!(load["sourceFormat"], "NEWLINE_DELIMITED_JSON");
        assert_eq!(load["writeDisposition"], "WRITE_APPEND");
        assert_eq!(load["destinationTable"]["tableId"], "employee_trainings");
    }

    #[test]
    fn test_table_ref_uses_configured_dataset() {
        let client = BigQueryClient::new("http://localhost", "p", "d", "US", None);
        assert_eq!(client.table_ref("employee_trainings"), "p.d.employee_trainings");
    }
}
