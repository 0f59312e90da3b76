//! HTTP warehouse engine implementation.
//!
//! Provides the `HttpQueryEngine` struct that implements the `QueryEngine`
//! trait against a BigQuery-compatible REST endpoint using reqwest.

use super::{QueryEngine, QueryRequest};
use crate::error::{Result, ViewmergeError};
use crate::table::{ColumnInfo, ResultTable, Row, Value};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Default REST endpoint for the warehouse API.
const DEFAULT_ENDPOINT: &str = "https://bigquery.googleapis.com/bigquery/v2";

/// Client-side timeout for a single query request, in seconds.
const QUERY_TIMEOUT_SECS: u64 = 30;

/// Server-side wait budget requested per query, in milliseconds.
const QUERY_WAIT_MS: u64 = 20_000;

/// Warehouse query engine speaking the REST API.
#[derive(Debug)]
pub struct HttpQueryEngine {
    client: reqwest::Client,
    base_url: String,
}

impl HttpQueryEngine {
    /// Creates an engine pointed at the default endpoint.
    pub fn new() -> Result<Self> {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    /// Creates an engine pointed at a custom endpoint.
    ///
    /// The endpoint must be an absolute URL; a trailing slash is tolerated.
    pub fn with_endpoint(endpoint: &str) -> Result<Self> {
        let parsed = url::Url::parse(endpoint)
            .map_err(|e| ViewmergeError::config(format!("Invalid endpoint URL: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(QUERY_TIMEOUT_SECS))
            .build()
            .map_err(|e| ViewmergeError::engine(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl QueryEngine for HttpQueryEngine {
    async fn run_query(&self, request: QueryRequest<'_>) -> Result<ResultTable> {
        let use_legacy_sql = match request.dialect {
            "legacy" => true,
            "standard" => false,
            other => {
                return Err(ViewmergeError::engine(format!(
                    "unsupported dialect \"{other}\""
                )))
            }
        };

        let url = format!("{}/projects/{}/queries", self.base_url, request.project_id);
        debug!(
            project_id = request.project_id,
            dialect = request.dialect,
            "Dispatching warehouse query"
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(request.credential)
            .json(&serde_json::json!({
                "query": request.sql,
                "useLegacySql": use_legacy_sql,
                "timeoutMs": QUERY_WAIT_MS,
            }))
            .send()
            .await
            .map_err(|e| ViewmergeError::engine(format!("Query request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ViewmergeError::engine(format_api_error(status, &body)));
        }

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| ViewmergeError::engine(format!("Malformed query response: {e}")))?;

        decode_response(body)
    }
}

/// Extracts the API error message from an error payload, falling back to the
/// raw body when it does not parse.
fn format_api_error(status: reqwest::StatusCode, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorEnvelope {
        error: ErrorBody,
    }
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }

    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => format!("{}: {}", status, envelope.error.message),
        Err(_) => format!("{}: {}", status, body.trim()),
    }
}

/// Wire format of a query response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    job_complete: bool,
    schema: Option<ResponseSchema>,
    #[serde(default)]
    rows: Vec<ResponseRow>,
    #[serde(default)]
    errors: Vec<ResponseError>,
}

#[derive(Debug, Deserialize)]
struct ResponseSchema {
    fields: Vec<ResponseField>,
}

#[derive(Debug, Deserialize)]
struct ResponseField {
    name: String,
    #[serde(rename = "type")]
    field_type: String,
}

#[derive(Debug, Deserialize)]
struct ResponseRow {
    f: Vec<ResponseCell>,
}

#[derive(Debug, Deserialize)]
struct ResponseCell {
    #[serde(default)]
    v: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ResponseError {
    message: String,
}

/// Converts a decoded response body into a `ResultTable`.
fn decode_response(body: QueryResponse) -> Result<ResultTable> {
    if let Some(first) = body.errors.first() {
        return Err(ViewmergeError::engine(first.message.clone()));
    }
    if !body.job_complete {
        // Pagination/polling of incomplete jobs is out of scope.
        return Err(ViewmergeError::engine(
            "query did not complete within the engine wait budget",
        ));
    }

    let schema = body
        .schema
        .ok_or_else(|| ViewmergeError::engine("query response carried no schema"))?;

    let columns: Vec<ColumnInfo> = schema
        .fields
        .iter()
        .map(|f| ColumnInfo::new(f.name.as_str(), f.field_type.as_str()))
        .collect();

    let mut rows = Vec::with_capacity(body.rows.len());
    for row in &body.rows {
        if row.f.len() != columns.len() {
            return Err(ViewmergeError::engine(format!(
                "row width {} does not match schema width {}",
                row.f.len(),
                columns.len()
            )));
        }
        let converted: Row = row
            .f
            .iter()
            .zip(&schema.fields)
            .map(|(cell, field)| convert_cell(&field.field_type, &cell.v))
            .collect();
        rows.push(converted);
    }

    debug!(
        columns = columns.len(),
        rows = rows.len(),
        "Decoded warehouse query response"
    );
    Ok(ResultTable::with_data(columns, rows))
}

/// Converts one wire cell into a typed value.
///
/// The API renders every scalar as a JSON string; the declared field type
/// drives the conversion. Values that fail to parse are kept as strings.
fn convert_cell(field_type: &str, raw: &serde_json::Value) -> Value {
    let text = match raw {
        serde_json::Value::Null => return Value::Null,
        serde_json::Value::String(s) => s.as_str(),
        other => return Value::String(other.to_string()),
    };

    match field_type.to_ascii_uppercase().as_str() {
        "INTEGER" | "INT64" => match text.parse::<i64>() {
            Ok(i) => Value::Int(i),
            Err(_) => {
                warn!(field_type, "Unparseable integer cell, keeping as string");
                Value::String(text.to_string())
            }
        },
        "FLOAT" | "FLOAT64" | "NUMERIC" => match text.parse::<f64>() {
            Ok(f) => Value::Float(f),
            Err(_) => {
                warn!(field_type, "Unparseable float cell, keeping as string");
                Value::String(text.to_string())
            }
        },
        "BOOLEAN" | "BOOL" => match text {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(text.to_string()),
        },
        _ => Value::String(text.to_string()),
    }
}
