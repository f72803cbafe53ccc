use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

/// A single result row. Keys keep the statement's column order.
pub type Row = Map<String, Value>;

/// Outcome of running one statement against the practice dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub row_count: usize,
    /// Wall-clock milliseconds spent in the engine.
    pub execution_time: f64,
}

impl ExecutionResult {
    pub fn new(columns: Vec<String>, rows: Vec<Row>, execution_time: f64) -> Self {
        let row_count = rows.len();
        Self {
            columns,
            rows,
            row_count,
            execution_time,
        }
    }

    /// First column of the first row, the shape produced by `SELECT COUNT(*) ...`.
    pub fn first_scalar(&self) -> Option<&Value> {
        self.rows.first().and_then(|row| row.values().next())
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct QueryRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "쿼리가 필요합니다."))]
    pub query: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub success: bool,
    pub data: Vec<Row>,
    pub row_count: usize,
    pub execution_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaInfo {
    pub table_name: String,
    pub columns: Vec<ColumnInfo>,
    pub row_count: u64,
}
