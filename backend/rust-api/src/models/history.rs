use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Learner-side history of successfully executed free queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub query: String,
    pub timestamp: DateTime<Utc>,
    pub row_count: usize,
    pub execution_time: f64,
    pub success: bool,
    #[serde(default)]
    pub favorite: bool,
}

/// Server-side audit of one gated execution attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryLogRecord {
    pub id: String,
    pub user_id: Option<String>,
    pub query_text: String,
    pub execution_time: f64,
    pub row_count: usize,
    pub success: bool,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryStats {
    pub total_queries: u64,
    pub successful_queries: u64,
    pub avg_execution_time: Option<f64>,
    pub total_rows_returned: u64,
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<i64>,
}
