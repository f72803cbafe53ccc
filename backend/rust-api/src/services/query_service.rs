use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::metrics::{record_query, GATE_REJECTIONS_TOTAL};
use crate::models::{ColumnInfo, ExecutionResult, QueryLogRecord, SchemaInfo};

use super::executor::{ExecutionError, QueryExecutor};
use super::query_gate::{GateRejection, QueryGate};
use super::query_log::QueryLogStore;
use super::translator::ColumnTranslator;

pub const SAMPLE_SIZE: usize = 5;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Rejected(#[from] GateRejection),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

/// Runs learner SQL written against localized column names: gate, translate,
/// bound, execute, translate the result back, and log the attempt.
pub struct QueryService {
    gate: QueryGate,
    translator: ColumnTranslator,
    executor: Arc<dyn QueryExecutor>,
    logs: Arc<dyn QueryLogStore>,
}

impl QueryService {
    pub fn new(
        gate: QueryGate,
        translator: ColumnTranslator,
        executor: Arc<dyn QueryExecutor>,
        logs: Arc<dyn QueryLogStore>,
    ) -> Self {
        Self {
            gate,
            translator,
            executor,
            logs,
        }
    }

    pub fn table(&self) -> &str {
        self.gate.table()
    }

    pub fn translator(&self) -> &ColumnTranslator {
        &self.translator
    }

    /// `actor` is the learner the attempt is logged under, if any.
    pub async fn run(&self, query: &str, actor: Option<&str>) -> Result<ExecutionResult, QueryError> {
        if let Err(rejection) = self.gate.classify(query) {
            GATE_REJECTIONS_TOTAL
                .with_label_values(&[rejection.rule()])
                .inc();
            tracing::warn!(
                "Query rejected by gate ({}) for {}",
                rejection.rule(),
                actor.unwrap_or("anonymous")
            );
            return Err(rejection.into());
        }

        let prepared = self.prepare(query);
        tracing::debug!("Executing prepared query: {}", prepared);

        match self.executor.execute(&prepared).await {
            Ok(result) => {
                let result = self.localize(result);
                record_query("success", result.execution_time);
                self.log_attempt(query, actor, Ok(&result)).await;
                Ok(result)
            }
            Err(e) => {
                record_query("error", 0.0);
                tracing::info!("Query failed for {}: {}", actor.unwrap_or("anonymous"), e);
                self.log_attempt(query, actor, Err(&e)).await;
                Err(e.into())
            }
        }
    }

    /// Engine text for `query`: internal column names plus the row limit.
    fn prepare(&self, query: &str) -> String {
        let translated = self.translator.to_internal(query);
        self.gate.apply_row_limit(query, &translated)
    }

    fn localize(&self, result: ExecutionResult) -> ExecutionResult {
        ExecutionResult {
            columns: self.translator.columns_to_external(result.columns),
            rows: self.translator.to_external(result.rows),
            row_count: result.row_count,
            execution_time: result.execution_time,
        }
    }

    /// Runs a catalog statement with the same translation and row limit as
    /// learner queries. Not gated, not counted, not logged.
    pub async fn run_reference(&self, query: &str) -> Result<ExecutionResult, ExecutionError> {
        let prepared = self.prepare(query);
        tracing::debug!("Executing reference query: {}", prepared);
        self.executor
            .execute(&prepared)
            .await
            .map(|result| self.localize(result))
    }

    async fn log_attempt(
        &self,
        query: &str,
        actor: Option<&str>,
        outcome: Result<&ExecutionResult, &ExecutionError>,
    ) {
        let (execution_time, row_count, error_message) = match outcome {
            Ok(result) => (result.execution_time, result.row_count, None),
            Err(e) => (0.0, 0, Some(e.to_string())),
        };

        self.logs
            .append(QueryLogRecord {
                id: Uuid::new_v4().to_string(),
                user_id: actor.map(str::to_string),
                query_text: query.to_string(),
                execution_time,
                row_count,
                success: outcome.is_ok(),
                error_message,
                created_at: Utc::now(),
            })
            .await;
    }

    /// Column list with localized names, plus the table's row count.
    pub async fn schema(&self) -> Result<SchemaInfo, ExecutionError> {
        let table = self.gate.table();
        let columns = self
            .executor
            .table_columns(table)
            .await?
            .into_iter()
            .map(|column| ColumnInfo {
                name: self
                    .translator
                    .localized_name(&column.name)
                    .unwrap_or(&column.name)
                    .to_string(),
                data_type: column.data_type,
            })
            .collect();

        let count = self
            .executor
            .execute(&format!("SELECT COUNT(*) AS count FROM {}", table))
            .await?;
        let row_count = count.first_scalar().and_then(Value::as_u64).unwrap_or(0);

        Ok(SchemaInfo {
            table_name: table.to_string(),
            columns,
            row_count,
        })
    }

    /// Up to five distinct non-null values of a localized column, or `None`
    /// when the column is unknown.
    pub async fn sample(&self, column: &str) -> Result<Option<Vec<Value>>, ExecutionError> {
        let Some(internal) = self.translator.internal_name(column) else {
            return Ok(None);
        };

        let sql = format!(
            "SELECT DISTINCT {col} AS value FROM {table} WHERE {col} IS NOT NULL LIMIT {limit}",
            col = internal,
            table = self.gate.table(),
            limit = SAMPLE_SIZE
        );
        let result = self.executor.execute(&sql).await?;

        Ok(Some(
            result
                .rows
                .into_iter()
                .filter_map(|mut row| row.remove("value"))
                .collect(),
        ))
    }

    /// Executor view that routes every statement through this pipeline on
    /// behalf of `actor`.
    pub fn for_learner(&self, actor: Option<String>) -> LearnerExecutor<'_> {
        LearnerExecutor {
            service: self,
            actor,
        }
    }

    /// Executor view over `run_reference`, for canonical answers.
    pub fn for_reference(&self) -> ReferenceExecutor<'_> {
        ReferenceExecutor { service: self }
    }

    pub async fn ping(&self) -> Result<(), ExecutionError> {
        self.executor.execute("SELECT 1").await.map(|_| ())
    }
}

/// Gated executor handed to the answer validator. Gate rejections surface as
/// execution errors carrying the rejection message.
pub struct LearnerExecutor<'a> {
    service: &'a QueryService,
    actor: Option<String>,
}

#[async_trait]
impl QueryExecutor for LearnerExecutor<'_> {
    async fn execute(&self, sql: &str) -> Result<ExecutionResult, ExecutionError> {
        self.service
            .run(sql, self.actor.as_deref())
            .await
            .map_err(|e| match e {
                QueryError::Rejected(rejection) => ExecutionError::Rejected(rejection.to_string()),
                QueryError::Execution(e) => e,
            })
    }

    async fn table_columns(&self, table: &str) -> Result<Vec<ColumnInfo>, ExecutionError> {
        self.service.executor.table_columns(table).await
    }
}

pub struct ReferenceExecutor<'a> {
    service: &'a QueryService,
}

#[async_trait]
impl QueryExecutor for ReferenceExecutor<'_> {
    async fn execute(&self, sql: &str) -> Result<ExecutionResult, ExecutionError> {
        self.service.run_reference(sql).await
    }

    async fn table_columns(&self, table: &str) -> Result<Vec<ColumnInfo>, ExecutionError> {
        self.service.executor.table_columns(table).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::executor::SqliteExecutor;
    use crate::services::query_log::MemoryQueryLogStore;
    use rusqlite::Connection;
    use serde_json::json;
    use std::time::Duration;

    fn service() -> (QueryService, Arc<MemoryQueryLogStore>) {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE stores (col1 TEXT, col2 TEXT, col5 TEXT, col15 TEXT);
             WITH RECURSIVE n(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM n WHERE i < 150)
             INSERT INTO stores
             SELECT 'id' || i, '가게' || i, CASE WHEN i % 2 = 0 THEN '음식' ELSE '소매' END,
                    CASE WHEN i % 3 = 0 THEN '서초구' ELSE '강남구' END
             FROM n;",
        )
        .unwrap();

        let logs = Arc::new(MemoryQueryLogStore::new());
        let service = QueryService::new(
            QueryGate::default(),
            ColumnTranslator::stores().unwrap(),
            Arc::new(SqliteExecutor::from_connection(conn, Duration::from_secs(5))),
            logs.clone(),
        );
        (service, logs)
    }

    #[tokio::test]
    async fn localized_query_returns_localized_rows_with_auto_limit() {
        let (service, _) = service();
        let result = service
            .run("SELECT 상호명, 시군구명 FROM stores", None)
            .await
            .unwrap();

        assert_eq!(result.columns, vec!["상호명", "시군구명"]);
        assert_eq!(result.row_count, 100);
        assert_eq!(result.rows[0]["상호명"], json!("가게1"));
    }

    #[tokio::test]
    async fn explicit_limit_is_respected() {
        let (service, _) = service();
        let result = service
            .run("SELECT * FROM stores WHERE 시군구명 = '강남구' LIMIT 7;", None)
            .await
            .unwrap();
        assert_eq!(result.row_count, 7);
        assert!(result.columns.contains(&"상권업종대분류명".to_string()));
    }

    #[tokio::test]
    async fn gate_rejection_never_reaches_engine_or_log() {
        let (service, logs) = service();
        let err = service
            .run("DELETE FROM stores", Some("learner"))
            .await
            .unwrap_err();

        assert!(matches!(err, QueryError::Rejected(GateRejection::NotReadOnly)));
        assert!(logs.recent("learner", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn attempts_are_logged_under_actor() {
        let (service, logs) = service();
        service
            .run("SELECT COUNT(*) FROM stores", Some("learner"))
            .await
            .unwrap();
        service
            .run("SELECT 없는컬럼 FROM stores", Some("learner"))
            .await
            .unwrap_err();

        let records = logs.recent("learner", 10).await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(!records[0].success);
        assert!(records[0].error_message.is_some());
        assert!(records[1].success);
        assert_eq!(records[1].query_text, "SELECT COUNT(*) FROM stores");
    }

    #[tokio::test]
    async fn schema_lists_localized_columns() {
        let (service, _) = service();
        let schema = service.schema().await.unwrap();

        assert_eq!(schema.table_name, "stores");
        assert_eq!(schema.row_count, 150);
        let names: Vec<&str> = schema.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["상가업소번호", "상호명", "상권업종대분류명", "시군구명"]);
    }

    #[tokio::test]
    async fn sample_values_for_known_columns_only() {
        let (service, _) = service();

        let mut values = service.sample("시군구명").await.unwrap().unwrap();
        values.sort_by(|a, b| a.as_str().cmp(&b.as_str()));
        assert_eq!(values, vec![json!("강남구"), json!("서초구")]);

        assert_eq!(service.sample("상호명").await.unwrap().unwrap().len(), SAMPLE_SIZE);
        assert_eq!(service.sample("col1; DROP TABLE stores").await.unwrap(), None);
    }

    #[tokio::test]
    async fn learner_executor_reports_rejection_as_error() {
        let (service, _) = service();
        let executor = service.for_learner(Some("learner".to_string()));

        let err = executor.execute("SELECT * FROM users").await.unwrap_err();
        assert!(matches!(err, ExecutionError::Rejected(msg) if msg.contains("stores")));
    }

    #[tokio::test]
    async fn reference_queries_are_translated_but_not_logged() {
        let (service, logs) = service();
        let learner = service.for_learner(Some("learner".to_string()));
        let reference = service.for_reference();

        let expected = reference
            .execute("SELECT 시군구명, COUNT(*) AS 개수 FROM stores GROUP BY 시군구명")
            .await
            .unwrap();
        assert_eq!(expected.columns, vec!["시군구명", "개수"]);
        assert_eq!(expected.row_count, 2);
        assert!(logs.recent("learner", 10).await.unwrap().is_empty());

        learner.execute("SELECT COUNT(*) FROM stores").await.unwrap();
        let records = logs.recent("learner", 10).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].query_text, "SELECT COUNT(*) FROM stores");
    }
}
