use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use lazy_static::lazy_static;
use regex::Regex;
use rusqlite::{types::ValueRef, Connection, InterruptHandle, OpenFlags, ToSql};
use serde_json::{Number, Value};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::models::{ColumnInfo, ExecutionResult, Row};

lazy_static! {
    // MySQL-style table inspection, answered from SQLite's table_info pragma.
    static ref DESCRIBE_RE: Regex = Regex::new(
        r#"(?i)^\s*(?:DESCRIBE|DESC|SHOW\s+COLUMNS\s+FROM)\s+[`"']?([A-Za-z_][A-Za-z0-9_]*)"#
    )
    .unwrap();
}

const DESCRIBE_SQL: &str = r#"SELECT name AS Field,
       type AS Type,
       CASE "notnull" WHEN 1 THEN 'NO' ELSE 'YES' END AS "Null",
       CASE pk WHEN 0 THEN '' ELSE 'PRI' END AS "Key",
       dflt_value AS "Default"
FROM pragma_table_info(?1)"#;

#[derive(Debug, Clone, Error)]
pub enum ExecutionError {
    #[error("{0}")]
    Engine(String),
    #[error("쿼리 실행 시간이 제한({0}ms)을 초과했습니다.")]
    Timeout(u128),
    #[error("읽기 전용 쿼리만 실행할 수 있습니다.")]
    NotReadOnly,
    /// A gated executor refused the statement before it reached the engine.
    #[error("{0}")]
    Rejected(String),
    #[error("query worker failed: {0}")]
    Worker(String),
}

impl From<rusqlite::Error> for ExecutionError {
    fn from(err: rusqlite::Error) -> Self {
        ExecutionError::Engine(err.to_string())
    }
}

/// Runs a statement against the practice dataset and returns its rows.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<ExecutionResult, ExecutionError>;

    /// Storage column names and declared types of `table`, in ordinal order.
    async fn table_columns(&self, table: &str) -> Result<Vec<ColumnInfo>, ExecutionError>;
}

/// SQLite engine over the dataset file. One connection, serialized behind a
/// mutex and driven from tokio's blocking pool. The timeout covers execution
/// only, not the wait for the connection.
pub struct SqliteExecutor {
    conn: Arc<Mutex<Connection>>,
    interrupt: Arc<InterruptHandle>,
    timeout: Duration,
}

impl SqliteExecutor {
    pub fn open_read_only(path: impl AsRef<Path>, timeout: Duration) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("Failed to open dataset {}", path.display()))?;

        tracing::info!("Opened practice dataset {} (read-only)", path.display());
        Ok(Self::from_connection(conn, timeout))
    }

    pub fn from_connection(conn: Connection, timeout: Duration) -> Self {
        let interrupt = Arc::new(conn.get_interrupt_handle());
        Self {
            conn: Arc::new(Mutex::new(conn)),
            interrupt,
            timeout,
        }
    }

    async fn run_blocking<T, F>(&self, job: F) -> Result<T, ExecutionError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, ExecutionError> + Send + 'static,
    {
        // Held until the job's statement is finished, so an interrupt can only
        // reach the statement this call started.
        let guard = self.conn.clone().lock_owned().await;
        let mut task = tokio::task::spawn_blocking(move || job(&guard));

        match tokio::time::timeout(self.timeout, &mut task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(ExecutionError::Worker(join_err.to_string())),
            Err(_) => {
                tracing::warn!(
                    "Query exceeded {}ms, interrupting engine",
                    self.timeout.as_millis()
                );
                self.interrupt.interrupt();
                if let Err(join_err) = task.await {
                    tracing::error!("Interrupted query worker failed: {}", join_err);
                }
                Err(ExecutionError::Timeout(self.timeout.as_millis()))
            }
        }
    }
}

#[async_trait]
impl QueryExecutor for SqliteExecutor {
    async fn execute(&self, sql: &str) -> Result<ExecutionResult, ExecutionError> {
        let sql = sql.to_string();
        self.run_blocking(move |conn| {
            let start = Instant::now();
            let (columns, rows) = match DESCRIBE_RE.captures(&sql) {
                Some(caps) => {
                    let table = caps[1].to_string();
                    query_rows(conn, DESCRIBE_SQL, &[&table as &dyn ToSql])?
                }
                None => query_rows(conn, &sql, &[])?,
            };
            let elapsed = start.elapsed().as_secs_f64() * 1000.0;
            Ok(ExecutionResult::new(columns, rows, elapsed))
        })
        .await
    }

    async fn table_columns(&self, table: &str) -> Result<Vec<ColumnInfo>, ExecutionError> {
        let table = table.to_string();
        self.run_blocking(move |conn| {
            let mut stmt = conn.prepare("SELECT name, type FROM pragma_table_info(?1)")?;
            let columns = stmt
                .query_map([&table], |row| {
                    Ok(ColumnInfo {
                        name: row.get(0)?,
                        data_type: row.get::<_, String>(1)?.to_uppercase(),
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(columns)
        })
        .await
    }
}

fn query_rows(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> Result<(Vec<String>, Vec<Row>), ExecutionError> {
    let mut stmt = conn.prepare(sql)?;
    if !stmt.readonly() {
        return Err(ExecutionError::NotReadOnly);
    }

    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut cursor = stmt.query(params)?;
    let mut rows = Vec::new();
    while let Some(row) = cursor.next()? {
        let mut record = Row::new();
        for (idx, name) in columns.iter().enumerate() {
            record.insert(name.clone(), sql_value_to_json(row.get_ref(idx)?));
        }
        rows.push(record);
    }

    Ok((columns, rows))
}

fn sql_value_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(general_purpose::STANDARD.encode(bytes)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn executor() -> SqliteExecutor {
        executor_with_timeout(Duration::from_secs(5))
    }

    fn executor_with_timeout(timeout: Duration) -> SqliteExecutor {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE stores (col1 TEXT PRIMARY KEY, col2 TEXT, col38 REAL);
             INSERT INTO stores VALUES ('1', '스타벅스카페', 127.5), ('2', '김밥천국', NULL);",
        )
        .unwrap();
        SqliteExecutor::from_connection(conn, timeout)
    }

    // Never finishes on its own within the test timeouts.
    const ENDLESS_SQL: &str = "WITH RECURSIVE n(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM n) \
                               SELECT COUNT(*) FROM n";

    #[tokio::test]
    async fn returns_columns_and_rows_in_statement_order() {
        let result = executor()
            .execute("SELECT col2, col1, col38 FROM stores ORDER BY col1")
            .await
            .unwrap();

        assert_eq!(result.columns, vec!["col2", "col1", "col38"]);
        assert_eq!(result.row_count, 2);
        assert_eq!(result.rows[0]["col38"], json!(127.5));
        assert_eq!(result.rows[1]["col38"], Value::Null);
        let keys: Vec<&str> = result.rows[0].keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["col2", "col1", "col38"]);
    }

    #[tokio::test]
    async fn count_is_an_integer_scalar() {
        let result = executor()
            .execute("SELECT COUNT(*) AS total FROM stores")
            .await
            .unwrap();
        assert_eq!(result.first_scalar(), Some(&json!(2)));
    }

    #[tokio::test]
    async fn engine_errors_are_reported() {
        let err = executor()
            .execute("SELECT nope FROM stores")
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::Engine(msg) if msg.contains("nope")));
    }

    #[tokio::test]
    async fn writes_are_refused() {
        let err = executor()
            .execute("UPDATE stores SET col2 = 'x'")
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::NotReadOnly));
    }

    #[tokio::test]
    async fn describe_uses_table_info() {
        let result = executor().execute("DESC stores LIMIT 100").await.unwrap();
        assert_eq!(result.row_count, 3);
        assert_eq!(result.rows[0]["Field"], json!("col1"));
        assert_eq!(result.rows[0]["Key"], json!("PRI"));
    }

    #[tokio::test]
    async fn table_columns_lists_declared_types() {
        let columns = executor().table_columns("stores").await.unwrap();
        assert_eq!(
            columns[2],
            ColumnInfo {
                name: "col38".to_string(),
                data_type: "REAL".to_string()
            }
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn waiting_for_the_connection_does_not_count_against_timeout() {
        let executor = Arc::new(executor_with_timeout(Duration::from_millis(200)));
        let held = executor.conn.clone().lock_owned().await;

        let queued = tokio::spawn({
            let executor = executor.clone();
            async move { executor.execute("SELECT COUNT(*) FROM stores").await }
        });
        tokio::time::sleep(Duration::from_millis(500)).await;
        drop(held);

        let result = queued.await.unwrap().unwrap();
        assert_eq!(result.first_scalar(), Some(&json!(2)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn timeout_interrupts_only_its_own_statement() {
        let executor = Arc::new(executor_with_timeout(Duration::from_millis(200)));

        let slow = tokio::spawn({
            let executor = executor.clone();
            async move { executor.execute(ENDLESS_SQL).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        let queued = tokio::spawn({
            let executor = executor.clone();
            async move {
                executor
                    .execute("SELECT col2 FROM stores ORDER BY col1")
                    .await
            }
        });

        let slow = slow.await.unwrap().unwrap_err();
        assert!(matches!(slow, ExecutionError::Timeout(200)));

        let queued = queued.await.unwrap().unwrap();
        assert_eq!(queued.row_count, 2);
        assert_eq!(queued.rows[0]["col2"], json!("스타벅스카페"));

        let after = executor.execute("SELECT COUNT(*) FROM stores").await.unwrap();
        assert_eq!(after.first_scalar(), Some(&json!(2)));
    }
}
