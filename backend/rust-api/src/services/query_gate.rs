use thiserror::Error;

pub const DEFAULT_ROW_LIMIT: u32 = 100;

const ALLOWED_STARTS: [&str; 6] = ["SELECT", "WITH", "DESC", "DESCRIBE", "SHOW", "EXPLAIN"];
// MySQL system schemas, then SQLite's catalog tables and pragma functions.
const BLOCKED_SCHEMAS: [&str; 8] = [
    "INFORMATION_SCHEMA",
    "MYSQL",
    "PERFORMANCE_SCHEMA",
    "SYS",
    "SQLITE_MASTER",
    "SQLITE_SCHEMA",
    "SQLITE_TEMP_MASTER",
    "PRAGMA",
];
const BLOCKED_KEYWORDS: [&str; 8] = [
    "DROP TABLE",
    "DROP DATABASE",
    "DELETE FROM",
    "TRUNCATE",
    "INSERT INTO",
    "UPDATE ",
    "ALTER TABLE",
    "CREATE TABLE",
];
const METADATA_STARTS: [&str; 3] = ["DESC", "DESCRIBE", "SHOW COLUMNS"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateRejection {
    #[error("보안상 SELECT, DESC, SHOW 쿼리만 실행 가능합니다. INSERT, UPDATE, DELETE, DROP 등은 사용할 수 없습니다.")]
    NotReadOnly,
    #[error("보안상 시스템 테이블 ({schema})에 접근할 수 없습니다. {table} 테이블만 사용하세요.")]
    BlockedSchema { schema: String, table: String },
    #[error("보안상 {keyword} 명령어는 사용할 수 없습니다.")]
    BlockedKeyword { keyword: String },
    #[error("{table} 테이블만 조회할 수 있습니다.")]
    TableNotAllowed { table: String },
}

impl GateRejection {
    /// Stable label for metrics and logs.
    pub fn rule(&self) -> &'static str {
        match self {
            GateRejection::NotReadOnly => "read_only",
            GateRejection::BlockedSchema { .. } => "blocked_schema",
            GateRejection::BlockedKeyword { .. } => "blocked_keyword",
            GateRejection::TableNotAllowed { .. } => "table_not_allowed",
        }
    }
}

/// Allow-list classifier for ad-hoc statements against the single practice table.
///
/// Checks are plain substring tests on an uppercased copy, applied in order;
/// the first failing check decides the rejection.
#[derive(Debug, Clone)]
pub struct QueryGate {
    table: String,
    table_upper: String,
    row_limit: u32,
}

impl QueryGate {
    pub fn new(table: impl Into<String>, row_limit: u32) -> Self {
        let table = table.into();
        let table_upper = table.to_uppercase();
        Self {
            table,
            table_upper,
            row_limit,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn classify(&self, query: &str) -> Result<(), GateRejection> {
        let normalized = query.trim().to_uppercase();

        if !ALLOWED_STARTS
            .iter()
            .any(|start| normalized.starts_with(start))
        {
            return Err(GateRejection::NotReadOnly);
        }

        if let Some(schema) = BLOCKED_SCHEMAS
            .iter()
            .find(|schema| normalized.contains(*schema))
        {
            return Err(GateRejection::BlockedSchema {
                schema: schema.to_string(),
                table: self.table.clone(),
            });
        }

        if let Some(keyword) = BLOCKED_KEYWORDS
            .iter()
            .find(|keyword| normalized.contains(*keyword))
        {
            return Err(GateRejection::BlockedKeyword {
                keyword: keyword.to_string(),
            });
        }

        let is_metadata = METADATA_STARTS
            .iter()
            .any(|start| normalized.starts_with(start));
        if !is_metadata && !normalized.contains(&self.table_upper) {
            return Err(GateRejection::TableNotAllowed {
                table: self.table.clone(),
            });
        }

        Ok(())
    }

    /// Bounds `prepared` (the text sent to the engine) unless `original` already
    /// carries a `LIMIT`. A trailing `;` stays last.
    pub fn apply_row_limit(&self, original: &str, prepared: &str) -> String {
        if original.to_uppercase().contains("LIMIT") {
            return prepared.to_string();
        }

        let prepared = prepared.trim();
        match prepared.strip_suffix(';') {
            Some(body) => format!("{} LIMIT {};", body, self.row_limit),
            None => format!("{} LIMIT {}", prepared, self.row_limit),
        }
    }
}

impl Default for QueryGate {
    fn default() -> Self {
        Self::new("stores", DEFAULT_ROW_LIMIT)
    }
}
