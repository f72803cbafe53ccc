use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Bson, DateTime as BsonDateTime, Document},
    Collection, Database,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::metrics::{track_db_operation, QUERY_LOG_WRITES_TOTAL};
use crate::models::{QueryLogRecord, QueryStats};
use crate::utils::retry::{retry_async_with_config, RetryConfig};
use crate::utils::time::{bson_to_chrono, chrono_to_bson};

pub const QUERY_LOG_COLLECTION: &str = "query_logs";
pub const DEFAULT_LOG_LIMIT: i64 = 50;

/// Audit trail of gated executions, one record per attempt.
#[async_trait]
pub trait QueryLogStore: Send + Sync {
    /// Records an attempt. Implementations may persist in the background; a
    /// failed write is logged and never reaches the caller.
    async fn append(&self, record: QueryLogRecord);

    /// Newest first.
    async fn recent(&self, user_id: &str, limit: i64) -> Result<Vec<QueryLogRecord>>;

    async fn stats(&self, user_id: &str) -> Result<QueryStats>;

    async fn ping(&self) -> Result<()>;

    fn backend(&self) -> &'static str;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct QueryLogDocument {
    #[serde(rename = "_id")]
    id: String,
    user_id: Option<String>,
    query_text: String,
    execution_time: f64,
    row_count: i64,
    success: bool,
    error_message: Option<String>,
    created_at: BsonDateTime,
}

impl From<QueryLogRecord> for QueryLogDocument {
    fn from(record: QueryLogRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            query_text: record.query_text,
            execution_time: record.execution_time,
            row_count: record.row_count as i64,
            success: record.success,
            error_message: record.error_message,
            created_at: chrono_to_bson(record.created_at),
        }
    }
}

impl From<QueryLogDocument> for QueryLogRecord {
    fn from(doc: QueryLogDocument) -> Self {
        Self {
            id: doc.id,
            user_id: doc.user_id,
            query_text: doc.query_text,
            execution_time: doc.execution_time,
            row_count: doc.row_count.max(0) as usize,
            success: doc.success,
            error_message: doc.error_message,
            created_at: bson_to_chrono(doc.created_at),
        }
    }
}

pub struct MongoQueryLogStore {
    mongo: Database,
}

impl MongoQueryLogStore {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    fn collection(&self) -> Collection<QueryLogDocument> {
        self.mongo.collection(QUERY_LOG_COLLECTION)
    }
}

#[async_trait]
impl QueryLogStore for MongoQueryLogStore {
    async fn append(&self, record: QueryLogRecord) {
        let collection = self.collection();
        let document = QueryLogDocument::from(record);

        tokio::spawn(async move {
            let res: Result<_, mongodb::error::Error> =
                retry_async_with_config(RetryConfig::default(), || async {
                    collection.insert_one(&document).await.map(|_| ())
                })
                .await;

            match res {
                Ok(()) => {
                    QUERY_LOG_WRITES_TOTAL.with_label_values(&["success"]).inc();
                    tracing::debug!("Query log saved: id={}", document.id);
                }
                Err(e) => {
                    QUERY_LOG_WRITES_TOTAL.with_label_values(&["error"]).inc();
                    tracing::error!("Background query log save failed: {:#?}", e);
                }
            }
        });
    }

    async fn recent(&self, user_id: &str, limit: i64) -> Result<Vec<QueryLogRecord>> {
        track_db_operation("find", QUERY_LOG_COLLECTION, async {
            let cursor = self
                .collection()
                .find(doc! { "user_id": user_id })
                .sort(doc! { "created_at": -1 })
                .limit(limit)
                .await
                .context("Failed to load query logs")?;

            let documents: Vec<QueryLogDocument> = cursor
                .try_collect()
                .await
                .context("Failed to collect query log documents")?;

            Ok(documents.into_iter().map(QueryLogRecord::from).collect())
        })
        .await
    }

    async fn stats(&self, user_id: &str) -> Result<QueryStats> {
        track_db_operation("aggregate", QUERY_LOG_COLLECTION, async {
            let pipeline = vec![
                doc! { "$match": { "user_id": user_id } },
                doc! {
                    "$group": {
                        "_id": Bson::Null,
                        "total_queries": { "$sum": 1 },
                        "successful_queries": { "$sum": { "$cond": ["$success", 1, 0] } },
                        "avg_execution_time": { "$avg": "$execution_time" },
                        "total_rows_returned": { "$sum": "$row_count" }
                    }
                },
            ];

            let mut cursor = self
                .mongo
                .collection::<Document>(QUERY_LOG_COLLECTION)
                .aggregate(pipeline)
                .await
                .context("Failed to aggregate query stats")?;

            let Some(doc) = cursor.try_next().await? else {
                return Ok(QueryStats::default());
            };

            Ok(QueryStats {
                total_queries: count_field(&doc, "total_queries"),
                successful_queries: count_field(&doc, "successful_queries"),
                avg_execution_time: doc.get_f64("avg_execution_time").ok(),
                total_rows_returned: count_field(&doc, "total_rows_returned"),
            })
        })
        .await
    }

    async fn ping(&self) -> Result<()> {
        tokio::time::timeout(
            std::time::Duration::from_secs(1),
            self.mongo.run_command(doc! { "ping": 1 }),
        )
        .await
        .map_err(|_| anyhow::anyhow!("MongoDB timeout after 1s"))??;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "mongodb"
    }
}

/// `$sum` yields Int32 or Int64 depending on magnitude.
fn count_field(doc: &Document, key: &str) -> u64 {
    doc.get_i64(key)
        .or_else(|_| doc.get_i32(key).map(i64::from))
        .unwrap_or(0)
        .max(0) as u64
}

/// Process-local log used when no MongoDB URI is configured, and in tests.
#[derive(Default)]
pub struct MemoryQueryLogStore {
    records: RwLock<Vec<QueryLogRecord>>,
}

impl MemoryQueryLogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QueryLogStore for MemoryQueryLogStore {
    async fn append(&self, record: QueryLogRecord) {
        self.records.write().await.push(record);
        QUERY_LOG_WRITES_TOTAL.with_label_values(&["success"]).inc();
    }

    async fn recent(&self, user_id: &str, limit: i64) -> Result<Vec<QueryLogRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .rev()
            .filter(|r| r.user_id.as_deref() == Some(user_id))
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn stats(&self, user_id: &str) -> Result<QueryStats> {
        let records = self.records.read().await;
        let mine: Vec<&QueryLogRecord> = records
            .iter()
            .filter(|r| r.user_id.as_deref() == Some(user_id))
            .collect();

        if mine.is_empty() {
            return Ok(QueryStats::default());
        }

        let total_time: f64 = mine.iter().map(|r| r.execution_time).sum();
        Ok(QueryStats {
            total_queries: mine.len() as u64,
            successful_queries: mine.iter().filter(|r| r.success).count() as u64,
            avg_execution_time: Some(total_time / mine.len() as f64),
            total_rows_returned: mine.iter().map(|r| r.row_count as u64).sum(),
        })
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
