use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{ExecutionResult, HistoryEntry};

use super::storage::{KeyValueStore, StoreError};

pub const HISTORY_KEY_PREFIX: &str = "sql_query_history:";
pub const MAX_HISTORY_ENTRIES: usize = 50;

fn history_key(learner: &str) -> String {
    format!("{}{}", HISTORY_KEY_PREFIX, learner)
}

/// Recently executed queries per learner, newest first, one entry per
/// distinct (trimmed) query text.
pub struct QueryHistory {
    store: Arc<dyn KeyValueStore>,
    write_lock: Mutex<()>,
}

impl QueryHistory {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Stored entries. A missing or unparseable document reads as empty; a
    /// failed store read is an error.
    async fn read(&self, learner: &str) -> Result<Vec<HistoryEntry>, StoreError> {
        let Some(raw) = self.store.get(&history_key(learner)).await? else {
            return Ok(Vec::new());
        };

        Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!("Discarding unreadable query history for {}: {}", learner, e);
            Vec::new()
        }))
    }

    pub async fn list(&self, learner: &str) -> Vec<HistoryEntry> {
        self.read(learner).await.unwrap_or_else(|e| {
            tracing::warn!("Failed to read query history for {}: {}", learner, e);
            Vec::new()
        })
    }

    async fn save(&self, learner: &str, entries: &[HistoryEntry]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(entries).unwrap_or_default();
        self.store.set(&history_key(learner), &raw).await
    }

    /// Puts `query` at the front. An earlier entry with the same text is
    /// replaced, favorite flag included.
    pub async fn add(
        &self,
        learner: &str,
        query: &str,
        result: &ExecutionResult,
    ) -> Result<HistoryEntry, StoreError> {
        let entry = HistoryEntry {
            id: Uuid::new_v4().to_string(),
            query: query.trim().to_string(),
            timestamp: Utc::now(),
            row_count: result.row_count,
            execution_time: result.execution_time,
            success: true,
            favorite: false,
        };

        let _guard = self.write_lock.lock().await;
        let mut entries = self.read(learner).await?;
        entries.retain(|existing| existing.query != entry.query);
        entries.insert(0, entry.clone());
        entries.truncate(MAX_HISTORY_ENTRIES);
        self.save(learner, &entries).await?;

        Ok(entry)
    }

    /// Returns false when no entry has `id`.
    pub async fn remove(&self, learner: &str, id: &str) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read(learner).await?;
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        if entries.len() == before {
            return Ok(false);
        }
        self.save(learner, &entries).await?;
        Ok(true)
    }

    pub async fn clear(&self, learner: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.store.delete(&history_key(learner)).await
    }

    /// Flips the favorite flag and returns the updated entry.
    pub async fn toggle_favorite(
        &self,
        learner: &str,
        id: &str,
    ) -> Result<Option<HistoryEntry>, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read(learner).await?;

        let Some(entry) = entries.iter_mut().find(|entry| entry.id == id) else {
            return Ok(None);
        };
        entry.favorite = !entry.favorite;
        let updated = entry.clone();

        self.save(learner, &entries).await?;
        Ok(Some(updated))
    }
}
