use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record of the first correct submission for a problem. Never rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolvedEntry {
    pub id: u32,
    pub level: u8,
    pub score: u32,
    pub solved_at: DateTime<Utc>,
    pub execution_time: f64,
}

/// Persisted shape of a learner's quiz progress.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredProgress {
    #[serde(default)]
    pub solved: Vec<SolvedEntry>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub solved: usize,
    pub total: usize,
    pub percentage: u32,
    pub score: u64,
    pub max_score: u64,
    pub score_percentage: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelProgress {
    pub level: u8,
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
    pub min_score: u32,
    pub unlocked: bool,
    pub progress: ProgressSnapshot,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub progress: ProgressSnapshot,
    pub solved: Vec<SolvedEntry>,
    pub last_updated: Option<DateTime<Utc>>,
}
