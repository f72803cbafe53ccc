use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::metrics::PROBLEMS_SOLVED_TOTAL;
use crate::models::{
    LevelProgress, Problem, ProgressResponse, ProgressSnapshot, SolvedEntry, StoredProgress,
    ValidationOutcome,
};

use super::catalog::ProblemCatalog;
use super::storage::{KeyValueStore, StoreError};

pub const PROGRESS_KEY_PREFIX: &str = "quiz_progress:";

fn progress_key(learner: &str) -> String {
    format!("{}{}", PROGRESS_KEY_PREFIX, learner)
}

fn percent(part: f64, whole: f64) -> u32 {
    if whole <= 0.0 {
        return 0;
    }
    (part * 100.0 / whole).round() as u32
}

/// Aggregate progress of `solved` over `problems`. Entries for problems
/// outside the set are ignored.
pub fn compute_progress<'a, I>(solved: &[SolvedEntry], problems: I) -> ProgressSnapshot
where
    I: IntoIterator<Item = &'a Problem>,
{
    let problems: Vec<&Problem> = problems.into_iter().collect();
    let ids: HashSet<u32> = problems.iter().map(|p| p.id).collect();

    let counted: Vec<&SolvedEntry> = solved.iter().filter(|e| ids.contains(&e.id)).collect();
    let score: u64 = counted.iter().map(|e| u64::from(e.score)).sum();
    let max_score: u64 = problems.iter().map(|p| u64::from(p.points)).sum();

    ProgressSnapshot {
        solved: counted.len(),
        total: problems.len(),
        percentage: percent(counted.len() as f64, problems.len() as f64),
        score,
        max_score,
        score_percentage: percent(score as f64, max_score as f64),
    }
}

/// First problem of `level_problems` not yet in `solved_ids`.
pub fn next_problem<'a>(
    solved_ids: &HashSet<u32>,
    level_problems: &[&'a Problem],
) -> Option<&'a Problem> {
    level_problems
        .iter()
        .copied()
        .find(|p| !solved_ids.contains(&p.id))
}

/// `hint_level` is 1-based.
pub fn get_hint(problem: &Problem, hint_level: usize) -> Option<&str> {
    hint_level
        .checked_sub(1)
        .and_then(|idx| problem.hints.get(idx))
        .map(String::as_str)
}

/// Per-learner record of first correct solves, persisted as one JSON document
/// per learner.
pub struct ProgressTracker {
    store: Arc<dyn KeyValueStore>,
    catalog: Arc<ProblemCatalog>,
    // Serializes read-modify-write of stored progress.
    write_lock: Mutex<()>,
}

impl ProgressTracker {
    pub fn new(store: Arc<dyn KeyValueStore>, catalog: Arc<ProblemCatalog>) -> Self {
        Self {
            store,
            catalog,
            write_lock: Mutex::new(()),
        }
    }

    /// Stored progress. A missing or unparseable document reads as empty
    /// progress; a failed store read is an error.
    async fn read(&self, learner: &str) -> Result<StoredProgress, StoreError> {
        let Some(raw) = self.store.get(&progress_key(learner)).await? else {
            return Ok(StoredProgress::default());
        };

        Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!("Discarding unreadable progress for {}: {}", learner, e);
            StoredProgress::default()
        }))
    }

    /// Read-only view: store failures also show as empty progress.
    pub async fn load(&self, learner: &str) -> StoredProgress {
        self.read(learner).await.unwrap_or_else(|e| {
            tracing::warn!("Failed to read progress for {}: {}", learner, e);
            StoredProgress::default()
        })
    }

    async fn save(&self, learner: &str, progress: &StoredProgress) -> Result<(), StoreError> {
        // Serializing plain data with string keys cannot fail.
        let raw = serde_json::to_string(progress).unwrap_or_default();
        self.store.set(&progress_key(learner), &raw).await
    }

    /// Appends a solved entry when `outcome` is correct and the problem has not
    /// been solved before. Later submissions never change the first record.
    pub async fn record_if_first_solve(
        &self,
        learner: &str,
        problem: &Problem,
        outcome: &ValidationOutcome,
    ) -> Result<Option<SolvedEntry>, StoreError> {
        if !outcome.is_correct {
            return Ok(None);
        }

        let _guard = self.write_lock.lock().await;

        let mut progress = self.read(learner).await?;
        if progress.solved.iter().any(|e| e.id == problem.id) {
            tracing::debug!("Problem {} already solved by {}", problem.id, learner);
            return Ok(None);
        }

        let now = Utc::now();
        let entry = SolvedEntry {
            id: problem.id,
            level: problem.level,
            score: outcome.score,
            solved_at: now,
            execution_time: outcome.execution_time.unwrap_or_default(),
        };
        progress.solved.push(entry.clone());
        progress.last_updated = Some(now);

        self.save(learner, &progress).await?;

        PROBLEMS_SOLVED_TOTAL
            .with_label_values(&[&problem.level.to_string()])
            .inc();
        tracing::info!(
            "Learner {} solved problem {} for {} points",
            learner,
            problem.id,
            entry.score
        );

        Ok(Some(entry))
    }

    pub fn snapshot(&self, solved: &[SolvedEntry]) -> ProgressSnapshot {
        compute_progress(solved, self.catalog.problems())
    }

    pub async fn overview(&self, learner: &str) -> ProgressResponse {
        let stored = self.load(learner).await;
        ProgressResponse {
            progress: self.snapshot(&stored.solved),
            solved: stored.solved,
            last_updated: stored.last_updated,
        }
    }

    pub async fn solved_ids(&self, learner: &str) -> HashSet<u32> {
        self.load(learner)
            .await
            .solved
            .iter()
            .map(|e| e.id)
            .collect()
    }

    /// Every level with the learner's progress in it. A level is unlocked once
    /// the learner's total score reaches its minimum.
    pub async fn levels(&self, learner: &str) -> Vec<LevelProgress> {
        let stored = self.load(learner).await;
        let total_score = self.snapshot(&stored.solved).score;

        self.catalog
            .levels()
            .iter()
            .map(|level| LevelProgress {
                level: level.level,
                name: level.name.clone(),
                description: level.description.clone(),
                icon: level.icon.clone(),
                min_score: level.min_score,
                unlocked: total_score >= u64::from(level.min_score),
                progress: compute_progress(
                    &stored.solved,
                    self.catalog.by_level(level.level),
                ),
            })
            .collect()
    }

    pub async fn next_problem(&self, learner: &str, level: u8) -> Option<Problem> {
        let solved = self.solved_ids(learner).await;
        next_problem(&solved, &self.catalog.by_level(level)).cloned()
    }

    pub async fn reset(&self, learner: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.store.delete(&progress_key(learner)).await?;
        tracing::info!("Progress reset for {}", learner);
        Ok(())
    }
}
