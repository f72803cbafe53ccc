use serde::{Deserialize, Serialize};
use validator::Validate;

use super::progress::{ProgressSnapshot, SolvedEntry};
use super::query::ExecutionResult;

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "쿼리가 필요합니다."))]
    pub query: String,
}

/// Result of checking one submission against a problem's rule.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    pub is_correct: bool,
    pub score: u32,
    pub feedback: String,
    pub execution_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_result: Option<ExecutionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationOutcome {
    pub fn failed_execution(message: &str) -> Self {
        Self {
            is_correct: false,
            score: 0,
            feedback: format!("쿼리 실행 오류: {}", message),
            execution_time: None,
            user_result: None,
            error: Some(message.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerResponse {
    #[serde(flatten)]
    pub outcome: ValidationOutcome,
    /// Present only when this submission was the learner's first correct one.
    pub solved_entry: Option<SolvedEntry>,
    pub progress: ProgressSnapshot,
}
