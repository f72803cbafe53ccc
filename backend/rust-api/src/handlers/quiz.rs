use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use validator::Validate;

use crate::{
    extractors::AppJson,
    metrics::HINTS_REQUESTED_TOTAL,
    middlewares::auth::{JwtClaims, LearnerId},
    models::{
        AnswerRevealResponse, HintResponse, LevelProgress, Problem, ProblemDetail,
        ProblemSummary, ProgressResponse, SubmitAnswerRequest, SubmitAnswerResponse,
    },
    services::{progress_service, validator::AnswerValidator, AppState},
};

use super::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct LevelQuery {
    pub level: Option<u8>,
}

fn find_problem(state: &AppState, id: u32) -> Result<&Problem, ApiError> {
    state
        .catalog
        .problem(id)
        .ok_or_else(|| ApiError::not_found(format!("문제를 찾을 수 없습니다: {}", id)))
}

/// GET /api/quiz/levels
pub async fn list_levels(
    State(state): State<Arc<AppState>>,
    learner: LearnerId,
) -> Json<Vec<LevelProgress>> {
    Json(state.progress.levels(learner.as_str()).await)
}

/// GET /api/quiz/problems?level=
pub async fn list_problems(
    State(state): State<Arc<AppState>>,
    learner: LearnerId,
    Query(query): Query<LevelQuery>,
) -> Json<Vec<ProblemSummary>> {
    let solved = state.progress.solved_ids(learner.as_str()).await;

    let summaries = state
        .catalog
        .problems()
        .iter()
        .filter(|p| query.level.map_or(true, |level| p.level == level))
        .map(|p| ProblemSummary::from_problem(p, solved.contains(&p.id)))
        .collect();

    Json(summaries)
}

/// GET /api/quiz/problems/{id}
pub async fn get_problem(
    State(state): State<Arc<AppState>>,
    learner: LearnerId,
    Path(id): Path<u32>,
) -> Result<Json<ProblemDetail>, ApiError> {
    let problem = find_problem(&state, id)?;
    let solved = state.progress.solved_ids(learner.as_str()).await;
    Ok(Json(ProblemDetail::from_problem(
        problem,
        solved.contains(&problem.id),
    )))
}

/// GET /api/quiz/problems/{id}/hints/{n} - n-th hint, 1-based
pub async fn get_hint(
    State(state): State<Arc<AppState>>,
    Path((id, hint_level)): Path<(u32, usize)>,
) -> Result<Json<HintResponse>, ApiError> {
    let problem = find_problem(&state, id)?;
    let hint = progress_service::get_hint(problem, hint_level)
        .ok_or_else(|| ApiError::not_found(format!("힌트가 없습니다: {}", hint_level)))?;

    HINTS_REQUESTED_TOTAL
        .with_label_values(&[&hint_level.to_string()])
        .inc();

    Ok(Json(HintResponse {
        problem_id: problem.id,
        hint_level,
        hint: hint.to_string(),
        hints_remaining: problem.hints.len() - hint_level,
    }))
}

/// GET /api/quiz/problems/{id}/answer
pub async fn reveal_answer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<AnswerRevealResponse>, ApiError> {
    let problem = find_problem(&state, id)?;
    tracing::info!("Answer revealed for problem {}", problem.id);
    Ok(Json(AnswerRevealResponse {
        problem_id: problem.id,
        answer: problem.answer.clone(),
    }))
}

/// POST /api/quiz/problems/{id}/submit
pub async fn submit_answer(
    State(state): State<Arc<AppState>>,
    learner: LearnerId,
    claims: Option<Extension<JwtClaims>>,
    Path(id): Path<u32>,
    AppJson(req): AppJson<SubmitAnswerRequest>,
) -> Result<Json<SubmitAnswerResponse>, ApiError> {
    req.validate()?;
    let problem = find_problem(&state, id)?;

    let executor = state.queries.for_learner(claims.map(|Extension(c)| c.sub));
    let reference = state.queries.for_reference();
    let outcome = AnswerValidator::new(&executor)
        .with_reference(&reference)
        .validate(&req.query, problem)
        .await;

    let solved_entry = state
        .progress
        .record_if_first_solve(learner.as_str(), problem, &outcome)
        .await?;
    let progress = state.progress.overview(learner.as_str()).await.progress;

    Ok(Json(SubmitAnswerResponse {
        outcome,
        solved_entry,
        progress,
    }))
}

/// GET /api/quiz/progress
pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    learner: LearnerId,
) -> Json<ProgressResponse> {
    Json(state.progress.overview(learner.as_str()).await)
}

/// DELETE /api/quiz/progress
pub async fn reset_progress(
    State(state): State<Arc<AppState>>,
    learner: LearnerId,
) -> Result<Json<Value>, ApiError> {
    state.progress.reset(learner.as_str()).await?;
    Ok(Json(json!({ "success": true })))
}

/// GET /api/quiz/next?level= - first unsolved problem of the level (default 1)
pub async fn next_problem(
    State(state): State<Arc<AppState>>,
    learner: LearnerId,
    Query(query): Query<LevelQuery>,
) -> Json<Value> {
    let level = query.level.unwrap_or(1);
    let next = state
        .progress
        .next_problem(learner.as_str(), level)
        .await
        .map(|p| ProblemSummary::from_problem(&p, false));

    Json(json!({ "problem": next }))
}
