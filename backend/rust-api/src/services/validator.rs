use std::cmp::Ordering;

use serde_json::Value;

use crate::metrics::ANSWERS_SUBMITTED_TOTAL;
use crate::models::{
    ExecutionResult, OrderDirection, Problem, ValidationOutcome, ValidationRule, WhereCondition,
};

use super::executor::QueryExecutor;

/// Submissions faster than this earn the speed bonus.
pub const FAST_EXECUTION_MS: f64 = 100.0;
pub const SPEED_BONUS: u32 = 5;

const WINDOW_KEYWORDS: [&str; 3] = ["ROW_NUMBER", "RANK", "DENSE_RANK"];
const COUNT_COLUMN_MARKERS: [&str; 3] = ["개수", "count", "COUNT"];

struct Verdict {
    correct: bool,
    feedback: String,
}

impl Verdict {
    fn new(correct: bool, ok: impl Into<String>, wrong: impl Into<String>) -> Self {
        Self {
            correct,
            feedback: if correct { ok.into() } else { wrong.into() },
        }
    }
}

/// Decides whether a learner's query satisfies a problem's rule.
///
/// Rules look at the shape of the returned rows or at keywords in the raw
/// query text; nothing here parses SQL. Alternative formulations that lack a
/// literal keyword (e.g. HAVING rewritten as a subquery) are rejected.
pub struct AnswerValidator<'a> {
    executor: &'a dyn QueryExecutor,
    reference: &'a dyn QueryExecutor,
}

impl<'a> AnswerValidator<'a> {
    pub fn new(executor: &'a dyn QueryExecutor) -> Self {
        Self {
            executor,
            reference: executor,
        }
    }

    /// Runs canonical answers on `reference` instead of the submission executor.
    pub fn with_reference(mut self, reference: &'a dyn QueryExecutor) -> Self {
        self.reference = reference;
        self
    }

    pub async fn validate(&self, submitted: &str, problem: &Problem) -> ValidationOutcome {
        let user_result = match self.executor.execute(submitted).await {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!("Submission for problem {} failed: {}", problem.id, e);
                ANSWERS_SUBMITTED_TOTAL
                    .with_label_values(&["error"])
                    .inc();
                return ValidationOutcome::failed_execution(&e.to_string());
            }
        };

        let reference = if matches!(problem.validation, ValidationRule::None) {
            match self.reference.execute(&problem.answer).await {
                Ok(result) => Some(result),
                Err(e) => {
                    tracing::error!(
                        "Canonical answer for problem {} failed to execute: {}",
                        problem.id,
                        e
                    );
                    ANSWERS_SUBMITTED_TOTAL
                        .with_label_values(&["error"])
                        .inc();
                    return ValidationOutcome::failed_execution(&e.to_string());
                }
            }
        } else {
            None
        };

        let verdict = evaluate(
            &problem.validation,
            submitted,
            &user_result,
            reference.as_ref(),
        );

        let mut score = 0;
        let mut feedback = verdict.feedback;
        if verdict.correct {
            score = problem.points;
            if user_result.execution_time < FAST_EXECUTION_MS {
                score += SPEED_BONUS;
                feedback.push_str(&format!(" ⚡ 빠른 실행 보너스 +{}점!", SPEED_BONUS));
            }
        }

        ANSWERS_SUBMITTED_TOTAL
            .with_label_values(&[if verdict.correct { "true" } else { "false" }])
            .inc();

        tracing::info!(
            "Validated problem={} rule={} correct={} score={} rows={}",
            problem.id,
            problem.validation.kind(),
            verdict.correct,
            score,
            user_result.row_count
        );

        ValidationOutcome {
            is_correct: verdict.correct,
            score,
            feedback,
            execution_time: Some(user_result.execution_time),
            user_result: Some(user_result),
            error: None,
        }
    }
}

fn evaluate(
    rule: &ValidationRule,
    submitted: &str,
    result: &ExecutionResult,
    reference: Option<&ExecutionResult>,
) -> Verdict {
    match rule {
        ValidationRule::RowCount { expected } => Verdict::new(
            result.row_count == *expected,
            format!("정답입니다! {}개의 행을 반환했습니다.", expected),
            format!(
                "틀렸습니다. {}개를 반환해야 하는데 {}개를 반환했습니다.",
                expected, result.row_count
            ),
        ),

        ValidationRule::Columns {
            expected_columns,
            min_rows,
        } => {
            let has_all = expected_columns
                .iter()
                .all(|col| result.columns.contains(col));
            let rows_ok = min_rows.map_or(true, |min| result.row_count >= min);
            let wrong = if !has_all {
                format!("필요한 컬럼이 누락되었습니다: {}", expected_columns.join(", "))
            } else {
                format!(
                    "최소 {}개 이상의 행이 필요합니다.",
                    min_rows.unwrap_or_default()
                )
            };
            Verdict::new(
                has_all && rows_ok,
                "정답입니다! 필요한 컬럼을 모두 포함했습니다.",
                wrong,
            )
        }

        ValidationRule::Exact { expected_value } => {
            let actual = result.first_scalar();
            let correct = actual.is_some_and(|value| scalar_eq(value, expected_value));
            Verdict::new(
                correct,
                format!("정답입니다! {}", display_scalar(Some(expected_value))),
                format!(
                    "틀렸습니다. 정답은 {}인데 {}를 얻었습니다.",
                    display_scalar(Some(expected_value)),
                    display_scalar(actual)
                ),
            )
        }

        ValidationRule::GroupBy { group_column } => {
            let has_group = result.columns.contains(group_column);
            let has_count = result.columns.iter().any(|col| {
                COUNT_COLUMN_MARKERS
                    .iter()
                    .any(|marker| col.contains(marker))
            });
            Verdict::new(
                has_group && has_count && result.row_count > 1,
                "정답입니다! GROUP BY를 올바르게 사용했습니다.",
                format!(
                    "GROUP BY {}를 사용하고 COUNT(*)로 개수를 세어야 합니다.",
                    group_column
                ),
            )
        }

        ValidationRule::Where { conditions } => {
            let all_match = result.rows.iter().all(|row| {
                conditions.iter().all(|cond| {
                    row.get(&cond.column)
                        .is_some_and(|value| scalar_eq(value, &cond.value))
                })
            });
            Verdict::new(
                all_match && result.row_count > 0,
                "정답입니다! WHERE 조건을 올바르게 적용했습니다.",
                format!(
                    "WHERE 조건이 올바르지 않습니다. {}",
                    describe_conditions(conditions)
                ),
            )
        }

        ValidationRule::Ordering {
            order_column,
            order_direction,
        } => {
            let correct = result.row_count >= 2 && {
                let first = result.rows[0].get(order_column);
                let second = result.rows[1].get(order_column);
                match (compare_scalars(first, second), order_direction) {
                    (Some(ord), OrderDirection::Asc) => ord != Ordering::Greater,
                    (Some(ord), OrderDirection::Desc) => ord != Ordering::Less,
                    (None, _) => false,
                }
            };
            Verdict::new(
                correct,
                format!(
                    "정답입니다! {}으로 {} 정렬했습니다.",
                    order_column,
                    order_direction.as_str()
                ),
                format!(
                    "ORDER BY {} {}로 정렬해야 합니다.",
                    order_column,
                    order_direction.as_str()
                ),
            )
        }

        // Direction is declared but not re-verified; only the count decides.
        ValidationRule::TopN { n, .. } => Verdict::new(
            result.row_count == *n,
            format!("정답입니다! TOP {}를 올바르게 조회했습니다.", n),
            format!("LIMIT {}를 사용하여 상위 {}개만 조회하세요.", n, n),
        ),

        ValidationRule::Like { column, pattern } => {
            let needle = pattern.replace('%', "");
            let all_match = result.rows.iter().all(|row| {
                row.get(column)
                    .and_then(Value::as_str)
                    .is_some_and(|text| text.contains(&needle))
            });
            Verdict::new(
                all_match && result.row_count > 0,
                "정답입니다! LIKE 패턴을 올바르게 사용했습니다.",
                format!("WHERE {} LIKE '{}'를 사용하세요.", column, pattern),
            )
        }

        ValidationRule::Having { .. } => {
            let upper = submitted.to_uppercase();
            Verdict::new(
                upper.contains("HAVING") && upper.contains("GROUP BY") && result.row_count > 0,
                "정답입니다! HAVING 절을 올바르게 사용했습니다.",
                "GROUP BY와 HAVING 절을 사용하여 그룹 결과를 필터링하세요.",
            )
        }

        ValidationRule::Window { .. } => {
            let upper = submitted.to_uppercase();
            let has_window = WINDOW_KEYWORDS.iter().any(|kw| upper.contains(kw));
            Verdict::new(
                has_window && upper.contains("PARTITION BY"),
                "정답입니다! 윈도우 함수를 올바르게 사용했습니다.",
                "윈도우 함수 (ROW_NUMBER, RANK 등)와 PARTITION BY를 사용하세요.",
            )
        }

        ValidationRule::Cte { has_distinct, .. } => {
            let upper = submitted.to_uppercase();
            let distinct_ok = !has_distinct || upper.contains("DISTINCT");
            Verdict::new(
                upper.contains("WITH") && distinct_ok && result.row_count > 0,
                "정답입니다! CTE를 올바르게 사용했습니다.",
                "WITH 절(CTE)을 사용하여 쿼리를 구조화하세요.",
            )
        }

        ValidationRule::None => {
            let correct = reference.is_some_and(|expected| rows_equal(result, expected));
            Verdict::new(correct, "정답입니다!", "결과가 정답과 다릅니다.")
        }
    }
}

/// Equality with numeric values compared by magnitude, so `1` matches `1.0`.
fn scalar_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn compare_scalars(a: Option<&Value>, b: Option<&Value>) -> Option<Ordering> {
    match (a?, b?) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

/// Row-by-row, in order, with keys compared in column order.
fn rows_equal(actual: &ExecutionResult, expected: &ExecutionResult) -> bool {
    actual.rows.len() == expected.rows.len()
        && actual.rows.iter().zip(&expected.rows).all(|(a, b)| {
            a.len() == b.len()
                && a.iter()
                    .zip(b.iter())
                    .all(|((ka, va), (kb, vb))| ka == kb && scalar_eq(va, vb))
        })
}

fn display_scalar(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "결과 없음".to_string(),
    }
}

fn describe_conditions(conditions: &[WhereCondition]) -> String {
    conditions
        .iter()
        .map(|c| format!("{} = '{}'", c.column, display_scalar(Some(&c.value))))
        .collect::<Vec<_>>()
        .join(" AND ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Row;
    use crate::services::executor::ExecutionError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;

    /// Answers each statement from a fixed table of canned results.
    struct CannedExecutor {
        results: HashMap<String, Result<ExecutionResult, ExecutionError>>,
    }

    impl CannedExecutor {
        fn new() -> Self {
            Self {
                results: HashMap::new(),
            }
        }

        fn with(mut self, sql: &str, result: ExecutionResult) -> Self {
            self.results.insert(sql.to_string(), Ok(result));
            self
        }

        fn failing(mut self, sql: &str, message: &str) -> Self {
            self.results.insert(
                sql.to_string(),
                Err(ExecutionError::Engine(message.to_string())),
            );
            self
        }
    }

    #[async_trait]
    impl QueryExecutor for CannedExecutor {
        async fn execute(&self, sql: &str) -> Result<ExecutionResult, ExecutionError> {
            self.results
                .get(sql)
                .cloned()
                .unwrap_or_else(|| Err(ExecutionError::Engine(format!("unexpected: {}", sql))))
        }

        async fn table_columns(
            &self,
            _table: &str,
        ) -> Result<Vec<crate::models::ColumnInfo>, ExecutionError> {
            Ok(Vec::new())
        }
    }

    fn rows(records: Vec<Value>) -> Vec<Row> {
        records
            .into_iter()
            .map(|value| match value {
                Value::Object(map) => map,
                other => panic!("row must be an object, got {}", other),
            })
            .collect()
    }

    fn result(columns: &[&str], records: Vec<Value>, ms: f64) -> ExecutionResult {
        ExecutionResult::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows(records),
            ms,
        )
    }

    fn problem(rule: ValidationRule) -> Problem {
        Problem {
            id: 1,
            level: 1,
            title: "t".to_string(),
            description: "d".to_string(),
            points: 20,
            time_limit: 300,
            tutorial: None,
            hints: vec![],
            answer: "ANSWER".to_string(),
            validation: rule,
        }
    }

    fn n_rows(n: usize) -> Vec<Value> {
        (0..n).map(|i| json!({ "상호명": format!("가게{}", i) })).collect()
    }

    async fn check(rule: ValidationRule, res: ExecutionResult) -> ValidationOutcome {
        let executor = CannedExecutor::new().with("Q", res);
        AnswerValidator::new(&executor)
            .validate("Q", &problem(rule))
            .await
    }

    #[tokio::test]
    async fn row_count_must_match_exactly() {
        let rule = ValidationRule::RowCount { expected: 10 };

        let ok = check(rule.clone(), result(&["상호명"], n_rows(10), 500.0)).await;
        assert!(ok.is_correct);
        assert_eq!(ok.score, 20);

        for n in [9, 11] {
            let wrong = check(rule.clone(), result(&["상호명"], n_rows(n), 500.0)).await;
            assert!(!wrong.is_correct);
            assert_eq!(wrong.score, 0);
            assert!(wrong.feedback.contains(&n.to_string()));
        }
    }

    #[tokio::test]
    async fn fast_execution_earns_bonus() {
        let rule = ValidationRule::RowCount { expected: 1 };
        let outcome = check(rule, result(&["상호명"], n_rows(1), 12.0)).await;

        assert!(outcome.is_correct);
        assert_eq!(outcome.score, 20 + SPEED_BONUS);
        assert!(outcome.feedback.contains("빠른 실행 보너스"));
    }

    #[tokio::test]
    async fn columns_require_superset_and_min_rows() {
        let rule = ValidationRule::Columns {
            expected_columns: vec!["상호명".to_string(), "시군구명".to_string()],
            min_rows: Some(2),
        };

        let records = vec![
            json!({ "상호명": "a", "시군구명": "강남구", "위도": 1 }),
            json!({ "상호명": "b", "시군구명": "서초구", "위도": 2 }),
        ];
        let ok = check(
            rule.clone(),
            result(&["상호명", "시군구명", "위도"], records.clone(), 500.0),
        )
        .await;
        assert!(ok.is_correct);

        let missing = check(rule.clone(), result(&["상호명"], n_rows(2), 500.0)).await;
        assert!(!missing.is_correct);
        assert!(missing.feedback.contains("누락"));

        let too_few = check(
            rule,
            result(&["상호명", "시군구명"], records[..1].to_vec(), 500.0),
        )
        .await;
        assert!(!too_few.is_correct);
        assert!(too_few.feedback.contains("최소 2개"));
    }

    #[tokio::test]
    async fn exact_compares_first_scalar() {
        let rule = ValidationRule::Exact {
            expected_value: json!(536115),
        };
        let ok = check(
            rule.clone(),
            result(&["총상가수"], vec![json!({ "총상가수": 536115 })], 500.0),
        )
        .await;
        assert!(ok.is_correct);

        let wrong = check(
            rule.clone(),
            result(&["총상가수"], vec![json!({ "총상가수": 12 })], 500.0),
        )
        .await;
        assert!(!wrong.is_correct);
        assert!(wrong.feedback.contains("12"));

        let empty = check(rule, result(&["총상가수"], vec![], 500.0)).await;
        assert!(!empty.is_correct);
    }

    #[tokio::test]
    async fn group_by_needs_group_and_count_columns() {
        let rule = ValidationRule::GroupBy {
            group_column: "시군구명".to_string(),
        };
        let records = vec![
            json!({ "시군구명": "강남구", "개수": 10 }),
            json!({ "시군구명": "서초구", "개수": 5 }),
        ];

        let ok = check(rule.clone(), result(&["시군구명", "개수"], records.clone(), 500.0)).await;
        assert!(ok.is_correct);

        let english = check(
            rule.clone(),
            result(&["시군구명", "store_count"], records.clone(), 500.0),
        )
        .await;
        assert!(english.is_correct);

        let no_count = check(rule.clone(), result(&["시군구명", "합계"], records.clone(), 500.0)).await;
        assert!(!no_count.is_correct);

        let single = check(rule, result(&["시군구명", "개수"], records[..1].to_vec(), 500.0)).await;
        assert!(!single.is_correct);
    }

    #[tokio::test]
    async fn where_rejects_any_non_matching_row() {
        let rule = ValidationRule::Where {
            conditions: vec![
                WhereCondition {
                    column: "시군구명".to_string(),
                    value: json!("강남구"),
                },
                WhereCondition {
                    column: "상권업종대분류명".to_string(),
                    value: json!("음식"),
                },
            ],
        };
        let good = json!({ "시군구명": "강남구", "상권업종대분류명": "음식" });
        let bad = json!({ "시군구명": "서초구", "상권업종대분류명": "음식" });
        let cols = ["시군구명", "상권업종대분류명"];

        let ok = check(rule.clone(), result(&cols, vec![good.clone(), good.clone()], 500.0)).await;
        assert!(ok.is_correct);

        let mixed = check(rule.clone(), result(&cols, vec![good.clone(), bad], 500.0)).await;
        assert!(!mixed.is_correct);
        assert!(mixed
            .feedback
            .contains("시군구명 = '강남구' AND 상권업종대분류명 = '음식'"));

        let empty = check(rule, result(&cols, vec![], 500.0)).await;
        assert!(!empty.is_correct);
    }

    #[tokio::test]
    async fn ordering_inspects_first_two_rows() {
        let rule = ValidationRule::Ordering {
            order_column: "상호명".to_string(),
            order_direction: OrderDirection::Asc,
        };
        let asc = vec![json!({ "상호명": "가" }), json!({ "상호명": "나" })];
        let desc = vec![json!({ "상호명": "나" }), json!({ "상호명": "가" })];

        assert!(check(rule.clone(), result(&["상호명"], asc.clone(), 500.0)).await.is_correct);
        assert!(!check(rule.clone(), result(&["상호명"], desc.clone(), 500.0)).await.is_correct);
        assert!(!check(rule, result(&["상호명"], asc[..1].to_vec(), 500.0)).await.is_correct);

        let desc_rule = ValidationRule::Ordering {
            order_column: "개수".to_string(),
            order_direction: OrderDirection::Desc,
        };
        let counts = vec![json!({ "개수": 30 }), json!({ "개수": 30 }), json!({ "개수": 1 })];
        assert!(check(desc_rule, result(&["개수"], counts, 500.0)).await.is_correct);
    }

    #[tokio::test]
    async fn top_n_checks_count_only() {
        let rule = ValidationRule::TopN {
            n: 3,
            order_by: Some(OrderDirection::Desc),
        };
        // Ascending order still passes: direction is not verified.
        let ascending = vec![json!({ "개수": 1 }), json!({ "개수": 2 }), json!({ "개수": 3 })];
        assert!(check(rule.clone(), result(&["개수"], ascending, 500.0)).await.is_correct);
        assert!(!check(rule, result(&["개수"], vec![json!({ "개수": 1 })], 500.0)).await.is_correct);
    }

    #[tokio::test]
    async fn like_matches_pattern_substring() {
        let rule = ValidationRule::Like {
            column: "상호명".to_string(),
            pattern: "%카페%".to_string(),
        };

        let ok = check(
            rule.clone(),
            result(&["상호명"], vec![json!({ "상호명": "스타벅스카페" })], 500.0),
        )
        .await;
        assert!(ok.is_correct);

        let wrong = check(
            rule.clone(),
            result(
                &["상호명"],
                vec![json!({ "상호명": "스타벅스카페" }), json!({ "상호명": "스타벅스" })],
                500.0,
            ),
        )
        .await;
        assert!(!wrong.is_correct);
        assert!(wrong.feedback.contains("LIKE '%카페%'"));

        let non_text = check(rule, result(&["상호명"], vec![json!({ "상호명": 7 })], 500.0)).await;
        assert!(!non_text.is_correct);
    }

    #[tokio::test]
    async fn having_is_a_textual_check() {
        let rule = ValidationRule::Having {
            group_column: Some("시군구명".to_string()),
            condition: Some("COUNT(*) >= 20000".to_string()),
        };
        let res = result(&["시군구명"], vec![json!({ "시군구명": "강남구" })], 500.0);

        let executor = CannedExecutor::new()
            .with("select 시군구명 from stores group by 시군구명 having count(*) > 1", res.clone())
            .with(
                "SELECT * FROM (SELECT 시군구명, COUNT(*) c FROM stores GROUP BY 시군구명) WHERE c > 1",
                res,
            );
        let validator = AnswerValidator::new(&executor);
        let p = problem(rule);

        assert!(validator
            .validate("select 시군구명 from stores group by 시군구명 having count(*) > 1", &p)
            .await
            .is_correct);
        // Equivalent subquery form lacks the HAVING keyword and is rejected.
        assert!(!validator
            .validate(
                "SELECT * FROM (SELECT 시군구명, COUNT(*) c FROM stores GROUP BY 시군구명) WHERE c > 1",
                &p
            )
            .await
            .is_correct);
    }

    #[tokio::test]
    async fn window_needs_ranking_and_partition() {
        let rule = ValidationRule::Window {
            has_row_number: true,
            has_partition: true,
        };
        let res = result(&["순위"], vec![], 500.0);
        let with_partition = "SELECT RANK() OVER (PARTITION BY 시군구명 ORDER BY 개수) FROM stores";
        let without_partition = "SELECT ROW_NUMBER() OVER (ORDER BY 개수) FROM stores";
        let executor = CannedExecutor::new()
            .with(with_partition, res.clone())
            .with(without_partition, res);
        let validator = AnswerValidator::new(&executor);
        let p = problem(rule);

        assert!(validator.validate(with_partition, &p).await.is_correct);
        assert!(!validator.validate(without_partition, &p).await.is_correct);
    }

    #[tokio::test]
    async fn cte_requires_with_and_declared_distinct() {
        let rule = ValidationRule::Cte {
            has_cte: true,
            has_distinct: true,
        };
        let res = result(&["업종수"], vec![json!({ "업종수": 3 })], 500.0);
        let good = "WITH d AS (SELECT COUNT(DISTINCT 상권업종대분류명) 업종수 FROM stores) SELECT * FROM d";
        let no_distinct = "WITH d AS (SELECT COUNT(*) 업종수 FROM stores) SELECT * FROM d";
        let executor = CannedExecutor::new()
            .with(good, res.clone())
            .with(no_distinct, res);
        let validator = AnswerValidator::new(&executor);
        let p = problem(rule);

        assert!(validator.validate(good, &p).await.is_correct);
        assert!(!validator.validate(no_distinct, &p).await.is_correct);
    }

    #[tokio::test]
    async fn fallback_compares_with_canonical_rows() {
        let expected = result(&["a"], vec![json!({ "a": 1 }), json!({ "a": 2 })], 5.0);
        let reordered = result(&["a"], vec![json!({ "a": 2 }), json!({ "a": 1 })], 5.0);
        let executor = CannedExecutor::new()
            .with("ANSWER", expected.clone())
            .with("SAME", expected)
            .with("REORDERED", reordered);
        let validator = AnswerValidator::new(&executor);
        let p = problem(ValidationRule::None);

        assert!(validator.validate("SAME", &p).await.is_correct);
        assert!(!validator.validate("REORDERED", &p).await.is_correct);
    }

    #[tokio::test]
    async fn execution_error_becomes_negative_outcome() {
        let executor = CannedExecutor::new().failing("BROKEN", "no such column: 없는컬럼");
        let outcome = AnswerValidator::new(&executor)
            .validate("BROKEN", &problem(ValidationRule::RowCount { expected: 1 }))
            .await;

        assert!(!outcome.is_correct);
        assert_eq!(outcome.score, 0);
        assert_eq!(outcome.error.as_deref(), Some("no such column: 없는컬럼"));
        assert!(outcome.feedback.starts_with("쿼리 실행 오류"));
    }

    #[tokio::test]
    async fn canonical_answer_runs_on_reference_executor() {
        let expected = result(&["a"], vec![json!({ "a": 1 })], 5.0);
        let learner = CannedExecutor::new().with("SAME", expected.clone());
        let reference = CannedExecutor::new().with("ANSWER", expected);

        let outcome = AnswerValidator::new(&learner)
            .with_reference(&reference)
            .validate("SAME", &problem(ValidationRule::None))
            .await;

        assert!(outcome.is_correct, "{}", outcome.feedback);
    }
}
