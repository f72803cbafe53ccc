use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One learning tier of the quiz, shown in the level picker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    pub level: u8,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
    /// Total score a learner needs before the level is shown as unlocked.
    #[serde(default)]
    pub min_score: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub id: u32,
    pub level: u8,
    pub title: String,
    pub description: String,
    pub points: u32,
    /// Advisory only, never enforced server-side.
    pub time_limit: u32,
    /// Markdown walkthrough shown before the learner starts.
    #[serde(default)]
    pub tutorial: Option<String>,
    #[serde(default)]
    pub hints: Vec<String>,
    pub answer: String,
    pub validation: ValidationRule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhereCondition {
    pub column: String,
    pub value: Value,
}

/// Correctness rule attached to a problem. The `type` tag selects the predicate
/// the validator applies; every variant carries only the parameters it uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ValidationRule {
    #[serde(rename_all = "camelCase")]
    RowCount { expected: usize },
    #[serde(rename_all = "camelCase")]
    Columns {
        expected_columns: Vec<String>,
        #[serde(default)]
        min_rows: Option<usize>,
    },
    #[serde(rename_all = "camelCase")]
    Exact { expected_value: Value },
    #[serde(rename_all = "camelCase")]
    GroupBy { group_column: String },
    #[serde(rename_all = "camelCase")]
    Where { conditions: Vec<WhereCondition> },
    #[serde(rename_all = "camelCase")]
    Ordering {
        order_column: String,
        order_direction: OrderDirection,
    },
    /// `order_by` is carried for authoring purposes; only the row count is checked.
    #[serde(rename = "topN", rename_all = "camelCase")]
    TopN {
        n: usize,
        #[serde(default)]
        order_by: Option<OrderDirection>,
    },
    #[serde(rename_all = "camelCase")]
    Like { column: String, pattern: String },
    #[serde(rename_all = "camelCase")]
    Having {
        #[serde(default)]
        group_column: Option<String>,
        #[serde(default)]
        condition: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Window {
        #[serde(default)]
        has_row_number: bool,
        #[serde(default)]
        has_partition: bool,
    },
    #[serde(rename_all = "camelCase")]
    Cte {
        #[serde(rename = "hasCTE", default)]
        has_cte: bool,
        #[serde(default)]
        has_distinct: bool,
    },
    /// Compare against the canonical answer's rows.
    None,
}

impl ValidationRule {
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationRule::RowCount { .. } => "rowCount",
            ValidationRule::Columns { .. } => "columns",
            ValidationRule::Exact { .. } => "exact",
            ValidationRule::GroupBy { .. } => "groupBy",
            ValidationRule::Where { .. } => "where",
            ValidationRule::Ordering { .. } => "ordering",
            ValidationRule::TopN { .. } => "topN",
            ValidationRule::Like { .. } => "like",
            ValidationRule::Having { .. } => "having",
            ValidationRule::Window { .. } => "window",
            ValidationRule::Cte { .. } => "cte",
            ValidationRule::None => "none",
        }
    }
}

/// Public projection of a problem used in listings: no answer, no hint text.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemSummary {
    pub id: u32,
    pub level: u8,
    pub title: String,
    pub description: String,
    pub points: u32,
    pub time_limit: u32,
    pub hint_count: usize,
    pub rule: &'static str,
    pub solved: bool,
}

impl ProblemSummary {
    pub fn from_problem(problem: &Problem, solved: bool) -> Self {
        Self {
            id: problem.id,
            level: problem.level,
            title: problem.title.clone(),
            description: problem.description.clone(),
            points: problem.points,
            time_limit: problem.time_limit,
            hint_count: problem.hints.len(),
            rule: problem.validation.kind(),
            solved,
        }
    }
}

/// Single-problem view: listing fields plus the tutorial, still without the answer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetail {
    #[serde(flatten)]
    pub summary: ProblemSummary,
    pub tutorial: Option<String>,
}

impl ProblemDetail {
    pub fn from_problem(problem: &Problem, solved: bool) -> Self {
        Self {
            summary: ProblemSummary::from_problem(problem, solved),
            tutorial: problem.tutorial.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rule_deserializes_from_authoring_shape() {
        let rule: ValidationRule = serde_json::from_value(json!({
            "type": "topN",
            "groupColumn": "상권업종대분류명",
            "n": 5,
            "orderBy": "DESC"
        }))
        .unwrap();

        assert_eq!(
            rule,
            ValidationRule::TopN {
                n: 5,
                order_by: Some(OrderDirection::Desc)
            }
        );
    }

    #[test]
    fn cte_rule_reads_uppercase_flag() {
        let rule: ValidationRule = serde_json::from_value(json!({
            "type": "cte",
            "hasCTE": true,
            "hasDistinct": true
        }))
        .unwrap();

        assert_eq!(
            rule,
            ValidationRule::Cte {
                has_cte: true,
                has_distinct: true
            }
        );
        assert_eq!(rule.kind(), "cte");
    }

    #[test]
    fn none_rule_has_no_parameters() {
        let rule: ValidationRule = serde_json::from_value(json!({ "type": "none" })).unwrap();
        assert_eq!(rule, ValidationRule::None);
    }
}
