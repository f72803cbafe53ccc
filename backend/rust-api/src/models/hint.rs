use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HintResponse {
    pub problem_id: u32,
    pub hint_level: usize,
    pub hint: String,
    pub hints_remaining: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRevealResponse {
    pub problem_id: u32,
    pub answer: String,
}
