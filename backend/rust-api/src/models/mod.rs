pub mod answer;
pub mod hint;
pub mod history;
pub mod problem;
pub mod progress;
pub mod query;

pub use answer::{SubmitAnswerRequest, SubmitAnswerResponse, ValidationOutcome};
pub use history::{HistoryEntry, LogsQuery, QueryLogRecord, QueryStats};
pub use hint::{AnswerRevealResponse, HintResponse};
pub use problem::{
    Level, OrderDirection, Problem, ProblemDetail, ProblemSummary, ValidationRule, WhereCondition,
};
pub use progress::{
    LevelProgress, ProgressResponse, ProgressSnapshot, SolvedEntry, StoredProgress,
};
pub use query::{ColumnInfo, ExecutionResult, QueryRequest, QueryResponse, Row, SchemaInfo};
