use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Normalized output of one scoring pass. Overwritten wholesale on
/// re-evaluation; no history is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub total_score: f64,
    pub max_score: f64,
    pub summary: String,
    pub pass_fail: PassFail,
    /// Question id → per-question verdict.
    pub question_evaluations: HashMap<String, QuestionEvaluation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionEvaluation {
    pub score: f64,
    pub feedback: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PassFail {
    Pass,
    Fail,
}
