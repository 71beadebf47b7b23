use crate::models::evaluation::EvaluationResult;
use crate::models::paper::Question;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// The mutable record of one candidate's attempt, keyed by `candidate_id`.
///
/// `status` only moves forward (IN_PROGRESS → SUBMITTED → GRADED) and
/// `end_time` is set exactly once, at the SUBMITTED transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSubmission {
    pub candidate_id: Uuid,
    pub paper_id: Uuid,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Question id → free-text response.
    pub answers: HashMap<String, String>,
    /// Append-only, chronological.
    pub proctor_logs: Vec<ProctorLog>,
    pub status: SubmissionStatus,
    /// The paper's questions as they stood when this attempt started.
    /// Resuming sessions and re-grading read these, so a later paper edit
    /// cannot change what the candidate answered against.
    #[serde(default)]
    pub questions_snapshot: Vec<Question>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_evaluation: Option<EvaluationResult>,
}

impl ExamSubmission {
    pub fn new(candidate_id: Uuid, paper_id: Uuid, questions_snapshot: Vec<Question>) -> Self {
        Self {
            candidate_id,
            paper_id,
            start_time: Utc::now(),
            end_time: None,
            answers: HashMap::new(),
            proctor_logs: Vec::new(),
            status: SubmissionStatus::InProgress,
            questions_snapshot,
            ai_evaluation: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.status,
            SubmissionStatus::Submitted | SubmissionStatus::Graded
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    InProgress,
    Submitted,
    Graded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProctorLog {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: ProctorEventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProctorEventType {
    TabSwitch,
    LostFocus,
    CopyAttempt,
    PasteAttempt,
    ContextMenu,
}
