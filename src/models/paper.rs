use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPaper {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub questions: Vec<Question>,
    /// Time budget in minutes.
    pub duration: u32,
    pub created_at: DateTime<Utc>,
}

impl QuestionPaper {
    pub fn duration_seconds(&self) -> i64 {
        i64::from(self.duration) * 60
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Unique within its paper, e.g. "q1a".
    pub id: String,
    pub section: String,
    pub title: String,
    pub text: String,
    /// Grading guidance for the scoring service, not a strict answer key.
    pub ideal_answer_key: String,
    #[serde(default)]
    pub code_type: CodeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marks: Option<i32>,
}

impl Question {
    pub fn marks(&self) -> i32 {
        self.marks.unwrap_or(10)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeType {
    #[default]
    Text,
    Javascript,
}
