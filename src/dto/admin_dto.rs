use crate::models::candidate::Candidate;
use crate::models::paper::Question;
use crate::models::submission::ExamSubmission;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaperRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 1, max = 480, message = "Duration must be 1-480 minutes"))]
    pub duration: u32,
    #[validate(length(min = 1, message = "A paper needs at least one question"))]
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignExamRequest {
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    pub paper_id: Uuid,
    #[validate(length(min = 1, message = "Assigner is required"))]
    pub assigned_by: String,
}

/// Candidate plus their attempt, as shown on the review dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateOverview {
    pub candidate: Candidate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission: Option<ExamSubmission>,
}
