use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Binding of an email to the paper it is authorized to take. At most one
/// assignment is authoritative per email; assigning again replaces it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamAssignment {
    pub id: Uuid,
    /// Stored lower-cased.
    pub email: String,
    pub paper_id: Uuid,
    pub assigned_by: String,
    pub assigned_at: DateTime<Utc>,
}
