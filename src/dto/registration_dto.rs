use serde::{Deserialize, Serialize};
use validator::Validate;

/// Candidate-facing registration form. Validated at this boundary so
/// malformed input never reaches the store.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    #[serde(default)]
    pub current_company: String,
    #[serde(default)]
    pub current_salary: String,
    #[serde(default)]
    pub notice_period: String,
}
