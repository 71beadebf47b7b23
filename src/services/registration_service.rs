use crate::dto::registration_dto::RegisterRequest;
use crate::error::Result;
use crate::models::candidate::Candidate;
use crate::storage::{ExamStore, RegistrationOutcome};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

/// Entry point for the candidate-facing registration form.
#[derive(Clone)]
pub struct RegistrationService {
    store: ExamStore,
}

impl RegistrationService {
    pub fn new(store: ExamStore) -> Self {
        Self { store }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<RegistrationOutcome> {
        req.validate()?;

        let candidate = Candidate {
            id: Uuid::new_v4(),
            full_name: req.full_name.trim().to_string(),
            email: req.email.trim().to_string(),
            current_company: req.current_company.trim().to_string(),
            current_salary: req.current_salary.trim().to_string(),
            notice_period: req.notice_period.trim().to_string(),
            registered_at: Utc::now(),
            assigned_paper_id: None,
        };

        let outcome = self.store.register_candidate(candidate).await;
        if let RegistrationOutcome::Rejected { reason } = &outcome {
            tracing::warn!(email = %req.email, %reason, "Registration rejected");
        }
        Ok(outcome)
    }
}
