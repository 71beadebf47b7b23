use crate::models::assignment::ExamAssignment;
use crate::models::candidate::Candidate;
use crate::models::evaluation::EvaluationResult;
use crate::models::paper::QuestionPaper;
use crate::models::submission::{ExamSubmission, ProctorLog, SubmissionStatus};
use crate::storage::bootstrap;
use crate::storage::medium::{MemoryMedium, StorageMedium};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const CANDIDATES_KEY: &str = "pathfinder_candidates";
const PAPERS_KEY: &str = "pathfinder_papers";
const ASSIGNMENTS_KEY: &str = "pathfinder_assignments";
const SUBMISSIONS_KEY: &str = "pathfinder_submissions";

/// Outcome of a registration attempt against the store.
#[derive(Debug, Clone)]
pub enum RegistrationOutcome {
    Created(Candidate),
    Resumed(Candidate),
    Rejected { reason: String },
}

/// Record store over an injected key-value medium. Whole-collection reads
/// and replace-whole-record writes only; a single writer is assumed.
///
/// Medium failures never surface to callers mid-session: reads degrade to
/// an empty collection and writes are dropped, both logged.
#[derive(Clone)]
pub struct ExamStore {
    medium: Arc<dyn StorageMedium>,
    /// Email of the identity allowed to re-register after finishing.
    test_identity_email: String,
    /// Scales the per-operation simulated latency; zero in tests.
    latency_unit: Duration,
}

impl ExamStore {
    pub fn new(medium: Arc<dyn StorageMedium>, test_identity_email: impl Into<String>) -> Self {
        Self {
            medium,
            test_identity_email: test_identity_email.into(),
            latency_unit: Duration::from_millis(100),
        }
    }

    /// Memory-backed store with latency disabled.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryMedium::new()), "alex.tester@example.com")
            .with_latency_unit(Duration::ZERO)
    }

    pub fn with_latency_unit(mut self, unit: Duration) -> Self {
        self.latency_unit = unit;
        self
    }

    /// Seeds the default question paper when none exist. Explicit so that
    /// tests and embedders opt in; never runs as a load-time side effect.
    pub async fn bootstrap(&self) {
        let papers: Vec<QuestionPaper> = self.load(PAPERS_KEY).await;
        if papers.is_empty() {
            let paper = bootstrap::default_paper();
            tracing::info!(paper_id = %paper.id, title = %paper.title, "Seeding default question paper");
            self.save(PAPERS_KEY, &[paper]).await;
        }
    }

    // ----- candidates -------------------------------------------------

    pub async fn register_candidate(&self, candidate: Candidate) -> RegistrationOutcome {
        self.delay(3).await;
        let email = candidate.email.to_lowercase();

        let assignments: Vec<ExamAssignment> = self.load(ASSIGNMENTS_KEY).await;
        let Some(assignment) = assignments.iter().find(|a| a.email == email) else {
            return RegistrationOutcome::Rejected {
                reason: "no exam assigned".to_string(),
            };
        };
        let paper_id = assignment.paper_id;

        let mut candidates: Vec<Candidate> = self.load(CANDIDATES_KEY).await;
        let submissions: Vec<ExamSubmission> = self.load(SUBMISSIONS_KEY).await;

        // A prior record is "active" while it has no submission yet, or its
        // submission is still IN_PROGRESS.
        let active = candidates
            .iter()
            .position(|c| {
                c.email_matches(&email)
                    && submissions
                        .iter()
                        .find(|s| s.candidate_id == c.id)
                        .map_or(true, |s| s.status == SubmissionStatus::InProgress)
            });

        if let Some(idx) = active {
            let existing = &mut candidates[idx];
            existing.full_name = candidate.full_name;
            existing.current_company = candidate.current_company;
            existing.current_salary = candidate.current_salary;
            existing.notice_period = candidate.notice_period;
            existing.assigned_paper_id = Some(paper_id);
            let resumed = existing.clone();
            self.save(CANDIDATES_KEY, &candidates).await;
            tracing::info!(candidate_id = %resumed.id, %email, "Registration resumed existing attempt");
            return RegistrationOutcome::Resumed(resumed);
        }

        let has_finished_attempt = candidates.iter().any(|c| c.email_matches(&email));
        if has_finished_attempt && !email.eq_ignore_ascii_case(&self.test_identity_email) {
            return RegistrationOutcome::Rejected {
                reason: "already submitted".to_string(),
            };
        }

        let mut created = candidate;
        created.assigned_paper_id = Some(paper_id);
        candidates.push(created.clone());
        self.save(CANDIDATES_KEY, &candidates).await;
        tracing::info!(candidate_id = %created.id, %email, "Registered new candidate");
        RegistrationOutcome::Created(created)
    }

    pub async fn get_candidate(&self, id: Uuid) -> Option<Candidate> {
        self.delay(1).await;
        let candidates: Vec<Candidate> = self.load(CANDIDATES_KEY).await;
        candidates.into_iter().find(|c| c.id == id)
    }

    pub async fn get_all_candidates(&self) -> Vec<Candidate> {
        self.delay(2).await;
        self.load(CANDIDATES_KEY).await
    }

    /// Full reset for one identity: the candidate record, its submission,
    /// and the assignment for its email all go.
    pub async fn delete_candidate(&self, id: Uuid) {
        self.delay(2).await;
        let mut candidates: Vec<Candidate> = self.load(CANDIDATES_KEY).await;
        let Some(idx) = candidates.iter().position(|c| c.id == id) else {
            return;
        };
        let removed = candidates.remove(idx);
        self.save(CANDIDATES_KEY, &candidates).await;

        let mut submissions: Vec<ExamSubmission> = self.load(SUBMISSIONS_KEY).await;
        submissions.retain(|s| s.candidate_id != id);
        self.save(SUBMISSIONS_KEY, &submissions).await;

        let email = removed.email.to_lowercase();
        let mut assignments: Vec<ExamAssignment> = self.load(ASSIGNMENTS_KEY).await;
        assignments.retain(|a| a.email != email);
        self.save(ASSIGNMENTS_KEY, &assignments).await;
        tracing::info!(candidate_id = %id, %email, "Deleted candidate and cascaded records");
    }

    // ----- papers -----------------------------------------------------

    pub async fn create_question_paper(&self, paper: QuestionPaper) {
        self.delay(2).await;
        let mut papers: Vec<QuestionPaper> = self.load(PAPERS_KEY).await;
        papers.push(paper);
        self.save(PAPERS_KEY, &papers).await;
    }

    /// Replace-by-id; unknown ids are ignored.
    pub async fn update_question_paper(&self, paper: QuestionPaper) {
        self.delay(2).await;
        let mut papers: Vec<QuestionPaper> = self.load(PAPERS_KEY).await;
        if let Some(existing) = papers.iter_mut().find(|p| p.id == paper.id) {
            *existing = paper;
            self.save(PAPERS_KEY, &papers).await;
        }
    }

    pub async fn get_all_papers(&self) -> Vec<QuestionPaper> {
        self.delay(2).await;
        self.load(PAPERS_KEY).await
    }

    pub async fn get_paper(&self, id: Uuid) -> Option<QuestionPaper> {
        self.delay(1).await;
        let papers: Vec<QuestionPaper> = self.load(PAPERS_KEY).await;
        papers.into_iter().find(|p| p.id == id)
    }

    // ----- assignments ------------------------------------------------

    /// Replace-by-email upsert: at most one authoritative assignment per
    /// email, the newest wins.
    pub async fn assign_exam(
        &self,
        email: &str,
        paper_id: Uuid,
        assigned_by: &str,
    ) -> ExamAssignment {
        self.delay(2).await;
        let assignment = ExamAssignment {
            id: Uuid::new_v4(),
            email: email.to_lowercase(),
            paper_id,
            assigned_by: assigned_by.to_string(),
            assigned_at: Utc::now(),
        };
        let mut assignments: Vec<ExamAssignment> = self.load(ASSIGNMENTS_KEY).await;
        assignments.retain(|a| a.email != assignment.email);
        assignments.push(assignment.clone());
        self.save(ASSIGNMENTS_KEY, &assignments).await;
        assignment
    }

    pub async fn get_all_assignments(&self) -> Vec<ExamAssignment> {
        self.delay(2).await;
        self.load(ASSIGNMENTS_KEY).await
    }

    // ----- submissions ------------------------------------------------

    /// Fetch-or-create. Creation stamps `startTime`, captures the paper's
    /// question snapshot, and starts IN_PROGRESS. Calling again returns
    /// the stored record unchanged.
    pub async fn init_submission(&self, candidate_id: Uuid, paper_id: Uuid) -> ExamSubmission {
        let mut submissions: Vec<ExamSubmission> = self.load(SUBMISSIONS_KEY).await;
        if let Some(existing) = submissions.iter().find(|s| s.candidate_id == candidate_id) {
            return existing.clone();
        }

        let snapshot = self
            .get_paper(paper_id)
            .await
            .map(|p| p.questions)
            .unwrap_or_default();
        let submission = ExamSubmission::new(candidate_id, paper_id, snapshot);
        submissions.push(submission.clone());
        self.save(SUBMISSIONS_KEY, &submissions).await;
        tracing::info!(%candidate_id, %paper_id, "Created submission");
        submission
    }

    /// Whole-record overwrite of the working answer map and violation log.
    /// No-op when no submission exists yet. Returns whether the write
    /// actually landed so callers can show a save indicator; a dropped
    /// write is still not an error.
    pub async fn save_draft(
        &self,
        candidate_id: Uuid,
        answers: &HashMap<String, String>,
        logs: &[ProctorLog],
    ) -> bool {
        let mut submissions: Vec<ExamSubmission> = self.load(SUBMISSIONS_KEY).await;
        if let Some(submission) = submissions.iter_mut().find(|s| s.candidate_id == candidate_id) {
            submission.answers = answers.clone();
            submission.proctor_logs = logs.to_vec();
            return self.save(SUBMISSIONS_KEY, &submissions).await;
        }
        false
    }

    /// IN_PROGRESS → SUBMITTED, stamping `endTime` exactly once. Any other
    /// state is left untouched so status never moves backward.
    pub async fn submit_exam(&self, candidate_id: Uuid) {
        self.delay(5).await;
        let mut submissions: Vec<ExamSubmission> = self.load(SUBMISSIONS_KEY).await;
        if let Some(submission) = submissions.iter_mut().find(|s| s.candidate_id == candidate_id) {
            if submission.status == SubmissionStatus::InProgress {
                submission.status = SubmissionStatus::Submitted;
                submission.end_time = Some(Utc::now());
                self.save(SUBMISSIONS_KEY, &submissions).await;
                tracing::info!(%candidate_id, "Submission finalized");
            }
        }
    }

    /// Attaches the evaluation and marks GRADED. Re-evaluation overwrites
    /// the prior result wholesale.
    pub async fn save_evaluation(&self, candidate_id: Uuid, result: EvaluationResult) {
        let mut submissions: Vec<ExamSubmission> = self.load(SUBMISSIONS_KEY).await;
        if let Some(submission) = submissions.iter_mut().find(|s| s.candidate_id == candidate_id) {
            submission.ai_evaluation = Some(result);
            submission.status = SubmissionStatus::Graded;
            self.save(SUBMISSIONS_KEY, &submissions).await;
            tracing::info!(%candidate_id, "Evaluation stored, submission graded");
        }
    }

    pub async fn get_submission(&self, candidate_id: Uuid) -> Option<ExamSubmission> {
        self.delay(2).await;
        let submissions: Vec<ExamSubmission> = self.load(SUBMISSIONS_KEY).await;
        submissions.into_iter().find(|s| s.candidate_id == candidate_id)
    }

    pub async fn get_all_submissions(&self) -> Vec<ExamSubmission> {
        self.delay(2).await;
        self.load(SUBMISSIONS_KEY).await
    }

    // ----- plumbing ---------------------------------------------------

    async fn load<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        match self.medium.read(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(list) => list,
                Err(e) => {
                    tracing::error!(key, error = %e, "Store decode failed, treating collection as empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::error!(key, error = %e, "Store read failed, treating collection as empty");
                Vec::new()
            }
        }
    }

    async fn save<T: Serialize>(&self, key: &str, list: &[T]) -> bool {
        let raw = match serde_json::to_string(list) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(key, error = %e, "Store encode failed, write dropped");
                return false;
            }
        };
        match self.medium.write(key, &raw).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(key, error = %e, "Store write failed, write dropped");
                false
            }
        }
    }

    async fn delay(&self, units: u32) {
        if !self.latency_unit.is_zero() {
            tokio::time::sleep(self.latency_unit * units).await;
        }
    }
}

#[cfg(test)]
impl ExamStore {
    /// Upserts a submission verbatim, bypassing `init_submission`, so tests
    /// can stage records with arbitrary start times or statuses.
    pub(crate) async fn put_submission(&self, submission: ExamSubmission) {
        let mut submissions: Vec<ExamSubmission> = self.load(SUBMISSIONS_KEY).await;
        submissions.retain(|s| s.candidate_id != submission.candidate_id);
        submissions.push(submission);
        self.save(SUBMISSIONS_KEY, &submissions).await;
    }
}
