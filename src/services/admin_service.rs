use crate::dto::admin_dto::{AssignExamRequest, CandidateOverview, CreatePaperRequest};
use crate::error::{Error, Result};
use crate::models::assignment::ExamAssignment;
use crate::models::evaluation::EvaluationResult;
use crate::models::paper::QuestionPaper;
use crate::services::scoring_service::Scorer;
use crate::storage::ExamStore;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Administrator console operations: paper CRUD, assignment upsert, review
/// of candidate/submission pairs, and manual re-scoring.
#[derive(Clone)]
pub struct AdminService {
    store: ExamStore,
    scorer: Arc<dyn Scorer>,
}

impl AdminService {
    pub fn new(store: ExamStore, scorer: Arc<dyn Scorer>) -> Self {
        Self { store, scorer }
    }

    pub async fn create_paper(&self, req: CreatePaperRequest) -> Result<QuestionPaper> {
        req.validate()?;
        let paper = QuestionPaper {
            id: Uuid::new_v4(),
            title: req.title,
            description: req.description,
            questions: req.questions,
            duration: req.duration,
            created_at: Utc::now(),
        };
        self.store.create_question_paper(paper.clone()).await;
        Ok(paper)
    }

    pub async fn update_paper(&self, paper: QuestionPaper) -> Result<()> {
        if self.store.get_paper(paper.id).await.is_none() {
            return Err(Error::NotFound(format!("Paper {}", paper.id)));
        }
        self.store.update_question_paper(paper).await;
        Ok(())
    }

    pub async fn list_papers(&self) -> Vec<QuestionPaper> {
        self.store.get_all_papers().await
    }

    pub async fn assign_exam(&self, req: AssignExamRequest) -> Result<ExamAssignment> {
        req.validate()?;
        if self.store.get_paper(req.paper_id).await.is_none() {
            return Err(Error::NotFound(format!("Paper {}", req.paper_id)));
        }
        Ok(self
            .store
            .assign_exam(&req.email, req.paper_id, &req.assigned_by)
            .await)
    }

    pub async fn list_assignments(&self) -> Vec<ExamAssignment> {
        self.store.get_all_assignments().await
    }

    pub async fn list_candidates(&self) -> Vec<CandidateOverview> {
        let candidates = self.store.get_all_candidates().await;
        let submissions = self.store.get_all_submissions().await;
        candidates
            .into_iter()
            .map(|candidate| {
                let submission = submissions
                    .iter()
                    .find(|s| s.candidate_id == candidate.id)
                    .cloned();
                CandidateOverview {
                    candidate,
                    submission,
                }
            })
            .collect()
    }

    pub async fn delete_candidate(&self, id: Uuid) {
        self.store.delete_candidate(id).await;
    }

    /// Re-runs automated scoring against a stored submission. Grades the
    /// questions the candidate actually saw (the snapshot), falling back to
    /// the live paper for records that predate snapshotting.
    pub async fn rerun_scoring(&self, candidate_id: Uuid) -> Result<EvaluationResult> {
        let submission = self
            .store
            .get_submission(candidate_id)
            .await
            .ok_or_else(|| Error::NotFound(format!("Submission for {}", candidate_id)))?;
        if !submission.is_finished() {
            return Err(Error::BadRequest(
                "Cannot grade an exam that is still in progress".to_string(),
            ));
        }

        let questions = if submission.questions_snapshot.is_empty() {
            self.store
                .get_paper(submission.paper_id)
                .await
                .ok_or_else(|| Error::NotFound(format!("Paper {}", submission.paper_id)))?
                .questions
        } else {
            submission.questions_snapshot.clone()
        };

        let evaluation = self.scorer.evaluate(&questions, &submission.answers).await?;
        self.store
            .save_evaluation(candidate_id, evaluation.clone())
            .await;
        Ok(evaluation)
    }
}
