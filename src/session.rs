use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::evaluation::EvaluationResult;
use crate::models::paper::Question;
use crate::models::submission::ProctorLog;
use crate::proctor::{ProctorMonitor, ProctorSignalBus};
use crate::services::scoring_service::{self, Scorer};
use crate::storage::ExamStore;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use uuid::Uuid;

/// Lifecycle of one exam session. Forward-only; ACTIVE is the only phase
/// in which the timer, autosave and proctoring run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Loading,
    Active,
    Submitting,
    Finished,
}

/// Last known fate of the background draft persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Saved,
    Saving,
    Error,
}

/// Point-in-time view of the session for the embedding UI.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub remaining_seconds: i64,
    pub save_status: SaveStatus,
    pub violation_count: usize,
    pub answered_count: usize,
    pub total_questions: usize,
    /// Present once FINISHED: the stored evaluation, or the zero-score
    /// fallback when scoring degraded.
    pub evaluation: Option<EvaluationResult>,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub autosave_interval: Duration,
    pub timer_tick: Duration,
    pub scoring_timeout: Duration,
    pub test_identity_email: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            autosave_interval: Duration::from_secs(5),
            timer_tick: Duration::from_secs(1),
            scoring_timeout: Duration::from_secs(60),
            test_identity_email: "alex.tester@example.com".to_string(),
        }
    }
}

impl From<&Config> for SessionConfig {
    fn from(config: &Config) -> Self {
        Self {
            autosave_interval: config.autosave_interval,
            timer_tick: config.timer_tick,
            scoring_timeout: config.scoring_timeout,
            test_identity_email: config.test_identity_email.clone(),
        }
    }
}

enum SessionMsg {
    Answer { question_id: String, text: String },
    Violation(ProctorLog),
    Submit,
    Snapshot(oneshot::Sender<SessionSnapshot>),
    SaveFinished(bool),
    Close,
}

/// Caller-side handle to a running session. Dropping it closes the session
/// (browser-unmount equivalent); the submission stays IN_PROGRESS for a
/// later resume unless submit ran first.
#[derive(Debug)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<SessionMsg>,
    phase_rx: watch::Receiver<SessionPhase>,
}

impl SessionHandle {
    /// Synchronous, in-memory edit of one answer. Persisted by the next
    /// autosave tick, never blocked by a save in flight.
    pub fn answer(&self, question_id: impl Into<String>, text: impl Into<String>) {
        let _ = self.tx.send(SessionMsg::Answer {
            question_id: question_id.into(),
            text: text.into(),
        });
    }

    pub fn submit(&self) {
        let _ = self.tx.send(SessionMsg::Submit);
    }

    /// Tears the session down without submitting.
    pub fn close(&self) {
        let _ = self.tx.send(SessionMsg::Close);
    }

    pub fn phase(&self) -> SessionPhase {
        *self.phase_rx.borrow()
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(SessionMsg::Snapshot(tx))
            .map_err(|_| Error::BadRequest("Session is closed".to_string()))?;
        rx.await
            .map_err(|_| Error::BadRequest("Session is closed".to_string()))
    }

    /// Resolves once the session reaches FINISHED. The session keeps
    /// serving snapshots afterwards, until the handle is dropped.
    pub async fn wait_finished(&mut self) {
        while *self.phase_rx.borrow() != SessionPhase::Finished {
            if self.phase_rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        let _ = self.tx.send(SessionMsg::Close);
    }
}

/// Loads the candidate's assigned paper, initializes or resumes the
/// submission, activates proctoring and spawns the session actor.
///
/// Fails fast when the candidate is unknown, has no assignment, the paper
/// id dangles, or the attempt already finished; nothing is spawned then.
pub async fn start(
    store: ExamStore,
    scorer: Arc<dyn Scorer>,
    bus: &ProctorSignalBus,
    candidate_id: Uuid,
    config: SessionConfig,
) -> Result<SessionHandle> {
    let (phase_tx, phase_rx) = watch::channel(SessionPhase::Loading);

    let candidate = store
        .get_candidate(candidate_id)
        .await
        .ok_or_else(|| Error::NotFound(format!("Candidate {}", candidate_id)))?;
    let paper_id = candidate
        .assigned_paper_id
        .ok_or_else(|| Error::Config("No exam paper assigned".to_string()))?;
    let paper = store
        .get_paper(paper_id)
        .await
        .ok_or_else(|| Error::Config("Assigned exam paper not found".to_string()))?;

    let submission = store.init_submission(candidate_id, paper_id).await;
    if submission.is_finished() {
        return Err(Error::BadRequest("Exam already submitted".to_string()));
    }

    // The candidate answers against the questions as they stood at start,
    // even if an administrator edits the paper mid-flight.
    let questions = if submission.questions_snapshot.is_empty() {
        paper.questions.clone()
    } else {
        submission.questions_snapshot.clone()
    };

    let mut answers = submission.answers.clone();
    if answers.is_empty() && candidate.email.eq_ignore_ascii_case(&config.test_identity_email) {
        // Manual-testing shortcut for the designated identity only: start
        // from the ideal answers so a full pass can be exercised quickly.
        for question in &questions {
            answers.insert(question.id.clone(), question.ideal_answer_key.clone());
        }
        tracing::debug!(%candidate_id, "Pre-filled ideal answers for test identity");
    }

    let elapsed = (Utc::now() - submission.start_time).num_seconds().max(0);
    let remaining_seconds = (paper.duration_seconds() - elapsed).max(0);

    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let monitor = ProctorMonitor::activate(bus, {
        let tx = cmd_tx.clone();
        move |log| {
            let _ = tx.send(SessionMsg::Violation(log));
        }
    });

    let actor = SessionActor {
        store,
        scorer,
        config,
        candidate_id,
        questions,
        answers,
        proctor_logs: submission.proctor_logs,
        remaining_seconds,
        save_status: SaveStatus::Saved,
        phase: SessionPhase::Loading,
        evaluation: None,
        phase_tx,
        cmd_tx: cmd_tx.clone(),
        monitor: Some(monitor),
    };
    tokio::spawn(actor.run(cmd_rx));

    Ok(SessionHandle {
        tx: cmd_tx,
        phase_rx,
    })
}

struct SessionActor {
    store: ExamStore,
    scorer: Arc<dyn Scorer>,
    config: SessionConfig,
    candidate_id: Uuid,
    questions: Vec<Question>,
    answers: HashMap<String, String>,
    proctor_logs: Vec<ProctorLog>,
    remaining_seconds: i64,
    save_status: SaveStatus,
    phase: SessionPhase,
    evaluation: Option<EvaluationResult>,
    phase_tx: watch::Sender<SessionPhase>,
    cmd_tx: mpsc::UnboundedSender<SessionMsg>,
    monitor: Option<ProctorMonitor>,
}

impl SessionActor {
    async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<SessionMsg>) {
        let mut timer = tokio::time::interval(self.config.timer_tick);
        let mut autosave = tokio::time::interval(self.config.autosave_interval);
        // Both intervals complete an immediate first tick; consume it so
        // the first real tick lands one full period in.
        timer.tick().await;
        autosave.tick().await;

        self.set_phase(SessionPhase::Active);
        tracing::info!(
            candidate_id = %self.candidate_id,
            remaining_seconds = self.remaining_seconds,
            "Exam session active"
        );

        if self.remaining_seconds == 0 {
            tracing::warn!(candidate_id = %self.candidate_id, "Time already expired on load");
            self.finalize().await;
        }

        loop {
            tokio::select! {
                maybe = cmd_rx.recv() => match maybe {
                    Some(SessionMsg::Answer { question_id, text })
                        if self.phase == SessionPhase::Active =>
                    {
                        self.answers.insert(question_id, text);
                    }
                    Some(SessionMsg::Violation(log)) if self.phase == SessionPhase::Active => {
                        self.proctor_logs.push(log);
                    }
                    Some(SessionMsg::Submit) => self.finalize().await,
                    Some(SessionMsg::Snapshot(reply)) => {
                        let _ = reply.send(self.snapshot());
                    }
                    Some(SessionMsg::SaveFinished(ok)) => {
                        if self.phase == SessionPhase::Active {
                            self.save_status = if ok { SaveStatus::Saved } else { SaveStatus::Error };
                        }
                    }
                    Some(SessionMsg::Close) | None => {
                        self.teardown();
                        break;
                    }
                    // Late edits or violations after ACTIVE are dropped.
                    Some(_) => {}
                },
                _ = timer.tick(), if self.phase == SessionPhase::Active => {
                    self.remaining_seconds = (self.remaining_seconds - 1).max(0);
                    if self.remaining_seconds == 0 {
                        tracing::warn!(candidate_id = %self.candidate_id, "Time expired, auto-submitting");
                        self.finalize().await;
                    }
                },
                _ = autosave.tick(), if self.phase == SessionPhase::Active => {
                    self.spawn_autosave();
                },
            }
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            remaining_seconds: self.remaining_seconds,
            save_status: self.save_status,
            violation_count: self.proctor_logs.len(),
            answered_count: self.answers.len(),
            total_questions: self.questions.len(),
            evaluation: self.evaluation.clone(),
        }
    }

    fn set_phase(&mut self, phase: SessionPhase) {
        self.phase = phase;
        let _ = self.phase_tx.send(phase);
    }

    /// Periodic draft persist, fired-and-forgotten so a slow write never
    /// blocks answer intake. Last writer wins.
    fn spawn_autosave(&mut self) {
        if self.answers.is_empty() {
            return;
        }
        self.save_status = SaveStatus::Saving;
        let store = self.store.clone();
        let candidate_id = self.candidate_id;
        let answers = self.answers.clone();
        let logs = self.proctor_logs.clone();
        let tx = self.cmd_tx.clone();
        tokio::spawn(async move {
            let ok = store.save_draft(candidate_id, &answers, &logs).await;
            let _ = tx.send(SessionMsg::SaveFinished(ok));
        });
    }

    /// The submit sequence. Idempotent-guarded; every step is individually
    /// tolerated so FINISHED is reached no matter what degrades.
    async fn finalize(&mut self) {
        if self.phase != SessionPhase::Active {
            return;
        }
        self.set_phase(SessionPhase::Submitting);
        if let Some(monitor) = self.monitor.take() {
            monitor.deactivate();
        }

        self.save_status = SaveStatus::Saving;
        let ok = self
            .store
            .save_draft(self.candidate_id, &self.answers, &self.proctor_logs)
            .await;
        self.save_status = if ok { SaveStatus::Saved } else { SaveStatus::Error };

        self.store.submit_exam(self.candidate_id).await;

        // The scoring call runs on its own task: the bound below abandons
        // it rather than cancelling, and a late result is simply discarded.
        let scorer = Arc::clone(&self.scorer);
        let questions = self.questions.clone();
        let answers = self.answers.clone();
        let scoring =
            tokio::spawn(async move { scorer.evaluate(&questions, &answers).await });

        match tokio::time::timeout(self.config.scoring_timeout, scoring).await {
            Ok(Ok(Ok(evaluation))) => {
                self.store
                    .save_evaluation(self.candidate_id, evaluation.clone())
                    .await;
                self.evaluation = Some(evaluation);
            }
            Ok(Ok(Err(e))) => {
                tracing::error!(candidate_id = %self.candidate_id, error = %e,
                    "Automated scoring failed, submission left for manual grading");
                self.evaluation = Some(scoring_service::fallback_result(
                    &self.questions,
                    "Automated scoring failed; the submission remains gradable.",
                ));
            }
            Ok(Err(e)) => {
                tracing::error!(candidate_id = %self.candidate_id, error = %e,
                    "Scoring task aborted, submission left for manual grading");
                self.evaluation = Some(scoring_service::fallback_result(
                    &self.questions,
                    "Automated scoring failed; the submission remains gradable.",
                ));
            }
            Err(_) => {
                let timeout = Error::ScoringTimeout(self.config.scoring_timeout.as_secs());
                tracing::error!(candidate_id = %self.candidate_id, error = %timeout,
                    "Submission left for manual grading");
                self.evaluation = Some(scoring_service::fallback_result(
                    &self.questions,
                    "Automated scoring timed out; the submission remains gradable.",
                ));
            }
        }

        self.set_phase(SessionPhase::Finished);
        tracing::info!(candidate_id = %self.candidate_id, "Exam session finished");
    }

    fn teardown(&mut self) {
        if let Some(monitor) = self.monitor.take() {
            monitor.deactivate();
        }
        tracing::debug!(candidate_id = %self.candidate_id, phase = ?self.phase, "Session torn down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::candidate::Candidate;
    use crate::models::evaluation::{PassFail, QuestionEvaluation};
    use crate::models::paper::{CodeType, QuestionPaper};
    use crate::models::submission::{ExamSubmission, SubmissionStatus};
    use crate::storage::RegistrationOutcome;
    use async_trait::async_trait;

    const TEST_IDENTITY: &str = "alex.tester@example.com";

    struct OkScorer;

    #[async_trait]
    impl Scorer for OkScorer {
        async fn evaluate(
            &self,
            questions: &[Question],
            _answers: &HashMap<String, String>,
        ) -> crate::error::Result<EvaluationResult> {
            let per_question: HashMap<String, QuestionEvaluation> = questions
                .iter()
                .map(|q| {
                    (
                        q.id.clone(),
                        QuestionEvaluation {
                            score: 8.0,
                            feedback: "Solid".to_string(),
                        },
                    )
                })
                .collect();
            Ok(EvaluationResult {
                total_score: per_question.values().map(|e| e.score).sum(),
                max_score: scoring_service::max_score(questions),
                summary: "Strong showing".to_string(),
                pass_fail: PassFail::Pass,
                question_evaluations: per_question,
            })
        }
    }

    struct FailScorer;

    #[async_trait]
    impl Scorer for FailScorer {
        async fn evaluate(
            &self,
            _questions: &[Question],
            _answers: &HashMap<String, String>,
        ) -> crate::error::Result<EvaluationResult> {
            Err(Error::Scoring("model unavailable".to_string()))
        }
    }

    /// Never completes within any test-sized bound.
    struct StuckScorer;

    #[async_trait]
    impl Scorer for StuckScorer {
        async fn evaluate(
            &self,
            _questions: &[Question],
            _answers: &HashMap<String, String>,
        ) -> crate::error::Result<EvaluationResult> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(Error::Scoring("unreachable".to_string()))
        }
    }

    fn paper(duration_minutes: u32) -> QuestionPaper {
        QuestionPaper {
            id: Uuid::new_v4(),
            title: "Test Paper".to_string(),
            description: "For unit tests".to_string(),
            duration: duration_minutes,
            created_at: Utc::now(),
            questions: vec![
                Question {
                    id: "q1".to_string(),
                    section: "Section A".to_string(),
                    title: "Q1".to_string(),
                    text: "Explain state vs props.".to_string(),
                    ideal_answer_key: "State is internal, props flow in.".to_string(),
                    code_type: CodeType::Text,
                    marks: None,
                },
                Question {
                    id: "q2".to_string(),
                    section: "Section A".to_string(),
                    title: "Q2".to_string(),
                    text: "What is the virtual DOM?".to_string(),
                    ideal_answer_key: "Diffed lightweight DOM copy.".to_string(),
                    code_type: CodeType::Text,
                    marks: None,
                },
            ],
        }
    }

    fn fast_config() -> SessionConfig {
        SessionConfig {
            autosave_interval: Duration::from_millis(40),
            timer_tick: Duration::from_millis(20),
            scoring_timeout: Duration::from_millis(100),
            test_identity_email: TEST_IDENTITY.to_string(),
        }
    }

    /// Registers a candidate against a fresh store with one paper assigned.
    async fn seeded_candidate(store: &ExamStore, email: &str) -> (Uuid, QuestionPaper) {
        let paper = paper(60);
        store.create_question_paper(paper.clone()).await;
        store.assign_exam(email, paper.id, "admin").await;
        let candidate = Candidate {
            id: Uuid::new_v4(),
            full_name: "Test Candidate".to_string(),
            email: email.to_string(),
            current_company: String::new(),
            current_salary: String::new(),
            notice_period: String::new(),
            registered_at: Utc::now(),
            assigned_paper_id: None,
        };
        match store.register_candidate(candidate).await {
            RegistrationOutcome::Created(c) => (c.id, paper),
            other => panic!("unexpected registration outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn start_fails_fast_without_assignment() {
        let store = ExamStore::in_memory();
        let bus = ProctorSignalBus::new();
        let err = start(
            store,
            Arc::new(OkScorer),
            &bus,
            Uuid::new_v4(),
            fast_config(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn start_fails_fast_when_paper_is_missing() {
        let store = ExamStore::in_memory();
        let bus = ProctorSignalBus::new();
        let (candidate_id, _paper) = seeded_candidate(&store, "cand@example.com").await;
        // Simulate a dangling assignment by pointing it at a dead paper id,
        // then re-register to pick it up.
        store
            .assign_exam("cand@example.com", Uuid::new_v4(), "admin")
            .await;
        let candidate = store.get_candidate(candidate_id).await.unwrap();
        let refreshed = match store.register_candidate(candidate).await {
            RegistrationOutcome::Resumed(c) => c,
            other => panic!("unexpected outcome: {:?}", other),
        };

        let err = start(
            store,
            Arc::new(OkScorer),
            &bus,
            refreshed.id,
            fast_config(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn autosave_round_trips_answers_and_violations_in_order() {
        let store = ExamStore::in_memory();
        let bus = ProctorSignalBus::new();
        let (candidate_id, _) = seeded_candidate(&store, "cand@example.com").await;

        let handle = start(
            store.clone(),
            Arc::new(OkScorer),
            &bus,
            candidate_id,
            fast_config(),
        )
        .await
        .unwrap();

        handle.answer("q1", "first draft");
        handle.answer("q2", "second answer");
        handle.answer("q1", "revised draft");
        bus.emit(crate::proctor::ProctorSignal::VisibilityHidden);
        bus.emit(crate::proctor::ProctorSignal::Copy);

        // Let at least one autosave tick land.
        tokio::time::sleep(Duration::from_millis(120)).await;

        let stored = store.get_submission(candidate_id).await.unwrap();
        assert_eq!(stored.status, SubmissionStatus::InProgress);
        assert_eq!(stored.answers["q1"], "revised draft");
        assert_eq!(stored.answers["q2"], "second answer");
        assert_eq!(stored.proctor_logs.len(), 2);
        assert_eq!(
            stored.proctor_logs[0].kind,
            crate::models::submission::ProctorEventType::TabSwitch
        );
        assert_eq!(
            stored.proctor_logs[1].kind,
            crate::models::submission::ProctorEventType::CopyAttempt
        );

        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.violation_count, 2);
        assert_eq!(snap.answered_count, 2);
    }

    #[tokio::test]
    async fn resume_adopts_stored_answers_verbatim() {
        let store = ExamStore::in_memory();
        let bus = ProctorSignalBus::new();
        let (candidate_id, _) = seeded_candidate(&store, "cand@example.com").await;

        {
            let handle = start(
                store.clone(),
                Arc::new(OkScorer),
                &bus,
                candidate_id,
                fast_config(),
            )
            .await
            .unwrap();
            handle.answer("q1", "keep me");
            tokio::time::sleep(Duration::from_millis(120)).await;
            handle.close();
        }

        let handle = start(
            store.clone(),
            Arc::new(OkScorer),
            &bus,
            candidate_id,
            fast_config(),
        )
        .await
        .unwrap();
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.answered_count, 1);

        handle.submit();
        let mut handle = handle;
        handle.wait_finished().await;
        let stored = store.get_submission(candidate_id).await.unwrap();
        assert_eq!(stored.answers["q1"], "keep me");
    }

    #[tokio::test]
    async fn test_identity_is_prefilled_and_others_are_not() {
        let store = ExamStore::in_memory();
        let bus = ProctorSignalBus::new();

        let (tester_id, paper) = seeded_candidate(&store, TEST_IDENTITY).await;
        let handle = start(
            store.clone(),
            Arc::new(OkScorer),
            &bus,
            tester_id,
            fast_config(),
        )
        .await
        .unwrap();
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.answered_count, paper.questions.len());
        drop(handle);

        let (other_id, _) = seeded_candidate(&store, "regular@example.com").await;
        let handle = start(
            store.clone(),
            Arc::new(OkScorer),
            &bus,
            other_id,
            fast_config(),
        )
        .await
        .unwrap();
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.answered_count, 0);
    }

    #[tokio::test]
    async fn manual_submit_grades_and_finishes() {
        let store = ExamStore::in_memory();
        let bus = ProctorSignalBus::new();
        let (candidate_id, _) = seeded_candidate(&store, "cand@example.com").await;

        let mut handle = start(
            store.clone(),
            Arc::new(OkScorer),
            &bus,
            candidate_id,
            fast_config(),
        )
        .await
        .unwrap();
        handle.answer("q1", "an answer");
        handle.submit();
        handle.wait_finished().await;

        let stored = store.get_submission(candidate_id).await.unwrap();
        assert_eq!(stored.status, SubmissionStatus::Graded);
        assert!(stored.end_time.is_some());
        let evaluation = stored.ai_evaluation.unwrap();
        assert_eq!(evaluation.total_score, 16.0);
        assert_eq!(evaluation.pass_fail, PassFail::Pass);

        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.phase, SessionPhase::Finished);
        assert!(snap.evaluation.is_some());
    }

    #[tokio::test]
    async fn expired_timer_on_load_submits_without_user_action() {
        let store = ExamStore::in_memory();
        let bus = ProctorSignalBus::new();
        let (candidate_id, paper) = seeded_candidate(&store, "cand@example.com").await;

        // One-minute paper whose attempt started 61 seconds ago.
        let mut one_minute = paper.clone();
        one_minute.duration = 1;
        store.update_question_paper(one_minute.clone()).await;
        let mut submission =
            ExamSubmission::new(candidate_id, one_minute.id, one_minute.questions.clone());
        submission.start_time = Utc::now() - chrono::Duration::seconds(61);
        store.put_submission(submission).await;

        let mut handle = start(
            store.clone(),
            Arc::new(OkScorer),
            &bus,
            candidate_id,
            fast_config(),
        )
        .await
        .unwrap();
        handle.wait_finished().await;

        let stored = store.get_submission(candidate_id).await.unwrap();
        assert!(stored.is_finished());
        assert!(stored.end_time.is_some());
    }

    #[tokio::test]
    async fn scoring_failure_leaves_submission_submitted_with_fallback_for_caller() {
        let store = ExamStore::in_memory();
        let bus = ProctorSignalBus::new();
        let (candidate_id, _) = seeded_candidate(&store, "cand@example.com").await;

        let mut handle = start(
            store.clone(),
            Arc::new(FailScorer),
            &bus,
            candidate_id,
            fast_config(),
        )
        .await
        .unwrap();
        handle.answer("q1", "an answer");
        handle.submit();
        handle.wait_finished().await;

        let stored = store.get_submission(candidate_id).await.unwrap();
        assert_eq!(stored.status, SubmissionStatus::Submitted);
        assert!(stored.ai_evaluation.is_none());

        let snap = handle.snapshot().await.unwrap();
        let fallback = snap.evaluation.unwrap();
        assert_eq!(fallback.total_score, 0.0);
        assert_eq!(fallback.pass_fail, PassFail::Fail);
    }

    #[tokio::test]
    async fn scoring_timeout_is_bounded_and_leaves_submission_submitted() {
        let store = ExamStore::in_memory();
        let bus = ProctorSignalBus::new();
        let (candidate_id, _) = seeded_candidate(&store, "cand@example.com").await;

        let started = std::time::Instant::now();
        let mut handle = start(
            store.clone(),
            Arc::new(StuckScorer),
            &bus,
            candidate_id,
            fast_config(),
        )
        .await
        .unwrap();
        handle.answer("q1", "an answer");
        handle.submit();
        handle.wait_finished().await;
        assert!(started.elapsed() < Duration::from_secs(5));

        let stored = store.get_submission(candidate_id).await.unwrap();
        assert_eq!(stored.status, SubmissionStatus::Submitted);
        assert!(stored.ai_evaluation.is_none());
    }

    #[tokio::test]
    async fn submit_is_idempotent_and_end_time_is_stamped_once() {
        let store = ExamStore::in_memory();
        let bus = ProctorSignalBus::new();
        let (candidate_id, _) = seeded_candidate(&store, "cand@example.com").await;

        let mut handle = start(
            store.clone(),
            Arc::new(OkScorer),
            &bus,
            candidate_id,
            fast_config(),
        )
        .await
        .unwrap();
        handle.submit();
        handle.submit();
        handle.wait_finished().await;

        let first = store.get_submission(candidate_id).await.unwrap();
        let end_time = first.end_time.unwrap();

        // A second submit after FINISHED must not disturb the record.
        handle.submit();
        tokio::time::sleep(Duration::from_millis(50)).await;
        let second = store.get_submission(candidate_id).await.unwrap();
        assert_eq!(second.end_time.unwrap(), end_time);
        assert_eq!(second.status, SubmissionStatus::Graded);
    }

    #[tokio::test]
    async fn violations_stop_once_submitting_begins() {
        let store = ExamStore::in_memory();
        let bus = ProctorSignalBus::new();
        let (candidate_id, _) = seeded_candidate(&store, "cand@example.com").await;

        let mut handle = start(
            store.clone(),
            Arc::new(OkScorer),
            &bus,
            candidate_id,
            fast_config(),
        )
        .await
        .unwrap();
        handle.answer("q1", "an answer");
        bus.emit(crate::proctor::ProctorSignal::WindowBlur);
        tokio::time::sleep(Duration::from_millis(30)).await;
        handle.submit();
        handle.wait_finished().await;

        bus.emit(crate::proctor::ProctorSignal::WindowBlur);
        bus.emit(crate::proctor::ProctorSignal::WindowBlur);
        tokio::time::sleep(Duration::from_millis(30)).await;

        let stored = store.get_submission(candidate_id).await.unwrap();
        assert_eq!(stored.proctor_logs.len(), 1);
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.violation_count, 1);
    }
}
