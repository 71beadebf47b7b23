use chrono::Utc;
use pathfinder_assessment::models::candidate::Candidate;
use pathfinder_assessment::models::evaluation::{EvaluationResult, PassFail};
use pathfinder_assessment::models::paper::{CodeType, Question, QuestionPaper};
use pathfinder_assessment::models::submission::SubmissionStatus;
use pathfinder_assessment::storage::{ExamStore, FileMedium, RegistrationOutcome};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const TEST_IDENTITY: &str = "alex.tester@example.com";

fn sample_paper() -> QuestionPaper {
    QuestionPaper {
        id: Uuid::new_v4(),
        title: "Sample Paper".to_string(),
        description: "Store tests".to_string(),
        duration: 60,
        created_at: Utc::now(),
        questions: vec![Question {
            id: "q1".to_string(),
            section: "Section A".to_string(),
            title: "Q1".to_string(),
            text: "Explain.".to_string(),
            ideal_answer_key: "Key.".to_string(),
            code_type: CodeType::Text,
            marks: None,
        }],
    }
}

fn candidate(email: &str) -> Candidate {
    Candidate {
        id: Uuid::new_v4(),
        full_name: "Some Person".to_string(),
        email: email.to_string(),
        current_company: "Acme".to_string(),
        current_salary: "n/a".to_string(),
        notice_period: "30 days".to_string(),
        registered_at: Utc::now(),
        assigned_paper_id: None,
    }
}

fn evaluation(total: f64) -> EvaluationResult {
    EvaluationResult {
        total_score: total,
        max_score: 10.0,
        summary: "ok".to_string(),
        pass_fail: PassFail::Pass,
        question_evaluations: HashMap::new(),
    }
}

async fn store_with_assignment(email: &str) -> (ExamStore, QuestionPaper) {
    let store = ExamStore::in_memory();
    let paper = sample_paper();
    store.create_question_paper(paper.clone()).await;
    store.assign_exam(email, paper.id, "admin").await;
    (store, paper)
}

#[tokio::test]
async fn registration_requires_an_assignment() {
    let store = ExamStore::in_memory();
    match store.register_candidate(candidate("nobody@example.com")).await {
        RegistrationOutcome::Rejected { reason } => assert_eq!(reason, "no exam assigned"),
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn registration_resumes_while_in_progress_and_rejects_after_submit() {
    let (store, paper) = store_with_assignment("jane@example.com").await;

    let created = match store.register_candidate(candidate("jane@example.com")).await {
        RegistrationOutcome::Created(c) => c,
        other => panic!("expected created, got {:?}", other),
    };
    assert_eq!(created.assigned_paper_id, Some(paper.id));

    store.init_submission(created.id, paper.id).await;

    // Same email again, twice, while the attempt is open: same record back.
    for _ in 0..2 {
        match store.register_candidate(candidate("JANE@example.com")).await {
            RegistrationOutcome::Resumed(c) => assert_eq!(c.id, created.id),
            other => panic!("expected resumed, got {:?}", other),
        }
    }

    store.submit_exam(created.id).await;
    match store.register_candidate(candidate("jane@example.com")).await {
        RegistrationOutcome::Rejected { reason } => assert_eq!(reason, "already submitted"),
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_identity_may_always_start_a_fresh_attempt() {
    let (store, paper) = store_with_assignment(TEST_IDENTITY).await;

    let first = match store.register_candidate(candidate(TEST_IDENTITY)).await {
        RegistrationOutcome::Created(c) => c,
        other => panic!("expected created, got {:?}", other),
    };
    store.init_submission(first.id, paper.id).await;
    store.submit_exam(first.id).await;

    match store.register_candidate(candidate(TEST_IDENTITY)).await {
        RegistrationOutcome::Created(c) => assert_ne!(c.id, first.id),
        other => panic!("expected fresh attempt, got {:?}", other),
    }
}

#[tokio::test]
async fn init_submission_is_idempotent() {
    let (store, paper) = store_with_assignment("jane@example.com").await;
    let candidate_id = Uuid::new_v4();

    let first = store.init_submission(candidate_id, paper.id).await;
    assert_eq!(first.status, SubmissionStatus::InProgress);
    assert_eq!(first.questions_snapshot.len(), paper.questions.len());

    let mut answers = HashMap::new();
    answers.insert("q1".to_string(), "draft".to_string());
    store.save_draft(candidate_id, &answers, &[]).await;

    let second = store.init_submission(candidate_id, paper.id).await;
    assert_eq!(second.start_time, first.start_time);
    assert_eq!(second.answers.get("q1").map(String::as_str), Some("draft"));
}

#[tokio::test]
async fn status_only_moves_forward() {
    let (store, paper) = store_with_assignment("jane@example.com").await;
    let candidate_id = Uuid::new_v4();
    store.init_submission(candidate_id, paper.id).await;

    store.submit_exam(candidate_id).await;
    let submitted = store.get_submission(candidate_id).await.unwrap();
    assert_eq!(submitted.status, SubmissionStatus::Submitted);
    let end_time = submitted.end_time.unwrap();

    // A second submit must not bump the end time or regress anything.
    store.submit_exam(candidate_id).await;
    let again = store.get_submission(candidate_id).await.unwrap();
    assert_eq!(again.end_time.unwrap(), end_time);

    store.save_evaluation(candidate_id, evaluation(7.0)).await;
    let graded = store.get_submission(candidate_id).await.unwrap();
    assert_eq!(graded.status, SubmissionStatus::Graded);

    // Re-grading overwrites the evaluation but the status stays GRADED.
    store.save_evaluation(candidate_id, evaluation(3.0)).await;
    let regraded = store.get_submission(candidate_id).await.unwrap();
    assert_eq!(regraded.status, SubmissionStatus::Graded);
    assert_eq!(regraded.ai_evaluation.unwrap().total_score, 3.0);

    store.submit_exam(candidate_id).await;
    let still_graded = store.get_submission(candidate_id).await.unwrap();
    assert_eq!(still_graded.status, SubmissionStatus::Graded);
}

#[tokio::test]
async fn assigning_again_replaces_the_previous_assignment() {
    let (store, _paper) = store_with_assignment("jane@example.com").await;
    let second_paper = sample_paper();
    store.create_question_paper(second_paper.clone()).await;
    store
        .assign_exam("Jane@Example.com", second_paper.id, "admin")
        .await;

    let assignments = store.get_all_assignments().await;
    let janes: Vec<_> = assignments
        .iter()
        .filter(|a| a.email == "jane@example.com")
        .collect();
    assert_eq!(janes.len(), 1);
    assert_eq!(janes[0].paper_id, second_paper.id);
}

#[tokio::test]
async fn deleting_a_candidate_cascades() {
    let (store, paper) = store_with_assignment("jane@example.com").await;
    let created = match store.register_candidate(candidate("jane@example.com")).await {
        RegistrationOutcome::Created(c) => c,
        other => panic!("expected created, got {:?}", other),
    };
    store.init_submission(created.id, paper.id).await;

    store.delete_candidate(created.id).await;

    assert!(store.get_candidate(created.id).await.is_none());
    assert!(store.get_submission(created.id).await.is_none());
    assert!(store.get_all_assignments().await.is_empty());
}

#[tokio::test]
async fn file_backed_store_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let paper = sample_paper();

    {
        let store = ExamStore::new(Arc::new(FileMedium::new(dir.path())), TEST_IDENTITY)
            .with_latency_unit(Duration::ZERO);
        store.create_question_paper(paper.clone()).await;
        store.assign_exam("jane@example.com", paper.id, "admin").await;
    }

    let reopened = ExamStore::new(Arc::new(FileMedium::new(dir.path())), TEST_IDENTITY)
        .with_latency_unit(Duration::ZERO);
    let papers = reopened.get_all_papers().await;
    assert_eq!(papers.len(), 1);
    assert_eq!(papers[0].id, paper.id);
    assert_eq!(reopened.get_all_assignments().await.len(), 1);
}

#[tokio::test]
async fn editing_a_paper_does_not_disturb_existing_snapshots() {
    let (store, paper) = store_with_assignment("jane@example.com").await;
    let candidate_id = Uuid::new_v4();
    let submission = store.init_submission(candidate_id, paper.id).await;
    assert_eq!(submission.questions_snapshot[0].text, "Explain.");

    let mut edited = paper.clone();
    edited.questions[0].text = "A totally different question.".to_string();
    store.update_question_paper(edited).await;

    let resumed = store.init_submission(candidate_id, paper.id).await;
    assert_eq!(resumed.questions_snapshot[0].text, "Explain.");
}
