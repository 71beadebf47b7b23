use anyhow::Context;
use pathfinder_assessment::config::Config;
use pathfinder_assessment::dto::registration_dto::RegisterRequest;
use pathfinder_assessment::proctor::ProctorSignal;
use pathfinder_assessment::storage::{FileMedium, RegistrationOutcome};
use pathfinder_assessment::AppState;
use std::sync::Arc;
use tracing::info;

/// Headless smoke run of the whole exam lifecycle against the file-backed
/// store: bootstrap, assign, register the test identity, run one session
/// and submit it. Without SCORING_API_KEY the scoring step degrades and the
/// submission stays gradable from the admin side.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    let medium = Arc::new(FileMedium::new(&config.data_dir));
    let state = AppState::new(&config, medium);

    state.store.bootstrap().await;
    let paper = state
        .admin_service
        .list_papers()
        .await
        .into_iter()
        .next()
        .context("no question paper available after bootstrap")?;
    info!(paper = %paper.title, duration_minutes = paper.duration, "Using paper");

    state
        .store
        .assign_exam(&config.test_identity_email, paper.id, "smoke-run")
        .await;

    let outcome = state
        .registration_service
        .register(RegisterRequest {
            full_name: "Alex Tester".to_string(),
            email: config.test_identity_email.clone(),
            current_company: "Example Corp".to_string(),
            current_salary: "n/a".to_string(),
            notice_period: "immediate".to_string(),
        })
        .await?;
    let candidate = match outcome {
        RegistrationOutcome::Created(c) | RegistrationOutcome::Resumed(c) => c,
        RegistrationOutcome::Rejected { reason } => anyhow::bail!("registration rejected: {}", reason),
    };
    info!(candidate_id = %candidate.id, email = %candidate.email, "Registered");

    let mut session = state.start_session(candidate.id).await?;

    // Exercise the proctoring path the way a wandering candidate would.
    state.proctor_bus.emit(ProctorSignal::VisibilityHidden);
    state.proctor_bus.emit(ProctorSignal::Copy);

    let snapshot = session.snapshot().await?;
    info!(
        answered = snapshot.answered_count,
        total = snapshot.total_questions,
        remaining_seconds = snapshot.remaining_seconds,
        "Session active"
    );

    session.submit();
    session.wait_finished().await;

    let submission = state
        .store
        .get_submission(candidate.id)
        .await
        .context("submission vanished")?;
    info!(
        status = ?submission.status,
        violations = submission.proctor_logs.len(),
        "Session complete"
    );
    if let Some(evaluation) = submission.ai_evaluation {
        info!(
            total = evaluation.total_score,
            max = evaluation.max_score,
            verdict = ?evaluation.pass_fail,
            summary = %evaluation.summary,
            "Evaluation"
        );
    } else {
        info!("No evaluation stored; grade manually from the admin side");
    }

    Ok(())
}
