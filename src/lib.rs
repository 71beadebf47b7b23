pub mod config;
pub mod dto;
pub mod error;
pub mod models;
pub mod proctor;
pub mod services;
pub mod session;
pub mod storage;

use crate::config::Config;
use crate::error::Result;
use crate::proctor::ProctorSignalBus;
use crate::services::admin_service::AdminService;
use crate::services::registration_service::RegistrationService;
use crate::services::scoring_service::{EvaluationService, Scorer};
use crate::session::{SessionConfig, SessionHandle};
use crate::storage::{ExamStore, StorageMedium};
use reqwest::Client;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub store: ExamStore,
    pub registration_service: RegistrationService,
    pub admin_service: AdminService,
    pub scorer: Arc<dyn Scorer>,
    pub proctor_bus: ProctorSignalBus,
    pub session_config: SessionConfig,
}

impl AppState {
    pub fn new(config: &Config, medium: Arc<dyn StorageMedium>) -> Self {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap();

        let store = ExamStore::new(medium, config.test_identity_email.clone());
        let scorer: Arc<dyn Scorer> = Arc::new(EvaluationService::new(config, http_client));
        let registration_service = RegistrationService::new(store.clone());
        let admin_service = AdminService::new(store.clone(), Arc::clone(&scorer));

        Self {
            store,
            registration_service,
            admin_service,
            scorer,
            proctor_bus: ProctorSignalBus::new(),
            session_config: SessionConfig::from(config),
        }
    }

    /// Opens an exam session for a registered candidate.
    pub async fn start_session(&self, candidate_id: Uuid) -> Result<SessionHandle> {
        session::start(
            self.store.clone(),
            Arc::clone(&self.scorer),
            &self.proctor_bus,
            candidate_id,
            self.session_config.clone(),
        )
        .await
    }
}
