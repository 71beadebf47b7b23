pub mod admin_service;
pub mod registration_service;
pub mod scoring_service;
