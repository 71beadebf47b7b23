use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Runtime configuration, loaded once from the environment and passed
/// explicitly to whatever needs it. Nothing in the crate reads env vars
/// after startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub scoring_api_url: String,
    pub scoring_api_key: String,
    pub scoring_model: String,
    /// Bound on a single scoring pass during submission.
    pub scoring_timeout: Duration,
    /// Period of the background draft persist while an exam is active.
    pub autosave_interval: Duration,
    /// Period of the countdown tick.
    pub timer_tick: Duration,
    /// Email of the always-allowed identity used for manual testing.
    pub test_identity_email: String,
    /// Directory for the file-backed store used by the binary.
    pub data_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            scoring_api_url: get_env_or(
                "SCORING_API_URL",
                "https://api.openai.com/v1/chat/completions",
            ),
            // May be empty; scoring then degrades to the fallback path.
            scoring_api_key: get_env_or("SCORING_API_KEY", ""),
            scoring_model: get_env_or("SCORING_MODEL", "gpt-4o"),
            scoring_timeout: Duration::from_secs(get_env_parse_or("SCORING_TIMEOUT_SECS", 60)?),
            autosave_interval: Duration::from_millis(get_env_parse_or(
                "AUTOSAVE_INTERVAL_MS",
                5_000,
            )?),
            timer_tick: Duration::from_millis(get_env_parse_or("TIMER_TICK_MS", 1_000)?),
            test_identity_email: get_env_or("TEST_IDENTITY_EMAIL", "alex.tester@example.com"),
            data_dir: get_env_or("DATA_DIR", "./data"),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scoring_api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            scoring_api_key: String::new(),
            scoring_model: "gpt-4o".to_string(),
            scoring_timeout: Duration::from_secs(60),
            autosave_interval: Duration::from_secs(5),
            timer_tick: Duration::from_secs(1),
            test_identity_email: "alex.tester@example.com".to_string(),
            data_dir: "./data".to_string(),
        }
    }
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}
