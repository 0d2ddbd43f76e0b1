use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_FILE_BASE_URL: &str = "https://pmsdemo.topiatech.co.uk/VacancyPDFs/";
const DEFAULT_SKILL_PATTERNS_PATH: &str = "jz_skill_patterns.jsonl";

/// Application configuration loaded from environment variables.
/// Every variable has a default, so a bare `cargo run` serves on localhost:5000.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Prefix that incoming `file_url` references are appended to.
    pub file_base_url: String,
    pub skill_patterns_path: String,
    pub fetch_timeout: Duration,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            host: env_or("HOST", "127.0.0.1"),
            port: env_or("PORT", "5000")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            file_base_url: env_or("FILE_BASE_URL", DEFAULT_FILE_BASE_URL),
            skill_patterns_path: env_or("SKILL_PATTERNS_PATH", DEFAULT_SKILL_PATTERNS_PATH),
            fetch_timeout: Duration::from_secs(
                env_or("FETCH_TIMEOUT_SECS", "30")
                    .parse::<u64>()
                    .context("FETCH_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
