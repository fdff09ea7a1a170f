use anyhow::{Context, Result};

/// Runtime configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub genai_url: String,
    pub genai_model: String,
    pub genai_temperature: f32,
    pub genai_timeout_secs: u64,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            genai_url: require_env("GENAI_URL")?,
            genai_model: std::env::var("GENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            genai_temperature: std::env::var("GENAI_TEMPERATURE")
                .unwrap_or_else(|_| "0.5".to_string())
                .parse::<f32>()
                .context("GENAI_TEMPERATURE must be a number")?,
            genai_timeout_secs: std::env::var("GENAI_TIMEOUT_SECS")
                .unwrap_or_else(|_| "120".to_string())
                .parse::<u64>()
                .context("GENAI_TIMEOUT_SECS must be a whole number of seconds")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
