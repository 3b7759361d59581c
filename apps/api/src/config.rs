use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub groq_api_key: String,
    pub groq_base_url: String,
    pub groq_model: String,
    pub groq_max_tokens: u32,
    pub groq_temperature: f32,
    pub free_tier_daily_limit: u32,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            groq_api_key: require_env("GROQ_API_KEY")?,
            groq_base_url: std::env::var("GROQ_BASE_URL")
                .unwrap_or_else(|_| "https://api.groq.com/openai/v1".to_string()),
            groq_model: std::env::var("GROQ_MODEL")
                .unwrap_or_else(|_| "llama-3.3-70b-versatile".to_string()),
            groq_max_tokens: parse_env("GROQ_MAX_TOKENS", 2048)?,
            groq_temperature: std::env::var("GROQ_TEMPERATURE")
                .unwrap_or_else(|_| "0.8".to_string())
                .parse::<f32>()
                .context("GROQ_TEMPERATURE must be a valid float")?,
            free_tier_daily_limit: parse_env("FREE_TIER_DAILY_LIMIT", 10)?,
            port: parse_env("PORT", 8080)? as u16,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env(key: &str, default: u32) -> Result<u32> {
    match std::env::var(key) {
        Ok(value) => value
            .parse::<u32>()
            .with_context(|| format!("{key} must be a non-negative integer")),
        Err(_) => Ok(default),
    }
}
