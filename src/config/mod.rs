// src/config/mod.rs
// All tunables load from the environment (.env supported), with defaults.

use once_cell::sync::Lazy;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct OnboardConfig {
    // ── Server
    pub host: String,
    pub port: u16,
    pub cors_origin: String,

    // ── Database
    pub database_url: String,
    pub sqlite_max_connections: u32,

    // ── Completion API
    pub llm_base_url: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub llm_timeout_secs: u64,
    pub llm_max_tokens: u32,

    // ── Auth boundary
    pub token_secret: String,

    // ── Rate limiting (requests per window)
    pub rate_limit_chat: u32,
    pub rate_limit_window_secs: u64,

    // ── API defaults
    pub history_default_limit: usize,
    pub history_max_limit: usize,

    // ── Logging
    pub log_level: String,
}

/// Parse an environment variable, falling back to a default on absence or
/// parse failure. Values may carry trailing comments in .env files.
fn env_var_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(val) => {
            let clean = val.split('#').next().unwrap_or("").trim();
            match clean.parse::<T>() {
                Ok(parsed) => parsed,
                Err(_) => {
                    eprintln!("Config: {} = '{}' (parse failed, using default)", key, val);
                    default
                }
            }
        }
        Err(_) => default,
    }
}

impl OnboardConfig {
    pub fn from_env() -> Self {
        if dotenvy::dotenv().is_err() {
            eprintln!("No .env file found; using environment variables and defaults.");
        }

        Self {
            host: env_var_or("ONBOARD_HOST", "0.0.0.0".to_string()),
            port: env_var_or("ONBOARD_PORT", 8080),
            cors_origin: env_var_or("ONBOARD_CORS_ORIGIN", "http://localhost:3000".to_string()),
            database_url: env_var_or("DATABASE_URL", "sqlite:./onboard.db?mode=rwc".to_string()),
            sqlite_max_connections: env_var_or("SQLITE_MAX_CONNECTIONS", 10),
            llm_base_url: env_var_or("ONBOARD_LLM_BASE_URL", "https://api.openai.com/v1".to_string()),
            llm_api_key: env_var_or("ONBOARD_LLM_API_KEY", String::new()),
            llm_model: env_var_or("ONBOARD_LLM_MODEL", "gpt-4o-mini".to_string()),
            llm_timeout_secs: env_var_or("ONBOARD_LLM_TIMEOUT_SECS", 30),
            llm_max_tokens: env_var_or("ONBOARD_LLM_MAX_TOKENS", 700),
            token_secret: env_var_or("ONBOARD_TOKEN_SECRET", "dev-secret-change-me".to_string()),
            rate_limit_chat: env_var_or("ONBOARD_RATE_LIMIT_CHAT", 30),
            rate_limit_window_secs: env_var_or("ONBOARD_RATE_LIMIT_WINDOW_SECS", 60),
            history_default_limit: env_var_or("ONBOARD_HISTORY_DEFAULT_LIMIT", 20),
            history_max_limit: env_var_or("ONBOARD_HISTORY_MAX_LIMIT", 100),
            log_level: env_var_or("ONBOARD_LOG_LEVEL", "info".to_string()),
        }
    }
}

pub static CONFIG: Lazy<OnboardConfig> = Lazy::new(OnboardConfig::from_env);
