use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub groq_api_key: String,
    pub groq_base_url: String,
    pub groq_model: String,
    pub request_timeout_secs: u64,
    pub max_attempts: u32,
    pub backoff_step_ms: u64,
    pub temperature: f32,
    pub max_output_tokens: u32,
    /// Development-only escape hatch: allow suffixed stub questions when the
    /// template pool cannot produce enough unique texts.
    pub stub_variants: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            groq_api_key: get_env("GROQ_API_KEY")?,
            groq_base_url: get_env_or("GROQ_BASE_URL", "https://api.groq.com/openai/v1"),
            groq_model: get_env_or("GROQ_MODEL", "llama-3.1-8b-instant"),
            request_timeout_secs: get_env_parse_or("GROQ_TIMEOUT_SECS", 30)?,
            max_attempts: get_env_parse_or("GROQ_MAX_ATTEMPTS", 4)?,
            backoff_step_ms: get_env_parse_or("GROQ_BACKOFF_MS", 1500)?,
            temperature: get_env_parse_or("GROQ_TEMPERATURE", 0.2)?,
            max_output_tokens: get_env_parse_or("GROQ_MAX_OUTPUT_TOKENS", 700)?,
            stub_variants: get_env_parse_or("STUB_VARIANTS", false)?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            groq_api_key: String::new(),
            groq_base_url: "https://api.groq.com/openai/v1".to_string(),
            groq_model: "llama-3.1-8b-instant".to_string(),
            request_timeout_secs: 30,
            max_attempts: 4,
            backoff_step_ms: 1500,
            temperature: 0.2,
            max_output_tokens: 700,
            stub_variants: false,
        }
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
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
