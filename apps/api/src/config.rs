use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::resume::AnalyzerBackend;

/// Application configuration loaded from environment variables.
/// Every value has a default; provider API keys are optional and only
/// checked when a request targets that provider.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub providers: ProviderKeys,
    /// Upper bound for a single upstream LLM call, including streaming.
    pub llm_timeout_secs: u64,
    /// Retries of the upstream connection attempt on 429 / 5xx.
    pub llm_max_retries: u32,
    pub humanize_rate_limit: usize,
    pub humanize_window_secs: u64,
    pub resume_model: String,
    pub resume_analyzer: AnalyzerBackend,
    pub reader_model: String,
    pub blog_dir: PathBuf,
    /// Largest accepted multipart upload, in bytes.
    pub max_upload_bytes: usize,
}

/// Per-provider API keys and optional base URL overrides.
#[derive(Debug, Clone, Default)]
pub struct ProviderKeys {
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    pub deepseek_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub anthropic_base_url: Option<String>,
    pub groq_base_url: Option<String>,
    pub deepseek_base_url: Option<String>,
    pub gemini_base_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            providers: ProviderKeys {
                openai_api_key: optional_env("OPENAI_API_KEY"),
                anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
                groq_api_key: optional_env("GROQ_API_KEY"),
                deepseek_api_key: optional_env("DEEPSEEK_API_KEY"),
                gemini_api_key: optional_env("GOOGLE_GENERATIVE_AI_API_KEY"),
                openai_base_url: optional_env("OPENAI_BASE_URL"),
                anthropic_base_url: optional_env("ANTHROPIC_BASE_URL"),
                groq_base_url: optional_env("GROQ_BASE_URL"),
                deepseek_base_url: optional_env("DEEPSEEK_BASE_URL"),
                gemini_base_url: optional_env("GEMINI_BASE_URL"),
            },
            llm_timeout_secs: parse_env("LLM_TIMEOUT_SECS", 30)?,
            llm_max_retries: parse_env("LLM_MAX_RETRIES", 2)?,
            humanize_rate_limit: parse_env("HUMANIZE_RATE_LIMIT", 5)?,
            humanize_window_secs: parse_env("HUMANIZE_RATE_WINDOW_SECS", 60)?,
            resume_model: std::env::var("RESUME_MODEL").unwrap_or_else(|_| "gpt-4".to_string()),
            resume_analyzer: parse_env("RESUME_ANALYZER", AnalyzerBackend::Llm)?,
            reader_model: std::env::var("READER_MODEL")
                .unwrap_or_else(|_| "openai:gpt-4".to_string()),
            blog_dir: std::env::var("BLOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("content/posts")),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 20 * 1024 * 1024)?,
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Configuration used by handler tests: every provider points at `base_url`.
    pub fn for_tests(base_url: &str) -> Self {
        Config {
            port: 0,
            rust_log: "debug".to_string(),
            providers: ProviderKeys {
                openai_api_key: Some("test-openai".to_string()),
                anthropic_api_key: Some("test-anthropic".to_string()),
                groq_api_key: Some("test-groq".to_string()),
                deepseek_api_key: Some("test-deepseek".to_string()),
                gemini_api_key: None,
                openai_base_url: Some(base_url.to_string()),
                anthropic_base_url: Some(base_url.to_string()),
                groq_base_url: Some(base_url.to_string()),
                deepseek_base_url: Some(base_url.to_string()),
                gemini_base_url: Some(base_url.to_string()),
            },
            llm_timeout_secs: 5,
            llm_max_retries: 0,
            humanize_rate_limit: 5,
            humanize_window_secs: 60,
            resume_model: "gpt-4".to_string(),
            resume_analyzer: AnalyzerBackend::Llm,
            reader_model: "openai:gpt-4".to_string(),
            blog_dir: PathBuf::from("does-not-exist"),
            max_upload_bytes: 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_falls_back_to_default() {
        let value: u16 = parse_env("SCISTU_TEST_UNSET_VARIABLE", 8080).unwrap();
        assert_eq!(value, 8080);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("SCISTU_TEST_BAD_PORT", "not-a-port");
        let result: Result<u16> = parse_env("SCISTU_TEST_BAD_PORT", 8080);
        assert!(result.is_err());
        std::env::remove_var("SCISTU_TEST_BAD_PORT");
    }

    #[test]
    fn test_optional_env_treats_blank_as_missing() {
        std::env::set_var("SCISTU_TEST_BLANK_KEY", "   ");
        assert!(optional_env("SCISTU_TEST_BLANK_KEY").is_none());
        std::env::remove_var("SCISTU_TEST_BLANK_KEY");
    }
}
