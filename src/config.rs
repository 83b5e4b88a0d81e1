use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Invalid log format: '{}'. Must be 'text' or 'json'", s),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // News provider
    pub news_api_key: String,
    pub news_api_url: String,
    // Completion API
    pub openai_api_key: String,
    pub openai_api_url: String,
    pub openai_model: String,
    pub summary_fallback: bool,
    // Dashboard
    pub dashboard_host: String,
    pub dashboard_port: u16,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Don't fail if .env missing
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup. `from_env` passes the process
    /// environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| -> String {
            lookup(key)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let openai_api_key = lookup("OPENAI_API_KEY").unwrap_or_default();
        let news_api_key = lookup("NEWS_API_KEY").unwrap_or_default();
        if openai_api_key.trim().is_empty() || news_api_key.trim().is_empty() {
            anyhow::bail!(
                "API keys are not set. Add OPENAI_API_KEY and NEWS_API_KEY to the \
                 environment or to a local .env file"
            );
        }

        Ok(Config {
            news_api_key,
            news_api_url: get("NEWS_API_URL", "https://cryptonewsapi.online/api/v1/news"),
            openai_api_key,
            openai_api_url: get("OPENAI_API_URL", "https://api.openai.com"),
            openai_model: get("OPENAI_MODEL", "gpt-5-nano"),
            summary_fallback: get("SUMMARY_FALLBACK", "false")
                .parse()
                .context("Failed to parse SUMMARY_FALLBACK")?,
            dashboard_host: get("DASHBOARD_HOST", "0.0.0.0"),
            dashboard_port: get("DASHBOARD_PORT", "8501")
                .parse()
                .context("Failed to parse DASHBOARD_PORT")?,
            log_format: get("LOG_FORMAT", "text")
                .parse()
                .context("Failed to parse LOG_FORMAT")?,
        })
    }

    pub fn dashboard_addr(&self) -> String {
        format!("{}:{}", self.dashboard_host, self.dashboard_port)
    }
}
