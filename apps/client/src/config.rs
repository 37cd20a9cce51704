use std::time::Duration;

use anyhow::{Context, Result};

/// Client configuration loaded from environment variables.
///
/// `JOBLINK_API_URLS` is a comma-separated, ordered list of candidate
/// origins; the first entry is the primary, the rest are fallbacks tried
/// in sequence when the primary fails at the transport level.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_urls: Vec<String>,
    pub standard_timeout: Duration,
    pub probe_timeout: Duration,
    pub upload_timeout: Duration,
    pub data_dir: String,
    pub rust_log: String,
}

const DEFAULT_API_URLS: &str = "https://api.joblink.app,https://api-fallback.joblink.app";

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let api_urls = std::env::var("JOBLINK_API_URLS")
            .unwrap_or_else(|_| DEFAULT_API_URLS.to_string())
            .split(',')
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        if api_urls.is_empty() {
            anyhow::bail!("JOBLINK_API_URLS must contain at least one origin");
        }

        Ok(Config {
            api_urls,
            standard_timeout: env_secs("JOBLINK_TIMEOUT_SECS", 10)?,
            probe_timeout: env_secs("JOBLINK_PROBE_TIMEOUT_SECS", 3)?,
            upload_timeout: env_secs("JOBLINK_UPLOAD_TIMEOUT_SECS", 30)?,
            data_dir: std::env::var("JOBLINK_DATA_DIR").unwrap_or_else(|_| ".joblink".to_string()),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn env_secs(key: &str, default: u64) -> Result<Duration> {
    let secs = match std::env::var(key) {
        Ok(v) => v
            .parse::<u64>()
            .with_context(|| format!("'{key}' must be a whole number of seconds"))?,
        Err(_) => default,
    };
    Ok(Duration::from_secs(secs))
}
