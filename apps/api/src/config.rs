use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::dispatcher::ToolFailurePolicy;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub port: u16,
    pub rust_log: String,
    /// Directory where uploads live for the duration of a single request.
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub tool_failure_policy: ToolFailurePolicy,
    pub llm_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let openai_api_key = lookup("OPENAI_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .context("Required environment variable 'OPENAI_API_KEY' is not set")?;

        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            None => DEFAULT_PORT,
        };

        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(raw) => raw
                .parse::<usize>()
                .context("MAX_UPLOAD_BYTES must be a byte count")?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let llm_timeout_secs = match lookup("LLM_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .context("LLM_TIMEOUT_SECS must be a number of seconds")?,
            None => DEFAULT_LLM_TIMEOUT_SECS,
        };

        let tool_failure_policy = match lookup("TOOL_FAILURE_POLICY") {
            Some(raw) => raw
                .parse::<ToolFailurePolicy>()
                .map_err(anyhow::Error::msg)?,
            None => ToolFailurePolicy::default(),
        };

        Ok(Config {
            openai_api_key,
            openai_base_url: lookup("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            port,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            upload_dir: lookup("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
            max_upload_bytes,
            tool_failure_policy,
            llm_timeout_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_apply_when_only_api_key_is_set() {
        let config = Config::from_lookup(lookup_from(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.openai_base_url, "https://api.openai.com/v1");
        assert_eq!(config.rust_log, "info");
        assert_eq!(config.max_upload_bytes, 20 * 1024 * 1024);
        assert_eq!(config.tool_failure_policy, ToolFailurePolicy::Disclose);
        assert_eq!(config.upload_dir, std::env::temp_dir());
    }

    #[test]
    fn test_missing_api_key_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "9000")])).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_blank_api_key_is_an_error() {
        assert!(Config::from_lookup(lookup_from(&[("OPENAI_API_KEY", "   ")])).is_err());
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_overrides_are_read() {
        let config = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("PORT", "9100"),
            ("UPLOAD_DIR", "/var/tmp/uploads"),
            ("MAX_UPLOAD_BYTES", "1024"),
            ("TOOL_FAILURE_POLICY", "suppress"),
            ("LLM_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.upload_dir, PathBuf::from("/var/tmp/uploads"));
        assert_eq!(config.max_upload_bytes, 1024);
        assert_eq!(config.tool_failure_policy, ToolFailurePolicy::Suppress);
        assert_eq!(config.llm_timeout_secs, 30);
    }

    #[test]
    fn test_unknown_failure_policy_is_rejected() {
        assert!(Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("TOOL_FAILURE_POLICY", "shrug"),
        ]))
        .is_err());
    }
}
