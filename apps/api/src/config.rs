use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::llm_client::{ClientSettings, RetryPolicy, DEFAULT_BASE_URL};

/// Model identifier sent with every analysis call.
pub const MODEL: &str = "gpt-4.1-mini";
/// Low but non-zero so the tone stays stable between runs.
pub const TEMPERATURE: f32 = 0.2;

const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// Application configuration loaded from environment variables.
/// Built once in `main` and handed to everything that needs it.
#[derive(Debug, Clone)]
pub struct Config {
    /// `None` when no credential was found. The service still starts;
    /// every analysis then fails validation with `missing_credential`.
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    /// `None` disables the client-side timeout (`LLM_TIMEOUT_SECS=0`).
    pub llm_timeout: Option<Duration>,
    pub llm_max_retries: u32,
    pub port: u16,
    pub rust_log: String,
}

/// Fixed model parameters injected into the analyzer.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub model: String,
    pub temperature: f32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model: MODEL.to_string(),
            temperature: TEMPERATURE,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests never touch
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let openai_api_key = lookup("OPENAI_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        let openai_base_url = lookup("OPENAI_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        if !openai_base_url.starts_with("http://") && !openai_base_url.starts_with("https://") {
            bail!("OPENAI_BASE_URL must start with http:// or https://");
        }

        let timeout_secs = match lookup("LLM_TIMEOUT_SECS") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        let llm_timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

        let llm_max_retries = match lookup("LLM_MAX_RETRIES") {
            Some(v) => v
                .trim()
                .parse::<u32>()
                .context("LLM_MAX_RETRIES must be a non-negative integer")?,
            None => 0,
        };

        Ok(Config {
            openai_api_key,
            openai_base_url,
            llm_timeout,
            llm_max_retries,
            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn credential_loaded(&self) -> bool {
        self.openai_api_key.is_some()
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.openai_base_url.clone(),
            timeout: self.llm_timeout,
            retry: RetryPolicy {
                max_retries: self.llm_max_retries,
                base_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_any_env() {
        let config = config_from(&[]).unwrap();
        assert!(config.openai_api_key.is_none());
        assert!(!config.credential_loaded());
        assert_eq!(config.openai_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.llm_timeout, Some(Duration::from_secs(120)));
        assert_eq!(config.llm_max_retries, 0);
        assert_eq!(config.port, 8080);
        assert_eq!(config.rust_log, "info");
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let config = config_from(&[("OPENAI_API_KEY", "   ")]).unwrap();
        assert!(!config.credential_loaded());
    }

    #[test]
    fn test_api_key_is_trimmed() {
        let config = config_from(&[("OPENAI_API_KEY", " sk-test \n")]).unwrap();
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_zero_timeout_disables_it() {
        let config = config_from(&[("LLM_TIMEOUT_SECS", "0")]).unwrap();
        assert!(config.llm_timeout.is_none());
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        assert!(config_from(&[("LLM_TIMEOUT_SECS", "soon")]).is_err());
        assert!(config_from(&[("LLM_MAX_RETRIES", "-1")]).is_err());
        assert!(config_from(&[("PORT", "99999")]).is_err());
    }

    #[test]
    fn test_base_url_must_be_http() {
        let err = config_from(&[("OPENAI_BASE_URL", "ftp://example.com")]).unwrap_err();
        assert!(err.to_string().contains("OPENAI_BASE_URL"));
    }

    #[test]
    fn test_base_url_trailing_slash_is_dropped() {
        let config = config_from(&[("OPENAI_BASE_URL", "http://localhost:9000/v1/")]).unwrap();
        assert_eq!(config.openai_base_url, "http://localhost:9000/v1");
    }

    #[test]
    fn test_client_settings_carry_retry_policy() {
        let config = config_from(&[("LLM_MAX_RETRIES", "2")]).unwrap();
        let settings = config.client_settings();
        assert_eq!(settings.retry.max_retries, 2);
        assert_eq!(settings.timeout, Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_model_settings_default() {
        let model = ModelSettings::default();
        assert_eq!(model.model, "gpt-4.1-mini");
        assert!((model.temperature - 0.2).abs() < f32::EPSILON);
    }
}
