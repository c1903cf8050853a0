use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::rate_limit::RateLimitSettings;

/// Default OpenAI-compatible API base; `/moderations` is appended to it.
pub const DEFAULT_MODERATION_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODERATION_MODEL: &str = "omni-moderation-latest";
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.9;
pub const DEFAULT_RATE_LIMIT: u32 = 20;
pub const DEFAULT_RATE_WINDOW_SECS: u64 = 60;
pub const DEFAULT_MODERATION_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

/// Central configuration loaded from environment variables.
///
/// Everything is read once at startup. The .env file is loaded
/// by main via dotenvy before `load()` runs.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the moderation API (without the `/moderations` suffix)
    pub moderation_base_url: String,
    /// Bearer credential for the moderation API. Empty when unset.
    pub moderation_api_key: String,
    pub moderation_model: String,
    /// A category must score strictly above this to block
    pub confidence_threshold: f64,
    /// Admissions allowed per user within one window
    pub rate_limit: u32,
    pub rate_window: Duration,
    pub moderation_timeout: Duration,
    /// How often idle users are evicted from the limiter. `None` disables the sweep.
    pub sweep_interval: Option<Duration>,
    /// File that receives warning-level security events
    pub security_log_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            moderation_base_url: DEFAULT_MODERATION_BASE_URL.to_string(),
            moderation_api_key: String::new(),
            moderation_model: DEFAULT_MODERATION_MODEL.to_string(),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            rate_limit: DEFAULT_RATE_LIMIT,
            rate_window: Duration::from_secs(DEFAULT_RATE_WINDOW_SECS),
            moderation_timeout: Duration::from_secs(DEFAULT_MODERATION_TIMEOUT_SECS),
            sweep_interval: Some(Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS)),
            security_log_path: PathBuf::from("security.log"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every setting has a default except the API key, which is only
    /// checked by commands that actually call the classifier.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. `load()` passes the
    /// process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let moderation_api_key = lookup("MODERATION_API_KEY")
            .or_else(|| lookup("OPENAI_API_KEY"))
            .unwrap_or_default();

        let confidence_threshold = parse_var(
            &lookup,
            "CONTENTGATE_CONFIDENCE_THRESHOLD",
            defaults.confidence_threshold,
        )?;
        if !(0.0..=1.0).contains(&confidence_threshold) {
            anyhow::bail!(
                "CONTENTGATE_CONFIDENCE_THRESHOLD must be between 0.0 and 1.0, got {confidence_threshold}"
            );
        }

        let rate_limit = parse_var(&lookup, "CONTENTGATE_RATE_LIMIT", defaults.rate_limit)?;
        if rate_limit == 0 {
            anyhow::bail!("CONTENTGATE_RATE_LIMIT must be at least 1");
        }

        let window_secs = parse_var(
            &lookup,
            "CONTENTGATE_RATE_WINDOW_SECS",
            DEFAULT_RATE_WINDOW_SECS,
        )?;
        if window_secs == 0 {
            anyhow::bail!("CONTENTGATE_RATE_WINDOW_SECS must be at least 1");
        }

        let timeout_secs = parse_var(
            &lookup,
            "CONTENTGATE_MODERATION_TIMEOUT_SECS",
            DEFAULT_MODERATION_TIMEOUT_SECS,
        )?;
        if timeout_secs == 0 {
            anyhow::bail!("CONTENTGATE_MODERATION_TIMEOUT_SECS must be at least 1");
        }

        // 0 turns the idle-user sweep off entirely
        let sweep_secs = parse_var(
            &lookup,
            "CONTENTGATE_SWEEP_INTERVAL_SECS",
            DEFAULT_SWEEP_INTERVAL_SECS,
        )?;

        Ok(Self {
            moderation_base_url: lookup("MODERATION_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.moderation_base_url),
            moderation_api_key,
            moderation_model: lookup("MODERATION_MODEL").unwrap_or(defaults.moderation_model),
            confidence_threshold,
            rate_limit,
            rate_window: Duration::from_secs(window_secs),
            moderation_timeout: Duration::from_secs(timeout_secs),
            sweep_interval: (sweep_secs > 0).then_some(Duration::from_secs(sweep_secs)),
            security_log_path: lookup("CONTENTGATE_SECURITY_LOG")
                .map(PathBuf::from)
                .unwrap_or(defaults.security_log_path),
        })
    }

    /// Check that the moderation API key is configured.
    /// Call this before any operation that talks to the classifier.
    pub fn require_moderation(&self) -> Result<()> {
        if self.moderation_api_key.is_empty() {
            anyhow::bail!(
                "MODERATION_API_KEY not set. Add it to your .env file.\n\
                 OPENAI_API_KEY is accepted as a fallback."
            );
        }
        Ok(())
    }

    /// Rate limiter settings derived from this config.
    pub fn limits(&self) -> RateLimitSettings {
        RateLimitSettings {
            max_requests: self.rate_limit,
            window: self.rate_window,
        }
    }

    /// The API key with everything but a short prefix masked, for display.
    pub fn redacted_api_key(&self) -> String {
        if self.moderation_api_key.is_empty() {
            return "(not set)".to_string();
        }
        let prefix: String = self.moderation_api_key.chars().take(4).collect();
        format!("{prefix}…")
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_environment_empty() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config.moderation_base_url, DEFAULT_MODERATION_BASE_URL);
        assert_eq!(config.moderation_model, "omni-moderation-latest");
        assert_eq!(config.confidence_threshold, 0.9);
        assert_eq!(config.rate_limit, 20);
        assert_eq!(config.rate_window, Duration::from_secs(60));
        assert_eq!(config.moderation_timeout, Duration::from_secs(30));
        assert_eq!(config.sweep_interval, Some(Duration::from_secs(300)));
        assert_eq!(config.security_log_path, PathBuf::from("security.log"));
        assert!(config.require_moderation().is_err());
    }

    #[test]
    fn test_openai_key_is_accepted_as_fallback() {
        let config = from_pairs(&[("OPENAI_API_KEY", "sk-fallback")]).unwrap();
        assert_eq!(config.moderation_api_key, "sk-fallback");
        assert!(config.require_moderation().is_ok());

        let config = from_pairs(&[
            ("OPENAI_API_KEY", "sk-fallback"),
            ("MODERATION_API_KEY", "sk-primary"),
        ])
        .unwrap();
        assert_eq!(config.moderation_api_key, "sk-primary");
    }

    #[test]
    fn test_base_url_trailing_slash_is_stripped() {
        let config = from_pairs(&[("MODERATION_BASE_URL", "http://localhost:9000/v1/")]).unwrap();
        assert_eq!(config.moderation_base_url, "http://localhost:9000/v1");
    }

    #[test]
    fn test_overrides_are_parsed() {
        let config = from_pairs(&[
            ("CONTENTGATE_CONFIDENCE_THRESHOLD", "0.75"),
            ("CONTENTGATE_RATE_LIMIT", "5"),
            ("CONTENTGATE_RATE_WINDOW_SECS", "10"),
            ("CONTENTGATE_MODERATION_TIMEOUT_SECS", "3"),
            ("CONTENTGATE_SWEEP_INTERVAL_SECS", "0"),
        ])
        .unwrap();
        assert_eq!(config.confidence_threshold, 0.75);
        assert_eq!(config.limits().max_requests, 5);
        assert_eq!(config.limits().window, Duration::from_secs(10));
        assert_eq!(config.moderation_timeout, Duration::from_secs(3));
        assert!(config.sweep_interval.is_none());
    }

    #[test]
    fn test_invalid_number_names_the_variable() {
        let err = from_pairs(&[("CONTENTGATE_RATE_LIMIT", "lots")]).unwrap_err();
        assert!(err.to_string().contains("CONTENTGATE_RATE_LIMIT"));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        assert!(from_pairs(&[("CONTENTGATE_CONFIDENCE_THRESHOLD", "1.5")]).is_err());
        assert!(from_pairs(&[("CONTENTGATE_RATE_LIMIT", "0")]).is_err());
        assert!(from_pairs(&[("CONTENTGATE_RATE_WINDOW_SECS", "0")]).is_err());
        assert!(from_pairs(&[("CONTENTGATE_MODERATION_TIMEOUT_SECS", "0")]).is_err());
    }

    #[test]
    fn test_redacted_api_key_hides_secret() {
        let config = from_pairs(&[("MODERATION_API_KEY", "sk-very-secret")]).unwrap();
        let shown = config.redacted_api_key();
        assert!(shown.starts_with("sk-v"));
        assert!(!shown.contains("secret"));
        assert_eq!(Config::default().redacted_api_key(), "(not set)");
    }
}
