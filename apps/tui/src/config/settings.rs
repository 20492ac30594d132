use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api/1/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_LOG_FILE: &str = "guardwatch.log";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("GUARDWATCH_BASE_URL must start with http:// or https://, got {0:?}")]
    BaseUrl(String),
    #[error("GUARDWATCH_TIMEOUT_SECS must be a positive whole number, got {0:?}")]
    Timeout(String),
}

/// Runtime settings, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Always ends with `/`.
    pub base_url: String,
    pub session_cookie: Option<String>,
    pub timeout: Duration,
    pub account: String,
    pub log_file: PathBuf,
    pub debug: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            session_cookie: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            account: String::new(),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            debug: false,
        }
    }
}

impl AppConfig {
    /// Loads `.env` (if present) and reads the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let base_url = match non_empty("GUARDWATCH_BASE_URL") {
            Some(url) => normalize_base_url(&url)?,
            None => defaults.base_url,
        };

        let timeout = match non_empty("GUARDWATCH_TIMEOUT_SECS") {
            Some(raw) => parse_timeout(&raw)?,
            None => defaults.timeout,
        };

        Ok(Self {
            base_url,
            session_cookie: non_empty("GUARDWATCH_SESSION_COOKIE"),
            timeout,
            account: non_empty("GUARDWATCH_ACCOUNT")
                .map(|account| account.trim().to_string())
                .unwrap_or_default(),
            log_file: non_empty("GUARDWATCH_LOG").map_or(defaults.log_file, PathBuf::from),
            debug: non_empty("DEBUG").is_some_and(|value| is_truthy(&value)),
        })
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let url = raw.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::BaseUrl(url.to_string()));
    }

    if url.ends_with('/') {
        Ok(url.to_string())
    } else {
        Ok(format!("{url}/"))
    }
}

/// `0`, `false`, `no` and `off` (any case) turn a flag off; anything else turns it on.
fn is_truthy(raw: &str) -> bool {
    !matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::Timeout(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        assert_eq!(config_from(&[]), Ok(AppConfig::default()));
    }

    #[test]
    fn base_url_gains_trailing_slash() -> Result<(), ConfigError> {
        let config = config_from(&[("GUARDWATCH_BASE_URL", " https://monkey.example/api/1 ")])?;
        assert_eq!(config.base_url, "https://monkey.example/api/1/");
        Ok(())
    }

    #[test]
    fn base_url_without_scheme_is_rejected() {
        assert_eq!(
            config_from(&[("GUARDWATCH_BASE_URL", "monkey.example/api/1/")]),
            Err(ConfigError::BaseUrl("monkey.example/api/1/".to_string()))
        );
    }

    #[test]
    fn timeout_must_be_positive() {
        assert!(matches!(
            config_from(&[("GUARDWATCH_TIMEOUT_SECS", "0")]),
            Err(ConfigError::Timeout(_))
        ));
        assert!(matches!(
            config_from(&[("GUARDWATCH_TIMEOUT_SECS", "soon")]),
            Err(ConfigError::Timeout(_))
        ));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() -> Result<(), ConfigError> {
        let config = config_from(&[
            ("GUARDWATCH_SESSION_COOKIE", "  "),
            ("GUARDWATCH_ACCOUNT", ""),
            ("GUARDWATCH_LOG", "/tmp/gw.log"),
            ("DEBUG", "1"),
        ])?;

        assert_eq!(config.session_cookie, None);
        assert_eq!(config.account, "");
        assert_eq!(config.log_file, PathBuf::from("/tmp/gw.log"));
        assert!(config.debug);
        Ok(())
    }

    #[test]
    fn debug_accepts_false_spellings() -> Result<(), ConfigError> {
        for off in ["0", "false", "FALSE", " no ", "off", ""] {
            assert!(!config_from(&[("DEBUG", off)])?.debug, "DEBUG={off:?}");
        }
        for on in ["1", "true", "yes"] {
            assert!(config_from(&[("DEBUG", on)])?.debug, "DEBUG={on:?}");
        }
        Ok(())
    }
}
