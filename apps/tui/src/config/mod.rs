mod settings;

pub use settings::{AppConfig, ConfigError, DEFAULT_BASE_URL, DEFAULT_LOG_FILE, DEFAULT_TIMEOUT_SECS};
