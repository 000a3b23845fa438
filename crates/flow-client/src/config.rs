//! Client configuration loading from file and environment variables.

use flow_notify::ReconnectPolicy;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Top-level client configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Backend HTTP API settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Push notification settings.
    #[serde(default)]
    pub notifications: NotificationsConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend HTTP API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the backend API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

/// Notification channel configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationsConfig {
    /// WebSocket URL of the notification endpoint.
    #[serde(default = "default_notify_url")]
    pub url: String,

    /// Initial reconnect backoff in milliseconds.
    #[serde(default = "default_reconnect_base_ms")]
    pub reconnect_base_ms: u64,

    /// Backoff cap in milliseconds.
    #[serde(default = "default_reconnect_max_ms")]
    pub reconnect_max_ms: u64,

    /// Consecutive failures tolerated before the channel closes for good.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "flow_client=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_notify_url() -> String {
    "ws://localhost:8080/ws".to_string()
}

fn default_reconnect_base_ms() -> u64 {
    500
}

fn default_reconnect_max_ms() -> u64 {
    30_000
}

fn default_max_retries() -> u32 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            url: default_notify_url(),
            reconnect_base_ms: default_reconnect_base_ms(),
            reconnect_max_ms: default_reconnect_max_ms(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl NotificationsConfig {
    /// The reconnect policy these settings describe.
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            base_delay: Duration::from_millis(self.reconnect_base_ms),
            max_delay: Duration::from_millis(self.reconnect_max_ms),
            max_retries: self.max_retries,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `FLOW_BACKEND_URL` overrides `backend.base_url`
/// - `FLOW_NOTIFY_URL` overrides `notifications.url`
/// - `FLOW_LOG_LEVEL` overrides `logging.level`
/// - `FLOW_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    // Environment variable overrides
    if let Ok(url) = std::env::var("FLOW_BACKEND_URL") {
        config.backend.base_url = url;
    }
    if let Ok(url) = std::env::var("FLOW_NOTIFY_URL") {
        config.notifications.url = url;
    }
    if let Ok(level) = std::env::var("FLOW_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("FLOW_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // load_config reads the process environment, so tests serialize on
    // this lock to keep the override test from bleeding into the others.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    fn env_guard() -> std::sync::MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[test]
    fn missing_file_yields_defaults() {
        let _env = env_guard();
        let config = load_config(Some("/nonexistent/flow.toml")).expect("defaults should load");
        assert_eq!(config.backend.base_url, "http://localhost:8080");
        assert_eq!(config.notifications.reconnect_base_ms, 500);
        assert_eq!(config.notifications.max_retries, 5);
    }

    #[test]
    fn partial_file_keeps_defaults_for_omitted_sections() {
        let _env = env_guard();
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "[backend]\nbase_url = \"https://flow.example\"\n\n[notifications]\nmax_retries = 9"
        )
        .unwrap();

        let config = load_config(file.path().to_str()).expect("config should parse");
        assert_eq!(config.backend.base_url, "https://flow.example");
        assert_eq!(config.notifications.max_retries, 9);
        // Omitted keys fall back per-field.
        assert_eq!(config.notifications.reconnect_base_ms, 500);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let _env = env_guard();
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "backend = \"not a table\"").unwrap();

        let err = load_config(file.path().to_str()).expect_err("parse should fail");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn env_overrides_win_over_file_values() {
        let _env = env_guard();
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "[backend]\nbase_url = \"https://from-file.example\"\n\n[logging]\nlevel = \"warn\""
        )
        .unwrap();

        std::env::set_var("FLOW_BACKEND_URL", "https://from-env.example");
        std::env::set_var("FLOW_NOTIFY_URL", "wss://from-env.example/ws");
        std::env::set_var("FLOW_LOG_LEVEL", "debug");
        std::env::set_var("FLOW_LOG_JSON", "true");
        let result = load_config(file.path().to_str());
        std::env::remove_var("FLOW_BACKEND_URL");
        std::env::remove_var("FLOW_NOTIFY_URL");
        std::env::remove_var("FLOW_LOG_LEVEL");
        std::env::remove_var("FLOW_LOG_JSON");

        let config = result.expect("config should load");
        assert_eq!(config.backend.base_url, "https://from-env.example");
        assert_eq!(config.notifications.url, "wss://from-env.example/ws");
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn reconnect_policy_converts_durations() {
        let notifications = NotificationsConfig {
            reconnect_base_ms: 250,
            reconnect_max_ms: 4_000,
            max_retries: 2,
            ..NotificationsConfig::default()
        };
        let policy = notifications.reconnect_policy();
        assert_eq!(policy.base_delay, Duration::from_millis(250));
        assert_eq!(policy.max_delay, Duration::from_secs(4));
        assert_eq!(policy.max_retries, 2);
    }
}
