#![deny(unsafe_code)]

//! Configuration loading and validation for maestro-shell.
//!
//! Loads an optional TOML file and validates it. [`ShellConfig`] is the
//! central configuration structure; every section falls back to defaults so
//! an empty file (or no file at all) is a valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Default Unix socket path of the maestro daemon API.
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/maestroapi.sock";

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Top-level shell configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Where to reach the daemon.
    #[serde(default)]
    pub daemon: DaemonConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Network event subscription settings.
    #[serde(default)]
    pub events: EventsConfig,

    /// Interactive prompt settings.
    #[serde(default)]
    pub shell: PromptConfig,
}

/// Connection settings for the maestro daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Path to the daemon's Unix domain socket.
    #[serde(default = "default_socket_path")]
    pub socket_path: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
        }
    }
}

fn default_socket_path() -> String {
    DEFAULT_SOCKET_PATH.to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "warn", "info", "debug").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Initial state of the shell's `debug` toggle.
    #[serde(default)]
    pub debug: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            debug: false,
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Network event subscription settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Capacity of the queue between the poller and the printer.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_channel_capacity() -> usize {
    64
}

/// Interactive prompt settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Text printed before each input line.
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
        }
    }
}

fn default_prompt() -> String {
    "maestro> ".to_string()
}

impl ShellConfig {
    /// Load configuration from a TOML file at the given path using async I/O.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let config = Self::parse(&content)?;
        tracing::debug!(path = %path.display(), "loaded shell config");
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: ShellConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.daemon.socket_path.is_empty() {
            return Err(ConfigError::Validation(
                "daemon.socket_path must not be empty".to_string(),
            ));
        }
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.level must be one of {:?}, got {:?}",
                valid_levels, self.logging.level
            )));
        }
        if self.events.channel_capacity == 0 {
            return Err(ConfigError::Validation(
                "events.channel_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ShellConfig::default();
        assert_eq!(config.daemon.socket_path, "/tmp/maestroapi.sock");
        assert_eq!(config.logging.level, "warn");
        assert!(!config.logging.debug);
        assert_eq!(config.events.channel_capacity, 64);
        assert_eq!(config.shell.prompt, "maestro> ");
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config = ShellConfig::parse("").unwrap();
        assert_eq!(config.daemon.socket_path, DEFAULT_SOCKET_PATH);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml = r#"
            [daemon]
            socket_path = "/run/maestro/api.sock"

            [logging]
            level = "debug"
            debug = true

            [events]
            channel_capacity = 8

            [shell]
            prompt = "> "
        "#;
        let config = ShellConfig::parse(toml).unwrap();
        assert_eq!(config.daemon.socket_path, "/run/maestro/api.sock");
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.debug);
        assert_eq!(config.events.channel_capacity, 8);
        assert_eq!(config.shell.prompt, "> ");
    }

    #[test]
    fn test_validation_rejects_empty_socket_path() {
        let toml = r#"
            [daemon]
            socket_path = ""
        "#;
        let result = ShellConfig::parse(toml);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validation_rejects_unknown_level() {
        let toml = r#"
            [logging]
            level = "loud"
        "#;
        let err = ShellConfig::parse(toml).unwrap_err();
        assert!(err.to_string().contains("logging.level"));
    }

    #[test]
    fn test_validation_rejects_zero_capacity() {
        let toml = r#"
            [events]
            channel_capacity = 0
        "#;
        assert!(ShellConfig::parse(toml).is_err());
    }

    #[test]
    fn test_parse_rejects_wrong_type() {
        let toml = r#"
            [logging]
            debug = "yes"
        "#;
        assert!(matches!(
            ShellConfig::parse(toml),
            Err(ConfigError::Parse(_))
        ));
    }

    // ── Async file-based loading ──────────────────────────────────────

    #[test_log::test(tokio::test)]
    async fn test_load_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("maestro-shell.toml");
        tokio::fs::write(&path, b"[daemon]\nsocket_path = \"/tmp/other.sock\"\n")
            .await
            .unwrap();

        let config = ShellConfig::load(&path).await.unwrap();
        assert_eq!(config.daemon.socket_path, "/tmp/other.sock");
    }

    #[test_log::test(tokio::test)]
    async fn test_load_nonexistent_file() {
        let result = ShellConfig::load(Path::new("/nonexistent/file.toml")).await;
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test_log::test(tokio::test)]
    async fn test_load_invalid_toml_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.toml");
        tokio::fs::write(&path, b"not valid toml [[[").await.unwrap();

        let result = ShellConfig::load(&path).await;
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_error_display() {
        let err = ConfigError::Validation("bad value".to_string());
        assert_eq!(err.to_string(), "validation error: bad value");
    }
}
