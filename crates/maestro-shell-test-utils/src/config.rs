//! Configuration builders for tests.
//!
//! Use [`TestConfigBuilder`] to create customised [`ShellConfig`] values
//! without repeating boilerplate across crate boundaries.

use std::path::Path;

use maestro_shell_config::ShellConfig;

/// Fluent builder for [`ShellConfig`] in tests.
///
/// ```ignore
/// let config = TestConfigBuilder::new()
///     .socket_path(daemon.socket_path())
///     .debug(true)
///     .build();
/// ```
pub struct TestConfigBuilder {
    config: ShellConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ShellConfig::default(),
        }
    }

    pub fn socket_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config.daemon.socket_path = path.as_ref().display().to_string();
        self
    }

    pub fn log_level(mut self, level: &str) -> Self {
        self.config.logging.level = level.to_string();
        self
    }

    pub fn debug(mut self, on: bool) -> Self {
        self.config.logging.debug = on;
        self
    }

    pub fn channel_capacity(mut self, n: usize) -> Self {
        self.config.events.channel_capacity = n;
        self
    }

    pub fn prompt(mut self, prompt: &str) -> Self {
        self.config.shell.prompt = prompt.to_string();
        self
    }

    pub fn build(self) -> ShellConfig {
        self.config
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
