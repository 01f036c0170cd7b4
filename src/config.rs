//! Client configuration: TOML file, environment, then CLI flags.

use crate::error::ConfigError;
use crate::session::DEFAULT_DEBUG_DELAY;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Public GROT server.
pub const DEFAULT_SERVER: &str = "http://grot-server.games.stxnext.pl";

/// Settings shared by every command.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the game server, without a trailing slash.
    #[serde(default = "default_server")]
    server: String,

    /// Token file location; defaults to `~/.grot_token`.
    #[serde(default)]
    token_file: Option<PathBuf>,

    /// Proxy for every request.
    #[serde(default)]
    proxy: Option<String>,

    /// Pause between turns in debug mode, in milliseconds.
    #[serde(default = "default_debug_delay_ms")]
    debug_delay_ms: u64,
}

fn default_server() -> String {
    DEFAULT_SERVER.to_string()
}

fn default_debug_delay_ms() -> u64 {
    DEFAULT_DEBUG_DELAY.as_millis() as u64
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            token_file: None,
            proxy: None,
            debug_delay_ms: default_debug_delay_ms(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(server = %config.server, "Config loaded successfully");
        Ok(config)
    }

    /// Loads `path` if given, otherwise starts from defaults, then applies
    /// `GROT_SERVER` and `GROT_PROXY` from the environment.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides(
            std::env::var("GROT_SERVER").ok(),
            std::env::var("GROT_PROXY").ok(),
        ))
    }

    /// Applies overrides that win over the file (environment or CLI flags).
    ///
    /// Empty strings are ignored.
    pub fn with_env_overrides(mut self, server: Option<String>, proxy: Option<String>) -> Self {
        if let Some(server) = server.filter(|s| !s.trim().is_empty()) {
            debug!(server = %server, "Overriding server");
            self.server = server;
        }
        if let Some(proxy) = proxy.filter(|p| !p.trim().is_empty()) {
            debug!(proxy = %proxy, "Overriding proxy");
            self.proxy = Some(proxy);
        }
        self.server = self.server.trim_end_matches('/').to_string();
        self
    }

    /// Returns the debug pause as a [`Duration`].
    pub fn debug_delay(&self) -> Duration {
        Duration::from_millis(self.debug_delay_ms)
    }
}
