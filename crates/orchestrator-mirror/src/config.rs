//! Client configuration, read from TOML.
//!
//! ```toml
//! server_url = "ws://orchestrator.local:8001/"
//! snapshot_path = "/service-properties"
//! socket_path = "/ws/socket.io"
//! reconnect_grace_ms = 2000
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable that overrides [`MirrorConfig::server_url`].
pub const SERVER_URL_ENV: &str = "ORCHESTRATOR_SERVER_URL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Base URL of the orchestrator server (`ws://` or `wss://`).
    pub server_url: String,
    /// HTTP path serving the full state snapshot.
    pub snapshot_path: String,
    /// Path of the event socket endpoint.
    pub socket_path: String,
    /// How long a dropped link reports "disconnected" before "reconnecting".
    pub reconnect_grace_ms: u64,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://localhost:8001/".to_string(),
            snapshot_path: "/service-properties".to_string(),
            socket_path: "/ws/socket.io".to_string(),
            reconnect_grace_ms: 2000,
        }
    }
}

impl MirrorConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: MirrorConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Load `path` if given and present, otherwise defaults; then apply
    /// environment overrides.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) if path.exists() => Self::load(path)?,
            Some(path) => {
                log::debug!("config file {} not found, using defaults", path.display());
                Self::default()
            }
            None => Self::default(),
        };
        let config = config.with_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in
    /// [`load_or_default`](Self::load_or_default)).
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(SERVER_URL_ENV).filter(|u| !u.is_empty()) {
            self.server_url = url;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let scheme_ok = ["ws://", "wss://", "http://", "https://"]
            .iter()
            .any(|scheme| self.server_url.starts_with(scheme));
        if !scheme_ok {
            return Err(ConfigError::Invalid(format!(
                "server_url '{}' must start with ws://, wss://, http:// or https://",
                self.server_url
            )));
        }
        for (name, path) in [
            ("snapshot_path", &self.snapshot_path),
            ("socket_path", &self.socket_path),
        ] {
            if !path.starts_with('/') {
                return Err(ConfigError::Invalid(format!("{name} must start with '/'")));
            }
        }
        Ok(())
    }

    /// HTTP URL of the snapshot endpoint.
    pub fn snapshot_url(&self) -> String {
        let base = self.base();
        let http_base = if let Some(rest) = base.strip_prefix("wss://") {
            format!("https://{rest}")
        } else if let Some(rest) = base.strip_prefix("ws://") {
            format!("http://{rest}")
        } else {
            base.to_string()
        };
        format!("{http_base}{}", self.snapshot_path)
    }

    pub fn socket_url(&self) -> String {
        format!("{}{}", self.base(), self.socket_path)
    }

    pub fn reconnect_grace(&self) -> Duration {
        Duration::from_millis(self.reconnect_grace_ms)
    }

    fn base(&self) -> &str {
        self.server_url.trim_end_matches('/')
    }
}
