use orchestrator_state::{NodeError, PatchError};
use thiserror::Error;

/// Failure reported by a transport collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("not connected")]
    NotConnected,
    #[error("snapshot unavailable for connection '{0}'")]
    SnapshotUnavailable(String),
    #[error("malformed message: {0}")]
    MalformedMessage(String),
    #[error("send failed: {0}")]
    Send(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error(transparent)]
    Patch(#[from] PatchError),
    #[error(transparent)]
    Node(#[from] NodeError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("mirror is not live; command '{0}' not sent")]
    NotConnected(String),
    #[error("replay line {line}: {source}")]
    Replay {
        line: usize,
        #[source]
        source: TransportError,
    },
    #[error("unexpected shape at '{path}': {reason}")]
    UnexpectedShape { path: String, reason: String },
}

impl MirrorError {
    pub(crate) fn shape(path: impl Into<String>, reason: impl Into<String>) -> Self {
        MirrorError::UnexpectedShape {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
