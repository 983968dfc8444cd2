//! Seam between the mirror and the duplex connection to the server.
//!
//! The socket itself lives outside this crate. A transport delivers
//! [`TransportEvent`]s in order, answers snapshot requests keyed by
//! connection identity, and emits commands:
//!
//! ```text
//!   socket ──events──▶ MirrorSession ──fetch_snapshot──▶ SnapshotSource
//!                           │
//!                           └──────emit──────▶ CommandSink
//! ```

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use orchestrator_state::Tree;
use serde_json::Value;

use crate::error::TransportError;
use crate::message::{Ack, Command, NotifyMessage};

/// Connection lifecycle and data events, in delivery order.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connected { connection_id: String },
    Disconnected,
    Notify(NotifyMessage),
}

impl TransportEvent {
    /// Decode a named socket event (`connect`, `disconnect`, `notify`).
    ///
    /// `connect` takes the connection id either as a bare string or as the
    /// `sid` field of an object.
    pub fn from_named(event: &str, payload: Value) -> Result<Self, TransportError> {
        match event {
            "connect" => {
                let connection_id = match &payload {
                    Value::String(s) => Some(s.clone()),
                    Value::Object(obj) => obj.get("sid").and_then(Value::as_str).map(str::to_string),
                    _ => None,
                }
                .ok_or_else(|| {
                    TransportError::MalformedMessage("connect without a connection id".to_string())
                })?;
                Ok(TransportEvent::Connected { connection_id })
            }
            "disconnect" => Ok(TransportEvent::Disconnected),
            "notify" => NotifyMessage::from_envelope(payload).map(TransportEvent::Notify),
            other => Err(TransportError::MalformedMessage(format!(
                "unknown event '{other}'"
            ))),
        }
    }
}

/// Request/response fetch of a full snapshot for one connection.
pub trait SnapshotSource {
    fn fetch_snapshot(&self, connection_id: &str) -> Result<Tree, TransportError>;
}

/// Outbound command channel. `Ok(None)` means fire-and-forget.
pub trait CommandSink {
    fn emit(&self, command: &Command) -> Result<Option<Ack>, TransportError>;
}

/// In-process transport: serves a fixed snapshot and records commands.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    snapshot: Option<Tree>,
    sent: Vec<Command>,
    acks: VecDeque<Ack>,
    fetches: Vec<String>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Tree) -> Self {
        let transport = Self::new();
        transport.set_snapshot(snapshot);
        transport
    }

    pub fn set_snapshot(&self, snapshot: Tree) {
        self.lock().snapshot = Some(snapshot);
    }

    pub fn clear_snapshot(&self) {
        self.lock().snapshot = None;
    }

    /// Queue an acknowledgement for the next emitted command.
    pub fn push_ack(&self, ack: Ack) {
        self.lock().acks.push_back(ack);
    }

    /// Commands emitted so far, oldest first.
    pub fn sent(&self) -> Vec<Command> {
        self.lock().sent.clone()
    }

    /// Connection ids snapshots were requested for.
    pub fn fetches(&self) -> Vec<String> {
        self.lock().fetches.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SnapshotSource for MemoryTransport {
    fn fetch_snapshot(&self, connection_id: &str) -> Result<Tree, TransportError> {
        let mut state = self.lock();
        state.fetches.push(connection_id.to_string());
        state
            .snapshot
            .clone()
            .ok_or_else(|| TransportError::SnapshotUnavailable(connection_id.to_string()))
    }
}

impl CommandSink for MemoryTransport {
    fn emit(&self, command: &Command) -> Result<Option<Ack>, TransportError> {
        let mut state = self.lock();
        state.sent.push(command.clone());
        Ok(state.acks.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree() -> Tree {
        Tree::from_json(json!({"type": "DataService", "value": {}, "readonly": false})).unwrap()
    }

    #[test]
    fn test_from_named_events() {
        assert_eq!(
            TransportEvent::from_named("connect", json!({"sid": "abc"})).unwrap(),
            TransportEvent::Connected {
                connection_id: "abc".to_string()
            }
        );
        assert_eq!(
            TransportEvent::from_named("connect", json!("xyz")).unwrap(),
            TransportEvent::Connected {
                connection_id: "xyz".to_string()
            }
        );
        assert!(TransportEvent::from_named("connect", json!(null)).is_err());
        assert_eq!(
            TransportEvent::from_named("disconnect", json!(null)).unwrap(),
            TransportEvent::Disconnected
        );
        let notify = TransportEvent::from_named(
            "notify",
            json!({"data": {"full_access_path": "a", "value": {"value": 1}}}),
        )
        .unwrap();
        assert!(matches!(notify, TransportEvent::Notify(ref m) if m.full_access_path == "a"));
        assert!(TransportEvent::from_named("pty-output", json!({})).is_err());
    }

    #[test]
    fn test_memory_transport_snapshot() {
        let transport = MemoryTransport::new();
        assert_eq!(
            transport.fetch_snapshot("c1"),
            Err(TransportError::SnapshotUnavailable("c1".to_string()))
        );
        transport.set_snapshot(tree());
        assert_eq!(transport.fetch_snapshot("c2").unwrap(), tree());
        assert_eq!(transport.fetches(), vec!["c1".to_string(), "c2".to_string()]);
    }

    #[test]
    fn test_memory_transport_records_commands() {
        let transport = MemoryTransport::new();
        transport.push_ack(json!("ok"));
        let cmd = Command::run_method("update", "");
        assert_eq!(transport.emit(&cmd).unwrap(), Some(json!("ok")));
        assert_eq!(transport.emit(&cmd).unwrap(), None);
        assert_eq!(transport.sent().len(), 2);
    }
}
