//! Wire messages exchanged with the orchestrator server.
//!
//! Inbound: `notify` carries one path-addressed patch. Outbound:
//! `set_attribute` and `run_method` address a field by its parent path and
//! name, the same way the mirror addresses nodes.

use orchestrator_state::{parse_access_path, AccessPath, NodePatch, PatchError, ValueNode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::TransportError;

/// Optional acknowledgement returned for a command.
pub type Ack = Value;

// ── Inbound ───────────────────────────────────────────────────────────────

/// A single-node patch notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotifyMessage {
    pub full_access_path: String,
    pub value: NodePatch,
}

#[derive(Deserialize)]
struct NotifyEnvelope {
    data: NotifyMessage,
}

impl NotifyMessage {
    pub fn new(full_access_path: impl Into<String>, value: impl Into<NodePatch>) -> Self {
        Self {
            full_access_path: full_access_path.into(),
            value: value.into(),
        }
    }

    /// Decode a `notify` payload, with or without the `{"data": ...}`
    /// envelope the socket wraps it in.
    pub fn from_envelope(payload: Value) -> Result<Self, TransportError> {
        let enveloped = payload
            .as_object()
            .map(|obj| obj.contains_key("data") && !obj.contains_key("full_access_path"))
            .unwrap_or(false);
        let decoded = if enveloped {
            serde_json::from_value::<NotifyEnvelope>(payload).map(|e| e.data)
        } else {
            serde_json::from_value::<NotifyMessage>(payload)
        };
        decoded.map_err(|e| TransportError::MalformedMessage(e.to_string()))
    }

    pub fn from_json_str(s: &str) -> Result<Self, TransportError> {
        let payload: Value =
            serde_json::from_str(s).map_err(|e| TransportError::MalformedMessage(e.to_string()))?;
        Self::from_envelope(payload)
    }

    pub fn path(&self) -> Result<AccessPath, PatchError> {
        parse_access_path(&self.full_access_path)
    }
}

// ── Outbound ──────────────────────────────────────────────────────────────

/// A command for the server authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum Command {
    /// Change the field `name` under `parent_path` to `value`.
    SetAttribute {
        name: String,
        parent_path: String,
        value: ValueNode,
    },
    /// Invoke the server-side method `name` under `parent_path`.
    RunMethod {
        name: String,
        parent_path: String,
        #[serde(default)]
        kwargs: Map<String, Value>,
    },
}

impl Command {
    pub fn set_attribute(
        name: impl Into<String>,
        parent_path: impl Into<String>,
        value: ValueNode,
    ) -> Self {
        Command::SetAttribute {
            name: name.into(),
            parent_path: parent_path.into(),
            value,
        }
    }

    pub fn run_method(name: impl Into<String>, parent_path: impl Into<String>) -> Self {
        Command::RunMethod {
            name: name.into(),
            parent_path: parent_path.into(),
            kwargs: Map::new(),
        }
    }

    /// Build a `run_method` from a full path such as
    /// `service_hosts[2].service_proxy_list[0].start`.
    ///
    /// # Errors
    ///
    /// Fails if the path is malformed or its last segment is indexed.
    pub fn run_method_at(full_access_path: &str) -> Result<Self, PatchError> {
        let path = parse_access_path(full_access_path)?;
        if path.target().index.is_some() {
            return Err(PatchError::MalformedPath {
                path: full_access_path.to_string(),
                reason: "method name cannot carry an index".to_string(),
            });
        }
        let (name, parent_path) = split_parent(&path);
        Ok(Command::run_method(name, parent_path))
    }

    /// Build a `set_attribute` from the full path of the field to change.
    pub fn set_attribute_at(full_access_path: &str, value: ValueNode) -> Result<Self, PatchError> {
        let path = parse_access_path(full_access_path)?;
        let (name, parent_path) = split_parent(&path);
        Ok(Command::set_attribute(name, parent_path, value))
    }

    pub fn with_kwarg(mut self, key: impl Into<String>, value: Value) -> Self {
        if let Command::RunMethod { kwargs, .. } = &mut self {
            kwargs.insert(key.into(), value);
        }
        self
    }

    /// Event name the transport emits this command under.
    pub fn event_name(&self) -> &'static str {
        match self {
            Command::SetAttribute { .. } => "set_attribute",
            Command::RunMethod { .. } => "run_method",
        }
    }

    /// The event body, without the event name.
    pub fn payload(&self) -> Value {
        match self {
            Command::SetAttribute {
                name,
                parent_path,
                value,
            } => json!({
                "name": name,
                "parent_path": parent_path,
                "value": value.to_json(),
            }),
            Command::RunMethod {
                name,
                parent_path,
                kwargs,
            } => json!({
                "name": name,
                "parent_path": parent_path,
                "kwargs": kwargs,
            }),
        }
    }

    /// The addressed field as one dotted path.
    pub fn full_access_path(&self) -> String {
        let (name, parent_path) = match self {
            Command::SetAttribute {
                name, parent_path, ..
            }
            | Command::RunMethod {
                name, parent_path, ..
            } => (name, parent_path),
        };
        if parent_path.is_empty() {
            name.clone()
        } else {
            format!("{parent_path}.{name}")
        }
    }
}

fn split_parent(path: &AccessPath) -> (String, String) {
    let name = path.target().to_string();
    let parent_path = path.parent().map(|p| p.to_string()).unwrap_or_default();
    (name, parent_path)
}
