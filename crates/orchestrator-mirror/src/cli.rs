//! Shared logic behind the `mirror-*` binaries.
//!
//! - `mirror-replay`: apply a recorded event stream to a snapshot
//! - `mirror-get`: look up one node of a snapshot by access path
//! - `mirror-services`: tabulate the services of a snapshot

use orchestrator_state::{find, parse_access_path, Tree};
use serde_json::Value;

use crate::config::MirrorConfig;
use crate::error::{MirrorError, TransportError};
use crate::message::NotifyMessage;
use crate::services::{self, ServiceFilter};
use crate::session::{MirrorSession, MirrorUpdate, SessionStats};
use crate::transport::{MemoryTransport, TransportEvent};

const REPLAY_CONNECTION: &str = "replay";

// ── mirror-replay ─────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct ReplayReport {
    /// The final mirror, or `None` if no snapshot was ever installed.
    pub mirror: Option<Tree>,
    pub stats: SessionStats,
    /// One entry per event line, in order.
    pub updates: Vec<MirrorUpdate>,
}

/// Decode one line of a recorded event stream.
///
/// A line is either a named event `{"event": "notify", "data": {...}}` or a
/// bare notification `{"full_access_path": ..., "value": ...}`.
pub fn parse_event_line(line: &str) -> Result<TransportEvent, TransportError> {
    let value: Value =
        serde_json::from_str(line).map_err(|e| TransportError::MalformedMessage(e.to_string()))?;
    match value {
        Value::Object(mut obj) if obj.contains_key("event") => {
            let event = obj
                .remove("event")
                .and_then(|e| e.as_str().map(str::to_string))
                .ok_or_else(|| {
                    TransportError::MalformedMessage("event name must be a string".to_string())
                })?;
            let data = obj.remove("data").unwrap_or(Value::Null);
            TransportEvent::from_named(&event, data)
        }
        other => NotifyMessage::from_envelope(other).map(TransportEvent::Notify),
    }
}

/// Connect a fresh session to `snapshot_json`, then feed it every line of
/// `events`. Blank lines and `#` comments are skipped. A `connect` event
/// re-installs the same snapshot.
pub fn replay(
    config: &MirrorConfig,
    snapshot_json: &str,
    events: &str,
) -> Result<ReplayReport, MirrorError> {
    let snapshot: Tree = serde_json::from_str(snapshot_json)?;
    let transport = MemoryTransport::with_snapshot(snapshot);
    let mut session = MirrorSession::with_config(config);
    session.connect(REPLAY_CONNECTION, &transport);

    let mut updates = Vec::new();
    for (n, line) in events.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let event = parse_event_line(line).map_err(|source| MirrorError::Replay {
            line: n + 1,
            source,
        })?;
        updates.push(session.handle(event, &transport));
    }

    Ok(ReplayReport {
        mirror: session.mirror().cloned(),
        stats: session.stats().clone(),
        updates,
    })
}

// ── mirror-get ────────────────────────────────────────────────────────────

/// The node at `path` in `snapshot_json`, pretty-printed.
pub fn lookup(snapshot_json: &str, path: &str) -> Result<String, MirrorError> {
    let tree: Tree = serde_json::from_str(snapshot_json)?;
    let path = parse_access_path(path)?;
    let node = find(&tree, &path)?;
    Ok(serde_json::to_string_pretty(node)?)
}

// ── mirror-services ───────────────────────────────────────────────────────

/// One line per service, tab-separated:
/// `path  hostname  name  state  tags`.
pub fn list_services(snapshot_json: &str, filter: &ServiceFilter) -> Result<String, MirrorError> {
    let tree: Tree = serde_json::from_str(snapshot_json)?;
    let all = services::services(&tree)?;
    let mut out = String::new();
    for service in filter.apply(&all) {
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\n",
            service.full_access_path,
            service.hostname,
            service.display_name(),
            service.state,
            service.tags.join(",")
        ));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot() -> String {
        json!({
            "type": "DataService",
            "value": {
                "update_wait_time": {"type": "int", "value": 30, "readonly": false, "doc": null}
            },
            "readonly": false,
            "doc": null
        })
        .to_string()
    }

    #[test]
    fn test_parse_event_line_forms() {
        assert_eq!(
            parse_event_line(r#"{"event": "disconnect"}"#).unwrap(),
            TransportEvent::Disconnected
        );
        assert!(matches!(
            parse_event_line(r#"{"full_access_path": "a", "value": {}}"#).unwrap(),
            TransportEvent::Notify(_)
        ));
        assert!(parse_event_line(r#"{"event": 3}"#).is_err());
        assert!(parse_event_line("[1, 2]").is_err());
    }

    #[test]
    fn test_replay_counts() {
        let events = r#"
# first tick
{"event": "notify", "data": {"data": {"full_access_path": "update_wait_time", "value": {"value": 10}}}}
{"full_access_path": "nope", "value": {"value": 1}}
{"full_access_path": "update_wait_time", "value": {"value": 600}}
"#;
        let report = replay(&MirrorConfig::default(), &snapshot(), events).unwrap();
        assert_eq!(report.stats.snapshots, 1);
        assert_eq!(report.stats.applied, 2);
        assert_eq!(report.stats.rejected, 1);
        assert_eq!(report.updates.len(), 3);
        let mirror = report.mirror.unwrap();
        assert_eq!(
            mirror.fields()["update_wait_time"].value.as_scalar(),
            Some(&json!(600))
        );
    }

    #[test]
    fn test_replay_reports_bad_line() {
        let err = replay(&MirrorConfig::default(), &snapshot(), "\n{not json}\n").unwrap_err();
        assert!(matches!(err, MirrorError::Replay { line: 2, .. }));
    }

    #[test]
    fn test_lookup() {
        let out = lookup(&snapshot(), "update_wait_time").unwrap();
        let node: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(node["value"], json!(30));
        assert!(matches!(
            lookup(&snapshot(), "missing"),
            Err(MirrorError::Patch(_))
        ));
        assert!(lookup(&snapshot(), "a..b").is_err());
    }
}
