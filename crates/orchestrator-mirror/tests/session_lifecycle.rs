use std::time::{Duration, Instant};

use orchestrator_mirror::{
    Command, ConnectionStatus, MemoryTransport, MirrorConfig, MirrorError, MirrorSession,
    MirrorUpdate, NotifyMessage, RefreshInterval, TransportEvent,
};
use orchestrator_state::{apply, NodePatch, Tree};
use proptest::prelude::*;
use serde_json::json;

fn snapshot(total: i64) -> Tree {
    Tree::from_json(json!({
        "type": "DataService",
        "value": {
            "total": {"type": "int", "value": total, "readonly": false, "doc": null},
            "update_wait_time": {"type": "int", "value": null, "readonly": false, "doc": null},
            "items": {"type": "list", "value": [], "readonly": false, "doc": null}
        },
        "readonly": false,
        "doc": null
    }))
    .unwrap()
}

fn connected(id: &str) -> TransportEvent {
    TransportEvent::Connected {
        connection_id: id.to_string(),
    }
}

fn notify(path: &str, value: serde_json::Value) -> NotifyMessage {
    NotifyMessage::new(
        path,
        NodePatch::new()
            .with("type", json!("int"))
            .with("value", value),
    )
}

#[test]
fn full_lifecycle() {
    let config = MirrorConfig {
        reconnect_grace_ms: 100,
        ..MirrorConfig::default()
    };
    let transport = MemoryTransport::with_snapshot(snapshot(0));
    let mut session = MirrorSession::with_config(&config);

    // Patches before the first snapshot have nothing to land on.
    let early = session.handle(TransportEvent::Notify(notify("total", json!(9))), &transport);
    assert!(matches!(early, MirrorUpdate::Dropped { .. }));

    session.handle(connected("c1"), &transport);
    for (i, v) in [1, 2, 3].into_iter().enumerate() {
        let msg = notify(&format!("items[{i}]"), json!(v));
        assert!(matches!(
            session.handle(TransportEvent::Notify(msg), &transport),
            MirrorUpdate::Patched { .. }
        ));
    }
    let rejected = session.handle(TransportEvent::Notify(notify("items[4]", json!(5))), &transport);
    assert!(matches!(rejected, MirrorUpdate::Rejected { .. }));

    let items = session.mirror().unwrap().fields()["items"].value.as_list().unwrap().len();
    assert_eq!(items, 3);

    // Frozen: state is kept, commands are refused, patches still apply.
    let dropped_at = Instant::now();
    session.disconnect_at(dropped_at);
    assert_eq!(session.status_at(dropped_at), ConnectionStatus::Disconnected);
    assert_eq!(
        session.status_at(dropped_at + Duration::from_millis(150)),
        ConnectionStatus::Reconnecting
    );
    assert!(matches!(
        session.send(&Command::run_method("update", ""), &transport),
        Err(MirrorError::NotConnected(_))
    ));
    session.handle(TransportEvent::Notify(notify("total", json!(7))), &transport);
    assert_eq!(
        session.mirror().unwrap().fields()["total"].value.as_scalar(),
        Some(&json!(7))
    );

    // Reconnect replaces the mirror wholesale with the fresh snapshot.
    transport.set_snapshot(snapshot(100));
    session.handle(connected("c2"), &transport);
    let mirror = session.mirror().unwrap();
    assert_eq!(mirror.fields()["total"].value.as_scalar(), Some(&json!(100)));
    assert!(mirror.fields()["items"].value.as_list().unwrap().is_empty());

    let stats = session.stats();
    assert_eq!(
        (stats.snapshots, stats.applied, stats.rejected, stats.dropped),
        (2, 4, 1, 1)
    );
    assert_eq!(transport.fetches(), ["c1", "c2"]);
}

#[test]
fn refresh_commands_go_out_in_order() {
    let transport = MemoryTransport::with_snapshot(snapshot(0));
    let mut session = MirrorSession::new();
    session.handle(connected("c1"), &transport);

    let current = RefreshInterval::current(session.mirror().unwrap()).unwrap();
    assert_eq!(current, Some(RefreshInterval::Off));

    for cmd in RefreshInterval::Min5.commands() {
        session.send(&cmd, &transport).unwrap();
    }
    let sent: Vec<_> = transport.sent().iter().map(Command::event_name).collect();
    assert_eq!(sent, ["set_attribute", "run_method", "run_method"]);
}

proptest! {
    /// The session's mirror equals a plain left fold of `apply` over the
    /// same patches, skipping failures.
    #[test]
    fn session_matches_sequential_fold(
        ops in prop::collection::vec((0usize..3, 0usize..4, -50i64..50), 0..24)
    ) {
        let transport = MemoryTransport::with_snapshot(snapshot(0));
        let mut session = MirrorSession::new();
        session.handle(connected("p"), &transport);

        let mut expected = snapshot(0);
        for (kind, index, v) in ops {
            let path = match kind {
                0 => "total".to_string(),
                1 => format!("items[{index}]"),
                _ => "missing".to_string(),
            };
            let msg = notify(&path, json!(v));
            if let Ok(next) = apply(&expected, &msg.full_access_path, &msg.value) {
                expected = next;
            }
            session.handle(TransportEvent::Notify(msg), &transport);
        }

        prop_assert_eq!(session.mirror(), Some(&expected));
    }
}
