//! Client-side live mirror of orchestrator state.
//!
//! A [`MirrorSession`] connects through a transport, installs the server's
//! full snapshot and keeps it current by applying `notify` patches in
//! delivery order. When the link drops the mirror freezes at its last known
//! state until the next connect replaces it. Commands travel the other way
//! and are only sent while the link is live.
//!
//! The [`services`] module reads the dashboard's host and service tables out
//! of the mirror and builds the matching start, stop, restart and refresh
//! commands.
//!
//! # Example
//!
//! ```
//! use orchestrator_mirror::{MemoryTransport, MirrorSession, MirrorUpdate, NotifyMessage, TransportEvent};
//! use orchestrator_state::{NodePatch, Tree};
//! use serde_json::json;
//!
//! let snapshot = Tree::from_json(json!({
//!     "type": "DataService",
//!     "value": {"update_wait_time": {"type": "int", "value": 30, "readonly": false, "doc": null}},
//!     "readonly": false,
//!     "doc": null
//! })).unwrap();
//! let transport = MemoryTransport::with_snapshot(snapshot);
//!
//! let mut session = MirrorSession::new();
//! session.handle(TransportEvent::Connected { connection_id: "c1".into() }, &transport);
//!
//! let patch = NodePatch::new().with("value", json!(60));
//! let update = session.handle(
//!     TransportEvent::Notify(NotifyMessage::new("update_wait_time", patch)),
//!     &transport,
//! );
//! assert!(matches!(update, MirrorUpdate::Patched { .. }));
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod message;
pub mod services;
pub mod session;
pub mod transport;

pub use config::{MirrorConfig, SERVER_URL_ENV};
pub use error::{ConfigError, MirrorError, TransportError};
pub use message::{Ack, Command, NotifyMessage};
pub use services::{
    all_hostnames, all_tags, hosts, refresh_now, services, HostEntry, RefreshInterval,
    ServiceAction, ServiceEntry, ServiceFilter, UnitState,
};
pub use session::{ConnectionStatus, Link, MirrorSession, MirrorUpdate, SessionStats};
pub use transport::{CommandSink, MemoryTransport, SnapshotSource, TransportEvent};
