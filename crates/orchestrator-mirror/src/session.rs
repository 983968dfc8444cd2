//! The client-side mirror and its connection lifecycle.
//!
//! ```text
//! Connecting ──connect──▶ Live ──disconnect──▶ Frozen ──connect──▶ Live
//!                          ▲  │ notify                 │ notify
//!                          └──┘ (patch mirror)         └ (patch frozen mirror)
//! ```
//!
//! Events are handled one at a time, in delivery order. A connect installs
//! a fresh snapshot wholesale; every notify is applied to the latest
//! mirror. A patch that cannot be applied is logged and the mirror stays as
//! it was.

use std::time::{Duration, Instant};

use orchestrator_state::{apply, PatchError, Tree};

use crate::config::MirrorConfig;
use crate::error::{MirrorError, TransportError};
use crate::message::{Ack, Command, NotifyMessage};
use crate::transport::{CommandSink, SnapshotSource, TransportEvent};

/// State of the link to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Link {
    /// No connection has been established yet.
    Connecting,
    Live { connection_id: String },
    /// The link dropped; the mirror holds the last known state.
    Frozen { since: Instant },
}

/// User-facing connection status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected,
    Reconnecting,
}

impl ConnectionStatus {
    pub fn message(&self) -> &'static str {
        match self {
            ConnectionStatus::Connecting => "Connecting...",
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Disconnected => "Disconnected",
            ConnectionStatus::Reconnecting => "Reconnecting...",
        }
    }
}

/// What handling one event did to the mirror.
#[derive(Debug, Clone, PartialEq)]
pub enum MirrorUpdate {
    /// A full snapshot replaced the mirror.
    Replaced,
    Patched { path: String },
    /// The patch failed; the previous mirror is kept.
    Rejected { path: String, error: PatchError },
    /// No snapshot is installed yet, so the patch had nothing to apply to.
    Dropped { path: String },
    Frozen,
    /// The snapshot fetch failed; the previous mirror is kept, frozen.
    SnapshotFailed(TransportError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub snapshots: u64,
    pub applied: u64,
    pub rejected: u64,
    pub dropped: u64,
}

#[derive(Debug)]
pub struct MirrorSession {
    mirror: Option<Tree>,
    link: Link,
    stats: SessionStats,
    reconnect_grace: Duration,
}

impl Default for MirrorSession {
    fn default() -> Self {
        Self::new()
    }
}

impl MirrorSession {
    pub fn new() -> Self {
        Self::with_config(&MirrorConfig::default())
    }

    pub fn with_config(config: &MirrorConfig) -> Self {
        Self {
            mirror: None,
            link: Link::Connecting,
            stats: SessionStats::default(),
            reconnect_grace: config.reconnect_grace(),
        }
    }

    pub fn mirror(&self) -> Option<&Tree> {
        self.mirror.as_ref()
    }

    pub fn link(&self) -> &Link {
        &self.link
    }

    pub fn is_live(&self) -> bool {
        matches!(self.link, Link::Live { .. })
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Handle one transport event.
    pub fn handle<S>(&mut self, event: TransportEvent, source: &S) -> MirrorUpdate
    where
        S: SnapshotSource + ?Sized,
    {
        match event {
            TransportEvent::Connected { connection_id } => self.connect(&connection_id, source),
            TransportEvent::Disconnected => self.disconnect(),
            TransportEvent::Notify(msg) => self.apply_notification(&msg),
        }
    }

    /// Fetch the snapshot for `connection_id` and install it.
    pub fn connect<S>(&mut self, connection_id: &str, source: &S) -> MirrorUpdate
    where
        S: SnapshotSource + ?Sized,
    {
        match source.fetch_snapshot(connection_id) {
            Ok(tree) => {
                log::info!("connected as '{connection_id}', snapshot installed");
                self.install_snapshot(tree);
                self.link = Link::Live {
                    connection_id: connection_id.to_string(),
                };
                MirrorUpdate::Replaced
            }
            Err(e) => {
                log::warn!("snapshot fetch for '{connection_id}' failed: {e}");
                if !matches!(self.link, Link::Frozen { .. }) {
                    self.link = Link::Frozen {
                        since: Instant::now(),
                    };
                }
                MirrorUpdate::SnapshotFailed(e)
            }
        }
    }

    pub fn disconnect(&mut self) -> MirrorUpdate {
        self.disconnect_at(Instant::now())
    }

    pub fn disconnect_at(&mut self, now: Instant) -> MirrorUpdate {
        if !matches!(self.link, Link::Frozen { .. }) {
            log::info!("link dropped, mirror frozen");
            self.link = Link::Frozen { since: now };
        }
        MirrorUpdate::Frozen
    }

    /// Replace the mirror wholesale.
    pub fn install_snapshot(&mut self, tree: Tree) {
        self.stats.snapshots += 1;
        self.mirror = Some(tree);
    }

    /// Apply one patch notification to the latest mirror.
    pub fn apply_notification(&mut self, msg: &NotifyMessage) -> MirrorUpdate {
        let path = msg.full_access_path.clone();
        let Some(current) = &self.mirror else {
            log::warn!("dropping patch for '{path}': no snapshot installed");
            self.stats.dropped += 1;
            return MirrorUpdate::Dropped { path };
        };

        match apply(current, &path, &msg.value) {
            Ok(next) => {
                log::debug!("patched '{path}'");
                self.mirror = Some(next);
                self.stats.applied += 1;
                MirrorUpdate::Patched { path }
            }
            Err(error) => {
                log::warn!("failed to apply patch for '{path}': {error}");
                self.stats.rejected += 1;
                MirrorUpdate::Rejected { path, error }
            }
        }
    }

    /// Emit a command. Only a live session sends; a frozen or connecting
    /// one refuses so the user never acts on state the server cannot see.
    pub fn send<C>(&self, command: &Command, sink: &C) -> Result<Option<Ack>, MirrorError>
    where
        C: CommandSink + ?Sized,
    {
        if !self.is_live() {
            log::warn!(
                "not sending {} for '{}': link is not live",
                command.event_name(),
                command.full_access_path()
            );
            return Err(MirrorError::NotConnected(command.event_name().to_string()));
        }
        log::debug!(
            "sending {} for '{}'",
            command.event_name(),
            command.full_access_path()
        );
        Ok(sink.emit(command)?)
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status_at(Instant::now())
    }

    /// Status as of `now`: a dropped link reads as disconnected for the
    /// grace period, then as reconnecting.
    pub fn status_at(&self, now: Instant) -> ConnectionStatus {
        match &self.link {
            Link::Connecting => ConnectionStatus::Connecting,
            Link::Live { .. } => ConnectionStatus::Connected,
            Link::Frozen { since } => {
                if now.saturating_duration_since(*since) < self.reconnect_grace {
                    ConnectionStatus::Disconnected
                } else {
                    ConnectionStatus::Reconnecting
                }
            }
        }
    }
}
