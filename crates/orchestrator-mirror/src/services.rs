//! Read-only views over the mirror for the services dashboard.
//!
//! The server exposes its fleet as
//!
//! ```text
//! service_hosts: list
//!   [i]: DataService { hostname, username, connected, service_proxy_list: list
//!          [j]: DataService { unit, state, description, tags, hostname?, username? } }
//! update_wait_time: int | null
//! ```
//!
//! Everything here reads that layout out of a [`Tree`] and builds the
//! commands the dashboard sends back. Missing or mistyped nodes are reported
//! as [`MirrorError::UnexpectedShape`].

use std::fmt;
use std::time::Duration;

use indexmap::IndexSet;
use orchestrator_state::{NodeType, Tree, ValueNode};
use serde_json::Value;

use crate::error::MirrorError;
use crate::message::Command;

const SERVICE_HOSTS: &str = "service_hosts";
const SERVICE_PROXY_LIST: &str = "service_proxy_list";
const UPDATE_WAIT_TIME: &str = "update_wait_time";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEntry {
    pub index: usize,
    pub hostname: String,
    pub username: String,
    pub connected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEntry {
    /// `service_hosts[i].service_proxy_list[j]`
    pub full_access_path: String,
    pub hostname: String,
    pub username: String,
    pub unit: String,
    pub description: String,
    pub state: UnitState,
    pub tags: Vec<String>,
}

/// Systemd unit state as reported by a service proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitState {
    Active,
    Inactive,
    Failed,
    Deactivating,
    Unknown(String),
}

impl UnitState {
    pub fn from_key(key: &str) -> Self {
        match key {
            "ACTIVE" => UnitState::Active,
            "INACTIVE" => UnitState::Inactive,
            "FAILED" => UnitState::Failed,
            "DEACTIVATING" => UnitState::Deactivating,
            other => UnitState::Unknown(other.to_string()),
        }
    }

    /// Decode an enum node. A `null` value reads as unknown.
    pub fn from_node(node: &ValueNode) -> Self {
        match node.as_str() {
            Some(key) => Self::from_key(key),
            None => UnitState::Unknown(String::new()),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            UnitState::Active => "ACTIVE",
            UnitState::Inactive => "INACTIVE",
            UnitState::Failed => "FAILED",
            UnitState::Deactivating => "DEACTIVATING",
            UnitState::Unknown(key) => key,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            UnitState::Active => "active",
            UnitState::Inactive => "inactive",
            UnitState::Failed => "failed",
            UnitState::Deactivating => "deactivating",
            UnitState::Unknown(key) => key,
        }
    }
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Extraction ────────────────────────────────────────────────────────────

fn host_list(tree: &Tree) -> Result<&[ValueNode], MirrorError> {
    let node = tree
        .fields()
        .get(SERVICE_HOSTS)
        .ok_or_else(|| MirrorError::shape(SERVICE_HOSTS, "missing"))?;
    node.value
        .as_list()
        .ok_or_else(|| MirrorError::shape(SERVICE_HOSTS, format!("expected a list, got {}", node.value)))
}

fn child<'a>(node: &'a ValueNode, path: &str, name: &str) -> Result<&'a ValueNode, MirrorError> {
    node.field(name)
        .ok_or_else(|| MirrorError::shape(format!("{path}.{name}"), "missing"))
}

fn string_field(node: &ValueNode, path: &str, name: &str) -> Result<String, MirrorError> {
    let field = child(node, path, name)?;
    match field.value.as_scalar() {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Null) => Ok(String::new()),
        _ => Err(MirrorError::shape(
            format!("{path}.{name}"),
            "expected a string",
        )),
    }
}

/// A non-empty string field, if present.
fn optional_string(node: &ValueNode, name: &str) -> Option<String> {
    node.field(name)
        .and_then(ValueNode::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// A tag is either a plain string or a `Tag` object with a `name` field.
fn tag_name(tag: &ValueNode, path: &str) -> Result<String, MirrorError> {
    if let Some(name) = tag.as_str() {
        return Ok(name.to_string());
    }
    tag.field("name")
        .and_then(ValueNode::as_str)
        .map(str::to_string)
        .ok_or_else(|| MirrorError::shape(path, "tag must be a string or carry a name"))
}

/// All hosts in list order.
pub fn hosts(tree: &Tree) -> Result<Vec<HostEntry>, MirrorError> {
    host_list(tree)?
        .iter()
        .enumerate()
        .map(|(index, host)| {
            let path = format!("{SERVICE_HOSTS}[{index}]");
            Ok(HostEntry {
                index,
                hostname: string_field(host, &path, "hostname")?,
                username: optional_string(host, "username").unwrap_or_default(),
                connected: host.field("connected").and_then(ValueNode::as_bool).unwrap_or(false),
            })
        })
        .collect()
}

/// Every service proxy of every host, host-major.
pub fn services(tree: &Tree) -> Result<Vec<ServiceEntry>, MirrorError> {
    let mut out = Vec::new();
    for (i, host) in host_list(tree)?.iter().enumerate() {
        let host_path = format!("{SERVICE_HOSTS}[{i}]");
        let host_name = string_field(host, &host_path, "hostname")?;
        let host_user = optional_string(host, "username").unwrap_or_default();

        let list = child(host, &host_path, SERVICE_PROXY_LIST)?;
        let proxies = list.value.as_list().ok_or_else(|| {
            MirrorError::shape(format!("{host_path}.{SERVICE_PROXY_LIST}"), "expected a list")
        })?;

        for (j, proxy) in proxies.iter().enumerate() {
            let path = format!("{host_path}.{SERVICE_PROXY_LIST}[{j}]");
            out.push(service_entry(proxy, path, &host_name, &host_user)?);
        }
    }
    Ok(out)
}

fn service_entry(
    proxy: &ValueNode,
    full_access_path: String,
    host_name: &str,
    host_user: &str,
) -> Result<ServiceEntry, MirrorError> {
    let path = full_access_path.as_str();
    let tags = match proxy.field("tags") {
        None => Vec::new(),
        Some(node) => {
            let items = node
                .value
                .as_list()
                .ok_or_else(|| MirrorError::shape(format!("{path}.tags"), "expected a list"))?;
            items
                .iter()
                .enumerate()
                .map(|(k, tag)| tag_name(tag, &format!("{path}.tags[{k}]")))
                .collect::<Result<_, _>>()?
        }
    };

    Ok(ServiceEntry {
        hostname: optional_string(proxy, "hostname").unwrap_or_else(|| host_name.to_string()),
        username: optional_string(proxy, "username").unwrap_or_else(|| host_user.to_string()),
        unit: string_field(proxy, path, "unit")?,
        description: optional_string(proxy, "description").unwrap_or_default(),
        state: proxy
            .field("state")
            .map(UnitState::from_node)
            .unwrap_or_else(|| UnitState::Unknown(String::new())),
        tags,
        full_access_path,
    })
}

// ── Filtering ─────────────────────────────────────────────────────────────

/// Host and tag selection. An empty set selects everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceFilter {
    pub hostnames: IndexSet<String>,
    pub tags: IndexSet<String>,
}

impl ServiceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostnames.insert(hostname.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// A service matches when it runs on a selected host and carries at
    /// least one selected tag.
    pub fn matches(&self, service: &ServiceEntry) -> bool {
        let host_ok = self.hostnames.is_empty() || self.hostnames.contains(&service.hostname);
        let tag_ok = self.tags.is_empty() || service.tags.iter().any(|t| self.tags.contains(t));
        host_ok && tag_ok
    }

    pub fn apply<'a>(&self, services: &'a [ServiceEntry]) -> Vec<&'a ServiceEntry> {
        services.iter().filter(|s| self.matches(s)).collect()
    }
}

/// Distinct hostnames, first-seen order.
pub fn all_hostnames(hosts: &[HostEntry]) -> Vec<String> {
    hosts
        .iter()
        .map(|h| h.hostname.clone())
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct tags across all services, first-seen order.
pub fn all_tags(services: &[ServiceEntry]) -> Vec<String> {
    services
        .iter()
        .flat_map(|s| s.tags.iter().cloned())
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

// ── Actions ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    Start,
    Stop,
    Restart,
}

impl ServiceAction {
    pub fn method_name(&self) -> &'static str {
        match self {
            ServiceAction::Start => "start",
            ServiceAction::Stop => "stop",
            ServiceAction::Restart => "restart",
        }
    }
}

impl ServiceEntry {
    /// The `run_method` command performing `action` on this service.
    pub fn command(&self, action: ServiceAction) -> Command {
        Command::run_method(action.method_name(), self.full_access_path.clone())
    }

    /// Unit name without the `container-` prefix podman gives generated units.
    pub fn display_name(&self) -> &str {
        self.unit.strip_prefix("container-").unwrap_or(&self.unit)
    }
}

// ── Refresh ───────────────────────────────────────────────────────────────

/// Automatic host refresh period, stored server-side in `update_wait_time`
/// as whole seconds (`null` for off).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshInterval {
    Off,
    Secs10,
    Secs30,
    Min1,
    Min5,
    Min10,
}

impl RefreshInterval {
    pub const ALL: [RefreshInterval; 6] = [
        RefreshInterval::Off,
        RefreshInterval::Secs10,
        RefreshInterval::Secs30,
        RefreshInterval::Min1,
        RefreshInterval::Min5,
        RefreshInterval::Min10,
    ];

    pub fn seconds(&self) -> Option<u64> {
        match self {
            RefreshInterval::Off => None,
            RefreshInterval::Secs10 => Some(10),
            RefreshInterval::Secs30 => Some(30),
            RefreshInterval::Min1 => Some(60),
            RefreshInterval::Min5 => Some(300),
            RefreshInterval::Min10 => Some(600),
        }
    }

    pub fn period(&self) -> Option<Duration> {
        self.seconds().map(Duration::from_secs)
    }

    pub fn label(&self) -> &'static str {
        match self {
            RefreshInterval::Off => "Off",
            RefreshInterval::Secs10 => "10s",
            RefreshInterval::Secs30 => "30s",
            RefreshInterval::Min1 => "1m",
            RefreshInterval::Min5 => "5m",
            RefreshInterval::Min10 => "10m",
        }
    }

    /// The preset matching `seconds`, if any.
    pub fn from_seconds(seconds: Option<u64>) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.seconds() == seconds)
    }

    /// The interval currently configured on the server. `Ok(None)` when the
    /// stored value is not one of the presets.
    pub fn current(tree: &Tree) -> Result<Option<Self>, MirrorError> {
        let node = tree
            .fields()
            .get(UPDATE_WAIT_TIME)
            .ok_or_else(|| MirrorError::shape(UPDATE_WAIT_TIME, "missing"))?;
        let seconds = match node.value.as_scalar() {
            Some(Value::Null) => None,
            Some(v) => Some(v.as_u64().ok_or_else(|| {
                MirrorError::shape(UPDATE_WAIT_TIME, format!("expected whole seconds, got {v}"))
            })?),
            None => {
                return Err(MirrorError::shape(
                    UPDATE_WAIT_TIME,
                    format!("expected a scalar, got {}", node.value),
                ))
            }
        };
        Ok(Self::from_seconds(seconds))
    }

    /// Commands that switch the server to this interval: store the new
    /// period, then restart the periodic host update task.
    pub fn commands(&self) -> Vec<Command> {
        let value = self.seconds().map(Value::from).unwrap_or(Value::Null);
        vec![
            Command::set_attribute(
                UPDATE_WAIT_TIME,
                "",
                ValueNode::scalar(NodeType::Int, value).with_readonly(false),
            ),
            Command::run_method("stop_update_hosts", ""),
            Command::run_method("start_update_hosts", ""),
        ]
    }
}

impl fmt::Display for RefreshInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ask the server to refresh every host once.
pub fn refresh_now() -> Command {
    Command::run_method("update", "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn str_node(s: &str) -> Value {
        json!({"type": "str", "value": s, "readonly": true, "doc": null})
    }

    fn tree_with_wait(wait: Value) -> Tree {
        Tree::from_json(json!({
            "type": "DataService",
            "value": {
                "update_wait_time": {"type": "int", "value": wait, "readonly": false, "doc": null},
                "service_hosts": {"type": "list", "value": [], "readonly": false, "doc": null}
            },
            "readonly": false,
            "doc": null
        }))
        .unwrap()
    }

    #[test]
    fn test_unit_state_keys() {
        assert_eq!(UnitState::from_key("FAILED"), UnitState::Failed);
        assert_eq!(UnitState::from_key("RELOADING").label(), "RELOADING");
        assert_eq!(UnitState::Active.to_string(), "active");
        assert_eq!(UnitState::Deactivating.key(), "DEACTIVATING");
    }

    #[test]
    fn test_tag_name_forms() {
        let plain = ValueNode::from_json(str_node("db")).unwrap();
        assert_eq!(tag_name(&plain, "t").unwrap(), "db");

        let tagged = ValueNode::from_json(json!({
            "type": "DataService",
            "value": {"name": str_node("web")},
            "readonly": false,
            "doc": null
        }))
        .unwrap();
        assert_eq!(tag_name(&tagged, "t").unwrap(), "web");

        let bad = ValueNode::scalar(NodeType::Int, json!(1));
        assert!(matches!(
            tag_name(&bad, "t"),
            Err(MirrorError::UnexpectedShape { .. })
        ));
    }

    #[test]
    fn test_refresh_interval_current() {
        assert_eq!(
            RefreshInterval::current(&tree_with_wait(json!(300))).unwrap(),
            Some(RefreshInterval::Min5)
        );
        assert_eq!(
            RefreshInterval::current(&tree_with_wait(Value::Null)).unwrap(),
            Some(RefreshInterval::Off)
        );
        assert_eq!(RefreshInterval::current(&tree_with_wait(json!(45))).unwrap(), None);
        assert!(RefreshInterval::current(&tree_with_wait(json!("soon"))).is_err());
    }

    #[test]
    fn test_refresh_interval_commands() {
        let cmds = RefreshInterval::Secs30.commands();
        assert_eq!(cmds.len(), 3);
        assert_eq!(cmds[0].event_name(), "set_attribute");
        assert_eq!(cmds[0].payload()["value"]["value"], json!(30));
        assert_eq!(cmds[0].payload()["value"]["type"], json!("int"));
        assert_eq!(cmds[1], Command::run_method("stop_update_hosts", ""));
        assert_eq!(cmds[2], Command::run_method("start_update_hosts", ""));

        let off = RefreshInterval::Off.commands();
        assert_eq!(off[0].payload()["value"]["value"], Value::Null);
    }

    #[test]
    fn test_refresh_interval_labels() {
        let labels: Vec<_> = RefreshInterval::ALL.iter().map(|i| i.label()).collect();
        assert_eq!(labels, ["Off", "10s", "30s", "1m", "5m", "10m"]);
        assert_eq!(RefreshInterval::Min1.period(), Some(Duration::from_secs(60)));
        assert_eq!(refresh_now(), Command::run_method("update", ""));
    }

    #[test]
    fn test_missing_hosts_is_shape_error() {
        let tree = Tree::from_json(json!({"type": "DataService", "value": {}, "readonly": false}))
            .unwrap();
        assert!(matches!(
            hosts(&tree),
            Err(MirrorError::UnexpectedShape { ref path, .. }) if path == "service_hosts"
        ));
    }
}
