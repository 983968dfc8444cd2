//! Live state tree for the service orchestrator dashboard.
//!
//! The server describes its whole state as a tree of self-describing
//! [`ValueNode`]s and then sends single-node patches addressed by dotted,
//! optionally indexed paths (`service_hosts[0].service_proxy_list[3].state`).
//! This crate holds the tree model, the path parser and the patch engine.
//!
//! # Example
//!
//! ```
//! use orchestrator_state::{apply, NodePatch, Tree};
//! use serde_json::json;
//!
//! let tree = Tree::from_json(json!({
//!     "type": "DataService",
//!     "value": {
//!         "update_wait_time": {"type": "int", "value": 30, "readonly": false, "doc": null}
//!     },
//!     "readonly": false,
//!     "doc": null
//! })).unwrap();
//!
//! let patch = NodePatch::new().with("value", json!(60));
//! let next = apply(&tree, "update_wait_time", &patch).unwrap();
//!
//! assert_eq!(next.fields()["update_wait_time"].value.as_scalar(), Some(&json!(60)));
//! // The input tree is untouched.
//! assert_eq!(tree.fields()["update_wait_time"].value.as_scalar(), Some(&json!(30)));
//! ```

pub mod apply;
pub mod error;
pub mod node;
pub mod path;
pub mod tree;
pub mod validate;

pub use apply::{apply, apply_at, find, get};
pub use error::{NodeError, PatchError};
pub use node::{EnumLabels, Fields, NodePatch, NodeType, NodeValue, ValueNode};
pub use path::{is_child, parse_access_path, AccessPath, PathSegment};
pub use tree::Tree;
pub use validate::{validate_access_path, MAX_PATH_DEPTH, MAX_PATH_LENGTH};
