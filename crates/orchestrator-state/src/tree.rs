//! The mirrored state tree.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::NodeError;
use crate::node::{Fields, NodeValue, ValueNode};

/// A whole snapshot of server state: a root node whose value is a mapping
/// of child nodes.
///
/// Trees are values. Patching produces a new tree and leaves the old one
/// as it was.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    root: ValueNode,
}

impl Tree {
    pub fn new(root: ValueNode) -> Result<Self, NodeError> {
        if matches!(root.value, NodeValue::Object(_)) {
            Ok(Self { root })
        } else {
            Err(NodeError::RootNotObject(root.value.to_string()))
        }
    }

    pub fn from_json(value: Value) -> Result<Self, NodeError> {
        Self::new(ValueNode::from_json(value)?)
    }

    pub fn to_json(&self) -> Value {
        self.root.to_json()
    }

    pub fn root(&self) -> &ValueNode {
        &self.root
    }

    pub fn into_root(self) -> ValueNode {
        self.root
    }

    /// Top-level fields of the root node.
    pub fn fields(&self) -> &Fields {
        match &self.root.value {
            NodeValue::Object(fields) => fields,
            // Tree::new only admits object roots.
            _ => unreachable!("tree root is always an object"),
        }
    }

    pub(crate) fn fields_mut(&mut self) -> &mut Fields {
        match &mut self.root.value {
            NodeValue::Object(fields) => fields,
            _ => unreachable!("tree root is always an object"),
        }
    }
}

impl Serialize for Tree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.root.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Tree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let root = ValueNode::deserialize(deserializer)?;
        Tree::new(root).map_err(serde::de::Error::custom)
    }
}
