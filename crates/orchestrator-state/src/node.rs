//! Self-describing value nodes.
//!
//! Every piece of synchronized state is a [`ValueNode`]: a type tag, a
//! payload, a read-only flag, optional documentation, and for enum kinds a
//! key → label mapping. The tag decides how the payload is decoded; it is
//! checked once when a node is built from JSON and never again by the patch
//! engine.

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::NodeError;

/// Child fields of an object node.
pub type Fields = IndexMap<String, ValueNode>;

/// Enum key → display label.
pub type EnumLabels = IndexMap<String, String>;

// ── Type tag ──────────────────────────────────────────────────────────────

/// The fixed set of wire type tags. JSON `null` (untyped) is `None` on
/// [`ValueNode::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    #[serde(rename = "str")]
    Str,
    #[serde(rename = "bool")]
    Bool,
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "int")]
    Int,
    Quantity,
    #[serde(rename = "list")]
    List,
    #[serde(rename = "method")]
    Method,
    DataService,
    DeviceConnection,
    Enum,
    NumberSlider,
    Image,
    ColouredEnum,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Str => "str",
            NodeType::Bool => "bool",
            NodeType::Float => "float",
            NodeType::Int => "int",
            NodeType::Quantity => "Quantity",
            NodeType::List => "list",
            NodeType::Method => "method",
            NodeType::DataService => "DataService",
            NodeType::DeviceConnection => "DeviceConnection",
            NodeType::Enum => "Enum",
            NodeType::NumberSlider => "NumberSlider",
            NodeType::Image => "Image",
            NodeType::ColouredEnum => "ColouredEnum",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "str" => NodeType::Str,
            "bool" => NodeType::Bool,
            "float" => NodeType::Float,
            "int" => NodeType::Int,
            "Quantity" => NodeType::Quantity,
            "list" => NodeType::List,
            "method" => NodeType::Method,
            "DataService" => NodeType::DataService,
            "DeviceConnection" => NodeType::DeviceConnection,
            "Enum" => NodeType::Enum,
            "NumberSlider" => NodeType::NumberSlider,
            "Image" => NodeType::Image,
            "ColouredEnum" => NodeType::ColouredEnum,
            _ => return None,
        })
    }

    /// Kinds whose value is a mapping of named child nodes.
    pub fn is_object(&self) -> bool {
        matches!(
            self,
            NodeType::DataService | NodeType::DeviceConnection | NodeType::NumberSlider
        )
    }

    pub fn is_list(&self) -> bool {
        matches!(self, NodeType::List)
    }

    pub fn is_enum(&self) -> bool {
        matches!(self, NodeType::Enum | NodeType::ColouredEnum)
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Payload ───────────────────────────────────────────────────────────────

/// Node payload, shaped by the node's type tag.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    /// Leaf payload, including `null`. Scalar kinds such as `Quantity` may
    /// carry structured JSON that is never interpreted as child nodes.
    Scalar(Value),
    List(Vec<ValueNode>),
    Object(Fields),
}

impl Default for NodeValue {
    fn default() -> Self {
        NodeValue::Scalar(Value::Null)
    }
}

impl NodeValue {
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            NodeValue::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ValueNode]> {
        match self {
            NodeValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut Vec<ValueNode>> {
        match self {
            NodeValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Fields> {
        match self {
            NodeValue::Object(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Fields> {
        match self {
            NodeValue::Object(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            NodeValue::Scalar(v) => v.clone(),
            NodeValue::List(items) => Value::Array(items.iter().map(ValueNode::to_json).collect()),
            NodeValue::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, node)| (k.clone(), node.to_json()))
                    .collect(),
            ),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            NodeValue::Scalar(Value::Null) => "null",
            NodeValue::Scalar(_) => "scalar",
            NodeValue::List(_) => "list",
            NodeValue::Object(_) => "object",
        }
    }
}

impl Serialize for NodeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            NodeValue::Scalar(v) => v.serialize(serializer),
            NodeValue::List(items) => items.serialize(serializer),
            NodeValue::Object(fields) => fields.serialize(serializer),
        }
    }
}

// ── Node ──────────────────────────────────────────────────────────────────

/// One node of the synchronized state tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueNode {
    /// `None` is the untyped (`null`) tag.
    pub kind: Option<NodeType>,
    pub value: NodeValue,
    /// Advisory only; enforcement belongs to the authority.
    pub readonly: bool,
    pub doc: Option<String>,
    pub enum_labels: Option<EnumLabels>,
    /// Advisory flags (`async`, `frontend_render`, ...) carried unvalidated.
    pub extra: Map<String, Value>,
}

impl ValueNode {
    /// The empty node placed in a list's append slot.
    pub fn untyped() -> Self {
        Self::default()
    }

    pub fn scalar(kind: NodeType, value: Value) -> Self {
        Self {
            kind: Some(kind),
            value: NodeValue::Scalar(value),
            ..Self::default()
        }
    }

    pub fn object(kind: NodeType, fields: impl IntoIterator<Item = (String, ValueNode)>) -> Self {
        Self {
            kind: Some(kind),
            value: NodeValue::Object(fields.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn list(items: impl IntoIterator<Item = ValueNode>) -> Self {
        Self {
            kind: Some(NodeType::List),
            value: NodeValue::List(items.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn with_readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn with_enum<K, L>(mut self, labels: impl IntoIterator<Item = (K, L)>) -> Self
    where
        K: Into<String>,
        L: Into<String>,
    {
        self.enum_labels = Some(
            labels
                .into_iter()
                .map(|(k, l)| (k.into(), l.into()))
                .collect(),
        );
        self
    }

    /// Child field `name` of an object node.
    pub fn field(&self, name: &str) -> Option<&ValueNode> {
        self.value.as_object().and_then(|fields| fields.get(name))
    }

    /// Element `index` of a list node.
    pub fn item(&self, index: usize) -> Option<&ValueNode> {
        self.value.as_list().and_then(|items| items.get(index))
    }

    pub fn as_str(&self) -> Option<&str> {
        self.value.as_scalar().and_then(Value::as_str)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.value.as_scalar().and_then(Value::as_bool)
    }

    /// Build a node from its wire JSON, validating the payload against the
    /// type tag.
    pub fn from_json(value: Value) -> Result<Self, NodeError> {
        let raw: RawNode =
            serde_json::from_value(value).map_err(|e| NodeError::Shape(e.to_string()))?;
        Self::try_from(raw)
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.to_json_fields())
    }

    /// The node's wire fields as a JSON object.
    pub fn to_json_fields(&self) -> Map<String, Value> {
        let mut out = Map::new();
        out.insert(
            "type".to_string(),
            self.kind
                .map(|k| Value::String(k.as_str().to_string()))
                .unwrap_or(Value::Null),
        );
        out.insert("value".to_string(), self.value.to_json());
        out.insert("readonly".to_string(), Value::Bool(self.readonly));
        out.insert(
            "doc".to_string(),
            self.doc.clone().map(Value::String).unwrap_or(Value::Null),
        );
        if let Some(labels) = &self.enum_labels {
            out.insert(
                "enum".to_string(),
                Value::Object(
                    labels
                        .iter()
                        .map(|(k, l)| (k.clone(), Value::String(l.clone())))
                        .collect(),
                ),
            );
        }
        for (k, v) in &self.extra {
            out.insert(k.clone(), v.clone());
        }
        out
    }
}

/// Wire form used at the decoding boundary.
#[derive(Deserialize)]
struct RawNode {
    #[serde(rename = "type", default)]
    kind: Option<NodeType>,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    readonly: bool,
    #[serde(default)]
    doc: Option<String>,
    #[serde(rename = "enum", default)]
    enum_labels: Option<EnumLabels>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TryFrom<RawNode> for ValueNode {
    type Error = NodeError;

    fn try_from(raw: RawNode) -> Result<Self, NodeError> {
        let value = match raw.kind {
            Some(kind) if kind.is_object() => match raw.value {
                Value::Object(map) => {
                    let mut fields = Fields::with_capacity(map.len());
                    for (name, child) in map {
                        let node = ValueNode::from_json(child)
                            .map_err(|e| NodeError::Shape(format!("{name}: {e}")))?;
                        fields.insert(name, node);
                    }
                    NodeValue::Object(fields)
                }
                other => {
                    return Err(NodeError::Shape(format!(
                        "{kind} expects a mapping of child nodes, found {}",
                        json_kind(&other)
                    )))
                }
            },
            Some(kind) if kind.is_list() => match raw.value {
                Value::Array(items) => {
                    let mut nodes = Vec::with_capacity(items.len());
                    for (i, item) in items.into_iter().enumerate() {
                        let node = ValueNode::from_json(item)
                            .map_err(|e| NodeError::Shape(format!("[{i}]: {e}")))?;
                        nodes.push(node);
                    }
                    NodeValue::List(nodes)
                }
                other => {
                    return Err(NodeError::Shape(format!(
                        "list expects an array, found {}",
                        json_kind(&other)
                    )))
                }
            },
            Some(kind) if kind.is_enum() && raw.enum_labels.is_none() => {
                return Err(NodeError::Shape(format!("{kind} is missing its enum labels")));
            }
            _ => NodeValue::Scalar(raw.value),
        };

        Ok(ValueNode {
            kind: raw.kind,
            value,
            readonly: raw.readonly,
            doc: raw.doc,
            enum_labels: raw.enum_labels,
            extra: raw.extra,
        })
    }
}

impl<'de> Deserialize<'de> for ValueNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawNode::deserialize(deserializer)?;
        ValueNode::try_from(raw).map_err(serde::de::Error::custom)
    }
}

impl Serialize for ValueNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", &self.kind)?;
        map.serialize_entry("value", &self.value)?;
        map.serialize_entry("readonly", &self.readonly)?;
        map.serialize_entry("doc", &self.doc)?;
        if let Some(labels) = &self.enum_labels {
            map.serialize_entry("enum", labels)?;
        }
        for (k, v) in &self.extra {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ── Patch ─────────────────────────────────────────────────────────────────

/// A partial node: only the wire fields present here are written onto the
/// target.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodePatch {
    fields: Map<String, Value>,
}

impl NodePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Set one wire field (`"type"`, `"value"`, `"readonly"`, ...).
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Overwrite the target's fields with the ones present in this patch.
    ///
    /// This is a plain field merge: the type tag is not checked against the
    /// payload. A patched `value` becomes child nodes only when the resulting
    /// tag is an object or list kind and the JSON decodes as such; anything
    /// else is kept as a scalar. Fails only when a wire field cannot be
    /// represented at all (an unknown tag, a non-boolean `readonly`, ...),
    /// in which case the target is left untouched.
    pub fn merge_into(&self, target: &mut ValueNode) -> Result<(), NodeError> {
        let mut kind = None;
        let mut readonly = None;
        let mut doc = None;
        let mut enum_labels = None;
        for (key, v) in &self.fields {
            match key.as_str() {
                "type" => kind = Some(patched_kind(v)?),
                "readonly" => readonly = Some(patched_readonly(v)?),
                "doc" => doc = Some(patched_doc(v)?),
                "enum" => enum_labels = Some(patched_labels(v)?),
                _ => {}
            }
        }

        let retyped = kind.is_some();
        if let Some(kind) = kind {
            target.kind = kind;
        }
        if let Some(readonly) = readonly {
            target.readonly = readonly;
        }
        if let Some(doc) = doc {
            target.doc = doc;
        }
        if let Some(labels) = enum_labels {
            target.enum_labels = labels;
        }
        for (key, v) in &self.fields {
            if !matches!(key.as_str(), "type" | "value" | "readonly" | "doc" | "enum") {
                target.extra.insert(key.clone(), v.clone());
            }
        }

        if let Some(value) = self.fields.get("value") {
            target.value = shape_value(target.kind, value);
        } else if retyped {
            if let NodeValue::Scalar(current) = &target.value {
                target.value = shape_value(target.kind, current);
            }
        }
        Ok(())
    }
}

fn patched_kind(v: &Value) -> Result<Option<NodeType>, NodeError> {
    match v {
        Value::Null => Ok(None),
        Value::String(s) => NodeType::parse(s)
            .map(Some)
            .ok_or_else(|| NodeError::Field(format!("unknown type tag '{s}'"))),
        other => Err(NodeError::Field(format!(
            "type must be a string or null, found {}",
            json_kind(other)
        ))),
    }
}

/// `null` reads as the wire default, `false`.
fn patched_readonly(v: &Value) -> Result<bool, NodeError> {
    match v {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(*b),
        other => Err(NodeError::Field(format!(
            "readonly must be a boolean, found {}",
            json_kind(other)
        ))),
    }
}

fn patched_doc(v: &Value) -> Result<Option<String>, NodeError> {
    match v {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        other => Err(NodeError::Field(format!(
            "doc must be a string or null, found {}",
            json_kind(other)
        ))),
    }
}

fn patched_labels(v: &Value) -> Result<Option<EnumLabels>, NodeError> {
    match v {
        Value::Null => Ok(None),
        Value::Object(map) => map
            .iter()
            .map(|(k, l)| match l {
                Value::String(l) => Ok((k.clone(), l.clone())),
                other => Err(NodeError::Field(format!(
                    "enum label for '{k}' must be a string, found {}",
                    json_kind(other)
                ))),
            })
            .collect::<Result<EnumLabels, _>>()
            .map(Some),
        other => Err(NodeError::Field(format!(
            "enum must be a mapping or null, found {}",
            json_kind(other)
        ))),
    }
}

/// Payload for a patched value under `kind`. Children are decoded only
/// when the tag asks for them and every child decodes; otherwise the JSON
/// is kept verbatim as a scalar.
fn shape_value(kind: Option<NodeType>, value: &Value) -> NodeValue {
    let shaped = match (kind, value) {
        (Some(k), Value::Object(map)) if k.is_object() => map
            .iter()
            .map(|(name, child)| Ok((name.clone(), ValueNode::deserialize(child)?)))
            .collect::<Result<Fields, serde_json::Error>>()
            .map(NodeValue::Object)
            .ok(),
        (Some(k), Value::Array(items)) if k.is_list() => items
            .iter()
            .map(|item| ValueNode::deserialize(item))
            .collect::<Result<Vec<_>, serde_json::Error>>()
            .map(NodeValue::List)
            .ok(),
        _ => None,
    };
    shaped.unwrap_or_else(|| NodeValue::Scalar(value.clone()))
}

impl From<&ValueNode> for NodePatch {
    fn from(node: &ValueNode) -> Self {
        Self {
            fields: node.to_json_fields(),
        }
    }
}

impl From<ValueNode> for NodePatch {
    fn from(node: ValueNode) -> Self {
        Self::from(&node)
    }
}

impl std::fmt::Display for NodeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_data_service() {
        let node: ValueNode = serde_json::from_value(json!({
            "type": "DataService",
            "value": {
                "hostname": {"type": "str", "value": "alpha", "readonly": true, "doc": null},
                "connected": {"type": "bool", "value": true, "readonly": true, "doc": null}
            },
            "readonly": false,
            "doc": "A host"
        }))
        .unwrap();

        assert_eq!(node.kind, Some(NodeType::DataService));
        assert_eq!(node.doc.as_deref(), Some("A host"));
        assert_eq!(node.field("hostname").and_then(ValueNode::as_str), Some("alpha"));
        assert_eq!(node.field("connected").and_then(ValueNode::as_bool), Some(true));
    }

    #[test]
    fn test_quantity_stays_scalar() {
        let node = ValueNode::from_json(json!({
            "type": "Quantity",
            "value": {"magnitude": 1.5, "unit": "s"},
            "readonly": false
        }))
        .unwrap();
        assert_eq!(
            node.value,
            NodeValue::Scalar(json!({"magnitude": 1.5, "unit": "s"}))
        );
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let err = ValueNode::from_json(json!({"type": "list", "value": 3, "readonly": false}))
            .unwrap_err();
        assert!(matches!(err, NodeError::Shape(_)));

        let err =
            ValueNode::from_json(json!({"type": "DataService", "value": [], "readonly": false}))
                .unwrap_err();
        assert!(err.to_string().contains("DataService"));

        let err = ValueNode::from_json(json!({"type": "Enum", "value": "A", "readonly": false}))
            .unwrap_err();
        assert!(err.to_string().contains("enum labels"));
    }

    #[test]
    fn test_unknown_tag_rejected() {
        assert!(ValueNode::from_json(json!({"type": "Banana", "value": 1})).is_err());
    }

    #[test]
    fn test_untyped_defaults() {
        let node = ValueNode::from_json(json!({"type": null})).unwrap();
        assert_eq!(node, ValueNode::untyped());
    }

    #[test]
    fn test_advisory_flags_roundtrip() {
        let wire = json!({
            "type": "method",
            "value": null,
            "readonly": true,
            "doc": "Start the unit",
            "async": false,
            "frontend_render": true
        });
        let node = ValueNode::from_json(wire.clone()).unwrap();
        assert_eq!(node.extra.get("frontend_render"), Some(&json!(true)));
        assert_eq!(serde_json::to_value(&node).unwrap(), wire);
        assert_eq!(node.to_json(), wire);
    }

    #[test]
    fn test_enum_labels() {
        let node = ValueNode::scalar(NodeType::Enum, json!("ACTIVE"))
            .with_enum([("ACTIVE", "active"), ("FAILED", "failed")]);
        let json = node.to_json();
        assert_eq!(json["enum"], json!({"ACTIVE": "active", "FAILED": "failed"}));
        assert_eq!(ValueNode::from_json(json).unwrap(), node);
    }

    #[test]
    fn test_object_equality_ignores_order() {
        let a = ValueNode::object(
            NodeType::DataService,
            [
                ("x".to_string(), ValueNode::scalar(NodeType::Int, json!(1))),
                ("y".to_string(), ValueNode::scalar(NodeType::Int, json!(2))),
            ],
        );
        let b = ValueNode::object(
            NodeType::DataService,
            [
                ("y".to_string(), ValueNode::scalar(NodeType::Int, json!(2))),
                ("x".to_string(), ValueNode::scalar(NodeType::Int, json!(1))),
            ],
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_patch_merges_present_fields_only() {
        let mut node = ValueNode::scalar(NodeType::Int, json!(1)).with_doc("counter");
        let patch = NodePatch::new().with("value", json!(7));
        patch.merge_into(&mut node).unwrap();
        assert_eq!(node.value, NodeValue::Scalar(json!(7)));
        assert_eq!(node.doc.as_deref(), Some("counter"));
        assert_eq!(node.kind, Some(NodeType::Int));
    }

    #[test]
    fn test_patch_retypes_untyped_slot() {
        let mut node = ValueNode::untyped();
        let patch = NodePatch::from(ValueNode::list([ValueNode::scalar(
            NodeType::Str,
            json!("web"),
        )]));
        patch.merge_into(&mut node).unwrap();
        assert_eq!(node.item(0).and_then(ValueNode::as_str), Some("web"));
    }

    #[test]
    fn test_merge_does_not_check_tag_against_value() {
        let mut node = ValueNode::scalar(NodeType::Int, json!(1));
        NodePatch::new()
            .with("type", json!("list"))
            .merge_into(&mut node)
            .unwrap();
        assert_eq!(node.kind, Some(NodeType::List));
        assert_eq!(node.value, NodeValue::Scalar(json!(1)));

        let mut slot = ValueNode::untyped();
        NodePatch::new()
            .with("type", json!("Enum"))
            .with("value", json!("A"))
            .merge_into(&mut slot)
            .unwrap();
        assert_eq!(slot.kind, Some(NodeType::Enum));
        assert_eq!(slot.as_str(), Some("A"));
        assert!(slot.enum_labels.is_none());

        let mut service = ValueNode::untyped();
        NodePatch::new()
            .with("type", json!("DataService"))
            .with("value", json!(3))
            .merge_into(&mut service)
            .unwrap();
        assert_eq!(service.value, NodeValue::Scalar(json!(3)));
    }

    #[test]
    fn test_merge_null_readonly_and_extra_flags() {
        let mut node = ValueNode::scalar(NodeType::Int, json!(1)).with_readonly(true);
        NodePatch::new()
            .with("readonly", Value::Null)
            .with("async", json!(true))
            .merge_into(&mut node)
            .unwrap();
        assert!(!node.readonly);
        assert_eq!(node.extra.get("async"), Some(&json!(true)));
        assert_eq!(node.value, NodeValue::Scalar(json!(1)));
    }

    #[test]
    fn test_merge_retype_decodes_scalar_payload() {
        let mut node = ValueNode {
            value: NodeValue::Scalar(json!([{"type": "int", "value": 4, "readonly": false}])),
            ..ValueNode::untyped()
        };
        NodePatch::new()
            .with("type", json!("list"))
            .merge_into(&mut node)
            .unwrap();
        assert_eq!(node.item(0).and_then(|n| n.value.as_scalar()), Some(&json!(4)));
    }

    #[test]
    fn test_unrepresentable_field_leaves_target() {
        let mut node = ValueNode::scalar(NodeType::Int, json!(1)).with_doc("counter");
        let before = node.clone();
        let patch = NodePatch::new()
            .with("doc", json!("changed"))
            .with("type", json!("Widget"));
        assert!(matches!(
            patch.merge_into(&mut node),
            Err(NodeError::Field(_))
        ));
        assert_eq!(node, before);
    }
}
