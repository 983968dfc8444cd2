//! Path-addressed patching of a [`Tree`].
//!
//! [`apply`] deep-copies the tree, walks the traversal prefix strictly,
//! resolves the target (allowing a list to grow by exactly one element),
//! merges the patch fields into the target and returns the copy. Any
//! failure returns an error and the caller keeps its tree.

use crate::error::PatchError;
use crate::node::{Fields, NodePatch, NodeValue, ValueNode};
use crate::path::{parse_access_path, AccessPath, PathSegment};
use crate::tree::Tree;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Growth {
    Forbid,
    AppendSlot,
}

/// Apply `patch` to the node at `path`, returning the patched copy.
///
/// # Errors
///
/// Returns a [`PatchError`] naming the offending segment if the path is
/// malformed, a traversal step does not exist, an index is out of range
/// (other than the single append slot on the target), or the merged node
/// fails validation. `tree` is never modified.
///
/// # Example
///
/// ```
/// use orchestrator_state::{apply, NodePatch, Tree};
/// use serde_json::json;
///
/// let tree = Tree::from_json(json!({
///     "type": "DataService",
///     "value": {
///         "items": {"type": "list", "value": [
///             {"type": "int", "value": 1, "readonly": false}
///         ], "readonly": false}
///     },
///     "readonly": false
/// })).unwrap();
///
/// let patch = NodePatch::new()
///     .with("type", json!("int"))
///     .with("value", json!(2))
///     .with("readonly", json!(false));
/// let next = apply(&tree, "items[1]", &patch).unwrap();
/// assert_eq!(next.fields()["items"].value.as_list().unwrap().len(), 2);
///
/// assert!(apply(&next, "items[3]", &patch).is_err());
/// ```
pub fn apply(tree: &Tree, path: &str, patch: &NodePatch) -> Result<Tree, PatchError> {
    let path = parse_access_path(path)?;
    apply_at(tree, &path, patch)
}

/// [`apply`] for an already parsed path.
pub fn apply_at(tree: &Tree, path: &AccessPath, patch: &NodePatch) -> Result<Tree, PatchError> {
    let mut working = tree.clone();

    let mut fields = working.fields_mut();
    for segment in path.prefix() {
        let node = resolve_mut(fields, segment, Growth::Forbid)?;
        fields = child_fields_mut(node, segment)?;
    }

    let target_segment = path.target();
    let target = resolve_mut(fields, target_segment, Growth::AppendSlot)?;
    patch
        .merge_into(target)
        .map_err(|e| PatchError::InvalidPatch {
            segment: target_segment.to_string(),
            reason: e.to_string(),
        })?;

    Ok(working)
}

/// Look up the node at `path`. Never grows a list.
pub fn find<'a>(tree: &'a Tree, path: &AccessPath) -> Result<&'a ValueNode, PatchError> {
    let mut fields = tree.fields();
    for segment in path.prefix() {
        let node = resolve(fields, segment)?;
        fields = node
            .value
            .as_object()
            .ok_or_else(|| PatchError::NotAnObject {
                segment: segment.to_string(),
            })?;
    }
    resolve(fields, path.target())
}

/// Like [`find`], discarding the reason for a miss.
pub fn get<'a>(tree: &'a Tree, path: &AccessPath) -> Option<&'a ValueNode> {
    find(tree, path).ok()
}

fn resolve<'a>(fields: &'a Fields, segment: &PathSegment) -> Result<&'a ValueNode, PatchError> {
    let node = fields
        .get(&segment.field)
        .ok_or_else(|| PatchError::MissingField {
            segment: segment.to_string(),
        })?;
    let Some(index) = segment.index else {
        return Ok(node);
    };
    let items = node.value.as_list().ok_or_else(|| PatchError::NotAList {
        segment: segment.to_string(),
    })?;
    items.get(index).ok_or_else(|| PatchError::IndexOutOfRange {
        segment: segment.to_string(),
        index,
        len: items.len(),
    })
}

fn resolve_mut<'a>(
    fields: &'a mut Fields,
    segment: &PathSegment,
    growth: Growth,
) -> Result<&'a mut ValueNode, PatchError> {
    let node = fields
        .get_mut(&segment.field)
        .ok_or_else(|| PatchError::MissingField {
            segment: segment.to_string(),
        })?;
    let Some(index) = segment.index else {
        return Ok(node);
    };
    let NodeValue::List(items) = &mut node.value else {
        return Err(PatchError::NotAList {
            segment: segment.to_string(),
        });
    };

    let len = items.len();
    if index < len {
        Ok(&mut items[index])
    } else if index == len && growth == Growth::AppendSlot {
        log::trace!("growing '{}' to {} elements", segment.field, len + 1);
        items.push(ValueNode::untyped());
        Ok(&mut items[index])
    } else {
        Err(PatchError::IndexOutOfRange {
            segment: segment.to_string(),
            index,
            len,
        })
    }
}

fn child_fields_mut<'a>(
    node: &'a mut ValueNode,
    segment: &PathSegment,
) -> Result<&'a mut Fields, PatchError> {
    node.value
        .as_object_mut()
        .ok_or_else(|| PatchError::NotAnObject {
            segment: segment.to_string(),
        })
}
