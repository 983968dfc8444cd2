//! Error types for the value tree and the patch engine.

use thiserror::Error;

/// A node failed validation at a construction boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// The payload does not have the shape its type tag requires.
    #[error("node shape mismatch: {0}")]
    Shape(String),
    /// A patched wire field has no representation (unknown tag, non-boolean
    /// `readonly`, ...).
    #[error("unrepresentable field: {0}")]
    Field(String),
    /// The root of a tree is not a mapping of child nodes.
    #[error("tree root must be an object node, found {0}")]
    RootNotObject(String),
}

/// Resolution or merge failure while addressing a node by path.
///
/// Every variant names the segment (or full path) that could not be
/// resolved so the failure can be logged without further context.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatchError {
    #[error("malformed path '{path}': {reason}")]
    MalformedPath { path: String, reason: String },
    #[error("error occurred trying to access '{segment}': key not found")]
    MissingField { segment: String },
    #[error("error occurred trying to access '{segment}': expected a list")]
    NotAList { segment: String },
    #[error("error occurred trying to access '{segment}': index {index} out of range for length {len}")]
    IndexOutOfRange {
        segment: String,
        index: usize,
        len: usize,
    },
    #[error("error occurred trying to access '{segment}': value has no child fields")]
    NotAnObject { segment: String },
    #[error("invalid patch for '{segment}': {reason}")]
    InvalidPatch { segment: String, reason: String },
}

impl PatchError {
    pub(crate) fn malformed(path: &str, reason: impl Into<String>) -> Self {
        PatchError::MalformedPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// The offending segment, or the whole path for malformed input.
    pub fn segment(&self) -> &str {
        match self {
            PatchError::MalformedPath { path, .. } => path,
            PatchError::MissingField { segment }
            | PatchError::NotAList { segment }
            | PatchError::IndexOutOfRange { segment, .. }
            | PatchError::NotAnObject { segment }
            | PatchError::InvalidPatch { segment, .. } => segment,
        }
    }
}
