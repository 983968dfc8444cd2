//! Dotted, optionally indexed access paths.
//!
//! A path such as `service_hosts[2].service_proxy_list[0].state` is parsed
//! once into a sequence of [`PathSegment`]s. The last segment is the
//! target; everything before it is the traversal prefix.

use std::fmt;
use std::str::FromStr;

use crate::error::PatchError;
use crate::validate::{is_integer, validate_access_path, validate_depth};

/// One dot-separated step: a field name with an optional list index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathSegment {
    pub field: String,
    pub index: Option<usize>,
}

impl PathSegment {
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            field: name.into(),
            index: None,
        }
    }

    pub fn indexed(name: impl Into<String>, index: usize) -> Self {
        Self {
            field: name.into(),
            index: Some(index),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(i) => write!(f, "{}[{}]", self.field, i),
            None => f.write_str(&self.field),
        }
    }
}

/// A parsed, non-empty access path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccessPath {
    prefix: Vec<PathSegment>,
    target: PathSegment,
}

impl AccessPath {
    /// A single-segment path.
    pub fn new(target: PathSegment) -> Self {
        Self {
            prefix: Vec::new(),
            target,
        }
    }

    /// Build a path from segments. Returns `None` for an empty list.
    pub fn from_segments(mut segments: Vec<PathSegment>) -> Option<Self> {
        let target = segments.pop()?;
        Some(Self {
            prefix: segments,
            target,
        })
    }

    /// Traversal prefix: every segment but the last.
    pub fn prefix(&self) -> &[PathSegment] {
        &self.prefix
    }

    pub fn target(&self) -> &PathSegment {
        &self.target
    }

    pub fn split_target(&self) -> (&[PathSegment], &PathSegment) {
        (&self.prefix, &self.target)
    }

    pub fn segments(&self) -> impl Iterator<Item = &PathSegment> {
        self.prefix.iter().chain(std::iter::once(&self.target))
    }

    pub fn len(&self) -> usize {
        self.prefix.len() + 1
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The path of the target's container, `None` for a top-level field.
    pub fn parent(&self) -> Option<AccessPath> {
        Self::from_segments(self.prefix.clone())
    }

    /// Append a plain field segment.
    pub fn join(&self, field: impl Into<String>) -> AccessPath {
        self.join_segment(PathSegment::field(field))
    }

    pub fn join_segment(&self, segment: PathSegment) -> AccessPath {
        let mut prefix = self.prefix.clone();
        prefix.push(self.target.clone());
        AccessPath {
            prefix,
            target: segment,
        }
    }

    /// `true` if `self` equals `other` or lies below it.
    pub fn starts_with(&self, other: &AccessPath) -> bool {
        other.len() <= self.len() && self.segments().zip(other.segments()).all(|(a, b)| a == b)
    }
}

/// `true` if `child` lies strictly below `parent`.
pub fn is_child(parent: &AccessPath, child: &AccessPath) -> bool {
    parent.len() < child.len() && child.starts_with(parent)
}

impl fmt::Display for AccessPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.prefix {
            write!(f, "{segment}.")?;
        }
        write!(f, "{}", self.target)
    }
}

impl FromStr for AccessPath {
    type Err = PatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_access_path(s)
    }
}

/// Parse an access path string.
///
/// # Errors
///
/// Returns [`PatchError::MalformedPath`] for an empty path, an empty
/// segment, an unterminated or stray bracket, a non-numeric index, or more
/// than one index on a segment.
///
/// # Example
///
/// ```
/// use orchestrator_state::{parse_access_path, PathSegment};
///
/// let path = parse_access_path("service_hosts[2].service_proxy_list[0].start").unwrap();
/// assert_eq!(path.target(), &PathSegment::field("start"));
/// assert_eq!(path.prefix()[0], PathSegment::indexed("service_hosts", 2));
/// assert_eq!(path.to_string(), "service_hosts[2].service_proxy_list[0].start");
///
/// assert!(parse_access_path("items[1").is_err());
/// ```
pub fn parse_access_path(path: &str) -> Result<AccessPath, PatchError> {
    validate_access_path(path)?;
    let segments = path
        .split('.')
        .map(|raw| parse_segment(path, raw))
        .collect::<Result<Vec<_>, _>>()?;
    validate_depth(path, segments.len())?;
    AccessPath::from_segments(segments).ok_or_else(|| PatchError::malformed(path, "empty path"))
}

fn parse_segment(path: &str, raw: &str) -> Result<PathSegment, PatchError> {
    if raw.is_empty() {
        return Err(PatchError::malformed(path, "empty segment"));
    }
    let Some(open) = raw.find('[') else {
        if raw.contains(']') {
            return Err(PatchError::malformed(path, format!("stray ']' in '{raw}'")));
        }
        return Ok(PathSegment::field(raw));
    };

    let field = &raw[..open];
    if field.is_empty() {
        return Err(PatchError::malformed(path, format!("missing field name in '{raw}'")));
    }
    if field.contains(']') {
        return Err(PatchError::malformed(path, format!("stray ']' in '{raw}'")));
    }
    let rest = &raw[open + 1..];
    let close = rest
        .find(']')
        .ok_or_else(|| PatchError::malformed(path, format!("unterminated bracket in '{raw}'")))?;
    if close + 1 != rest.len() {
        return Err(PatchError::malformed(
            path,
            format!("unexpected text after index in '{raw}'"),
        ));
    }
    let digits = &rest[..close];
    if !is_integer(digits) {
        return Err(PatchError::malformed(
            path,
            format!("index '{digits}' is not a non-negative integer"),
        ));
    }
    let index = digits
        .parse::<usize>()
        .map_err(|_| PatchError::malformed(path, format!("index '{digits}' is too large")))?;
    Ok(PathSegment::indexed(field, index))
}
