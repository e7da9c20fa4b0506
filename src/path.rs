//! Node Paths
//!
//! Validated, absolute, '/'-delimited paths into the node namespace.

use crate::error::PathError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Absolute path naming a node, e.g. `/app/config/db`
///
/// The root is `/`. Every other path is a sequence of non-empty segments,
/// none of which is `.` or `..`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodePath(String);

impl NodePath {
    /// The namespace root `/`
    pub fn root() -> Self {
        NodePath("/".to_string())
    }

    /// Parse and validate a path string
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        if raw.is_empty() {
            return Err(PathError::Empty);
        }
        if !raw.starts_with('/') {
            return Err(PathError::NotAbsolute(raw.to_string()));
        }
        if raw.contains('\0') {
            return Err(PathError::NulCharacter(raw.to_string()));
        }
        if raw == "/" {
            return Ok(Self::root());
        }
        if raw.ends_with('/') {
            return Err(PathError::TrailingSlash(raw.to_string()));
        }
        for segment in raw[1..].split('/') {
            if segment.is_empty() {
                return Err(PathError::EmptySegment(raw.to_string()));
            }
            if segment == "." || segment == ".." {
                return Err(PathError::ReservedSegment {
                    path: raw.to_string(),
                    segment: segment.to_string(),
                });
            }
        }
        Ok(NodePath(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Last segment; empty for the root
    pub fn name(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[idx + 1..],
            None => "",
        }
    }

    /// Parent path, `None` for the root
    pub fn parent(&self) -> Option<NodePath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(NodePath(self.0[..idx].to_string())),
            None => None,
        }
    }

    /// Append a single child segment
    pub fn join(&self, child: &str) -> Result<NodePath, PathError> {
        if child.is_empty()
            || child.contains('/')
            || child.contains('\0')
            || child == "."
            || child == ".."
        {
            return Err(PathError::InvalidChildName(child.to_string()));
        }
        if self.is_root() {
            Ok(NodePath(format!("/{}", child)))
        } else {
            Ok(NodePath(format!("{}/{}", self.0, child)))
        }
    }

    /// Iterate over the name segments, root yields nothing
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Number of segments below the root
    pub fn depth(&self) -> usize {
        self.segments().count()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NodePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodePath::parse(s)
    }
}

impl AsRef<str> for NodePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for NodePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NodePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NodePath::parse(&raw).map_err(serde::de::Error::custom)
    }
}
