//! Error types for path parsing and traversal.

use std::fmt;
use thiserror::Error;

/// Where in a traversal a failure happened.
///
/// `path` is the path being resolved, `traversed` the prefix consumed before
/// the failure and `segment` the segment that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub traversed: String,
    pub segment: String,
}

impl Location {
    pub fn new(
        path: impl Into<String>,
        traversed: impl Into<String>,
        segment: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            traversed: traversed.into(),
            segment: segment.into(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error traversing {:?}, failed from {:?} to {:?}",
            self.path, self.traversed, self.segment
        )
    }
}

/// Broad classification of a `PathError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A mapping key was missing
    Key,
    /// A sequence index was malformed or out of range, or a broadcast element failed
    Index,
    /// A value could not be navigated into
    Value,
    /// The path argument had an unsupported type
    PathType,
    /// The navigation options were unusable
    Options,
}

/// Errors raised while resolving a path.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PathError {
    #[error("unsupported path {found}")]
    BadPathType { found: String },

    #[error("{}bad value, unexpected {found}", context_prefix(.location))]
    BadValue {
        location: Option<Location>,
        found: &'static str,
    },

    #[error("{location}: no such key")]
    KeyNotFound { location: Location },

    #[error("{location}: index does not exist")]
    IndexOutOfRange { location: Location },

    #[error("{location}: bad sequence index")]
    BadIndexToken { location: Location },

    #[error("{location}: failed on {position}")]
    BroadcastElement {
        location: Location,
        position: usize,
        #[source]
        source: Box<PathError>,
    },

    #[error("invalid options: {reason}")]
    InvalidOptions { reason: String },
}

fn context_prefix(location: &Option<Location>) -> String {
    match location {
        Some(location) => format!("{}: ", location),
        None => String::new(),
    }
}

impl PathError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PathError::KeyNotFound { .. } => ErrorKind::Key,
            PathError::IndexOutOfRange { .. }
            | PathError::BadIndexToken { .. }
            | PathError::BroadcastElement { .. } => ErrorKind::Index,
            PathError::BadValue { .. } => ErrorKind::Value,
            PathError::BadPathType { .. } => ErrorKind::PathType,
            PathError::InvalidOptions { .. } => ErrorKind::Options,
        }
    }

    /// True for the failures a defaulting lookup recovers from: missing keys,
    /// bad or missing indices and failed broadcast elements.
    pub fn is_lookup_failure(&self) -> bool {
        matches!(self.kind(), ErrorKind::Key | ErrorKind::Index)
    }

    /// The traversal location, if the error carries one.
    pub fn location(&self) -> Option<&Location> {
        match self {
            PathError::KeyNotFound { location }
            | PathError::IndexOutOfRange { location }
            | PathError::BadIndexToken { location }
            | PathError::BroadcastElement { location, .. } => Some(location),
            PathError::BadValue { location, .. } => location.as_ref(),
            PathError::BadPathType { .. } | PathError::InvalidOptions { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_messages_name_path_prefix_and_segment() {
        let err = PathError::KeyNotFound {
            location: Location::new("a.b.c", "a", "b"),
        };
        assert_eq!(
            err.to_string(),
            r#"error traversing "a.b.c", failed from "a" to "b": no such key"#
        );
    }

    #[test]
    fn test_broadcast_error_chains_source() {
        let inner = PathError::KeyNotFound {
            location: Location::new("name", "^", "name"),
        };
        let err = PathError::BroadcastElement {
            location: Location::new("^.name", "", "^"),
            position: 2,
            source: Box::new(inner.clone()),
        };
        assert!(err.to_string().ends_with("failed on 2"));
        assert_eq!(err.kind(), ErrorKind::Index);
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), inner.to_string());
    }

    #[test]
    fn test_lookup_failure_classification() {
        let location = Location::new("x", "", "x");
        assert!(PathError::KeyNotFound {
            location: location.clone()
        }
        .is_lookup_failure());
        assert!(PathError::BadIndexToken {
            location: location.clone()
        }
        .is_lookup_failure());
        assert!(!PathError::BadValue {
            location: Some(location),
            found: "string"
        }
        .is_lookup_failure());
        assert!(!PathError::BadPathType {
            found: "null".to_string()
        }
        .is_lookup_failure());
    }

    #[test]
    fn test_bad_value_without_location() {
        let err = PathError::BadValue {
            location: None,
            found: "number",
        };
        assert_eq!(err.to_string(), "bad value, unexpected number");
    }
}
