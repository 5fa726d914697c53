//! User-facing error representation.
//!
//! Every failure that reaches a response, whether it came from the parser,
//! the validator, a resolver or an extension hook, is formatted into a
//! [`QueryError`]: a message, the source locations it refers to and the
//! result path of the field it belongs to.

use core::error::Error;
use core::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Boxed error returned by resolvers.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// 1-based line and column in the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Line number, starting at 1.
    pub line: usize,
    /// Column number, starting at 1.
    pub column: usize,
}

impl Location {
    /// Creates a location.
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// One step of a result path: a response key or a list index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// A field's response key.
    Field(String),
    /// A position inside a list.
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Field(key.to_owned())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Field(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Joins a result path with dots, e.g. `b.1.foo`.
#[must_use]
pub fn display_path(path: &[PathSegment]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

/// A structured, user-facing error.
///
/// Serialises to `{ "message", "locations"?, "path"? }`. The original error
/// is kept for callers that want to downcast it but is never serialised, and
/// it does not take part in equality.
#[derive(Debug, Clone, Serialize)]
pub struct QueryError {
    /// Human-readable message.
    pub message: String,
    /// Source locations the error refers to.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,
    /// Result path of the failing field.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PathSegment>,
    #[serde(skip)]
    original: Option<Arc<dyn Error + Send + Sync>>,
}

impl QueryError {
    /// Creates an error with only a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
            path: Vec::new(),
            original: None,
        }
    }

    /// Formats any error value, keeping it as the original cause.
    #[must_use]
    pub fn from_error<E>(err: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self {
            message: err.to_string(),
            locations: Vec::new(),
            path: Vec::new(),
            original: Some(Arc::new(err)),
        }
    }

    /// Formats a boxed resolver error, keeping it as the original cause.
    #[must_use]
    pub fn from_boxed(err: BoxError) -> Self {
        Self {
            message: err.to_string(),
            locations: Vec::new(),
            path: Vec::new(),
            original: Some(Arc::from(err)),
        }
    }

    /// Adds a source location.
    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.push(location);
        self
    }

    /// Sets the result path.
    #[must_use]
    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }

    /// Returns the underlying error, if this one was formatted from another.
    #[must_use]
    pub fn original_error(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.original.as_deref()
    }
}

impl PartialEq for QueryError {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message
            && self.locations == other.locations
            && self.path == other.path
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for QueryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.original
            .as_deref()
            .map(|err| err as &(dyn Error + 'static))
    }
}

/// A syntax error raised by the parser.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Syntax Error: {message}")]
pub struct ParseError {
    /// What the parser expected or found.
    pub message: String,
    /// Where the problem was detected.
    pub location: Location,
}

impl From<ParseError> for QueryError {
    fn from(err: ParseError) -> Self {
        let location = err.location;
        QueryError::from_error(err).with_location(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serialises_without_empty_fields() {
        let err = QueryError::new("boom");
        assert_eq!(serde_json::to_value(&err).unwrap(), json!({ "message": "boom" }));
    }

    #[test]
    fn serialises_locations_and_path() {
        let err = QueryError::new("test error")
            .with_location(Location::new(1, 9))
            .with_path(vec!["b".into(), 1.into(), "foo".into()]);
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({
                "message": "test error",
                "locations": [{ "line": 1, "column": 9 }],
                "path": ["b", 1, "foo"],
            })
        );
    }

    #[test]
    fn equality_ignores_original_cause() {
        let boxed: BoxError = "test error".into();
        let formatted = QueryError::from_boxed(boxed);
        assert!(formatted.original_error().is_some());
        assert_eq!(formatted, QueryError::new("test error"));
    }

    #[test]
    fn parse_error_carries_location() {
        let err: QueryError = ParseError {
            message: "Expected Name, found <EOF>".into(),
            location: Location::new(1, 4),
        }
        .into();
        assert_eq!(err.message, "Syntax Error: Expected Name, found <EOF>");
        assert_eq!(err.locations, vec![Location::new(1, 4)]);
    }

    #[test]
    fn display_path_joins_segments() {
        let path = vec![PathSegment::from("b"), PathSegment::from(0), PathSegment::from("bar")];
        assert_eq!(display_path(&path), "b.0.bar");
    }
}
