//! The query response and the aggregator that assembles it.
//!
//! [`ResultAggregator`] is the only writer of a [`Response`]. Field errors
//! produced by concurrently resolving fields go through an [`ErrorSink`]
//! first and are appended to the aggregator once execution has finished.

use parking_lot::Mutex;
use periscope_query::QueryError;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::PhaseError;

/// Extension results keyed by extension name.
pub type ResultMap = Map<String, Value>;

// ─────────────────────────────────────────────────────────────────────────────
// Response
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of a query.
///
/// Serialises to `{ "data"?, "errors"?, "extensions"? }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Response {
    /// Produced data; `None` when the query stopped before execution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Errors in the order they were produced.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<QueryError>,
    /// Extension payloads; `None` when no extension reports a result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<ResultMap>,
}

impl Response {
    /// Returns `true` if the response carries no errors.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the error messages, in order.
    #[must_use]
    pub fn error_messages(&self) -> Vec<&str> {
        self.errors.iter().map(|err| err.message.as_str()).collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ErrorSink
// ─────────────────────────────────────────────────────────────────────────────

/// Append-only error list shared by concurrently resolving fields.
#[derive(Debug, Default)]
pub struct ErrorSink {
    errors: Mutex<Vec<QueryError>>,
}

impl ErrorSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one error.
    pub fn push(&self, error: impl Into<QueryError>) {
        self.errors.lock().push(error.into());
    }

    /// Appends several errors, keeping their order.
    pub fn extend<E: Into<QueryError>>(&self, errors: impl IntoIterator<Item = E>) {
        let mut guard = self.errors.lock();
        guard.extend(errors.into_iter().map(Into::into));
    }

    /// Returns the number of collected errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.lock().len()
    }

    /// Returns `true` if nothing was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.lock().is_empty()
    }

    /// Consumes the sink, returning the errors.
    #[must_use]
    pub fn into_inner(self) -> Vec<QueryError> {
        self.errors.into_inner()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ResultAggregator
// ─────────────────────────────────────────────────────────────────────────────

/// Builds the final [`Response`].
#[derive(Debug, Default)]
pub struct ResultAggregator {
    response: Response,
}

impl ResultAggregator {
    /// Starts an empty response.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the response of a query that stopped before execution.
    #[must_use]
    pub fn aborted<E: Into<QueryError>>(errors: impl IntoIterator<Item = E>) -> Response {
        Response {
            data: None,
            errors: errors.into_iter().map(Into::into).collect(),
            extensions: None,
        }
    }

    /// Sets the produced data.
    pub fn set_data(&mut self, data: Option<Value>) {
        self.response.data = data;
    }

    /// Appends errors in order.
    pub fn append<E: Into<QueryError>>(&mut self, errors: impl IntoIterator<Item = E>) {
        self.response
            .errors
            .extend(errors.into_iter().map(Into::into));
    }

    /// Appends recovered hook faults in order.
    pub fn append_phase_errors(&mut self, errors: Vec<PhaseError>) {
        self.append(errors);
    }

    /// Attaches the extension payloads.
    pub fn attach_extensions(&mut self, extensions: Option<ResultMap>) {
        self.response.extensions = extensions;
    }

    /// Returns the response as assembled so far.
    #[must_use]
    pub fn view(&self) -> &Response {
        &self.response
    }

    /// Returns the finished response.
    #[must_use]
    pub fn finish(self) -> Response {
        self.response
    }
}
