//! Errors produced by the engine itself.

use std::sync::Arc;

use periscope_query::QueryError;

use crate::hooks::Phase;

/// A fault recovered from an extension hook.
///
/// Displays as `<extension>.<phase>: <cause>`, the exact message that
/// reaches the response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{extension}.{phase}: {cause}")]
pub struct PhaseError {
    /// Name of the faulting extension.
    pub extension: Arc<str>,
    /// Hook that faulted.
    pub phase: Phase,
    /// Message recovered from the fault.
    pub cause: String,
}

impl PhaseError {
    /// Creates a phase error.
    #[must_use]
    pub fn new(extension: impl Into<Arc<str>>, phase: Phase, cause: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            phase,
            cause: cause.into(),
        }
    }
}

impl From<PhaseError> for QueryError {
    fn from(err: PhaseError) -> Self {
        QueryError::from_error(err)
    }
}
