//! Phase labels for extension hooks.
//!
//! Every hook invocation is attributed to a [`Phase`]. DidStart/Finish pairs
//! are grouped by [`Stage`], which maps to the label used for each half.

use core::fmt;

// ─────────────────────────────────────────────────────────────────────────────
// Phase
// ─────────────────────────────────────────────────────────────────────────────

/// The hook being invoked when a fault is recovered.
///
/// The label is part of the user-visible error message and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// One-shot per-query initialisation.
    Init,
    /// Before the document is parsed.
    ParseDidStart,
    /// After parsing, with the parse error if any.
    ParseFinishFunc,
    /// Before the document is validated.
    ValidationDidStart,
    /// After validation, with the validation errors.
    ValidationFinishFunc,
    /// Before the operation is executed.
    ExecutionDidStart,
    /// After execution, with the produced response.
    ExecutionFinishFunc,
    /// Before a field's resolver runs.
    ResolveFieldDidStart,
    /// After a field's resolver returns.
    ResolveFieldFinishFunc,
    /// While collecting the extension's result payload.
    GetResult,
}

impl Phase {
    /// All phases in pipeline order.
    pub const ALL: [Phase; 10] = [
        Phase::Init,
        Phase::ParseDidStart,
        Phase::ParseFinishFunc,
        Phase::ValidationDidStart,
        Phase::ValidationFinishFunc,
        Phase::ExecutionDidStart,
        Phase::ExecutionFinishFunc,
        Phase::ResolveFieldDidStart,
        Phase::ResolveFieldFinishFunc,
        Phase::GetResult,
    ];

    /// Returns the label used in error messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Phase::Init => "Init",
            Phase::ParseDidStart => "ParseDidStart",
            Phase::ParseFinishFunc => "ParseFinishFunc",
            Phase::ValidationDidStart => "ValidationDidStart",
            Phase::ValidationFinishFunc => "ValidationFinishFunc",
            Phase::ExecutionDidStart => "ExecutionDidStart",
            Phase::ExecutionFinishFunc => "ExecutionFinishFunc",
            Phase::ResolveFieldDidStart => "ResolveFieldDidStart",
            Phase::ResolveFieldFinishFunc => "ResolveFieldFinishFunc",
            Phase::GetResult => "GetResult",
        }
    }

    /// Returns `true` if a fault in this phase ends the query without data.
    ///
    /// Faults before execution begins abort; faults afterwards are appended
    /// to a response that keeps its data.
    #[must_use]
    pub const fn aborts_query(self) -> bool {
        matches!(
            self,
            Phase::Init
                | Phase::ParseDidStart
                | Phase::ParseFinishFunc
                | Phase::ValidationDidStart
                | Phase::ValidationFinishFunc
                | Phase::ExecutionDidStart
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Stage
// ─────────────────────────────────────────────────────────────────────────────

/// A pipeline stage wrapped by a DidStart/Finish pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Document parsing.
    Parse,
    /// Static validation.
    Validation,
    /// Operation execution.
    Execution,
    /// A single field's resolution.
    ResolveField,
}

impl Stage {
    /// Phase label for the stage's DidStart hook.
    #[must_use]
    pub const fn did_start(self) -> Phase {
        match self {
            Stage::Parse => Phase::ParseDidStart,
            Stage::Validation => Phase::ValidationDidStart,
            Stage::Execution => Phase::ExecutionDidStart,
            Stage::ResolveField => Phase::ResolveFieldDidStart,
        }
    }

    /// Phase label for the finish function returned by the DidStart hook.
    #[must_use]
    pub const fn finish(self) -> Phase {
        match self {
            Stage::Parse => Phase::ParseFinishFunc,
            Stage::Validation => Phase::ValidationFinishFunc,
            Stage::Execution => Phase::ExecutionFinishFunc,
            Stage::ResolveField => Phase::ResolveFieldFinishFunc,
        }
    }
}
