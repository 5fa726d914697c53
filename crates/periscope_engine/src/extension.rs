//! The [`Extension`] trait.
//!
//! An extension observes a query as it moves through the pipeline. Each
//! `*_did_start` hook receives the current [`Context`] and returns the
//! context to continue with plus a finish function. The finish function runs
//! when the stage completes, with the stage's outcome.
//!
//! Every method has a no-op default, so an extension only implements the
//! hooks it needs.
//!
//! # Example
//!
//! ```
//! use periscope_context::Context;
//! use periscope_engine::extension::{Extension, ResolveFieldFinishFn, resolve_field_finish};
//! use periscope_query::ResolveInfo;
//!
//! struct FieldLogger;
//!
//! impl Extension for FieldLogger {
//!     fn name(&self) -> &str {
//!         "fieldLogger"
//!     }
//!
//!     fn resolve_field_did_start(
//!         &self,
//!         ctx: &Context,
//!         info: &ResolveInfo,
//!     ) -> (Context, ResolveFieldFinishFn) {
//!         let field = info.field_name.clone();
//!         let finish = resolve_field_finish(move |result| {
//!             tracing::debug!(%field, ok = result.is_ok(), "field resolved");
//!         });
//!         (ctx.clone(), finish)
//!     }
//! }
//! ```
//!
//! # State
//!
//! A registered extension is shared by every query executing against the
//! schema, and its field hooks may run for sibling fields concurrently.
//! Keep per-query state in the context returned from
//! [`init`](Extension::init) rather than in the extension value; any state the
//! extension does own must be synchronised by its author.

use periscope_context::Context;
use periscope_query::{BoxError, QueryError, ResolveInfo, Value};

use crate::request::Request;
use crate::response::Response;

/// Outcome of a field resolver as seen by a finish function.
pub type FieldResult<'a> = Result<&'a Value, &'a BoxError>;

/// Called after parsing with the parse error, if any.
pub type ParseFinishFn = Box<dyn FnOnce(Option<&QueryError>) + Send>;

/// Called after validation with the validation errors.
pub type ValidationFinishFn = Box<dyn FnOnce(&[QueryError]) + Send>;

/// Called after execution with the response produced so far.
pub type ExecutionFinishFn = Box<dyn FnOnce(&Response) + Send>;

/// Called after a field's resolver returns.
pub type ResolveFieldFinishFn = Box<dyn FnOnce(FieldResult<'_>) + Send>;

/// Boxes a parse finish function.
///
/// Passing the closure through here pins its signature, so
/// `parse_finish(|err| ..)` needs no parameter annotation.
pub fn parse_finish<F>(finish: F) -> ParseFinishFn
where
    F: FnOnce(Option<&QueryError>) + Send + 'static,
{
    Box::new(finish)
}

/// Boxes a validation finish function.
pub fn validation_finish<F>(finish: F) -> ValidationFinishFn
where
    F: FnOnce(&[QueryError]) + Send + 'static,
{
    Box::new(finish)
}

/// Boxes an execution finish function.
pub fn execution_finish<F>(finish: F) -> ExecutionFinishFn
where
    F: FnOnce(&Response) + Send + 'static,
{
    Box::new(finish)
}

/// Boxes a field finish function.
pub fn resolve_field_finish<F>(finish: F) -> ResolveFieldFinishFn
where
    F: FnOnce(FieldResult<'_>) + Send + 'static,
{
    Box::new(finish)
}

/// A pluggable observer of query processing.
pub trait Extension: Send + Sync + 'static {
    /// Name used in error attribution and as the key of the extension's
    /// result payload.
    fn name(&self) -> &str;

    /// Runs once per query before any stage begins.
    fn init(&self, ctx: &Context, request: &Request) -> Context {
        let _ = request;
        ctx.clone()
    }

    /// Runs before the document is parsed.
    fn parse_did_start(&self, ctx: &Context) -> (Context, ParseFinishFn) {
        (ctx.clone(), parse_finish(|_| {}))
    }

    /// Runs before the document is validated.
    fn validation_did_start(&self, ctx: &Context) -> (Context, ValidationFinishFn) {
        (ctx.clone(), validation_finish(|_| {}))
    }

    /// Runs before the operation is executed.
    fn execution_did_start(&self, ctx: &Context) -> (Context, ExecutionFinishFn) {
        (ctx.clone(), execution_finish(|_| {}))
    }

    /// Runs before each field's resolver.
    ///
    /// The returned context is passed to the resolver and seeds the hooks of
    /// the field's children. Sibling fields never see it.
    fn resolve_field_did_start(
        &self,
        ctx: &Context,
        info: &ResolveInfo,
    ) -> (Context, ResolveFieldFinishFn) {
        let _ = info;
        (ctx.clone(), resolve_field_finish(|_| {}))
    }

    /// Returns `true` if the extension contributes to the response's
    /// `extensions` map.
    fn has_result(&self) -> bool {
        false
    }

    /// Produces the payload stored under [`name`](Self::name).
    ///
    /// Only called when [`has_result`](Self::has_result) is `true`.
    fn get_result(&self, ctx: &Context) -> Value {
        let _ = ctx;
        Value::Null
    }
}
