//! Structured `tracing` events at every stage boundary.

use std::sync::Arc;

use periscope_context::Context;
use periscope_engine::extension::{
    ExecutionFinishFn, Extension, ParseFinishFn, ResolveFieldFinishFn, ValidationFinishFn,
    execution_finish, parse_finish, resolve_field_finish, validation_finish,
};
use periscope_engine::{Phase, Request};
use periscope_query::ResolveInfo;
use periscope_query::error::display_path;

use crate::clock::{Clock, as_nanos};

/// Query identity carried through the context for event correlation.
#[derive(Clone)]
struct QueryLabel(Arc<str>);

/// Emits a `tracing` event when each stage starts and finishes.
///
/// Stage events are emitted at `DEBUG` and field events at `TRACE`, all
/// under the `periscope::query` target with the phase, the operation name
/// and the elapsed nanoseconds as fields. The extension reports no result.
///
/// # Example
///
/// ```
/// use periscope_engine::Schema;
/// use periscope_extensions::{LoggingConfig, TracingExtension};
/// use periscope_query::schema::{Field, ObjectType, TypeSystem};
/// use serde_json::json;
/// use tracing::Level;
///
/// LoggingConfig::new().with_level(Level::DEBUG).init();
///
/// let query = ObjectType::new("Query")
///     .field("a", Field::new("String").resolve(|_| Ok(json!("x"))));
/// let schema = Schema::new(TypeSystem::build(query).finish().unwrap())
///     .with_extension(TracingExtension::new());
///
/// let response = schema.execute_sync("{ a }");
/// assert!(response.extensions.is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TracingExtension {
    clock: Clock,
}

impl TracingExtension {
    /// Creates the extension on the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the time source used for elapsed times.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn label(ctx: &Context) -> Arc<str> {
        ctx.get::<QueryLabel>()
            .map_or_else(|| Arc::from(""), |label| Arc::clone(&label.0))
    }
}

impl Extension for TracingExtension {
    fn name(&self) -> &str {
        "tracing"
    }

    fn init(&self, ctx: &Context, request: &Request) -> Context {
        let operation = request.operation_name.as_deref().unwrap_or("");
        tracing::debug!(
            target: "periscope::query",
            phase = %Phase::Init,
            operation,
            variables = request.variables.len(),
            "query started"
        );
        ctx.with(QueryLabel(Arc::from(operation)))
    }

    fn parse_did_start(&self, ctx: &Context) -> (Context, ParseFinishFn) {
        let operation = Self::label(ctx);
        tracing::debug!(
            target: "periscope::query",
            phase = %Phase::ParseDidStart,
            operation = &*operation,
            "parse started"
        );

        let clock = self.clock.clone();
        let started = clock.now();
        let finish = parse_finish(move |error| {
            tracing::debug!(
                target: "periscope::query",
                phase = %Phase::ParseFinishFunc,
                operation = &*operation,
                elapsed_ns = as_nanos(clock.elapsed_since(started)),
                error = error.map(|e| e.message.as_str()),
                "parse finished"
            );
        });
        (ctx.clone(), finish)
    }

    fn validation_did_start(&self, ctx: &Context) -> (Context, ValidationFinishFn) {
        let operation = Self::label(ctx);
        tracing::debug!(
            target: "periscope::query",
            phase = %Phase::ValidationDidStart,
            operation = &*operation,
            "validation started"
        );

        let clock = self.clock.clone();
        let started = clock.now();
        let finish = validation_finish(move |errors| {
            tracing::debug!(
                target: "periscope::query",
                phase = %Phase::ValidationFinishFunc,
                operation = &*operation,
                elapsed_ns = as_nanos(clock.elapsed_since(started)),
                errors = errors.len(),
                "validation finished"
            );
        });
        (ctx.clone(), finish)
    }

    fn execution_did_start(&self, ctx: &Context) -> (Context, ExecutionFinishFn) {
        let operation = Self::label(ctx);
        tracing::debug!(
            target: "periscope::query",
            phase = %Phase::ExecutionDidStart,
            operation = &*operation,
            "execution started"
        );

        let clock = self.clock.clone();
        let started = clock.now();
        let finish = execution_finish(move |response| {
            tracing::debug!(
                target: "periscope::query",
                phase = %Phase::ExecutionFinishFunc,
                operation = &*operation,
                elapsed_ns = as_nanos(clock.elapsed_since(started)),
                errors = response.errors.len(),
                has_data = response.data.is_some(),
                "execution finished"
            );
        });
        (ctx.clone(), finish)
    }

    fn resolve_field_did_start(
        &self,
        ctx: &Context,
        info: &ResolveInfo,
    ) -> (Context, ResolveFieldFinishFn) {
        let path = display_path(&info.path);
        tracing::trace!(
            target: "periscope::query",
            phase = %Phase::ResolveFieldDidStart,
            path = %path,
            parent_type = %info.parent_type,
            "field started"
        );

        let clock = self.clock.clone();
        let started = clock.now();
        let finish = resolve_field_finish(move |result| {
            tracing::trace!(
                target: "periscope::query",
                phase = %Phase::ResolveFieldFinishFunc,
                path = %path,
                elapsed_ns = as_nanos(clock.elapsed_since(started)),
                ok = result.is_ok(),
                "field finished"
            );
        });
        (ctx.clone(), finish)
    }
}
