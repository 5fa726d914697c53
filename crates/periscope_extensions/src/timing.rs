//! Per-query timing in the Apollo tracing layout.
//!
//! [`TimingExtension`] records when each stage and each field resolver
//! starts and how long it takes, and reports the trace under the
//! `"timing"` key of the response's `extensions` map:
//!
//! ```json
//! {
//!   "version": 1,
//!   "duration": 1250000,
//!   "parsing": { "startOffset": 2000, "duration": 40000 },
//!   "validation": { "startOffset": 45000, "duration": 12000 },
//!   "execution": {
//!     "resolvers": [
//!       {
//!         "path": ["user", "name"],
//!         "parentType": "User",
//!         "fieldName": "name",
//!         "returnType": "String!",
//!         "startOffset": 60000,
//!         "duration": 3000
//!       }
//!     ]
//!   }
//! }
//! ```
//!
//! All offsets and durations are nanoseconds from the start of the query.
//! The trace lives in the query [`Context`], so one extension value serves
//! any number of concurrent queries.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use periscope_context::Context;
use periscope_engine::extension::{
    ExecutionFinishFn, Extension, ParseFinishFn, ResolveFieldFinishFn, ValidationFinishFn,
    execution_finish, parse_finish, resolve_field_finish, validation_finish,
};
use periscope_engine::Request;
use periscope_query::{PathSegment, ResolveInfo, Value};
use serde::Serialize;

use crate::clock::{Clock, as_nanos};

/// Version of the reported trace layout.
pub const TIMING_VERSION: u32 = 1;

/// Start offset and duration of one stage, in nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTiming {
    /// Offset from the start of the query.
    pub start_offset: u64,
    /// Time spent in the stage.
    pub duration: u64,
}

/// Timing of one field resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverTiming {
    /// Result path of the field.
    pub path: Vec<PathSegment>,
    /// Object type declaring the field.
    pub parent_type: String,
    /// Field name.
    pub field_name: String,
    /// Declared return type.
    pub return_type: String,
    /// Offset from the start of the query.
    pub start_offset: u64,
    /// Time spent in the resolver.
    pub duration: u64,
}

/// Resolver timings, ordered by start offset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionTiming {
    /// One entry per resolved field.
    pub resolvers: Vec<ResolverTiming>,
}

/// The reported trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimingReport {
    /// Layout version, always [`TIMING_VERSION`].
    pub version: u32,
    /// Time from `init` to the end of execution, or to the report if
    /// execution never finished.
    pub duration: u64,
    /// Parse stage, if it started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsing: Option<StageTiming>,
    /// Validation stage, if it started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<StageTiming>,
    /// Field resolvers.
    pub execution: ExecutionTiming,
}

/// Mutable per-query record.
#[derive(Debug)]
struct Trace {
    start: Instant,
    end: Option<Instant>,
    parsing: Option<StageTiming>,
    validation: Option<StageTiming>,
    resolvers: Vec<ResolverTiming>,
}

impl Trace {
    fn offset(&self, at: Instant) -> u64 {
        as_nanos(at.saturating_duration_since(self.start))
    }

    fn stage(&self, started: Instant, finished: Instant) -> StageTiming {
        StageTiming {
            start_offset: self.offset(started),
            duration: as_nanos(finished.saturating_duration_since(started)),
        }
    }

    fn report(&self, now: Instant) -> TimingReport {
        let mut resolvers = self.resolvers.clone();
        resolvers.sort_by_key(|r| r.start_offset);
        TimingReport {
            version: TIMING_VERSION,
            duration: self.offset(self.end.unwrap_or(now)),
            parsing: self.parsing,
            validation: self.validation,
            execution: ExecutionTiming { resolvers },
        }
    }
}

/// Context binding for the running query's trace.
#[derive(Clone)]
struct TraceHandle(Arc<Mutex<Trace>>);

/// Records stage and resolver timings and reports them under `"timing"`.
///
/// # Example
///
/// ```
/// use periscope_engine::Schema;
/// use periscope_extensions::TimingExtension;
/// use periscope_query::schema::{Field, ObjectType, TypeSystem};
/// use serde_json::json;
///
/// let query = ObjectType::new("Query")
///     .field("a", Field::new("String").resolve(|_| Ok(json!("x"))));
/// let schema = Schema::new(TypeSystem::build(query).finish().unwrap())
///     .with_extension(TimingExtension::new());
///
/// let response = schema.execute_sync("{ a }");
/// let extensions = response.extensions.unwrap();
/// let timing = &extensions["timing"];
/// assert_eq!(timing["version"], 1);
/// assert_eq!(timing["execution"]["resolvers"][0]["fieldName"], "a");
/// ```
#[derive(Debug, Clone, Default)]
pub struct TimingExtension {
    clock: Clock,
}

impl TimingExtension {
    /// Creates the extension on the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the trace recorded in `ctx`, if this extension initialised it.
    #[must_use]
    pub fn report(&self, ctx: &Context) -> Option<TimingReport> {
        ctx.get::<TraceHandle>()
            .map(|handle| handle.0.lock().report(self.clock.now()))
    }

    fn trace(ctx: &Context) -> Option<Arc<Mutex<Trace>>> {
        ctx.get::<TraceHandle>().map(|handle| Arc::clone(&handle.0))
    }
}

impl Extension for TimingExtension {
    fn name(&self) -> &str {
        "timing"
    }

    fn init(&self, ctx: &Context, _request: &Request) -> Context {
        ctx.with(TraceHandle(Arc::new(Mutex::new(Trace {
            start: self.clock.now(),
            end: None,
            parsing: None,
            validation: None,
            resolvers: Vec::new(),
        }))))
    }

    fn parse_did_start(&self, ctx: &Context) -> (Context, ParseFinishFn) {
        let Some(trace) = Self::trace(ctx) else {
            return (ctx.clone(), parse_finish(|_| {}));
        };
        let clock = self.clock.clone();
        let started = clock.now();
        let finish = parse_finish(move |_| {
            let mut trace = trace.lock();
            trace.parsing = Some(trace.stage(started, clock.now()));
        });
        (ctx.clone(), finish)
    }

    fn validation_did_start(&self, ctx: &Context) -> (Context, ValidationFinishFn) {
        let Some(trace) = Self::trace(ctx) else {
            return (ctx.clone(), validation_finish(|_| {}));
        };
        let clock = self.clock.clone();
        let started = clock.now();
        let finish = validation_finish(move |_| {
            let mut trace = trace.lock();
            trace.validation = Some(trace.stage(started, clock.now()));
        });
        (ctx.clone(), finish)
    }

    fn execution_did_start(&self, ctx: &Context) -> (Context, ExecutionFinishFn) {
        let Some(trace) = Self::trace(ctx) else {
            return (ctx.clone(), execution_finish(|_| {}));
        };
        let clock = self.clock.clone();
        let finish = execution_finish(move |_| {
            trace.lock().end = Some(clock.now());
        });
        (ctx.clone(), finish)
    }

    fn resolve_field_did_start(
        &self,
        ctx: &Context,
        info: &ResolveInfo,
    ) -> (Context, ResolveFieldFinishFn) {
        let Some(trace) = Self::trace(ctx) else {
            return (ctx.clone(), resolve_field_finish(|_| {}));
        };
        let clock = self.clock.clone();
        let started = clock.now();
        let path = info.path.clone();
        let parent_type = info.parent_type.clone();
        let field_name = info.field_name.clone();
        let return_type = info.return_type.to_string();

        let finish = resolve_field_finish(move |_| {
            let mut trace = trace.lock();
            let StageTiming {
                start_offset,
                duration,
            } = trace.stage(started, clock.now());
            trace.resolvers.push(ResolverTiming {
                path,
                parent_type,
                field_name,
                return_type,
                start_offset,
                duration,
            });
        });
        (ctx.clone(), finish)
    }

    fn has_result(&self) -> bool {
        true
    }

    fn get_result(&self, ctx: &Context) -> Value {
        self.report(ctx)
            .and_then(|report| serde_json::to_value(report).ok())
            .unwrap_or(Value::Null)
    }
}
