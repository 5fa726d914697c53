//! Ready-made extensions for the Periscope engine.
//!
//! - [`TracingExtension`] - Structured `tracing` events at every stage boundary
//! - [`TimingExtension`] - Per-query stage and resolver timings in the response
//! - [`LoggingConfig`] - Installs a `tracing-subscriber` for those events
//!
//! Both extensions keep per-query state in the query context, so a single
//! instance can be attached to a schema that serves concurrent queries.
//!
//! # Example
//!
//! ```
//! use periscope_engine::Schema;
//! use periscope_extensions::{TimingExtension, TracingExtension};
//! use periscope_query::schema::{Field, ObjectType, TypeSystem};
//! use serde_json::json;
//!
//! let query = ObjectType::new("Query")
//!     .field("a", Field::new("String").resolve(|_| Ok(json!("x"))));
//! let schema = Schema::new(TypeSystem::build(query).finish().unwrap())
//!     .with_extension(TracingExtension::new())
//!     .with_extension(TimingExtension::new());
//!
//! let response = schema.execute_sync("{ a }");
//! assert_eq!(response.data, Some(json!({ "a": "x" })));
//! assert!(response.extensions.unwrap().contains_key("timing"));
//! ```

pub mod clock;
mod logging;
mod timing;
mod tracing_extension;

pub use clock::{Clock, ClockProvider};
pub use logging::{LogFormat, LoggingConfig};
pub use timing::{
    ExecutionTiming, ResolverTiming, StageTiming, TIMING_VERSION, TimingExtension, TimingReport,
};
pub use tracing_extension::TracingExtension;

#[cfg(any(test, feature = "test-utils"))]
pub use clock::MockClock;
