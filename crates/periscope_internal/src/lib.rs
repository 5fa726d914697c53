//! # Periscope Internal Library
//!
//! Re-exports the core Periscope crates for convenience.

/// Typed context chain threaded through every stage.
pub use periscope_context;

/// Document model, parser, validator and type system.
pub use periscope_query;

/// Extension hooks, pipeline and response assembly.
pub use periscope_engine;

/// Ready-made tracing and timing extensions.
pub use periscope_extensions;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use periscope_context::Context;
    pub use periscope_engine::extension::{
        ExecutionFinishFn, Extension, FieldResult, ParseFinishFn, ResolveFieldFinishFn,
        ValidationFinishFn, execution_finish, parse_finish, resolve_field_finish,
        validation_finish,
    };
    pub use periscope_engine::{ExecutorConfig, Phase, Request, Response, Schema, execute};
    pub use periscope_extensions::{LogFormat, LoggingConfig, TimingExtension, TracingExtension};
    pub use periscope_query::{
        Field, ObjectType, QueryError, ResolveInfo, ResolveParams, TypeRef, TypeSystem, Value,
    };
}
