//! Instrumentation and extension layer of the Periscope query engine.
//!
//! Extensions attach to a [`Schema`] and observe every query as it moves
//! through initialisation, parsing, validation, execution and per-field
//! resolution. Hooks can derive new [`Context`](periscope_context::Context)
//! values for the stages that follow, but they cannot crash the host or
//! silently abort a query: every call into extension code passes through a
//! fault barrier and any fault becomes an ordinary error in the response.
//!
//! # Architecture
//!
//! - [`extension`] - The [`Extension`] trait and finish-function types
//! - [`hooks`] - Phase labels, fault barrier and the [`ExtensionRegistry`]
//! - [`pipeline`] - Stage ordering and per-phase abort policy
//! - [`executor`] - Field resolution with context threading and null propagation
//! - [`response`] - [`Response`] and the aggregator that assembles it
//! - [`schema`] - [`Schema`], the entry point
//!
//! # Example
//!
//! ```
//! use periscope_context::Context;
//! use periscope_engine::extension::Extension;
//! use periscope_engine::{Request, Schema};
//! use periscope_query::schema::{Field, ObjectType, TypeSystem};
//! use serde_json::{Value, json};
//!
//! struct Version;
//!
//! impl Extension for Version {
//!     fn name(&self) -> &str {
//!         "version"
//!     }
//!
//!     fn has_result(&self) -> bool {
//!         true
//!     }
//!
//!     fn get_result(&self, _ctx: &Context) -> Value {
//!         json!(1)
//!     }
//! }
//!
//! let query = ObjectType::new("Query")
//!     .field("a", Field::new("String").resolve(|_| Ok(json!("foo"))));
//! let schema = Schema::new(TypeSystem::build(query).finish().unwrap()).with_extension(Version);
//!
//! let response = schema.execute_sync(Request::new("{ a }"));
//! assert_eq!(
//!     serde_json::to_value(&response).unwrap(),
//!     json!({ "data": { "a": "foo" }, "extensions": { "version": 1 } })
//! );
//! ```

pub mod error;
pub mod executor;
pub mod extension;
pub mod hooks;
pub mod pipeline;
pub mod request;
pub mod response;
pub mod schema;

pub use error::PhaseError;
pub use executor::ExecutorConfig;
pub use extension::{
    ExecutionFinishFn, Extension, FieldResult, ParseFinishFn, ResolveFieldFinishFn,
    ValidationFinishFn,
};
pub use hooks::{ExtensionRegistry, Phase};
pub use request::Request;
pub use response::{Response, ResultMap};
pub use schema::{Schema, execute};
