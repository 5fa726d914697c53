//! Extensible query execution with fault-isolated instrumentation hooks.
//!
//! # Example
//!
//! ```
//! use periscope::prelude::*;
//! use serde_json::json;
//!
//! let query = ObjectType::new("Query")
//!     .field("a", Field::new("String").resolve(|_| Ok(json!("foo"))));
//! let schema = Schema::new(TypeSystem::build(query).finish().unwrap())
//!     .with_extension(TimingExtension::new());
//!
//! let response = execute(&schema, "{ a }", Context::new());
//! assert_eq!(response.data, Some(json!({ "a": "foo" })));
//! ```

pub use periscope_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use periscope_internal::prelude::*;
}
