//! Persistent, typed execution context for Periscope (Layer 1).
//!
//! `periscope_context` provides the immutable environment that is threaded
//! through every phase of query processing:
//!
//! - [`Context`] - Cheap-to-clone chain of typed values
//! - [`ContextBuilder`] - Derives a child scope holding several values at once
//! - [`ContextValue`] - Marker for types that can be stored in a context
//!
//! # Scoping
//!
//! A context is never mutated after creation. Every addition derives a new
//! child that shares its ancestors:
//!
//! ```text
//! Request Context (local: RequestId)
//!    │
//!    └── Execution Context (local: TraceHandle)
//!           │
//!           ├── Field `a` Context (local: FieldPath ["a"])
//!           │      └── Field `a.foo` Context
//!           │
//!           └── Field `b` Context (local: FieldPath ["b"])
//! ```
//!
//! Siblings never observe each other's additions; children see everything
//! their ancestors bound.
//!
//! # Example
//!
//! ```
//! use periscope_context::Context;
//!
//! #[derive(Debug, PartialEq)]
//! struct RequestId(u64);
//!
//! let root = Context::new();
//! let derived = root.with(RequestId(7));
//!
//! assert_eq!(derived.get::<RequestId>(), Some(&RequestId(7)));
//! assert!(root.get::<RequestId>().is_none());
//! ```

/// Context chain and builder.
pub mod context;

pub use context::{Context, ContextBuilder, ContextValue};
