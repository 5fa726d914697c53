//! Query-language collaborators for the Periscope engine.
//!
//! This crate holds the stages that the instrumentation layer wraps but does
//! not own:
//!
//! - [`ast`] - Parsed document model with source locations
//! - [`parser`] - Document text to [`Document`](ast::Document)
//! - [`schema`] - Object types, fields, scalars and the [`TypeSystem`]
//! - [`resolver`] - Field resolver capability and [`ResolveInfo`]
//! - [`validation`] - Static checks of a document against a type system
//! - [`error`] - User-facing [`QueryError`] with locations and result path
//!
//! Grammar coverage is deliberately narrow: operations, fields, aliases,
//! arguments and variables. Fragments and directives are not recognised.

/// Parsed document model.
pub mod ast;

/// User-facing error representation.
pub mod error;

/// Recursive descent parser.
pub mod parser;

/// Field resolver capability.
pub mod resolver;

/// Object types, scalars and the type system.
pub mod schema;

/// Static document validation.
pub mod validation;

pub use error::{BoxError, Location, ParseError, PathSegment, QueryError};
pub use resolver::{ResolveInfo, ResolveParams, Resolver};
pub use schema::{Field, ObjectType, ScalarType, SchemaError, TypeRef, TypeSystem};

/// JSON value type used for data, arguments and variables.
pub use serde_json::{Map, Value};
