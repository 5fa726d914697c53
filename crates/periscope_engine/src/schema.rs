//! Executable schema: a type system plus its extensions.
//!
//! # Example
//!
//! ```
//! use periscope_engine::Schema;
//! use periscope_query::schema::{Field, ObjectType, TypeSystem};
//! use serde_json::json;
//!
//! let query = ObjectType::new("Type")
//!     .field("a", Field::new("String").resolve(|_| Ok(json!("foo"))));
//! let schema = Schema::new(TypeSystem::build(query).finish().unwrap());
//!
//! let response = schema.execute_sync("query Example { a }");
//! assert_eq!(response.data, Some(json!({ "a": "foo" })));
//! assert!(response.errors.is_empty());
//! assert!(response.extensions.is_none());
//! ```

use std::sync::Arc;

use periscope_context::Context;
use periscope_query::TypeSystem;
use tracing::Instrument;

use crate::executor::ExecutorConfig;
use crate::extension::Extension;
use crate::hooks::ExtensionRegistry;
use crate::pipeline::Pipeline;
use crate::request::Request;
use crate::response::Response;

/// A type system with attached extensions, ready to execute queries.
///
/// Cloning is cheap; clones share the type system and the extension
/// instances.
#[derive(Debug, Clone)]
pub struct Schema {
    types: Arc<TypeSystem>,
    extensions: ExtensionRegistry,
    config: ExecutorConfig,
}

impl Schema {
    /// Wraps a type system with no extensions and the default configuration.
    #[must_use]
    pub fn new(types: TypeSystem) -> Self {
        Self {
            types: Arc::new(types),
            extensions: ExtensionRegistry::new(),
            config: ExecutorConfig::default(),
        }
    }

    /// Replaces the execution settings.
    #[must_use]
    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Builder form of [`add_extension`](Self::add_extension), consuming and
    /// returning the schema so attachments can be chained at construction.
    ///
    /// ```ignore
    /// let schema = Schema::new(types)
    ///     .with_extension(TracingExtension::new())
    ///     .with_extension(TimingExtension::new());
    /// ```
    #[must_use]
    pub fn with_extension(mut self, extension: impl Extension) -> Self {
        self.add_extension(extension);
        self
    }

    /// Registers an extension on an existing schema, after those already
    /// attached. Its hooks run in that position for every later query.
    pub fn add_extension(&mut self, extension: impl Extension) -> &mut Self {
        self.extensions.register(extension);
        self
    }

    /// Attaches several extensions, preserving their order.
    pub fn add_extensions<I>(&mut self, extensions: I) -> &mut Self
    where
        I: IntoIterator<Item = Arc<dyn Extension>>,
    {
        for extension in extensions {
            self.extensions.register_shared(extension);
        }
        self
    }

    /// Returns the type system.
    #[must_use]
    pub fn types(&self) -> &TypeSystem {
        &self.types
    }

    /// Returns the attached extensions.
    #[must_use]
    pub fn extensions(&self) -> &ExtensionRegistry {
        &self.extensions
    }

    /// Returns the execution settings.
    #[must_use]
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Runs a request through the pipeline.
    ///
    /// Always returns a well-formed response; faults raised by extensions
    /// and resolvers are reported as errors.
    pub async fn execute(&self, request: impl Into<Request>) -> Response {
        let request = request.into();
        let span = tracing::debug_span!(
            "execute",
            operation = request.operation_name.as_deref().unwrap_or(""),
            extensions = self.extensions.len()
        );
        Pipeline::new(self).run(request).instrument(span).await
    }

    /// Runs a request to completion on the current thread.
    ///
    /// Resolvers that depend on a specific async runtime need
    /// [`execute`](Self::execute) instead.
    #[must_use]
    pub fn execute_sync(&self, request: impl Into<Request>) -> Response {
        futures::executor::block_on(self.execute(request))
    }
}

/// Executes `query` against `schema` with `context` as the root context.
#[must_use]
pub fn execute(schema: &Schema, query: &str, context: Context) -> Response {
    schema.execute_sync(Request::new(query).with_context(context))
}
