//! Field resolver capability.
//!
//! A [`Resolver`] computes one field's raw value from its parent value, its
//! arguments and the request [`Context`]. Synchronous and asynchronous
//! resolvers share one representation: a boxed future factory.

use core::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use periscope_context::Context;
use serde_json::{Map, Value};

use crate::error::{BoxError, Location, PathSegment};
use crate::schema::TypeRef;

/// Static facts about the field being resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveInfo {
    /// Schema field name.
    pub field_name: String,
    /// Key in the response, i.e. the alias if one was given.
    pub response_key: String,
    /// Name of the object type declaring the field.
    pub parent_type: String,
    /// Declared type of the field.
    pub return_type: TypeRef,
    /// Result path, ending with this field's response key.
    pub path: Vec<PathSegment>,
    /// Location of the field in the query text.
    pub location: Location,
}

/// Everything a resolver receives.
#[derive(Debug, Clone)]
pub struct ResolveParams {
    /// The parent value, or the root value for top-level fields.
    pub source: Value,
    /// Argument values with variables substituted.
    pub args: Map<String, Value>,
    /// Request context, including everything extensions added for this field.
    pub context: Context,
    /// Field metadata.
    pub info: Arc<ResolveInfo>,
}

type ResolveFn = dyn Fn(ResolveParams) -> BoxFuture<'static, Result<Value, BoxError>> + Send + Sync;

/// A shareable field resolver.
#[derive(Clone)]
pub struct Resolver {
    inner: Arc<ResolveFn>,
}

impl Resolver {
    /// Wraps a synchronous function.
    pub fn new<F>(resolve: F) -> Self
    where
        F: Fn(ResolveParams) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(move |params| futures::future::ready(resolve(params)).boxed()),
        }
    }

    /// Wraps an asynchronous function.
    pub fn new_async<F, Fut>(resolve: F) -> Self
    where
        F: Fn(ResolveParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, BoxError>> + Send + 'static,
    {
        Self {
            inner: Arc::new(move |params| resolve(params).boxed()),
        }
    }

    /// Starts resolution. The synchronous part of the resolver runs here.
    pub fn call(&self, params: ResolveParams) -> BoxFuture<'static, Result<Value, BoxError>> {
        (self.inner)(params)
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Resolver(..)")
    }
}

/// Property lookup used for fields without a resolver.
///
/// Returns `source[field_name]`, or `null` when the source is not an object
/// or lacks the key.
#[must_use]
pub fn default_resolve(params: &ResolveParams) -> Value {
    params
        .source
        .get(&params.info.field_name)
        .cloned()
        .unwrap_or(Value::Null)
}
