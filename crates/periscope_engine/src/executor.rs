//! Field-resolution engine.
//!
//! Walks an operation's selection tree, resolving each field through its
//! resolver and completing the raw value against the field's declared type.
//! Every field resolution is wrapped by the `ResolveField` DidStart/Finish
//! pair of the registered extensions.
//!
//! # Context flow
//!
//! ```text
//! execution context
//! ├── a: ResolveFieldDidStart(execution ctx) -> ctx(a)
//! │   ├── a.foo: ResolveFieldDidStart(ctx(a)) -> ctx(a.foo)
//! │   └── a.bar: ResolveFieldDidStart(ctx(a)) -> ctx(a.bar)
//! └── b: ResolveFieldDidStart(execution ctx) -> ctx(b)
//! ```
//!
//! A field's context reaches its resolver and its children, never its
//! siblings.
//!
//! # Null propagation
//!
//! A field error or a null in a non-null position makes the value null at
//! the nearest nullable ancestor. The error is recorded once, where it
//! happened.

use core::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use periscope_context::Context;
use periscope_query::ast::{Operation, OperationKind, Selection};
use periscope_query::resolver::default_resolve;
use periscope_query::schema::NamedType;
use periscope_query::{
    BoxError, Map, ObjectType, PathSegment, QueryError, ResolveInfo, ResolveParams, TypeRef,
    TypeSystem, Value,
};

use crate::extension::ResolveFieldFinishFn;
use crate::hooks::{ExtensionRegistry, Stage, panic_message};
use crate::response::ErrorSink;

// ─────────────────────────────────────────────────────────────────────────────
// ExecutorConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Execution settings shared by every query on a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorConfig {
    max_depth: usize,
    concurrent_fields: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutorConfig {
    /// Default maximum selection depth.
    pub const DEFAULT_MAX_DEPTH: usize = 64;

    /// Creates the default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            concurrent_fields: true,
        }
    }

    /// Sets the deepest selection level that will be resolved.
    ///
    /// Fields nested deeper become null with an error.
    #[must_use]
    pub const fn with_max_depth(mut self, max: usize) -> Self {
        self.max_depth = max;
        self
    }

    /// Chooses whether sibling fields of a query resolve concurrently.
    ///
    /// Top-level mutation fields always resolve one after another.
    #[must_use]
    pub const fn with_concurrent_fields(mut self, concurrent: bool) -> Self {
        self.concurrent_fields = concurrent;
        self
    }

    /// Returns the maximum selection depth.
    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Returns `true` if siblings resolve concurrently.
    #[must_use]
    pub const fn concurrent_fields(&self) -> bool {
        self.concurrent_fields
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Variables
// ─────────────────────────────────────────────────────────────────────────────

/// Applies defaults and checks the supplied variables against the
/// operation's declarations.
///
/// # Errors
///
/// Returns every variable that is missing or cannot be coerced.
pub fn coerce_variables(
    types: &TypeSystem,
    operation: &Operation,
    supplied: &Map<String, Value>,
) -> Result<Map<String, Value>, Vec<QueryError>> {
    let mut coerced = Map::new();
    let mut errors = Vec::new();

    for definition in &operation.variables {
        let name = &definition.name;
        let value = match supplied.get(name) {
            Some(value) => value.clone(),
            None => match &definition.default_value {
                Some(default) => default.evaluate(&Map::new()),
                None if definition.ty.is_non_null() => {
                    errors.push(
                        QueryError::new(format!(
                            "Variable \"${name}\" of required type \"{}\" was not provided.",
                            definition.ty
                        ))
                        .with_location(definition.location),
                    );
                    continue;
                }
                None => continue,
            },
        };

        match coerce_input(types, &definition.ty, value) {
            Some(value) => {
                coerced.insert(name.clone(), value);
            }
            None => errors.push(
                QueryError::new(format!(
                    "Variable \"${name}\" got invalid value for type \"{}\".",
                    definition.ty
                ))
                .with_location(definition.location),
            ),
        }
    }

    if errors.is_empty() {
        Ok(coerced)
    } else {
        Err(errors)
    }
}

fn coerce_input(types: &TypeSystem, ty: &TypeRef, value: Value) -> Option<Value> {
    match ty {
        TypeRef::NonNull(inner) => {
            if value.is_null() {
                return None;
            }
            coerce_input(types, inner, value)
        }
        _ if value.is_null() => Some(Value::Null),
        TypeRef::List(item) => match value {
            Value::Array(items) => items
                .into_iter()
                .map(|v| coerce_input(types, item, v))
                .collect::<Option<Vec<_>>>()
                .map(Value::Array),
            single => coerce_input(types, item, single).map(|v| Value::Array(vec![v])),
        },
        TypeRef::Named(name) => match types.lookup(name)? {
            NamedType::Scalar(scalar) => scalar.coerce(&value),
            NamedType::Object(_) => None,
        },
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Executor
// ─────────────────────────────────────────────────────────────────────────────

/// Marker for a null that must move to the nearest nullable ancestor.
///
/// The error that caused it has already been recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Bubble;

type Completion = Result<Value, Bubble>;

/// Resolves one operation.
pub struct Executor<'a> {
    types: &'a TypeSystem,
    extensions: &'a ExtensionRegistry,
    config: ExecutorConfig,
    variables: Map<String, Value>,
    errors: ErrorSink,
}

impl<'a> Executor<'a> {
    /// Creates an executor for one query.
    #[must_use]
    pub fn new(
        types: &'a TypeSystem,
        extensions: &'a ExtensionRegistry,
        config: ExecutorConfig,
        variables: Map<String, Value>,
    ) -> Self {
        Self {
            types,
            extensions,
            config,
            variables,
            errors: ErrorSink::new(),
        }
    }

    /// Executes `operation` and returns its data.
    ///
    /// Returns `None` if the schema has no root type for the operation.
    /// A null that propagates to the root yields `Some(Value::Null)`.
    pub async fn execute(
        &self,
        operation: &Operation,
        root: &Value,
        ctx: &Context,
    ) -> Option<Value> {
        let Some(root_type) = self.types.root_type(operation.kind) else {
            self.errors.push(
                QueryError::new(format!(
                    "Schema is not configured for {}s.",
                    operation.kind.as_str()
                ))
                .with_location(operation.location),
            );
            return None;
        };

        let serial = operation.kind == OperationKind::Mutation || !self.config.concurrent_fields;
        let data = self
            .execute_fields(root_type, root, &operation.selection_set, &[], ctx, 1, serial)
            .await;
        Some(data.map_or(Value::Null, Value::Object))
    }

    /// Consumes the executor, returning the field errors it recorded.
    #[must_use]
    pub fn into_errors(self) -> Vec<QueryError> {
        self.errors.into_inner()
    }

    fn execute_fields<'b>(
        &'b self,
        parent: &'b ObjectType,
        source: &'b Value,
        selections: &'b [Selection],
        path: &'b [PathSegment],
        ctx: &'b Context,
        depth: usize,
        serial: bool,
    ) -> BoxFuture<'b, Result<Map<String, Value>, Bubble>> {
        Box::pin(async move {
            let outcomes = if serial {
                let mut outcomes = Vec::with_capacity(selections.len());
                for selection in selections {
                    outcomes.push(
                        self.resolve_field(parent, source, selection, path, ctx, depth)
                            .await,
                    );
                }
                outcomes
            } else {
                join_all(selections.iter().map(|selection| {
                    self.resolve_field(parent, source, selection, path, ctx, depth)
                }))
                .await
            };

            let mut object = Map::new();
            for (selection, outcome) in selections.iter().zip(outcomes) {
                object.insert(selection.response_key().to_owned(), outcome?);
            }
            Ok(object)
        })
    }

    fn resolve_field<'b>(
        &'b self,
        parent: &'b ObjectType,
        source: &'b Value,
        selection: &'b Selection,
        parent_path: &'b [PathSegment],
        ctx: &'b Context,
        depth: usize,
    ) -> BoxFuture<'b, Completion> {
        Box::pin(async move {
            let mut path = parent_path.to_vec();
            path.push(PathSegment::Field(selection.response_key().to_owned()));

            let Some(field) = parent.get_field(&selection.name) else {
                return Ok(Value::Null);
            };
            let ty = field.ty();

            if depth > self.config.max_depth {
                self.errors.push(
                    QueryError::new(format!(
                        "Maximum selection depth of {} exceeded.",
                        self.config.max_depth
                    ))
                    .with_location(selection.location)
                    .with_path(path),
                );
                return null_or_bubble(ty);
            }

            let info = Arc::new(ResolveInfo {
                field_name: selection.name.clone(),
                response_key: selection.response_key().to_owned(),
                parent_type: parent.name().to_owned(),
                return_type: ty.clone(),
                path: path.clone(),
                location: selection.location,
            });
            tracing::trace!(path = %periscope_query::error::display_path(&path), "resolving field");

            let start = self.extensions.did_start(Stage::ResolveField, ctx, |ext, ctx| {
                ext.resolve_field_did_start(ctx, &info)
            });
            self.errors.extend(start.errors);
            let field_ctx = start.context;

            let params = ResolveParams {
                source: source.clone(),
                args: selection.argument_values(&self.variables),
                context: field_ctx.clone(),
                info: Arc::clone(&info),
            };
            let outcome: Result<Value, BoxError> = match field.resolver() {
                Some(resolver) => AssertUnwindSafe(async move { resolver.call(params).await })
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|payload| Err(panic_message(payload.as_ref()).into())),
                None => Ok(default_resolve(&params)),
            };

            let finish_errors = start
                .pending
                .finish_all(|finish: ResolveFieldFinishFn| finish(outcome.as_ref()));
            self.errors.extend(finish_errors);

            let value = match outcome {
                Ok(value) => value,
                Err(err) => {
                    self.errors.push(
                        QueryError::from_boxed(err)
                            .with_location(selection.location)
                            .with_path(path),
                    );
                    return null_or_bubble(ty);
                }
            };

            self.complete_value(ty, &info, selection, path, value, &field_ctx, depth)
                .await
        })
    }

    /// Completes `value` against `ty`, enforcing non-null.
    fn complete_value<'b>(
        &'b self,
        ty: &'b TypeRef,
        info: &'b ResolveInfo,
        selection: &'b Selection,
        path: Vec<PathSegment>,
        value: Value,
        ctx: &'b Context,
        depth: usize,
    ) -> BoxFuture<'b, Completion> {
        Box::pin(async move {
            match ty {
                TypeRef::NonNull(inner) => {
                    let completed = self
                        .complete_nullable(inner, info, selection, path.clone(), value, ctx, depth)
                        .await?;
                    if completed.is_null() {
                        self.errors.push(
                            QueryError::new(format!(
                                "Cannot return null for non-nullable field {}.{}.",
                                info.parent_type, info.field_name
                            ))
                            .with_location(selection.location)
                            .with_path(path),
                        );
                        return Err(Bubble);
                    }
                    Ok(completed)
                }
                _ => Ok(self
                    .complete_nullable(ty, info, selection, path, value, ctx, depth)
                    .await
                    .unwrap_or(Value::Null)),
            }
        })
    }

    fn complete_nullable<'b>(
        &'b self,
        ty: &'b TypeRef,
        info: &'b ResolveInfo,
        selection: &'b Selection,
        path: Vec<PathSegment>,
        value: Value,
        ctx: &'b Context,
        depth: usize,
    ) -> BoxFuture<'b, Completion> {
        Box::pin(async move {
            if value.is_null() {
                return Ok(Value::Null);
            }
            match ty {
                TypeRef::NonNull(_) => {
                    self.complete_value(ty, info, selection, path, value, ctx, depth)
                        .await
                }
                TypeRef::List(item_ty) => {
                    let items = match value {
                        Value::Array(items) => items,
                        other => {
                            return Err(self.field_error(
                                format!(
                                    "Expected a list for field {}.{}, found {}.",
                                    info.parent_type,
                                    info.field_name,
                                    kind_of(&other)
                                ),
                                selection,
                                path,
                            ));
                        }
                    };
                    let completions = items.into_iter().enumerate().map(|(index, item)| {
                        let mut item_path = path.clone();
                        item_path.push(PathSegment::Index(index));
                        self.complete_value(item_ty, info, selection, item_path, item, ctx, depth)
                    });
                    let completed = if self.config.concurrent_fields {
                        join_all(completions).await
                    } else {
                        let mut completed = Vec::new();
                        for completion in completions {
                            completed.push(completion.await);
                        }
                        completed
                    };
                    completed
                        .into_iter()
                        .collect::<Result<Vec<_>, _>>()
                        .map(Value::Array)
                }
                TypeRef::Named(name) => match self.types.lookup(name) {
                    Some(NamedType::Scalar(scalar)) => match scalar.coerce(&value) {
                        Some(coerced) => Ok(coerced),
                        None => Err(self.field_error(
                            format!("{} cannot represent value: {value}", scalar.name()),
                            selection,
                            path,
                        )),
                    },
                    Some(NamedType::Object(object)) => self
                        .execute_fields(
                            object,
                            &value,
                            &selection.selection_set,
                            &path,
                            ctx,
                            depth + 1,
                            !self.config.concurrent_fields,
                        )
                        .await
                        .map(Value::Object),
                    None => Err(self.field_error(
                        format!("Unknown type \"{name}\"."),
                        selection,
                        path,
                    )),
                },
            }
        })
    }

    fn field_error(
        &self,
        message: impl Into<String>,
        selection: &Selection,
        path: Vec<PathSegment>,
    ) -> Bubble {
        self.errors.push(
            QueryError::new(message)
                .with_location(selection.location)
                .with_path(path),
        );
        Bubble
    }
}

impl fmt::Debug for Executor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("config", &self.config)
            .field("extensions", self.extensions)
            .field("errors", &self.errors.len())
            .finish()
    }
}

fn null_or_bubble(ty: &TypeRef) -> Completion {
    if ty.is_non_null() {
        Err(Bubble)
    } else {
        Ok(Value::Null)
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
