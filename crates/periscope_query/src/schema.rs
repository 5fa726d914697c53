//! Object types, scalars and the type system.
//!
//! Types reference each other by name. Every object type reachable from a
//! field must be registered with the [`TypeSystemBuilder`] before
//! [`finish`](TypeSystemBuilder::finish) succeeds.
//!
//! # Example
//!
//! ```
//! use periscope_query::schema::{Field, ObjectType, TypeRef, TypeSystem};
//! use serde_json::json;
//!
//! let item = ObjectType::new("Item")
//!     .field("name", Field::new("String"));
//!
//! let query = ObjectType::new("Query")
//!     .field(
//!         "items",
//!         Field::new(TypeRef::list("Item")).resolve(|_| Ok(json!([{ "name": "a" }]))),
//!     );
//!
//! let types = TypeSystem::build(query).register(item).finish().unwrap();
//! assert!(types.object("Item").is_some());
//! ```

use core::fmt;
use std::future::Future;

use indexmap::IndexMap;
use serde_json::Value;

use crate::ast::OperationKind;
use crate::error::BoxError;
use crate::resolver::{ResolveParams, Resolver};

// ─────────────────────────────────────────────────────────────────────────────
// TypeRef
// ─────────────────────────────────────────────────────────────────────────────

/// Reference to an output or input type, with list and non-null wrappers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// A named scalar or object type.
    Named(String),
    /// A list of the inner type.
    List(Box<TypeRef>),
    /// The inner type, never null.
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    /// A named type.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    /// A list of `inner`.
    #[must_use]
    pub fn list(inner: impl Into<TypeRef>) -> Self {
        TypeRef::List(Box::new(inner.into()))
    }

    /// `inner`, marked non-null.
    #[must_use]
    pub fn non_null(inner: impl Into<TypeRef>) -> Self {
        TypeRef::NonNull(Box::new(inner.into()))
    }

    /// Returns the innermost named type.
    #[must_use]
    pub fn named_type(&self) -> &str {
        match self {
            TypeRef::Named(name) => name,
            TypeRef::List(inner) | TypeRef::NonNull(inner) => inner.named_type(),
        }
    }

    /// Returns `true` for a non-null wrapper.
    #[must_use]
    pub fn is_non_null(&self) -> bool {
        matches!(self, TypeRef::NonNull(_))
    }
}

impl From<&str> for TypeRef {
    fn from(name: &str) -> Self {
        TypeRef::Named(name.to_owned())
    }
}

impl From<String> for TypeRef {
    fn from(name: String) -> Self {
        TypeRef::Named(name)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => f.write_str(name),
            TypeRef::List(inner) => write!(f, "[{inner}]"),
            TypeRef::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ScalarType
// ─────────────────────────────────────────────────────────────────────────────

/// Built-in leaf types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// UTF-8 text.
    String,
    /// Signed 32-bit integer.
    Int,
    /// Double-precision float.
    Float,
    /// `true` or `false`.
    Boolean,
    /// Opaque identifier, serialised as a string.
    Id,
}

impl ScalarType {
    /// Looks a built-in scalar up by its schema name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "String" => Some(ScalarType::String),
            "Int" => Some(ScalarType::Int),
            "Float" => Some(ScalarType::Float),
            "Boolean" => Some(ScalarType::Boolean),
            "ID" => Some(ScalarType::Id),
            _ => None,
        }
    }

    /// Returns the schema name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ScalarType::String => "String",
            ScalarType::Int => "Int",
            ScalarType::Float => "Float",
            ScalarType::Boolean => "Boolean",
            ScalarType::Id => "ID",
        }
    }

    /// Serialises a resolved value as this scalar.
    ///
    /// Returns `None` when the value cannot be represented.
    #[must_use]
    pub fn coerce(self, value: &Value) -> Option<Value> {
        match (self, value) {
            (_, Value::Null) => Some(Value::Null),
            (ScalarType::String | ScalarType::Id, Value::String(_)) => Some(value.clone()),
            (ScalarType::String | ScalarType::Id, Value::Number(n)) => {
                Some(Value::String(n.to_string()))
            }
            (ScalarType::String, Value::Bool(b)) => Some(Value::String(b.to_string())),
            (ScalarType::Int, Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .filter(|i| i32::try_from(*i).is_ok())
                .map(Value::from),
            (ScalarType::Int, Value::Bool(b)) => Some(Value::from(i64::from(*b))),
            (ScalarType::Float, Value::Number(n)) => n.as_f64().map(Value::from),
            (ScalarType::Boolean, Value::Bool(_)) => Some(value.clone()),
            (ScalarType::Boolean, Value::Number(n)) => n.as_f64().map(|f| Value::Bool(f != 0.0)),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Field & ObjectType
// ─────────────────────────────────────────────────────────────────────────────

/// A field definition on an object type.
#[derive(Clone)]
pub struct Field {
    ty: TypeRef,
    arguments: IndexMap<String, TypeRef>,
    resolver: Option<Resolver>,
}

impl Field {
    /// Creates a field of the given type that uses the default resolver.
    #[must_use]
    pub fn new(ty: impl Into<TypeRef>) -> Self {
        Self {
            ty: ty.into(),
            arguments: IndexMap::new(),
            resolver: None,
        }
    }

    /// Declares an argument.
    #[must_use]
    pub fn argument(mut self, name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        self.arguments.insert(name.into(), ty.into());
        self
    }

    /// Attaches a synchronous resolver.
    #[must_use]
    pub fn resolve<F>(mut self, resolve: F) -> Self
    where
        F: Fn(ResolveParams) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.resolver = Some(Resolver::new(resolve));
        self
    }

    /// Attaches an asynchronous resolver.
    #[must_use]
    pub fn resolve_async<F, Fut>(mut self, resolve: F) -> Self
    where
        F: Fn(ResolveParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, BoxError>> + Send + 'static,
    {
        self.resolver = Some(Resolver::new_async(resolve));
        self
    }

    /// Returns the field's type.
    #[must_use]
    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    /// Returns the declared arguments in declaration order.
    #[must_use]
    pub fn arguments(&self) -> &IndexMap<String, TypeRef> {
        &self.arguments
    }

    /// Returns the custom resolver, if any.
    #[must_use]
    pub fn resolver(&self) -> Option<&Resolver> {
        self.resolver.as_ref()
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("ty", &self.ty)
            .field("arguments", &self.arguments)
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

/// An object type: a name and an ordered set of fields.
#[derive(Debug, Clone)]
pub struct ObjectType {
    name: String,
    fields: IndexMap<String, Field>,
}

impl ObjectType {
    /// Creates an object type with no fields.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
        }
    }

    /// Adds a field. A later field with the same name replaces the earlier one.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    /// Returns the type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks a field up by name.
    #[must_use]
    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Iterates over fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TypeSystem
// ─────────────────────────────────────────────────────────────────────────────

/// A named type resolved against the type system.
#[derive(Debug, Clone, Copy)]
pub enum NamedType<'a> {
    /// A built-in scalar.
    Scalar(ScalarType),
    /// A registered object type.
    Object(&'a ObjectType),
}

/// Errors raised while assembling a type system.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// Two object types share a name, or an object shadows a scalar.
    #[error("duplicate type name: {0}")]
    DuplicateType(String),

    /// An object type declares no fields.
    #[error("object type {0} must define one or more fields")]
    EmptyObject(String),

    /// A field or argument references an unregistered type.
    #[error("unknown type {type_name} referenced by {owner}.{field}")]
    UnknownType {
        /// The object type declaring the field.
        owner: String,
        /// The field (or `field(argument)`) making the reference.
        field: String,
        /// The missing type name.
        type_name: String,
    },

    /// An argument references an object type.
    #[error("argument {owner}.{field} must be a scalar, found {type_name}")]
    NonInputArgument {
        /// The object type declaring the field.
        owner: String,
        /// The field and argument, as `field(argument)`.
        field: String,
        /// The offending type name.
        type_name: String,
    },
}

/// All object types of a schema plus its operation roots.
#[derive(Debug, Clone)]
pub struct TypeSystem {
    query: String,
    mutation: Option<String>,
    objects: IndexMap<String, ObjectType>,
}

impl TypeSystem {
    /// Starts a type system rooted at `query`.
    #[must_use]
    pub fn build(query: ObjectType) -> TypeSystemBuilder {
        TypeSystemBuilder {
            query,
            mutation: None,
            types: Vec::new(),
        }
    }

    /// Returns the query root type.
    #[must_use]
    pub fn query_type(&self) -> &ObjectType {
        &self.objects[&self.query]
    }

    /// Returns the mutation root type, if configured.
    #[must_use]
    pub fn mutation_type(&self) -> Option<&ObjectType> {
        self.mutation.as_ref().map(|name| &self.objects[name])
    }

    /// Returns the root type for an operation kind.
    #[must_use]
    pub fn root_type(&self, kind: OperationKind) -> Option<&ObjectType> {
        match kind {
            OperationKind::Query => Some(self.query_type()),
            OperationKind::Mutation => self.mutation_type(),
        }
    }

    /// Looks an object type up by name.
    #[must_use]
    pub fn object(&self, name: &str) -> Option<&ObjectType> {
        self.objects.get(name)
    }

    /// Resolves a type name to a scalar or object type.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<NamedType<'_>> {
        ScalarType::from_name(name)
            .map(NamedType::Scalar)
            .or_else(|| self.objects.get(name).map(NamedType::Object))
    }
}

/// Builder for [`TypeSystem`].
pub struct TypeSystemBuilder {
    query: ObjectType,
    mutation: Option<ObjectType>,
    types: Vec<ObjectType>,
}

impl TypeSystemBuilder {
    /// Sets the mutation root type.
    #[must_use]
    pub fn mutation(mut self, mutation: ObjectType) -> Self {
        self.mutation = Some(mutation);
        self
    }

    /// Registers an additional object type.
    #[must_use]
    pub fn register(mut self, object: ObjectType) -> Self {
        self.types.push(object);
        self
    }

    /// Checks every type reference and assembles the type system.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] for duplicate or empty types and for
    /// references to types that were never registered.
    pub fn finish(self) -> Result<TypeSystem, SchemaError> {
        let query = self.query.name.clone();
        let mutation = self.mutation.as_ref().map(|m| m.name.clone());

        let mut objects = IndexMap::new();
        let all = core::iter::once(self.query)
            .chain(self.mutation)
            .chain(self.types);
        for object in all {
            if ScalarType::from_name(&object.name).is_some() || objects.contains_key(&object.name)
            {
                return Err(SchemaError::DuplicateType(object.name));
            }
            if object.fields.is_empty() {
                return Err(SchemaError::EmptyObject(object.name));
            }
            objects.insert(object.name.clone(), object);
        }

        for object in objects.values() {
            for (field_name, field) in &object.fields {
                let named = field.ty.named_type();
                if ScalarType::from_name(named).is_none() && !objects.contains_key(named) {
                    return Err(SchemaError::UnknownType {
                        owner: object.name.clone(),
                        field: field_name.clone(),
                        type_name: named.to_owned(),
                    });
                }
                for (arg_name, arg_ty) in &field.arguments {
                    let named = arg_ty.named_type();
                    if ScalarType::from_name(named).is_some() {
                        continue;
                    }
                    let field = format!("{field_name}({arg_name})");
                    let owner = object.name.clone();
                    let type_name = named.to_owned();
                    return Err(if objects.contains_key(named) {
                        SchemaError::NonInputArgument {
                            owner,
                            field,
                            type_name,
                        }
                    } else {
                        SchemaError::UnknownType {
                            owner,
                            field,
                            type_name,
                        }
                    });
                }
            }
        }

        Ok(TypeSystem {
            query,
            mutation,
            objects,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query() -> ObjectType {
        ObjectType::new("Query").field("a", Field::new("String"))
    }

    #[test]
    fn type_ref_display() {
        let ty = TypeRef::non_null(TypeRef::list(TypeRef::non_null("Int")));
        assert_eq!(ty.to_string(), "[Int!]!");
        assert_eq!(ty.named_type(), "Int");
        assert!(ty.is_non_null());
    }

    #[test]
    fn scalar_coercion() {
        assert_eq!(ScalarType::String.coerce(&json!(3)), Some(json!("3")));
        assert_eq!(ScalarType::Int.coerce(&json!(3.0)), Some(json!(3)));
        assert_eq!(ScalarType::Int.coerce(&json!(3.5)), None);
        assert_eq!(ScalarType::Int.coerce(&json!(i64::MAX)), None);
        assert_eq!(ScalarType::Boolean.coerce(&json!("yes")), None);
        assert_eq!(ScalarType::Float.coerce(&json!(null)), Some(json!(null)));
    }

    #[test]
    fn finish_rejects_unknown_types() {
        let q = query().field("b", Field::new("Missing"));
        let err = TypeSystem::build(q).finish().unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownType {
                owner: "Query".into(),
                field: "b".into(),
                type_name: "Missing".into(),
            }
        );
    }

    #[test]
    fn finish_rejects_empty_and_duplicate_types() {
        let err = TypeSystem::build(query())
            .register(ObjectType::new("Empty"))
            .finish()
            .unwrap_err();
        assert_eq!(err, SchemaError::EmptyObject("Empty".into()));

        let err = TypeSystem::build(query())
            .register(query())
            .finish()
            .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateType("Query".into()));
    }

    #[test]
    fn finish_rejects_object_arguments() {
        let item = ObjectType::new("Item").field("id", Field::new("ID"));
        let q = query().field("item", Field::new("Item").argument("filter", "Item"));
        let err = TypeSystem::build(q).register(item).finish().unwrap_err();
        assert!(matches!(err, SchemaError::NonInputArgument { .. }));
    }

    #[test]
    fn lookup_resolves_scalars_and_objects() {
        let types = TypeSystem::build(query()).finish().unwrap();
        assert!(matches!(
            types.lookup("Int"),
            Some(NamedType::Scalar(ScalarType::Int))
        ));
        assert!(matches!(types.lookup("Query"), Some(NamedType::Object(_))));
        assert!(types.lookup("Nope").is_none());
        assert!(types.root_type(OperationKind::Mutation).is_none());
    }
}
