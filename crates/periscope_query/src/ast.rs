//! Parsed document model.
//!
//! Every operation and field keeps the [`Location`] of its first token so that
//! errors raised later in the pipeline can point back into the query text.

use serde_json::{Map, Number, Value};

use crate::error::Location;
use crate::schema::TypeRef;

/// A parsed request document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Operations in source order.
    pub operations: Vec<Operation>,
}

impl Document {
    /// Picks the operation to run.
    ///
    /// With no name, the document must contain exactly one operation.
    ///
    /// # Errors
    ///
    /// Returns the user-facing message when no single operation matches.
    pub fn operation(&self, name: Option<&str>) -> Result<&Operation, String> {
        match name {
            Some(name) => self
                .operations
                .iter()
                .find(|op| op.name.as_deref() == Some(name))
                .ok_or_else(|| format!("Unknown operation named \"{name}\".")),
            None => match self.operations.as_slice() {
                [single] => Ok(single),
                [] => Err("Must provide an operation.".to_owned()),
                _ => Err("Must provide operation name if query contains multiple operations."
                    .to_owned()),
            },
        }
    }
}

/// Operation type keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// `query` or shorthand `{ ... }`.
    Query,
    /// `mutation`.
    Mutation,
}

impl OperationKind {
    /// Returns the keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
        }
    }
}

/// A single operation definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// Query or mutation.
    pub kind: OperationKind,
    /// Optional operation name.
    pub name: Option<String>,
    /// Declared variables.
    pub variables: Vec<VariableDefinition>,
    /// Top-level selections.
    pub selection_set: Vec<Selection>,
    /// Location of the operation keyword or opening brace.
    pub location: Location,
}

/// A `$name: Type = default` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDefinition {
    /// Name without the `$`.
    pub name: String,
    /// Declared type.
    pub ty: TypeRef,
    /// Default used when the request does not supply a value.
    pub default_value: Option<InputValue>,
    /// Location of the `$`.
    pub location: Location,
}

/// A field selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Response key override.
    pub alias: Option<String>,
    /// Schema field name.
    pub name: String,
    /// Arguments in source order.
    pub arguments: Vec<(String, InputValue)>,
    /// Nested selections; empty for leaf fields.
    pub selection_set: Vec<Selection>,
    /// Location of the alias or field name.
    pub location: Location,
}

impl Selection {
    /// Returns the key this field occupies in the response.
    #[must_use]
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Evaluates the arguments against the request variables.
    #[must_use]
    pub fn argument_values(&self, variables: &Map<String, Value>) -> Map<String, Value> {
        self.arguments
            .iter()
            .map(|(name, value)| (name.clone(), value.evaluate(variables)))
            .collect()
    }
}

/// A literal or variable in argument position.
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    /// `null`.
    Null,
    /// Integer literal.
    Int(i64),
    /// Float literal.
    Float(f64),
    /// String literal, escapes already decoded.
    String(String),
    /// `true` / `false`.
    Boolean(bool),
    /// Bare enum value.
    Enum(String),
    /// `$name` reference.
    Variable(String),
    /// `[ ... ]`.
    List(Vec<InputValue>),
    /// `{ key: value }`.
    Object(Vec<(String, InputValue)>),
}

impl InputValue {
    /// Converts the literal into a JSON value, substituting variables.
    ///
    /// Unknown variables evaluate to `null`.
    #[must_use]
    pub fn evaluate(&self, variables: &Map<String, Value>) -> Value {
        match self {
            InputValue::Null => Value::Null,
            InputValue::Int(i) => Value::from(*i),
            InputValue::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            InputValue::String(s) | InputValue::Enum(s) => Value::String(s.clone()),
            InputValue::Boolean(b) => Value::Bool(*b),
            InputValue::Variable(name) => variables.get(name).cloned().unwrap_or(Value::Null),
            InputValue::List(items) => {
                Value::Array(items.iter().map(|item| item.evaluate(variables)).collect())
            }
            InputValue::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(key, value)| (key.clone(), value.evaluate(variables)))
                    .collect(),
            ),
        }
    }

    /// Collects the names of every variable referenced by this value.
    pub fn variables<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            InputValue::Variable(name) => out.push(name),
            InputValue::List(items) => items.iter().for_each(|item| item.variables(out)),
            InputValue::Object(fields) => fields.iter().for_each(|(_, value)| value.variables(out)),
            _ => {}
        }
    }
}
