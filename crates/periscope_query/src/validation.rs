//! Static document validation.
//!
//! Checks a parsed [`Document`] against a [`TypeSystem`] before anything is
//! resolved. All problems are collected; validation never stops at the first
//! one.

use crate::ast::{Document, Operation, OperationKind, Selection};
use crate::error::QueryError;
use crate::schema::{NamedType, ObjectType, TypeSystem};

/// Validates every operation in `document`.
///
/// Returns an empty list when the document is valid.
///
/// # Example
///
/// ```
/// use periscope_query::parser::parse;
/// use periscope_query::schema::{Field, ObjectType, TypeSystem};
/// use periscope_query::validation::validate;
///
/// let types = TypeSystem::build(ObjectType::new("Query").field("a", Field::new("String")))
///     .finish()
///     .unwrap();
///
/// assert!(validate(&types, &parse("{ a }").unwrap()).is_empty());
///
/// let errors = validate(&types, &parse("{ b }").unwrap());
/// assert_eq!(errors[0].message, "Cannot query field \"b\" on type \"Query\".");
/// ```
#[must_use]
pub fn validate(types: &TypeSystem, document: &Document) -> Vec<QueryError> {
    let mut errors = Vec::new();

    if document.operations.len() > 1 {
        for op in document.operations.iter().filter(|op| op.name.is_none()) {
            errors.push(
                QueryError::new("This anonymous operation must be the only defined operation.")
                    .with_location(op.location),
            );
        }
    }
    for (i, op) in document.operations.iter().enumerate() {
        let Some(name) = &op.name else { continue };
        let duplicate = document.operations[..i]
            .iter()
            .any(|prev| prev.name.as_ref() == Some(name));
        if duplicate {
            errors.push(
                QueryError::new(format!("There can be only one operation named \"{name}\"."))
                    .with_location(op.location),
            );
        }
    }

    for op in &document.operations {
        validate_operation(types, op, &mut errors);
    }
    errors
}

fn validate_operation(types: &TypeSystem, op: &Operation, errors: &mut Vec<QueryError>) {
    for (i, var) in op.variables.iter().enumerate() {
        if op.variables[..i].iter().any(|prev| prev.name == var.name) {
            errors.push(
                QueryError::new(format!(
                    "There can be only one variable named \"${}\".",
                    var.name
                ))
                .with_location(var.location),
            );
        }
        match types.lookup(var.ty.named_type()) {
            Some(NamedType::Scalar(_)) => {}
            _ => errors.push(
                QueryError::new(format!(
                    "Variable \"${}\" cannot be non-input type \"{}\".",
                    var.name, var.ty
                ))
                .with_location(var.location),
            ),
        }
    }

    let Some(root) = types.root_type(op.kind) else {
        let message = match op.kind {
            OperationKind::Query => "Schema is not configured for queries.",
            OperationKind::Mutation => "Schema is not configured for mutations.",
        };
        errors.push(QueryError::new(message).with_location(op.location));
        return;
    };

    let mut checker = SelectionChecker {
        types,
        op,
        errors,
    };
    checker.check(root, &op.selection_set);
}

struct SelectionChecker<'a> {
    types: &'a TypeSystem,
    op: &'a Operation,
    errors: &'a mut Vec<QueryError>,
}

impl SelectionChecker<'_> {
    fn check(&mut self, parent: &ObjectType, selections: &[Selection]) {
        for selection in selections {
            self.check_field(parent, selection);
        }
    }

    fn check_field(&mut self, parent: &ObjectType, selection: &Selection) {
        let Some(field) = parent.get_field(&selection.name) else {
            self.errors.push(
                QueryError::new(format!(
                    "Cannot query field \"{}\" on type \"{}\".",
                    selection.name,
                    parent.name()
                ))
                .with_location(selection.location),
            );
            return;
        };

        for (arg_name, value) in &selection.arguments {
            if !field.arguments().contains_key(arg_name) {
                self.errors.push(
                    QueryError::new(format!(
                        "Unknown argument \"{arg_name}\" on field \"{}\" of type \"{}\".",
                        selection.name,
                        parent.name()
                    ))
                    .with_location(selection.location),
                );
            }
            let mut referenced = Vec::new();
            value.variables(&mut referenced);
            for var in referenced {
                if !self.op.variables.iter().any(|def| def.name == var) {
                    self.errors.push(
                        QueryError::new(format!("Variable \"${var}\" is not defined."))
                            .with_location(selection.location),
                    );
                }
            }
        }

        for (arg_name, arg_ty) in field.arguments() {
            let provided = selection.arguments.iter().any(|(name, _)| name == arg_name);
            if arg_ty.is_non_null() && !provided {
                self.errors.push(
                    QueryError::new(format!(
                        "Field \"{}\" argument \"{arg_name}\" of type \"{arg_ty}\" is required but not provided.",
                        selection.name
                    ))
                    .with_location(selection.location),
                );
            }
        }

        let ty = field.ty();
        match self.types.lookup(ty.named_type()) {
            Some(NamedType::Scalar(_)) if !selection.selection_set.is_empty() => {
                self.errors.push(
                    QueryError::new(format!(
                        "Field \"{}\" must not have a selection since type \"{ty}\" has no subfields.",
                        selection.name
                    ))
                    .with_location(selection.location),
                );
            }
            Some(NamedType::Object(_)) if selection.selection_set.is_empty() => {
                self.errors.push(
                    QueryError::new(format!(
                        "Field \"{}\" of type \"{ty}\" must have a selection of subfields.",
                        selection.name
                    ))
                    .with_location(selection.location),
                );
            }
            Some(NamedType::Object(object)) => self.check(object, &selection.selection_set),
            _ => {}
        }
    }
}
