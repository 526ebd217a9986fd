//! Value type checking
//!
//! Structural checks of metadata values against field type expressions.

use thalo_ast::{PrimitiveType, TypeExpression, Value, ValueContent};

/// Check a value against a type expression
///
/// An array type also accepts a single scalar that satisfies its element
/// type. Empty and unreadable values never match.
///
/// # Example
///
/// ```
/// use thalo_ast::{PrimitiveType, TypeExpression, ValueContent};
/// use thalo_validate::types::matches_type;
///
/// let ty = TypeExpression::Union(vec![
///     TypeExpression::Literal("high".into()),
///     TypeExpression::Literal("low".into()),
/// ]);
/// assert!(matches_type(&ty, &ValueContent::Plain("high".into())));
/// assert!(!matches_type(&ty, &ValueContent::Plain("medium".into())));
/// assert!(matches_type(
///     &TypeExpression::Primitive(PrimitiveType::Number),
///     &ValueContent::Number(3.0),
/// ));
/// ```
pub fn matches_type(ty: &TypeExpression, value: &ValueContent) -> bool {
    match ty {
        TypeExpression::Primitive(primitive) => matches_primitive(*primitive, value),
        TypeExpression::Literal(literal) => value.as_text() == Some(literal.as_str()),
        TypeExpression::Union(members) => members.iter().any(|member| matches_type(member, value)),
        TypeExpression::Array(element) => match value {
            ValueContent::Array(items) => items.iter().all(|item| matches_value(element, item)),
            scalar => matches_type(element, scalar),
        },
    }
}

/// [`matches_type`] over a whole value
pub fn matches_value(ty: &TypeExpression, value: &Value) -> bool {
    value
        .content
        .as_ref()
        .is_ok_and(|content| matches_type(ty, content))
}

fn matches_primitive(primitive: PrimitiveType, value: &ValueContent) -> bool {
    match primitive {
        PrimitiveType::String => matches!(value, ValueContent::Quoted(_) | ValueContent::Plain(_)),
        PrimitiveType::Number => matches!(value, ValueContent::Number(_)),
        PrimitiveType::Datetime => matches!(value, ValueContent::Datetime(_)),
        PrimitiveType::DateRange => matches!(value, ValueContent::DateRange(_)),
        PrimitiveType::Link => matches!(value, ValueContent::Link(_)),
    }
}
