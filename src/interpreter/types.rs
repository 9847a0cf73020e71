//! Runtime checks of type annotations and signatures.

use crate::{
    ast::types::TypeAnnotation,
    errors::errors::{RuntimeError, RuntimeErrorKind},
};

use super::{format::format_value, value::Value};

pub fn matches_type(value: &Value, annotation: &TypeAnnotation) -> bool {
    match annotation {
        TypeAnnotation::Named(name) => matches_named(value, name),
        TypeAnnotation::List(inner) => match value {
            Value::List(items) => items.iter().all(|item| matches_type(item, inner)),
            _ => false,
        },
        TypeAnnotation::Tuple(types) => match value {
            Value::Tuple(items) => {
                items.len() == types.len()
                    && items.iter().zip(types).all(|(item, t)| matches_type(item, t))
            }
            _ => false,
        },
        TypeAnnotation::Optional(inner) => {
            matches!(value, Value::Null) || matches_type(value, inner)
        }
    }
}

fn matches_named(value: &Value, name: &str) -> bool {
    match name {
        "Any" => true,
        "Int" => matches!(value, Value::Number(n) if n.fract() == 0.0 && n.is_finite()),
        "Float" | "Number" => matches!(value, Value::Number(_)),
        "String" => matches!(value, Value::String(_)),
        "Bool" | "Boolean" => matches!(value, Value::Bool(_)),
        "Null" => matches!(value, Value::Null),
        "List" => matches!(value, Value::List(_)),
        "Tuple" => matches!(value, Value::Tuple(_)),
        "Record" => matches!(value, Value::Record(_)),
        "Function" => value.is_callable(),
        "Pipeline" => matches!(value, Value::Pipeline(_) | Value::Bidirectional(_)),
        "Promise" => matches!(value, Value::Promise(_)),
        "Reactive" => matches!(value, Value::Reactive(_)),
        _ => false,
    }
}

/// Whether every argument matches its declared type. Arguments without a
/// declared type always match.
pub fn arguments_match(types: &[TypeAnnotation], arguments: &[Value]) -> bool {
    types
        .iter()
        .zip(arguments)
        .all(|(annotation, value)| matches_type(value, annotation))
}

pub fn check_arguments(
    name: &str,
    types: &[TypeAnnotation],
    arguments: &[Value],
) -> Result<(), RuntimeError> {
    for (index, (annotation, value)) in types.iter().zip(arguments).enumerate() {
        if !matches_type(value, annotation) {
            return Err(RuntimeErrorKind::TypeMismatch {
                context: format!("argument {} of `{}`", index + 1, name),
                expected: annotation.to_string(),
                actual: value.type_name().to_string(),
            }
            .into());
        }
    }
    Ok(())
}

pub fn check_return(
    name: &str,
    annotation: &TypeAnnotation,
    value: &Value,
) -> Result<(), RuntimeError> {
    if matches_type(value, annotation) {
        return Ok(());
    }
    Err(RuntimeErrorKind::TypeMismatch {
        context: format!("return value of `{}`", name),
        expected: annotation.to_string(),
        actual: value.type_name().to_string(),
    }
    .into())
}

/// Best-effort conversion used by `#coerce`, `#tease` and `toNumber`.
pub fn convert(value: &Value, annotation: &TypeAnnotation) -> Option<Value> {
    if matches_type(value, annotation) {
        return Some(value.clone());
    }

    let TypeAnnotation::Named(name) = annotation else {
        return match (annotation, value) {
            (TypeAnnotation::List(inner), Value::List(items)) => items
                .iter()
                .map(|item| convert(item, inner))
                .collect::<Option<Vec<_>>>()
                .map(Value::List),
            (TypeAnnotation::Optional(inner), _) => convert(value, inner),
            _ => None,
        };
    };

    match (name.as_str(), value) {
        ("Int", Value::Number(n)) => Some(Value::Number(n.trunc())),
        ("Int", Value::String(s)) => parse_number(s).map(|n| Value::Number(n.trunc())),
        ("Int" | "Float" | "Number", Value::Bool(b)) => Some(Value::Number(f64::from(u8::from(*b)))),
        ("Float" | "Number", Value::String(s)) => parse_number(s).map(Value::Number),
        ("String", other) => Some(Value::String(format_value(other))),
        ("Bool" | "Boolean", Value::String(s)) if s == "true" || s == "false" => {
            Some(Value::Bool(s == "true"))
        }
        ("Bool" | "Boolean", other) => Some(Value::Bool(other.is_truthy())),
        ("List", Value::Tuple(items)) => Some(Value::List(items.clone())),
        ("Tuple", Value::List(items)) => Some(Value::Tuple(items.clone())),
        _ => None,
    }
}

pub fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}
