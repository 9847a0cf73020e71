//! Side-effect free rendering of runtime values.

use std::rc::Rc;

use crate::ast::render::format_number;

use super::value::Value;

/// Display form: top-level strings are printed raw.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => repr_value(other),
    }
}

/// Nested form: strings are quoted.
pub fn repr_value(value: &Value) -> String {
    match value {
        Value::Number(n) => format_number(*n),
        Value::String(s) => format!("{:?}", s),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::from("null"),
        Value::List(items) => format!("[{}]", join(items)),
        Value::Tuple(items) if items.len() == 1 => format!("({},)", repr_value(&items[0])),
        Value::Tuple(items) => format!("({})", join(items)),
        Value::Record(fields) if fields.is_empty() => String::from("{}"),
        Value::Record(fields) => {
            let fields: Vec<String> = fields
                .iter()
                .map(|(key, value)| format!("{}: {}", key, repr_value(value)))
                .collect();
            format!("{{ {} }}", fields.join(", "))
        }
        Value::Function(function) => format!("<function {}>", function.name),
        Value::Builtin(builtin) => format!("<builtin {}>", builtin.name),
        Value::Pipeline(pipeline) => {
            let stages: Vec<String> = pipeline.stages.iter().map(|s| s.to_string()).collect();
            format!("<pipeline {}>", stages.join(" "))
        }
        Value::Bidirectional(pipeline) => format!("<bidirectional {}>", pipeline.name),
        Value::Reversible(pair) => format!("<reversible {}>", pair.name),
        Value::Overload(set) => format!("<overloads {} x{}>", set.name, set.candidates.len()),
        Value::Reactive(reactive) => format!("<reactive {}>", reactive.borrow().source),
        Value::Promise(promise) => match &promise.outcome {
            Ok(value) => format!("<promise {}>", repr_value(value)),
            Err(_) => String::from("<promise rejected>"),
        },
        Value::Layer(layer) => format!("<decorated {}>", repr_value(&layer.target)),
    }
}

fn join(items: &[Value]) -> String {
    items.iter().map(repr_value).collect::<Vec<_>>().join(", ")
}

/// `typeOf`: the runtime type name.
pub fn type_of(value: &Value) -> String {
    value.type_name().to_string()
}

/// Memo key for an argument list. Data is keyed by value with its type, so
/// `1` and `"1"` differ; callables are keyed by identity.
pub fn canonical_key(arguments: &[Value]) -> String {
    arguments
        .iter()
        .map(canonical)
        .collect::<Vec<_>>()
        .join("|")
}

fn canonical(value: &Value) -> String {
    match value {
        Value::List(items) => format!("L[{}]", canonical_key(items)),
        Value::Tuple(items) => format!("T({})", canonical_key(items)),
        Value::Record(fields) => {
            let fields: Vec<String> = fields
                .iter()
                .map(|(key, value)| format!("{:?}={}", key, canonical(value)))
                .collect();
            format!("R{{{}}}", fields.join(","))
        }
        Value::Function(f) => format!("F@{:p}", Rc::as_ptr(f)),
        Value::Pipeline(p) => format!("P@{:p}", Rc::as_ptr(p)),
        Value::Reversible(r) => format!("V@{:p}", Rc::as_ptr(r)),
        Value::Overload(o) => format!("O@{:p}", Rc::as_ptr(o)),
        Value::Bidirectional(b) => format!("B@{:p}", Rc::as_ptr(b)),
        Value::Reactive(r) => format!("X@{:p}", Rc::as_ptr(r)),
        Value::Promise(p) => format!("Q@{:p}", Rc::as_ptr(p)),
        Value::Layer(l) => format!("D@{:p}", Rc::as_ptr(l)),
        other => format!("{}:{}", other.type_name(), repr_value(other)),
    }
}
