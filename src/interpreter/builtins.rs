//! Native functions available in every scope.
//!
//! Builtins receive their arguments already evaluated. Extra arguments are
//! ignored so that builtins can sit behind a spread pipe, which also passes
//! the element index.

use std::{cmp::Ordering, rc::Rc};

use crate::{
    ast::types::TypeAnnotation,
    errors::errors::{RuntimeError, RuntimeErrorKind},
    MK_BUILTIN,
};

use super::{
    asynchronous::{clock, delay, parallel, race, then},
    environment::Environment,
    expr::resolve_index,
    format::{format_value, type_of},
    interpreter::Interpreter,
    types::convert,
    value::{Builtin, Value},
};

type BuiltinResult = Result<Value, RuntimeError>;

pub fn register_builtins(env: &Rc<Environment>) {
    MK_BUILTIN!(env, "print", print);
    MK_BUILTIN!(env, "toString", to_string);
    MK_BUILTIN!(env, "toNumber", to_number);
    MK_BUILTIN!(env, "typeOf", type_of_value);
    MK_BUILTIN!(env, "length", length);
    MK_BUILTIN!(env, "identity", identity);
    MK_BUILTIN!(env, "fail", fail);

    MK_BUILTIN!(env, "map", map);
    MK_BUILTIN!(env, "filter", filter);
    MK_BUILTIN!(env, "reduce", reduce);
    MK_BUILTIN!(env, "sum", sum);
    MK_BUILTIN!(env, "range", range);
    MK_BUILTIN!(env, "head", first);
    MK_BUILTIN!(env, "first", first);
    MK_BUILTIN!(env, "last", last);
    MK_BUILTIN!(env, "nth", nth);
    MK_BUILTIN!(env, "tail", tail);
    MK_BUILTIN!(env, "take", take);
    MK_BUILTIN!(env, "drop", drop_items);
    MK_BUILTIN!(env, "reverse", reverse);
    MK_BUILTIN!(env, "sort", sort);
    MK_BUILTIN!(env, "zip", zip);
    MK_BUILTIN!(env, "flatten", flatten);
    MK_BUILTIN!(env, "includes", includes);

    MK_BUILTIN!(env, "join", join);
    MK_BUILTIN!(env, "split", split);
    MK_BUILTIN!(env, "upper", upper);
    MK_BUILTIN!(env, "lower", lower);

    MK_BUILTIN!(env, "keys", keys);
    MK_BUILTIN!(env, "values", values);

    MK_BUILTIN!(env, "min", min);
    MK_BUILTIN!(env, "max", max);
    MK_BUILTIN!(env, "abs", abs);
    MK_BUILTIN!(env, "floor", floor);
    MK_BUILTIN!(env, "ceil", ceil);
    MK_BUILTIN!(env, "round", round);
    MK_BUILTIN!(env, "sqrt", sqrt);

    MK_BUILTIN!(env, "delay", delay);
    MK_BUILTIN!(env, "parallel", parallel);
    MK_BUILTIN!(env, "race", race);
    MK_BUILTIN!(env, "then", then);
    MK_BUILTIN!(env, "clock", clock);
}

fn type_error(message: String) -> RuntimeError {
    RuntimeErrorKind::TypeError { message }.into()
}

fn argument(arguments: &[Value], index: usize) -> Value {
    arguments.get(index).cloned().unwrap_or(Value::Null)
}

fn list_argument(name: &str, arguments: &[Value], index: usize) -> Result<Vec<Value>, RuntimeError> {
    match arguments.get(index) {
        Some(Value::List(items)) | Some(Value::Tuple(items)) => Ok(items.clone()),
        other => Err(type_error(format!(
            "{} expects a List, got {}",
            name,
            other.map(Value::type_name).unwrap_or("nothing")
        ))),
    }
}

fn number_argument(name: &str, arguments: &[Value], index: usize) -> Result<f64, RuntimeError> {
    match arguments.get(index) {
        Some(Value::Number(n)) => Ok(*n),
        other => Err(type_error(format!(
            "{} expects a number, got {}",
            name,
            other.map(Value::type_name).unwrap_or("nothing")
        ))),
    }
}

fn string_argument(name: &str, arguments: &[Value], index: usize) -> Result<String, RuntimeError> {
    match arguments.get(index) {
        Some(Value::String(s)) => Ok(s.clone()),
        other => Err(type_error(format!(
            "{} expects a String, got {}",
            name,
            other.map(Value::type_name).unwrap_or("nothing")
        ))),
    }
}

// GENERAL

fn print(interpreter: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    let line = arguments
        .iter()
        .map(format_value)
        .collect::<Vec<_>>()
        .join(" ");
    interpreter.emit(line);
    Ok(match arguments.len() {
        1 => argument(&arguments, 0),
        _ => Value::Null,
    })
}

fn to_string(_: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    Ok(Value::String(format_value(&argument(&arguments, 0))))
}

fn to_number(_: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    let value = argument(&arguments, 0);
    convert(&value, &TypeAnnotation::Named(String::from("Number")))
        .ok_or_else(|| type_error(format!("cannot convert {} to a number", format_value(&value))))
}

fn type_of_value(_: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    Ok(Value::String(type_of(&argument(&arguments, 0))))
}

fn length(_: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    let length = match argument(&arguments, 0) {
        Value::List(items) | Value::Tuple(items) => items.len(),
        Value::String(text) => text.chars().count(),
        Value::Record(fields) => fields.len(),
        Value::Pipeline(pipeline) => pipeline.stages.len(),
        Value::Bidirectional(pipeline) => pipeline.stages.len(),
        other => return Err(type_error(format!("{} has no length", other.type_name()))),
    };
    Ok(Value::Number(length as f64))
}

fn identity(_: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    Ok(argument(&arguments, 0))
}

fn fail(_: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    Err(RuntimeErrorKind::Custom {
        message: format_value(&argument(&arguments, 0)),
    }
    .into())
}

// LISTS

/// `map(list, f)` calls `f(element, index)`.
fn map(interpreter: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    let items = list_argument("map", &arguments, 0)?;
    let function = argument(&arguments, 1);
    let mut results = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        results.push(interpreter.call_value(&function, vec![item, Value::Number(index as f64)])?);
    }
    Ok(Value::List(results))
}

fn filter(interpreter: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    let items = list_argument("filter", &arguments, 0)?;
    let predicate = argument(&arguments, 1);
    let mut results = vec![];
    for (index, item) in items.into_iter().enumerate() {
        let keep = interpreter.call_value(&predicate, vec![item.clone(), Value::Number(index as f64)])?;
        if keep.is_truthy() {
            results.push(item);
        }
    }
    Ok(Value::List(results))
}

/// `reduce(list, initial, f)` calls `f(accumulator, element, index)`.
fn reduce(interpreter: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    let items = list_argument("reduce", &arguments, 0)?;
    let mut accumulator = argument(&arguments, 1);
    let function = argument(&arguments, 2);
    for (index, item) in items.into_iter().enumerate() {
        accumulator = interpreter.call_value(&function, vec![accumulator, item, Value::Number(index as f64)])?;
    }
    Ok(accumulator)
}

fn sum(_: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    let items = list_argument("sum", &arguments, 0)?;
    let mut total = 0.0;
    for item in &items {
        match item {
            Value::Number(n) => total += n,
            other => return Err(type_error(format!("sum expects numbers, got {}", other.type_name()))),
        }
    }
    Ok(Value::Number(total))
}

/// `range(end)`, `range(start, end)` or `range(start, end, step)`; `end` is exclusive.
fn range(_: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    let (start, end) = match arguments.len() {
        0 | 1 => (0.0, number_argument("range", &arguments, 0)?),
        _ => (number_argument("range", &arguments, 0)?, number_argument("range", &arguments, 1)?),
    };
    let step = match arguments.get(2) {
        Some(_) => number_argument("range", &arguments, 2)?,
        None if end < start => -1.0,
        None => 1.0,
    };
    if step == 0.0 {
        return Err(type_error(String::from("range step must not be zero")));
    }

    let mut values = vec![];
    let mut current = start;
    while (step > 0.0 && current < end) || (step < 0.0 && current > end) {
        values.push(Value::Number(current));
        current += step;
    }
    Ok(Value::List(values))
}

fn first(_: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    let items = list_argument("first", &arguments, 0)?;
    Ok(items.into_iter().next().unwrap_or(Value::Null))
}

fn last(_: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    let items = list_argument("last", &arguments, 0)?;
    Ok(items.into_iter().last().unwrap_or(Value::Null))
}

fn tail(_: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    let items = list_argument("tail", &arguments, 0)?;
    Ok(Value::List(items.into_iter().skip(1).collect()))
}

fn take(_: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    let items = list_argument("take", &arguments, 0)?;
    let count = number_argument("take", &arguments, 1)?.max(0.0) as usize;
    Ok(Value::List(items.into_iter().take(count).collect()))
}

fn drop_items(_: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    let items = list_argument("drop", &arguments, 0)?;
    let count = number_argument("drop", &arguments, 1)?.max(0.0) as usize;
    Ok(Value::List(items.into_iter().skip(count).collect()))
}

fn reverse(_: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    match argument(&arguments, 0) {
        Value::String(text) => Ok(Value::String(text.chars().rev().collect())),
        _ => {
            let mut items = list_argument("reverse", &arguments, 0)?;
            items.reverse();
            Ok(Value::List(items))
        }
    }
}

fn natural_order(a: &Value, b: &Value) -> Result<Ordering, RuntimeError> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Ok(x.partial_cmp(y).unwrap_or(Ordering::Equal)),
        (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
        _ => Err(type_error(format!(
            "cannot compare {} with {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

/// `sort(list)` or `sort(list, compare)` where `compare(a, b)` returns a number.
/// Stable.
fn sort(interpreter: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    let mut items = list_argument("sort", &arguments, 0)?;
    let comparator = arguments.get(1).cloned();

    // Insertion sort, so a failing comparator surfaces its error.
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 {
            let ordering = match &comparator {
                Some(function) => {
                    let result = interpreter.call_value(function, vec![items[j - 1].clone(), items[j].clone()])?;
                    match result {
                        Value::Number(n) if n > 0.0 => Ordering::Greater,
                        Value::Number(n) if n < 0.0 => Ordering::Less,
                        Value::Number(_) => Ordering::Equal,
                        other => return Err(type_error(format!("sort comparator returned {}", other.type_name()))),
                    }
                }
                None => natural_order(&items[j - 1], &items[j])?,
            };
            if ordering != Ordering::Greater {
                break;
            }
            items.swap(j - 1, j);
            j -= 1;
        }
    }
    Ok(Value::List(items))
}

fn zip(_: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    let left = list_argument("zip", &arguments, 0)?;
    let right = list_argument("zip", &arguments, 1)?;
    Ok(Value::List(
        left.into_iter()
            .zip(right)
            .map(|(a, b)| Value::Tuple(vec![a, b]))
            .collect(),
    ))
}

fn flatten(_: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    let items = list_argument("flatten", &arguments, 0)?;
    let mut flat = vec![];
    for item in items {
        match item {
            Value::List(inner) => flat.extend(inner),
            other => flat.push(other),
        }
    }
    Ok(Value::List(flat))
}

fn includes(_: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    let needle = argument(&arguments, 1);
    match argument(&arguments, 0) {
        Value::String(text) => Ok(Value::Bool(text.contains(&format_value(&needle)))),
        Value::Record(fields) => Ok(Value::Bool(fields.contains_key(&format_value(&needle)))),
        _ => {
            let items = list_argument("includes", &arguments, 0)?;
            Ok(Value::Bool(items.contains(&needle)))
        }
    }
}

// STRINGS

fn join(_: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    let items = list_argument("join", &arguments, 0)?;
    let separator = match arguments.get(1) {
        Some(Value::String(separator)) => separator.clone(),
        _ => String::new(),
    };
    Ok(Value::String(
        items.iter().map(format_value).collect::<Vec<_>>().join(&separator),
    ))
}

fn split(_: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    let text = string_argument("split", &arguments, 0)?;
    let separator = match arguments.get(1) {
        Some(Value::String(separator)) => separator.clone(),
        _ => String::new(),
    };
    let parts: Vec<Value> = if separator.is_empty() {
        text.chars().map(|c| Value::String(c.to_string())).collect()
    } else {
        text.split(separator.as_str()).map(Value::string).collect()
    };
    Ok(Value::List(parts))
}

fn upper(_: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    Ok(Value::String(string_argument("upper", &arguments, 0)?.to_uppercase()))
}

fn lower(_: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    Ok(Value::String(string_argument("lower", &arguments, 0)?.to_lowercase()))
}

// RECORDS

fn keys(_: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    match argument(&arguments, 0) {
        Value::Record(fields) => Ok(Value::List(fields.keys().map(|k| Value::string(k)).collect())),
        other => Err(type_error(format!("keys expects a Record, got {}", other.type_name()))),
    }
}

fn values(_: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    match argument(&arguments, 0) {
        Value::Record(fields) => Ok(Value::List(fields.into_values().collect())),
        other => Err(type_error(format!("values expects a Record, got {}", other.type_name()))),
    }
}

// NUMBERS

/// `min(list)` or `min(a, b, ...)`.
fn extremum(name: &str, arguments: Vec<Value>, wanted: Ordering) -> BuiltinResult {
    let items = match arguments.as_slice() {
        [Value::List(items)] => items.clone(),
        _ => arguments,
    };
    let mut best: Option<Value> = None;
    for item in items {
        if !matches!(item, Value::Number(_) | Value::String(_)) {
            return Err(type_error(format!("{} expects numbers or strings, got {}", name, item.type_name())));
        }
        best = match best {
            Some(current) if natural_order(&item, &current)? != wanted => Some(current),
            _ => Some(item),
        };
    }
    Ok(best.unwrap_or(Value::Null))
}

fn min(_: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    extremum("min", arguments, Ordering::Less)
}

fn max(_: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    extremum("max", arguments, Ordering::Greater)
}

fn abs(_: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    Ok(Value::Number(number_argument("abs", &arguments, 0)?.abs()))
}

fn floor(_: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    Ok(Value::Number(number_argument("floor", &arguments, 0)?.floor()))
}

fn ceil(_: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    Ok(Value::Number(number_argument("ceil", &arguments, 0)?.ceil()))
}

fn round(_: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    Ok(Value::Number(number_argument("round", &arguments, 0)?.round()))
}

fn sqrt(_: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    let n = number_argument("sqrt", &arguments, 0)?;
    if n < 0.0 {
        return Err(type_error(format!("sqrt of negative number {}", n)));
    }
    Ok(Value::Number(n.sqrt()))
}

/// `nth(list, index)`; negative indices count from the end.
fn nth(_: &mut Interpreter, arguments: Vec<Value>) -> BuiltinResult {
    let items = list_argument("nth", &arguments, 0)?;
    let index = number_argument("nth", &arguments, 1)?;
    let position = resolve_index(index, items.len())?;
    Ok(items[position].clone())
}
