//! Cooperative async on a virtual clock.
//!
//! A promise is settled the moment it is created; what it records is the
//! virtual instant its outcome becomes observable. `await` moves the clock
//! forward to that instant. Async calls rewind the clock when they return so
//! sibling calls overlap in virtual time.

use std::{rc::Rc, thread, time::Duration};

use tracing::debug;

use crate::errors::errors::{RuntimeError, RuntimeErrorKind};

use super::{
    interpreter::Interpreter,
    value::{Promise, Value},
};

impl Interpreter {
    /// Waits for `value` if it is a promise; other values are returned as is.
    pub fn await_value(&mut self, value: Value) -> Result<Value, RuntimeError> {
        let promise = match value {
            Value::Promise(promise) => promise,
            other => return Ok(other),
        };
        self.advance_to(promise.settles_at);
        promise.outcome.clone()
    }

    fn advance_to(&mut self, instant: u64) {
        if instant <= self.now {
            return;
        }
        if self.options.real_time {
            thread::sleep(Duration::from_millis(instant - self.now));
        }
        debug!(from = self.now, to = instant, "clock advanced");
        self.now = instant;
    }
}

/// Outcome and settle instant of any value; plain values settle now.
fn settlement(interpreter: &Interpreter, value: Value) -> (Result<Value, RuntimeError>, u64) {
    match value {
        Value::Promise(promise) => (promise.outcome.clone(), promise.settles_at),
        other => (Ok(other), interpreter.now),
    }
}

fn milliseconds(name: &str, value: Option<&Value>) -> Result<u64, RuntimeError> {
    match value {
        Some(Value::Number(n)) if *n >= 0.0 => Ok(*n as u64),
        Some(other) => Err(RuntimeErrorKind::TypeError {
            message: format!("{} expects a non-negative number of milliseconds, got {}", name, other.type_name()),
        }
        .into()),
        None => Ok(0),
    }
}

/// `delay(ms, value?)`
pub fn delay(interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
    let ms = milliseconds("delay", arguments.first())?;
    let value = arguments.get(1).cloned().unwrap_or(Value::Null);
    Ok(Promise::resolved(value, interpreter.now + ms))
}

/// `parallel(items, f?, { limit }?)`: runs `f(item, index)` for every item on
/// at most `limit` slots. Results keep input order; the promise settles when
/// the last task does, or rejects with the first failure in input order.
pub fn parallel(interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
    let mut arguments = arguments.into_iter();
    let items = match arguments.next() {
        Some(Value::List(items)) => items,
        other => {
            return Err(RuntimeErrorKind::TypeError {
                message: format!(
                    "parallel expects a List, got {}",
                    other.map(|v| v.type_name()).unwrap_or("nothing")
                ),
            }
            .into())
        }
    };

    let mut task = None;
    let mut limit = items.len().max(1);
    for argument in arguments {
        match argument {
            Value::Record(options) => {
                if let Some(Value::Number(n)) = options.get("limit") {
                    limit = (*n as usize).max(1);
                }
            }
            callable if callable.is_callable() => task = Some(callable),
            Value::Null => {}
            other => {
                return Err(RuntimeErrorKind::TypeError {
                    message: format!("unexpected {} argument to parallel", other.type_name()),
                }
                .into())
            }
        }
    }

    let started = interpreter.now;
    let mut slots = vec![started; limit];
    let mut outcomes = Vec::with_capacity(items.len());
    let mut finished = started;

    for (index, item) in items.into_iter().enumerate() {
        let (slot, free_at) = slots
            .iter()
            .copied()
            .enumerate()
            .min_by_key(|(slot, free_at)| (*free_at, *slot))
            .unwrap_or((0, started));
        interpreter.now = free_at;

        let value = match &task {
            Some(task) => interpreter.call_value(task, vec![item, Value::Number(index as f64)]),
            None => Ok(item),
        };
        let (outcome, settles_at) = match value {
            Ok(value) => settlement(interpreter, value),
            Err(error) => (Err(error), interpreter.now),
        };

        slots[slot] = settles_at;
        finished = finished.max(settles_at);
        outcomes.push(outcome);
    }
    interpreter.now = started;
    debug!(tasks = outcomes.len(), limit, settles_at = finished, "parallel scheduled");

    match outcomes.into_iter().collect::<Result<Vec<_>, _>>() {
        Ok(values) => Ok(Promise::resolved(Value::List(values), finished)),
        Err(error) => Ok(Promise::rejected(error, finished)),
    }
}

/// `race(items)`: the earliest settling input wins, ties go to the first.
pub fn race(interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
    let Some(Value::List(items)) = arguments.into_iter().next() else {
        return Err(RuntimeErrorKind::TypeError {
            message: String::from("race expects a List"),
        }
        .into());
    };

    let winner = items
        .into_iter()
        .map(|item| settlement(interpreter, item))
        .enumerate()
        .min_by_key(|(index, (_, settles_at))| (*settles_at, *index));

    match winner {
        Some((_, (Ok(value), settles_at))) => Ok(Promise::resolved(value, settles_at)),
        Some((_, (Err(error), settles_at))) => Ok(Promise::rejected(error, settles_at)),
        None => Ok(Promise::resolved(Value::Null, interpreter.now)),
    }
}

/// `then(promise, f)`: `f` runs at the instant the promise settles.
pub fn then(interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
    let mut arguments = arguments.into_iter();
    let source = arguments.next().unwrap_or(Value::Null);
    let callback = arguments.next().unwrap_or(Value::Null);

    let promise = match source {
        Value::Promise(promise) => promise,
        other => return interpreter.call_value(&callback, vec![other]),
    };
    let value = match &promise.outcome {
        Ok(value) => value.clone(),
        Err(_) => return Ok(Value::Promise(Rc::clone(&promise))),
    };

    let resumed = interpreter.now;
    interpreter.now = interpreter.now.max(promise.settles_at);
    let result = interpreter.call_value(&callback, vec![value]);
    let settles_at = interpreter.now;
    interpreter.now = resumed;

    Ok(match result {
        Ok(Value::Promise(chained)) => Value::Promise(chained),
        Ok(value) => Promise::resolved(value, settles_at),
        Err(error) => Promise::rejected(error, settles_at),
    })
}

/// `clock()`: the current virtual time in milliseconds.
pub fn clock(interpreter: &mut Interpreter, _arguments: Vec<Value>) -> Result<Value, RuntimeError> {
    Ok(Value::Number(interpreter.now as f64))
}
