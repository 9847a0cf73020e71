//! Built-in decorators and the dispatch to user-defined ones.
//!
//! A decorated callable is called through its layers: layer `depth` applies
//! decorator `depth - 1` around a [`DecoratorLayer`] of depth `depth - 1`.
//! The first decorator in source order therefore sits closest to the body.

use std::{rc::Rc, time::Instant};

use tracing::{debug, info, warn};

use crate::{
    ast::{ast::Expr, expressions::Decorator, types::TypeAnnotation},
    errors::errors::{RuntimeError, RuntimeErrorKind},
};

use super::{
    environment::Environment,
    expr::eval_expr,
    format::{canonical_key, format_value, repr_value},
    interpreter::{Interpreter, Unwind},
    types::{convert, parse_number},
    value::{DecoratorLayer, MemoCache, Promise, Value},
};

impl Interpreter {
    pub(crate) fn apply_decorator(
        &mut self,
        decorator: &Decorator,
        target: &Value,
        depth: usize,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        let inner = Value::Layer(Rc::new(DecoratorLayer {
            target: target.clone(),
            depth: depth - 1,
        }));
        let name = callable_name(target);
        debug!(decorator = %decorator.name, target = %name, "applying decorator");

        match decorator.name.as_str() {
            "memo" => {
                let key = canonical_key(&arguments);
                if let Some(cached) = memo_cache(target).and_then(|cache| cache.borrow().get(&key).cloned()) {
                    return Ok(cached);
                }
                let result = self.call_value(&inner, arguments)?;
                if let Some(cache) = memo_cache(target) {
                    cache.borrow_mut().insert(key, result.clone());
                }
                Ok(result)
            }
            "log" => {
                info!(function = %name, "called with {} arguments", arguments.len());
                let result = self.call_value(&inner, arguments)?;
                info!(function = %name, result = %repr_value(&result), "returned");
                Ok(result)
            }
            "log_verbose" => {
                let rendered: Vec<String> = arguments.iter().map(repr_value).collect();
                debug!(function = %name, arguments = %rendered.join(", "), "called");
                let result = self.call_value(&inner, arguments)?;
                debug!(function = %name, result = %repr_value(&result), kind = result.type_name(), "returned");
                Ok(result)
            }
            "time" => {
                let started = Instant::now();
                let virtual_start = self.now;
                let result = self.call_value(&inner, arguments);
                info!(
                    function = %name,
                    elapsed_us = started.elapsed().as_micros() as u64,
                    virtual_ms = self.now.saturating_sub(virtual_start),
                    "timed"
                );
                result
            }
            "retry" => {
                let retries = self.decorator_number(decorator, target, 0)?.unwrap_or(1.0).max(0.0) as usize;
                self.retry(&inner, &name, retries + 1, arguments)
            }
            "timeout" => {
                let limit_ms = self.decorator_number(decorator, target, 0)?.unwrap_or(0.0).max(0.0) as u64;
                let started = self.now;
                let result = self.call_value(&inner, arguments)?;
                let timeout = RuntimeErrorKind::Timeout {
                    name: name.clone(),
                    limit_ms,
                };
                // A promise is judged by when it settles, anything else by the clock.
                let (expired, pending) = match &result {
                    Value::Promise(promise) => (promise.settles_at.saturating_sub(started) > limit_ms, true),
                    _ => (self.now.saturating_sub(started) > limit_ms, false),
                };
                match (expired, pending) {
                    (false, _) => Ok(result),
                    (true, true) => Ok(Promise::rejected(timeout.into(), started + limit_ms)),
                    (true, false) => Err(timeout.into()),
                }
            }
            "validate" => {
                self.check_call_arguments(target, &arguments)?;
                let result = self.call_value(&inner, arguments)?;
                self.check_call_result(target, &result)?;
                Ok(result)
            }
            "coerce" => {
                let annotation = decorator_type(decorator)?;
                let mut converted = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    let value = convert(&argument, &annotation).ok_or_else(|| RuntimeErrorKind::TypeError {
                        message: format!(
                            "cannot coerce {} to {} for `{}`",
                            repr_value(&argument),
                            annotation,
                            name
                        ),
                    })?;
                    converted.push(value);
                }
                self.call_value(&inner, converted)
            }
            "tease" => {
                let annotation = decorator_type(decorator)?;
                let result = self.call_value(&inner, arguments)?;
                Ok(convert(&result, &annotation).unwrap_or(result))
            }
            "parse" => {
                let parsed = arguments.into_iter().map(parse_literal).collect();
                self.call_value(&inner, parsed)
            }
            "stringify" => {
                let result = self.call_value(&inner, arguments)?;
                Ok(Value::String(format_value(&result)))
            }
            "async" => {
                let started = self.now;
                let result = self.call_value(&inner, arguments);
                let settles_at = self.now;
                self.now = started;
                Ok(match result {
                    Ok(Value::Promise(promise)) => Value::Promise(promise),
                    Ok(value) => Promise::resolved(value, settles_at),
                    Err(error) => Promise::rejected(error, settles_at),
                })
            }
            "export" => self.call_value(&inner, arguments),
            _ => self.apply_user_decorator(decorator, target, inner, arguments),
        }
    }

    /// `decorator name = (f, ...args) -> callable`: the definition receives the
    /// inner layers and the decorator's own arguments, and its result is
    /// called with the call's arguments.
    fn apply_user_decorator(
        &mut self,
        decorator: &Decorator,
        target: &Value,
        inner: Value,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        let scope = scope_of(target).unwrap_or_else(|| Rc::clone(&self.env));
        let key = format!("#{}", decorator.name);
        let definition = scope
            .get_variable(&key)
            .or_else(|| self.env.get_variable(&key))
            .ok_or_else(|| RuntimeErrorKind::UndefinedDecorator {
                name: decorator.name.clone(),
            })?;

        let mut decorator_arguments = vec![inner];
        decorator_arguments.extend(self.decorator_arguments(decorator, target)?);
        let wrapped = self.call_value(&definition, decorator_arguments)?;
        self.call_value(&wrapped, arguments)
    }

    fn retry(
        &mut self,
        inner: &Value,
        name: &str,
        attempts: usize,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        let mut last_error = None;
        for attempt in 1..=attempts {
            let outcome = match self.call_value(inner, arguments.clone()) {
                Ok(Value::Promise(promise)) => match promise.outcome.as_ref().err().cloned() {
                    Some(error) => Err(error),
                    None => return Ok(Value::Promise(promise)),
                },
                other => other,
            };
            match outcome {
                Ok(value) => return Ok(value),
                Err(error) => {
                    warn!(function = %name, attempt, attempts, error = %error.kind, "attempt failed");
                    last_error = Some(error);
                }
            }
        }

        Err(RuntimeErrorKind::RetryExhausted {
            name: name.to_string(),
            attempts,
            last_error: last_error.map(|error| error.kind.to_string()).unwrap_or_default(),
        }
        .into())
    }

    /// Decorator arguments evaluated in the scope the decorated value was
    /// written in.
    fn decorator_arguments(&mut self, decorator: &Decorator, target: &Value) -> Result<Vec<Value>, RuntimeError> {
        let scope = scope_of(target).unwrap_or_else(|| Rc::clone(&self.env));
        self.with_env(scope, |interpreter| {
            let mut values = Vec::with_capacity(decorator.arguments.len());
            for argument in &decorator.arguments {
                values.push(eval_expr(interpreter, argument)?);
            }
            Ok::<_, Unwind>(values)
        })
        .map_err(|unwind| match unwind {
            Unwind::Error(error) => error,
            Unwind::Return(_) => RuntimeErrorKind::TypeError {
                message: format!("`return` in arguments of #{}", decorator.name),
            }
            .into(),
        })
    }

    fn decorator_number(
        &mut self,
        decorator: &Decorator,
        target: &Value,
        index: usize,
    ) -> Result<Option<f64>, RuntimeError> {
        let arguments = self.decorator_arguments(decorator, target)?;
        match arguments.get(index) {
            None => Ok(None),
            Some(Value::Number(n)) => Ok(Some(*n)),
            Some(other) => Err(RuntimeErrorKind::TypeError {
                message: format!(
                    "#{} expects a number, got {}",
                    decorator.name,
                    other.type_name()
                ),
            }
            .into()),
        }
    }
}

/// `#coerce(Int)` names a type rather than a value.
fn decorator_type(decorator: &Decorator) -> Result<TypeAnnotation, RuntimeError> {
    match decorator.arguments.first() {
        Some(Expr::Symbol(symbol)) => Ok(TypeAnnotation::Named(symbol.value.clone())),
        Some(Expr::String(string)) => Ok(TypeAnnotation::Named(string.value.clone())),
        _ => Err(RuntimeErrorKind::TypeError {
            message: format!("#{} expects a type name", decorator.name),
        }
        .into()),
    }
}

/// Strings spelling a number, boolean or `null` become that value.
fn parse_literal(value: Value) -> Value {
    let Value::String(text) = &value else {
        return value;
    };
    match text.trim() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        other => parse_number(other).map(Value::Number).unwrap_or(value),
    }
}

fn memo_cache(target: &Value) -> Option<&MemoCache> {
    match target {
        Value::Function(function) => Some(&function.memo),
        Value::Pipeline(pipeline) => Some(&pipeline.memo),
        Value::Bidirectional(pipeline) => Some(&pipeline.memo),
        _ => None,
    }
}

fn scope_of(target: &Value) -> Option<Rc<Environment>> {
    match target {
        Value::Function(function) => Some(Rc::clone(&function.closure)),
        Value::Pipeline(pipeline) => Some(Rc::clone(&pipeline.closure)),
        _ => None,
    }
}

pub fn callable_name(value: &Value) -> String {
    match value {
        Value::Function(function) => function.name.clone(),
        Value::Pipeline(pipeline) => pipeline.name.clone(),
        Value::Bidirectional(pipeline) => pipeline.name.clone(),
        Value::Reversible(pair) => pair.name.clone(),
        Value::Overload(set) => set.name.clone(),
        Value::Builtin(builtin) => builtin.name.to_string(),
        Value::Layer(layer) => callable_name(&layer.target),
        other => other.type_name().to_string(),
    }
}
