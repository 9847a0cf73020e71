//! Calling values: user functions, builtins, pipelines, overload sets and the
//! decorator layers around them.

use std::rc::Rc;

use crate::{
    ast::expressions::{Decorator, FunctionBody},
    errors::errors::{RuntimeError, RuntimeErrorKind},
};

use super::{
    environment::Environment,
    expr::eval_expr,
    interpreter::{Interpreter, Unwind},
    stmt::exec_block,
    types::{arguments_match, check_arguments, check_return},
    value::{OverloadSet, UserFunction, Value},
};

impl Interpreter {
    pub fn call_value(&mut self, callee: &Value, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
        match callee {
            Value::Builtin(builtin) => (builtin.function)(self, arguments),
            Value::Function(_) | Value::Pipeline(_) | Value::Bidirectional(_) => {
                let depth = decorators_of(callee).len();
                self.invoke_layers(callee, depth, arguments)
            }
            Value::Layer(layer) => self.invoke_layers(&layer.target, layer.depth, arguments),
            Value::Reversible(pair) => self.call_value(&pair.forward, arguments),
            Value::Overload(set) => {
                let candidate = resolve_overload(set, &arguments)?;
                self.call_value(&Value::Function(candidate), arguments)
            }
            other => Err(RuntimeErrorKind::NotCallable {
                type_name: other.type_name().to_string(),
            }
            .into()),
        }
    }

    /// Calls `target` with only its first `depth` decorators applied.
    pub(crate) fn invoke_layers(
        &mut self,
        target: &Value,
        depth: usize,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        if depth == 0 {
            return self.call_undecorated(target, arguments);
        }
        let decorator = decorators_of(target)[depth - 1].clone();
        self.apply_decorator(&decorator, target, depth, arguments)
            .map_err(|error| error.at(&decorator.span.start))
    }

    fn call_undecorated(&mut self, target: &Value, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
        match target {
            Value::Function(function) => self.call_function(function, arguments),
            Value::Pipeline(pipeline) => {
                let checked = pipeline.signature.is_some() && self.strict;
                if checked {
                    self.check_call_arguments(target, &arguments)?;
                }
                let result = self.run_pipeline(pipeline, arguments)?;
                if checked {
                    self.check_call_result(target, &result)?;
                }
                Ok(result)
            }
            Value::Bidirectional(pipeline) => self.run_bidirectional(pipeline, arguments, false),
            other => self.call_value(other, arguments),
        }
    }

    pub(crate) fn enter_call(&mut self) -> Result<(), RuntimeError> {
        if self.call_depth >= self.options.max_call_depth {
            return Err(RuntimeErrorKind::StackOverflow {
                limit: self.options.max_call_depth,
            }
            .into());
        }
        self.call_depth += 1;
        Ok(())
    }

    /// Binds parameters in a child of the closure and runs the body. Extra
    /// arguments are ignored; missing ones take their default.
    fn call_function(&mut self, function: &Rc<UserFunction>, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
        let callee = Value::Function(Rc::clone(function));
        let checked = self.strict && function.has_types();
        if checked {
            self.check_call_arguments(&callee, &arguments)?;
        }

        self.enter_call()?;
        let provided = self.provided.len();
        let env = Environment::child(&function.closure);
        let result = self.with_env(env, |interpreter| {
            interpreter.bind_parameters(function, arguments)?;
            match &function.body {
                FunctionBody::Expression(body) => eval_expr(interpreter, body),
                FunctionBody::Block(body) => exec_block(interpreter, body),
            }
        });
        self.provided.truncate(provided);
        self.call_depth -= 1;

        let result = result.or_else(Unwind::into_result)?;
        if checked {
            self.check_call_result(&callee, &result)?;
        }
        Ok(result)
    }

    fn bind_parameters(&mut self, function: &UserFunction, arguments: Vec<Value>) -> Result<(), Unwind> {
        let received = arguments.len();
        let mut arguments = arguments.into_iter();
        for parameter in &function.parameters {
            let value = match (arguments.next(), &parameter.default) {
                (Some(value), _) => value,
                (None, Some(default)) => eval_expr(self, default)?,
                (None, None) => {
                    return Err(RuntimeErrorKind::ArityMismatch {
                        name: function.name.clone(),
                        expected: function.required_arity(),
                        received,
                    }
                    .into())
                }
            };
            self.env.declare_variable(&parameter.name, value, false);
        }
        Ok(())
    }

    pub(crate) fn check_call_arguments(&self, callee: &Value, arguments: &[Value]) -> Result<(), RuntimeError> {
        match callee {
            Value::Function(function) => match function.parameter_types() {
                Some(types) => check_arguments(&function.name, &types, arguments),
                None => {
                    // Only some parameters are annotated.
                    for (parameter, value) in function.parameters.iter().zip(arguments) {
                        if let Some(annotation) = &parameter.annotation {
                            check_arguments(&function.name, std::slice::from_ref(annotation), std::slice::from_ref(value))?;
                        }
                    }
                    Ok(())
                }
            },
            Value::Pipeline(pipeline) => match &pipeline.signature {
                Some(signature) => check_arguments(&pipeline.name, &signature.parameters, arguments),
                None => Ok(()),
            },
            _ => Ok(()),
        }
    }

    pub(crate) fn check_call_result(&self, callee: &Value, result: &Value) -> Result<(), RuntimeError> {
        match callee {
            Value::Function(function) => match function.return_type() {
                Some(returns) => check_return(&function.name, returns, result),
                None => Ok(()),
            },
            Value::Pipeline(pipeline) => match pipeline.signature.as_ref().and_then(|s| s.returns.as_ref()) {
                Some(returns) => check_return(&pipeline.name, returns, result),
                None => Ok(()),
            },
            _ => Ok(()),
        }
    }

    pub fn member_access(&mut self, object: &Value, property: &str) -> Result<Value, RuntimeError> {
        let found = match object {
            Value::Record(fields) => fields.get(property).cloned(),
            Value::List(items) | Value::Tuple(items) if property == "length" => {
                Some(Value::Number(items.len() as f64))
            }
            Value::String(text) if property == "length" => {
                Some(Value::Number(text.chars().count() as f64))
            }
            Value::Pipeline(pipeline) => self.pipeline_member(pipeline, property),
            Value::Bidirectional(pipeline) => match property {
                "length" => Some(Value::Number(pipeline.stages.len() as f64)),
                "stages" => Some(Value::List(pipeline.stages.clone())),
                _ => None,
            },
            Value::Reversible(pair) => match property {
                "forward" => Some(pair.forward.clone()),
                "reverse" => Some(pair.reverse.clone()),
                _ => None,
            },
            Value::Overload(set) if property == "length" => {
                Some(Value::Number(set.candidates.len() as f64))
            }
            Value::Reactive(reactive) => match property {
                "value" => Some(self.reactive_value(reactive)?),
                "source" => Some(Value::String(reactive.borrow().source.clone())),
                "dirty" => Some(Value::Bool(reactive.borrow().dirty)),
                "computations" => Some(Value::Number(reactive.borrow().computations as f64)),
                _ => None,
            },
            Value::Promise(promise) if property == "settled" => {
                Some(Value::Bool(promise.settles_at <= self.now))
            }
            _ => None,
        };

        found.ok_or_else(|| {
            RuntimeErrorKind::FieldNotFound {
                field: property.to_string(),
                type_name: object.type_name().to_string(),
            }
            .into()
        })
    }
}

pub fn decorators_of(target: &Value) -> &[Decorator] {
    match target {
        Value::Function(function) => &function.decorators,
        Value::Pipeline(pipeline) => &pipeline.decorators,
        Value::Bidirectional(pipeline) => &pipeline.decorators,
        _ => &[],
    }
}

/// Arity first, then argument types. Exactly one candidate must survive.
pub fn resolve_overload(set: &OverloadSet, arguments: &[Value]) -> Result<Rc<UserFunction>, RuntimeError> {
    let count = arguments.len();
    let describe = || {
        arguments
            .iter()
            .map(|argument| argument.type_name())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let compatible: Vec<&Rc<UserFunction>> = set
        .candidates
        .iter()
        .filter(|candidate| {
            candidate.required_arity() <= count && count <= candidate.parameters.len()
        })
        .filter(|candidate| match candidate.parameter_types() {
            Some(types) => arguments_match(&types, arguments),
            None => candidate
                .parameters
                .iter()
                .zip(arguments)
                .all(|(parameter, value)| match &parameter.annotation {
                    Some(annotation) => arguments_match(std::slice::from_ref(annotation), std::slice::from_ref(value)),
                    None => true,
                }),
        })
        .collect();

    match compatible.as_slice() {
        [single] => Ok(Rc::clone(single)),
        [] => Err(RuntimeErrorKind::NoMatchingOverload {
            name: set.name.clone(),
            arguments: describe(),
        }
        .into()),
        many => Err(RuntimeErrorKind::AmbiguousOverload {
            name: set.name.clone(),
            candidates: many.len(),
            arguments: describe(),
        }
        .into()),
    }
}
