use std::rc::Rc;

use tracing::debug;

use crate::{
    ast::{
        ast::Expr,
        statements::{AndStmt, BindingTarget, LetStmt, Stmt},
    },
    errors::errors::RuntimeErrorKind,
};

use super::{
    environment::Watcher,
    expr::{eval_expr, make_function, resolve_index},
    interpreter::{EvalResult, Interpreter, Unwind},
    pipes::{make_bidirectional, make_pipeline},
    value::{OverloadSet, ReversibleValue, Value},
};

/// Executes `body` in the current frame and returns the value of the last
/// statement. Only expression statements produce a value.
pub fn exec_block(interpreter: &mut Interpreter, body: &[Stmt]) -> EvalResult {
    let mut last = Value::Null;
    for stmt in body {
        last = exec_stmt(interpreter, stmt)
            .map_err(|unwind| unwind.at(&stmt.get_span().start))?;
    }
    Ok(last)
}

pub fn exec_stmt(interpreter: &mut Interpreter, stmt: &Stmt) -> EvalResult {
    match stmt {
        Stmt::Let(binding) => {
            exec_let(interpreter, binding)?;
            Ok(Value::Null)
        }
        Stmt::And(extension) => {
            exec_and(interpreter, extension)?;
            Ok(Value::Null)
        }
        Stmt::Assign(assign) => {
            let value = eval_expr(interpreter, &assign.value)?;
            let watchers = interpreter.env.assign_variable(&assign.name, value)?;
            mark_dirty(&watchers);
            Ok(Value::Null)
        }
        Stmt::Context(context) => {
            let value = eval_expr(interpreter, &context.value)?;
            interpreter.context_defaults.insert(context.name.clone(), value);
            Ok(Value::Null)
        }
        Stmt::Provide(provide) => {
            let value = eval_expr(interpreter, &provide.value)?;
            interpreter.provided.push((provide.name.clone(), value));
            Ok(Value::Null)
        }
        Stmt::Decorator(decorator) => {
            let value = eval_named(interpreter, &decorator.value, &decorator.name)?;
            if !value.is_callable() {
                return Err(RuntimeErrorKind::NotCallable {
                    type_name: value.type_name().to_string(),
                }
                .into());
            }
            interpreter
                .env
                .declare_variable(&format!("#{}", decorator.name), value, false);
            Ok(Value::Null)
        }
        Stmt::Block(block) => {
            debug!(label = %block.label, "entering block");
            exec_block(interpreter, &block.body)
        }
        Stmt::Pragma(pragma) => {
            debug!(pragma = %pragma.name, "pragma");
            if pragma.name == "strict" {
                interpreter.strict = true;
            }
            Ok(Value::Null)
        }
        Stmt::Expression(expression) => eval_expr(interpreter, &expression.expression),
    }
}

fn mark_dirty(watchers: &[Watcher]) {
    for watcher in watchers.iter().filter_map(|watcher| watcher.upgrade()) {
        watcher.borrow_mut().dirty = true;
    }
}

/// Evaluates a binding's value, naming function and pipeline literals after
/// the binding.
fn eval_named(interpreter: &mut Interpreter, expr: &Expr, name: &str) -> EvalResult {
    match expr {
        Expr::Function(function) => Ok(make_function(interpreter, function, Some(name))),
        Expr::Pipeline(pipeline) => Ok(make_pipeline(interpreter, pipeline, Some(name))),
        Expr::Bidirectional(pipeline) => make_bidirectional(interpreter, pipeline, Some(name)),
        other => eval_expr(interpreter, other),
    }
}

fn exec_let(interpreter: &mut Interpreter, binding: &LetStmt) -> Result<(), Unwind> {
    let value = match &binding.target {
        BindingTarget::Name(name) => eval_named(interpreter, &binding.value, name)?,
        _ => eval_expr(interpreter, &binding.value)?,
    };

    let value = match value {
        Value::Function(function) if !binding.decorators.is_empty() => {
            Value::Function(Rc::new(function.with_decorators(&binding.decorators)))
        }
        Value::Pipeline(pipeline) if !binding.decorators.is_empty() => {
            Value::Pipeline(Rc::new(pipeline.with_decorators(&binding.decorators)))
        }
        other => other,
    };

    let env = Rc::clone(&interpreter.env);
    match (&binding.target, value) {
        (BindingTarget::Name(name), value) => {
            mark_dirty(&env.declare_variable(name, value, binding.mutable));
        }
        (BindingTarget::Record(names), Value::Record(fields)) => {
            for name in names {
                let value = fields.get(name).cloned().ok_or_else(|| {
                    RuntimeErrorKind::FieldNotFound {
                        field: name.clone(),
                        type_name: String::from("Record"),
                    }
                })?;
                mark_dirty(&env.declare_variable(name, value, binding.mutable));
            }
        }
        (BindingTarget::List(names), Value::List(items))
        | (BindingTarget::Tuple(names), Value::Tuple(items))
        | (BindingTarget::Tuple(names), Value::List(items))
        | (BindingTarget::List(names), Value::Tuple(items)) => {
            for (index, name) in names.iter().enumerate() {
                let position = resolve_index(index as f64, items.len())?;
                mark_dirty(&env.declare_variable(name, items[position].clone(), binding.mutable));
            }
        }
        (_, value) => {
            return Err(RuntimeErrorKind::TypeError {
                message: format!("cannot destructure {}", value.type_name()),
            }
            .into())
        }
    }
    Ok(())
}

/// `and name = ...`: a reverse function pairs with the existing binding into a
/// reversible value, a forward one joins its overload set.
fn exec_and(interpreter: &mut Interpreter, extension: &AndStmt) -> Result<(), Unwind> {
    let existing = interpreter.lookup(&extension.name)?;
    let addition = eval_named(interpreter, &extension.value, &extension.name)?;

    let Value::Function(addition) = addition else {
        return Err(RuntimeErrorKind::TypeError {
            message: format!(
                "`and {}` expects a function, got {}",
                extension.name,
                addition.type_name()
            ),
        }
        .into());
    };

    let combined = if addition.is_reverse {
        let forward = match existing {
            Value::Reversible(pair) => pair.forward.clone(),
            other if other.is_callable() => other,
            other => {
                return Err(RuntimeErrorKind::NotCallable {
                    type_name: other.type_name().to_string(),
                }
                .into())
            }
        };
        Value::Reversible(Rc::new(ReversibleValue {
            name: extension.name.clone(),
            forward,
            reverse: Value::Function(addition),
        }))
    } else {
        let missing_signature = || RuntimeErrorKind::MissingSignature {
            name: extension.name.clone(),
        };
        if addition.parameter_types().is_none() {
            return Err(missing_signature().into());
        }
        let mut candidates = match existing {
            Value::Function(function) if function.parameter_types().is_some() => vec![function],
            Value::Function(_) => return Err(missing_signature().into()),
            Value::Overload(set) => set.candidates.clone(),
            other => {
                return Err(RuntimeErrorKind::TypeError {
                    message: format!("cannot overload {}", other.type_name()),
                }
                .into())
            }
        };
        candidates.push(addition);
        debug!(name = %extension.name, candidates = candidates.len(), "overload set extended");
        Value::Overload(Rc::new(OverloadSet {
            name: extension.name.clone(),
            candidates,
        }))
    };

    interpreter.env.extend_variable(&extension.name, combined)?;
    Ok(())
}
