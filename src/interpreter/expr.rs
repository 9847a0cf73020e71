//! Expression evaluation.
//!
//! Every node evaluates against `interpreter.env`. Errors pick up the span of
//! the innermost node that raised them.

use std::{cell::RefCell, collections::BTreeMap, collections::HashMap, rc::Rc};

use crate::{
    ast::{
        ast::Expr,
        expressions::{
            Argument, BinaryExpr, BinaryOperator, CallExpr, Element, FunctionExpr, IndexExpr,
            MatchCaseKind, MatchExpr, RecordEntry, TemplatePart, UnaryOperator,
        },
    },
    errors::errors::{RuntimeError, RuntimeErrorKind},
};

use super::{
    environment::Environment,
    format::{format_value, repr_value},
    interpreter::{EvalResult, Interpreter, Unwind},
    pipes::{eval_parallel, eval_pipe, eval_reactive, make_bidirectional, make_pipeline},
    value::{UserFunction, Value},
};

pub fn eval_expr(interpreter: &mut Interpreter, expr: &Expr) -> EvalResult {
    eval_node(interpreter, expr).map_err(|unwind| unwind.at(&expr.get_span().start))
}

fn eval_node(interpreter: &mut Interpreter, expr: &Expr) -> EvalResult {
    match expr {
        Expr::Number(number) => Ok(Value::Number(number.value)),
        Expr::String(string) => Ok(Value::String(string.value.clone())),
        Expr::Boolean(boolean) => Ok(Value::Bool(boolean.value)),
        Expr::Null(_) => Ok(Value::Null),
        Expr::Template(template) => {
            let mut text = String::new();
            for part in &template.parts {
                match part {
                    TemplatePart::Text(literal) => text.push_str(literal),
                    TemplatePart::Expr(expr) => {
                        text.push_str(&format_value(&eval_expr(interpreter, expr)?))
                    }
                }
            }
            Ok(Value::String(text))
        }
        Expr::Symbol(symbol) => Ok(interpreter.lookup(&symbol.value)?),
        Expr::Placeholder(_) => Ok(interpreter.lookup("input")?),
        Expr::Context(context) => Ok(interpreter.lookup_context(&context.name)?),
        Expr::List(list) => Ok(Value::List(eval_elements(interpreter, &list.elements)?)),
        Expr::Tuple(tuple) => Ok(Value::Tuple(eval_elements(interpreter, &tuple.elements)?)),
        Expr::Record(record) => {
            let mut fields = BTreeMap::new();
            for entry in &record.entries {
                match entry {
                    RecordEntry::Field { key, value } => {
                        let value = eval_expr(interpreter, value)?;
                        fields.insert(key.clone(), value);
                    }
                    RecordEntry::Spread(expr) => match eval_expr(interpreter, expr)? {
                        Value::Record(other) => fields.extend(other),
                        other => {
                            return Err(type_error(format!(
                                "cannot spread {} into a record",
                                other.type_name()
                            )))
                        }
                    },
                }
            }
            Ok(Value::Record(fields))
        }
        Expr::Index(index) => eval_index(interpreter, index),
        Expr::Member(member) => {
            let object = eval_expr(interpreter, &member.object)?;
            Ok(interpreter.member_access(&object, &member.property)?)
        }
        Expr::Unary(unary) => {
            let operand = eval_expr(interpreter, &unary.operand)?;
            match (unary.operator, operand) {
                (UnaryOperator::Negate, Value::Number(n)) => Ok(Value::Number(-n)),
                (UnaryOperator::Negate, other) => Err(type_error(format!(
                    "cannot negate {}",
                    other.type_name()
                ))),
                (UnaryOperator::Not, value) => Ok(Value::Bool(!value.is_truthy())),
            }
        }
        Expr::Binary(binary) => eval_binary(interpreter, binary),
        Expr::Ternary(ternary) => {
            if eval_expr(interpreter, &ternary.condition)?.is_truthy() {
                eval_expr(interpreter, &ternary.then_branch)
            } else {
                eval_expr(interpreter, &ternary.else_branch)
            }
        }
        Expr::Pipe(pipe) => eval_pipe(interpreter, pipe),
        Expr::Parallel(parallel) => Ok(Value::List(eval_parallel(interpreter, parallel)?)),
        Expr::Reactive(reactive) => eval_reactive(interpreter, reactive),
        Expr::Function(function) => Ok(make_function(interpreter, function, None)),
        Expr::Call(call) => eval_call(interpreter, call),
        Expr::Pipeline(pipeline) => Ok(make_pipeline(interpreter, pipeline, None)),
        Expr::Bidirectional(pipeline) => make_bidirectional(interpreter, pipeline, None),
        Expr::Await(await_expr) => {
            let value = eval_expr(interpreter, &await_expr.operand)?;
            Ok(interpreter.await_value(value)?)
        }
        Expr::Return(return_expr) => {
            let value = match &return_expr.value {
                Some(value) => eval_expr(interpreter, value)?,
                None => Value::Null,
            };
            Err(Unwind::Return(value))
        }
        Expr::Match(match_expr) => eval_match(interpreter, match_expr),
        Expr::Use(use_expr) => Ok(interpreter.load_module(&use_expr.path)?),
    }
}

pub fn type_error(message: String) -> Unwind {
    RuntimeErrorKind::TypeError { message }.into()
}

fn eval_elements(interpreter: &mut Interpreter, elements: &[Element]) -> Result<Vec<Value>, Unwind> {
    let mut values = vec![];
    for element in elements {
        let value = eval_expr(interpreter, &element.value)?;
        if element.spread {
            values.extend(spread_items(value)?);
        } else {
            values.push(value);
        }
    }
    Ok(values)
}

pub fn eval_arguments(
    interpreter: &mut Interpreter,
    arguments: &[Argument],
) -> Result<Vec<Value>, Unwind> {
    let mut values = vec![];
    for argument in arguments {
        let value = eval_expr(interpreter, &argument.value)?;
        if argument.spread {
            values.extend(spread_items(value)?);
        } else {
            values.push(value);
        }
    }
    Ok(values)
}

fn spread_items(value: Value) -> Result<Vec<Value>, Unwind> {
    match value {
        Value::List(items) | Value::Tuple(items) => Ok(items),
        other => Err(type_error(format!("cannot spread {}", other.type_name()))),
    }
}

/// Builds a function value closing over the current frame.
pub fn make_function(
    interpreter: &mut Interpreter,
    function: &FunctionExpr,
    name: Option<&str>,
) -> Value {
    Value::Function(Rc::new(UserFunction {
        name: name.unwrap_or("<anonymous>").to_string(),
        parameters: function.parameters.clone(),
        body: function.body.clone(),
        decorators: function.decorators.clone(),
        signature: function.signature.clone(),
        is_reverse: function.is_reverse,
        closure: Rc::clone(&interpreter.env),
        memo: RefCell::new(HashMap::new()),
    }))
}

fn eval_index(interpreter: &mut Interpreter, index: &IndexExpr) -> EvalResult {
    let object = eval_expr(interpreter, &index.object)?;
    let key = eval_expr(interpreter, &index.index)?;

    match (&object, &key) {
        (Value::List(items) | Value::Tuple(items), Value::Number(n)) => {
            let position = resolve_index(*n, items.len())?;
            Ok(items[position].clone())
        }
        (Value::String(text), Value::Number(n)) => {
            let chars: Vec<char> = text.chars().collect();
            let position = resolve_index(*n, chars.len())?;
            Ok(Value::String(chars[position].to_string()))
        }
        (Value::Record(fields), Value::String(field)) => {
            fields.get(field).cloned().ok_or_else(|| {
                RuntimeErrorKind::FieldNotFound {
                    field: field.clone(),
                    type_name: object.type_name().to_string(),
                }
                .into()
            })
        }
        _ => Err(type_error(format!(
            "cannot index {} with {}",
            object.type_name(),
            key.type_name()
        ))),
    }
}

/// Negative indices count from the end.
pub fn resolve_index(index: f64, length: usize) -> Result<usize, RuntimeError> {
    if index.fract() != 0.0 {
        return Err(RuntimeErrorKind::TypeError {
            message: format!("index {} is not an integer", index),
        }
        .into());
    }
    let index = index as i64;
    let resolved = if index < 0 { index + length as i64 } else { index };
    if resolved < 0 || resolved >= length as i64 {
        return Err(RuntimeErrorKind::IndexOutOfBounds { index, length }.into());
    }
    Ok(resolved as usize)
}

fn eval_binary(interpreter: &mut Interpreter, binary: &BinaryExpr) -> EvalResult {
    match binary.operator {
        BinaryOperator::And => {
            let left = eval_expr(interpreter, &binary.left)?;
            if !left.is_truthy() {
                return Ok(Value::Bool(false));
            }
            let right = eval_expr(interpreter, &binary.right)?;
            return Ok(Value::Bool(right.is_truthy()));
        }
        BinaryOperator::Or => {
            let left = eval_expr(interpreter, &binary.left)?;
            if left.is_truthy() {
                return Ok(Value::Bool(true));
            }
            let right = eval_expr(interpreter, &binary.right)?;
            return Ok(Value::Bool(right.is_truthy()));
        }
        _ => {}
    }

    let left = eval_expr(interpreter, &binary.left)?;
    let right = eval_expr(interpreter, &binary.right)?;
    binary_operation(binary.operator, left, right)
}

pub fn binary_operation(operator: BinaryOperator, left: Value, right: Value) -> EvalResult {
    use BinaryOperator::*;

    let result = match (operator, &left, &right) {
        (Add, Value::Number(a), Value::Number(b)) => Value::Number(a + b),
        (Add, Value::String(_), _) | (Add, _, Value::String(_)) => {
            Value::String(format!("{}{}", format_value(&left), format_value(&right)))
        }
        (Subtract, Value::Number(a), Value::Number(b)) => Value::Number(a - b),
        (Multiply, Value::Number(a), Value::Number(b)) => Value::Number(a * b),
        (Divide | Modulo, Value::Number(_), Value::Number(b)) if *b == 0.0 => {
            return Err(RuntimeErrorKind::DivisionByZero.into())
        }
        (Divide, Value::Number(a), Value::Number(b)) => Value::Number(a / b),
        (Modulo, Value::Number(a), Value::Number(b)) => Value::Number(a % b),
        (Concat, Value::List(a), Value::List(b)) => {
            Value::List(a.iter().chain(b.iter()).cloned().collect())
        }
        (Concat, Value::String(_), _) | (Concat, _, Value::String(_)) => {
            Value::String(format!("{}{}", format_value(&left), format_value(&right)))
        }
        (Equal, _, _) => Value::Bool(left == right),
        (NotEqual, _, _) => Value::Bool(left != right),
        (Less | LessEqual | Greater | GreaterEqual, Value::Number(a), Value::Number(b)) => {
            Value::Bool(compare(operator, a.partial_cmp(b)))
        }
        (Less | LessEqual | Greater | GreaterEqual, Value::String(a), Value::String(b)) => {
            Value::Bool(compare(operator, Some(a.cmp(b))))
        }
        _ => {
            return Err(type_error(format!(
                "unsupported operands for `{}`: {} and {}",
                operator.symbol(),
                left.type_name(),
                right.type_name()
            )))
        }
    };
    Ok(result)
}

fn compare(operator: BinaryOperator, ordering: Option<std::cmp::Ordering>) -> bool {
    let Some(ordering) = ordering else {
        return false;
    };
    match operator {
        BinaryOperator::Less => ordering.is_lt(),
        BinaryOperator::LessEqual => ordering.is_le(),
        BinaryOperator::Greater => ordering.is_gt(),
        BinaryOperator::GreaterEqual => ordering.is_ge(),
        _ => false,
    }
}

fn eval_call(interpreter: &mut Interpreter, call: &CallExpr) -> EvalResult {
    if let Expr::Member(member) = call.callee.as_ref() {
        let object = eval_expr(interpreter, &member.object)?;
        if let Value::Pipeline(pipeline) = &object {
            if Interpreter::is_pipeline_method(&member.property) {
                let arguments = eval_arguments(interpreter, &call.arguments)?;
                return Ok(interpreter.pipeline_method(pipeline, &member.property, arguments)?);
            }
        }
        let callee = interpreter
            .member_access(&object, &member.property)
            .map_err(|error| error.at(&member.span.start))?;
        let arguments = eval_arguments(interpreter, &call.arguments)?;
        return Ok(interpreter.call_value(&callee, arguments)?);
    }

    let callee = eval_expr(interpreter, &call.callee)?;
    let arguments = eval_arguments(interpreter, &call.arguments)?;
    Ok(interpreter.call_value(&callee, arguments)?)
}

fn eval_match(interpreter: &mut Interpreter, match_expr: &MatchExpr) -> EvalResult {
    let scrutinee = eval_expr(interpreter, &match_expr.scrutinee)?;
    let env = Environment::child(&interpreter.env);
    env.declare_variable("input", scrutinee.clone(), false);

    interpreter.with_env(env, |interpreter| {
        for case in &match_expr.cases {
            let matched = match &case.kind {
                MatchCaseKind::Pattern(pattern) => eval_expr(interpreter, pattern)? == scrutinee,
                MatchCaseKind::Guard(guard) => eval_expr(interpreter, guard)?.is_truthy(),
                MatchCaseKind::Default => true,
            };
            if matched {
                return eval_expr(interpreter, &case.body);
            }
        }
        Err(RuntimeErrorKind::NoMatchingCase {
            value: repr_value(&scrutinee),
        }
        .into())
    })
}
