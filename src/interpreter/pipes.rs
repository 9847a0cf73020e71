//! The pipe family: sequential, reverse, spread and parallel pipes, pipeline
//! values and their algebra, and reactive pipes.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use crate::{
    ast::{
        ast::Expr,
        expressions::{
            BidirectionalPipelineExpr, ParallelPipeExpr, PipeExpr, PipeKind, PipelineExpr,
            PipelineStage, ReactivePipeExpr,
        },
    },
    errors::errors::{RuntimeError, RuntimeErrorKind},
};

use super::{
    expr::{eval_arguments, eval_expr, type_error},
    interpreter::{EvalResult, Interpreter, Unwind},
    value::{BidirectionalValue, PipelineValue, ReactiveValue, Stage, Value},
};

/// Values flowing between stages. A parallel stage produces one value per
/// branch; everything else produces exactly one.
type Inputs = Vec<Value>;

fn collapse(mut values: Inputs) -> Value {
    if values.len() == 1 {
        values.remove(0)
    } else {
        Value::List(values)
    }
}

pub fn eval_pipe(interpreter: &mut Interpreter, pipe: &PipeExpr) -> EvalResult {
    let inputs = match pipe.left.as_ref() {
        Expr::Parallel(parallel) => eval_parallel(interpreter, parallel)?,
        left => vec![eval_expr(interpreter, left)?],
    };

    match pipe.kind {
        PipeKind::Sequential => pipe_into(interpreter, inputs, &pipe.right, false),
        PipeKind::Reverse => pipe_into(interpreter, inputs, &pipe.right, true),
        PipeKind::Spread => spread_into(interpreter, collapse(inputs), &pipe.right),
    }
}

/// Feeds `inputs` into `right`:
/// - a call with an `input` argument is evaluated with the value bound;
/// - a call without one receives the inputs before its own arguments;
/// - any other expression mentioning `input` is evaluated with it bound;
/// - anything else must evaluate to a callable.
pub fn pipe_into(
    interpreter: &mut Interpreter,
    inputs: Inputs,
    right: &Expr,
    reverse: bool,
) -> EvalResult {
    let position = right.get_span().start.clone();
    let invoke = |interpreter: &mut Interpreter, callee: &Value, arguments: Vec<Value>| {
        let result = if reverse {
            interpreter.call_reverse(callee, arguments)
        } else {
            interpreter.call_value(callee, arguments)
        };
        result.map_err(|error| Unwind::from(error.at(&position)))
    };

    if let Expr::Call(call) = right {
        if call.arguments.iter().any(|arg| arg.value.contains_placeholder()) {
            let (callee, arguments) = interpreter.with_input(collapse(inputs), |interpreter| {
                let callee = eval_expr(interpreter, &call.callee)?;
                let arguments = eval_arguments(interpreter, &call.arguments)?;
                Ok::<_, Unwind>((callee, arguments))
            })?;
            return invoke(interpreter, &callee, arguments);
        }

        let callee = eval_expr(interpreter, &call.callee)?;
        let mut arguments = inputs;
        arguments.extend(eval_arguments(interpreter, &call.arguments)?);
        return invoke(interpreter, &callee, arguments);
    }

    if right.contains_placeholder() {
        return interpreter.with_input(collapse(inputs), |interpreter| eval_expr(interpreter, right));
    }

    let callee = eval_expr(interpreter, right)?;
    invoke(interpreter, &callee, inputs)
}

/// `list />>> f` calls `f(element, index)` for every element, in order;
/// `list />>> f(a)` calls `f(element, index, a)`.
fn spread_into(interpreter: &mut Interpreter, input: Value, right: &Expr) -> EvalResult {
    let items = match input {
        Value::List(items) => items,
        other => {
            return Err(type_error(format!(
                "spread pipe expects a List, got {}",
                other.type_name()
            )))
        }
    };

    let mut results = Vec::with_capacity(items.len());
    match right {
        Expr::Call(call) if !right.contains_placeholder() => {
            let callee = eval_expr(interpreter, &call.callee)?;
            let extra = eval_arguments(interpreter, &call.arguments)?;
            for (index, item) in items.into_iter().enumerate() {
                let mut arguments = vec![item, Value::Number(index as f64)];
                arguments.extend(extra.iter().cloned());
                results.push(interpreter.call_value(&callee, arguments)?);
            }
        }
        _ if right.contains_placeholder() => {
            for item in items {
                results.push(pipe_into(interpreter, vec![item], right, false)?);
            }
        }
        _ => {
            let callee = eval_expr(interpreter, right)?;
            for (index, item) in items.into_iter().enumerate() {
                let arguments = vec![item, Value::Number(index as f64)];
                results.push(interpreter.call_value(&callee, arguments)?);
            }
        }
    }
    Ok(Value::List(results))
}

/// Evaluates the fed value once and runs every branch against it, in
/// declaration order.
pub fn eval_parallel(interpreter: &mut Interpreter, parallel: &ParallelPipeExpr) -> Result<Inputs, Unwind> {
    let input = eval_expr(interpreter, &parallel.input)?;
    run_branches(interpreter, &parallel.branches, vec![input])
}

fn run_branches(
    interpreter: &mut Interpreter,
    branches: &[Vec<PipelineStage>],
    inputs: Inputs,
) -> Result<Inputs, Unwind> {
    let mut results = Vec::with_capacity(branches.len());
    for branch in branches {
        let values = run_stages(interpreter, branch, inputs.clone())?;
        results.push(collapse(values));
    }
    Ok(results)
}

/// Runs `stages` in the current frame.
pub fn run_stages(
    interpreter: &mut Interpreter,
    stages: &[PipelineStage],
    mut inputs: Inputs,
) -> Result<Inputs, Unwind> {
    for stage in stages {
        inputs = run_stage(interpreter, stage, inputs)?;
    }
    Ok(inputs)
}

fn run_stage(
    interpreter: &mut Interpreter,
    stage: &PipelineStage,
    inputs: Inputs,
) -> Result<Inputs, Unwind> {
    match stage {
        PipelineStage::Pipe(expr) => Ok(vec![pipe_into(interpreter, inputs, expr, false)?]),
        PipelineStage::Spread(expr) => Ok(vec![spread_into(interpreter, collapse(inputs), expr)?]),
        PipelineStage::Parallel(branches) => run_branches(interpreter, branches, inputs),
    }
}

pub fn make_pipeline(interpreter: &mut Interpreter, pipeline: &PipelineExpr, name: Option<&str>) -> Value {
    let closure = Rc::clone(&interpreter.env);
    Value::Pipeline(Rc::new(PipelineValue {
        name: name.unwrap_or("<pipeline>").to_string(),
        stages: pipeline
            .stages
            .iter()
            .map(|stage| Stage::Source(stage.clone(), Rc::clone(&closure)))
            .collect(),
        signature: pipeline.signature.clone(),
        decorators: pipeline.decorators.clone(),
        closure,
        memo: RefCell::new(HashMap::new()),
    }))
}

pub fn make_bidirectional(
    interpreter: &mut Interpreter,
    pipeline: &BidirectionalPipelineExpr,
    name: Option<&str>,
) -> EvalResult {
    let mut stages = Vec::with_capacity(pipeline.stages.len());
    for stage in &pipeline.stages {
        stages.push(eval_expr(interpreter, stage)?);
    }
    Ok(Value::Bidirectional(Rc::new(BidirectionalValue {
        name: name.unwrap_or("<bidirectional>").to_string(),
        stages,
        decorators: pipeline.decorators.clone(),
        memo: RefCell::new(HashMap::new()),
    })))
}

/// `source @> stages`: registers a watcher on `source` and starts dirty.
pub fn eval_reactive(interpreter: &mut Interpreter, reactive: &ReactivePipeExpr) -> EvalResult {
    let value = Rc::new(RefCell::new(ReactiveValue {
        source: reactive.source.clone(),
        stages: reactive.stages.clone(),
        closure: Rc::clone(&interpreter.env),
        cached: None,
        dirty: true,
        computations: 0,
    }));
    interpreter
        .env
        .watch_variable(&reactive.source, Rc::downgrade(&value))?;
    Ok(Value::Reactive(value))
}

impl Interpreter {
    /// Runs the stages of a pipeline value, without its decorators.
    pub fn run_pipeline(
        &mut self,
        pipeline: &PipelineValue,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        self.enter_call()?;
        let result = self.run_pipeline_stages(&pipeline.stages, arguments);
        self.call_depth -= 1;
        result
    }

    fn run_pipeline_stages(&mut self, stages: &[Stage], arguments: Vec<Value>) -> Result<Value, RuntimeError> {
        let mut inputs = arguments;
        for stage in stages {
            inputs = match stage {
                Stage::Source(stage, closure) => {
                    let result = self.with_env(Rc::clone(closure), |interpreter| {
                        run_stage(interpreter, stage, inputs)
                    });
                    match result {
                        Ok(values) => values,
                        Err(Unwind::Return(value)) => return Ok(value),
                        Err(Unwind::Error(error)) => return Err(error),
                    }
                }
                Stage::Callable(callee) => vec![self.call_value(callee, inputs)?],
            };
        }
        Ok(collapse(inputs))
    }

    /// Forward runs left to right; reverse runs right to left through each
    /// stage's reverse half.
    pub fn run_bidirectional(
        &mut self,
        pipeline: &BidirectionalValue,
        arguments: Vec<Value>,
        reverse: bool,
    ) -> Result<Value, RuntimeError> {
        let mut value = collapse(arguments);
        if reverse {
            for stage in pipeline.stages.iter().rev() {
                value = self.call_reverse(stage, vec![value])?;
            }
        } else {
            for stage in &pipeline.stages {
                value = self.call_value(stage, vec![value])?;
            }
        }
        Ok(value)
    }

    pub fn call_reverse(&mut self, callee: &Value, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
        match callee {
            Value::Reversible(pair) => self.call_value(&pair.reverse, arguments),
            Value::Bidirectional(pipeline) => self.run_bidirectional(pipeline, arguments, true),
            Value::Function(function) if function.is_reverse => self.call_value(callee, arguments),
            other => Err(RuntimeErrorKind::NotReversible {
                type_name: other.type_name().to_string(),
            }
            .into()),
        }
    }

    pub fn is_pipeline_method(name: &str) -> bool {
        matches!(name, "push" | "prepend" | "concat" | "reverse" | "slice")
    }

    /// Pipeline algebra. Every method returns a new pipeline.
    pub fn pipeline_method(
        &mut self,
        pipeline: &PipelineValue,
        method: &str,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        let argument = |index: usize| arguments.get(index).cloned().unwrap_or(Value::Null);
        let callable = |value: Value| -> Result<Stage, RuntimeError> {
            if value.is_callable() {
                Ok(Stage::Callable(value))
            } else {
                Err(RuntimeErrorKind::NotCallable {
                    type_name: value.type_name().to_string(),
                }
                .into())
            }
        };

        let mut stages = pipeline.stages.clone();
        match method {
            "push" => stages.push(callable(argument(0))?),
            "prepend" => stages.insert(0, callable(argument(0))?),
            "concat" => match argument(0) {
                Value::Pipeline(other) => stages.extend(other.stages.iter().cloned()),
                other => stages.push(callable(other)?),
            },
            "reverse" => stages.reverse(),
            "slice" => {
                let length = stages.len();
                let bound = |value: Value, default: usize| -> Result<usize, RuntimeError> {
                    match value {
                        Value::Null => Ok(default),
                        Value::Number(n) if n < 0.0 => Ok(length.saturating_sub((-n) as usize)),
                        Value::Number(n) => Ok((n as usize).min(length)),
                        other => Err(RuntimeErrorKind::TypeError {
                            message: format!("slice bound must be a number, got {}", other.type_name()),
                        }
                        .into()),
                    }
                };
                let start = bound(argument(0), 0)?;
                let end = bound(argument(1), length)?.max(start);
                stages = stages[start..end].to_vec();
            }
            _ => {
                return Err(RuntimeErrorKind::FieldNotFound {
                    field: method.to_string(),
                    type_name: String::from("Pipeline"),
                }
                .into())
            }
        }
        Ok(Value::Pipeline(Rc::new(pipeline.derive(stages))))
    }

    /// Introspection of pipelines (`.length`, `.stages`, `.first`, `.last`).
    pub fn pipeline_member(&self, pipeline: &PipelineValue, property: &str) -> Option<Value> {
        let single = |stage: Option<&Stage>| match stage {
            Some(stage) => Value::Pipeline(Rc::new(pipeline.derive(vec![stage.clone()]))),
            None => Value::Null,
        };
        match property {
            "length" => Some(Value::Number(pipeline.stages.len() as f64)),
            "stages" => Some(Value::List(
                pipeline
                    .stages
                    .iter()
                    .map(|stage| Value::String(stage.to_string()))
                    .collect(),
            )),
            "first" => Some(single(pipeline.stages.first())),
            "last" => Some(single(pipeline.stages.last())),
            "name" => Some(Value::String(pipeline.name.clone())),
            _ => None,
        }
    }
}
