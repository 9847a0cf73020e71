//! Main interpreter module.
//!
//! This module contains the `Interpreter` structure that owns the evaluation
//! state of one program run: the scope chain, the virtual clock used by async
//! code, provided contexts, captured output and the module loader.

use std::{collections::HashMap, rc::Rc};

use tracing::debug;

use crate::{
    ast::statements::Program,
    errors::errors::{RuntimeError, RuntimeErrorKind},
    Position,
};

use super::{
    builtins::register_builtins, environment::Environment, modules::ModuleLoader,
    options::InterpreterOptions, stmt::exec_block, value::Value,
};

/// Non-local exit from expression evaluation: either a failure or an early
/// `return` travelling up to the nearest function boundary.
#[derive(Debug)]
pub enum Unwind {
    Error(RuntimeError),
    Return(Value),
}

impl Unwind {
    pub fn at(self, position: &Position) -> Self {
        match self {
            Unwind::Error(error) => Unwind::Error(error.at(position)),
            other => other,
        }
    }

    /// Settles the unwind at a call boundary: `return` becomes the result.
    pub fn into_result(self) -> Result<Value, RuntimeError> {
        match self {
            Unwind::Error(error) => Err(error),
            Unwind::Return(value) => Ok(value),
        }
    }
}

impl From<RuntimeError> for Unwind {
    fn from(error: RuntimeError) -> Self {
        Unwind::Error(error)
    }
}

impl From<RuntimeErrorKind> for Unwind {
    fn from(kind: RuntimeErrorKind) -> Self {
        Unwind::Error(RuntimeError::new(kind))
    }
}

pub type EvalResult = Result<Value, Unwind>;

/// The evaluation state for one program run.
///
/// `env` is the frame statements currently execute in. It is swapped with
/// [`Interpreter::with_env`] when entering function bodies, pipe stages and
/// match arms, and always restored afterwards.
pub struct Interpreter {
    pub options: InterpreterOptions,
    /// Frame holding the builtins; parent of every program and module scope.
    pub prelude: Rc<Environment>,
    pub globals: Rc<Environment>,
    pub env: Rc<Environment>,
    /// Effective strict mode: the option or the `#strict` pragma.
    pub strict: bool,
    pub call_depth: usize,
    /// Virtual clock in milliseconds.
    pub now: u64,
    pub(crate) output: Vec<String>,
    pub(crate) module_loader: Option<Rc<dyn ModuleLoader>>,
    /// Paths of modules currently being evaluated, innermost last.
    pub(crate) loading: Vec<String>,
    pub(crate) modules: HashMap<String, Value>,
    /// `provide` overrides, innermost last. Truncated when a call returns.
    pub(crate) provided: Vec<(String, Value)>,
    /// Values given by `context Name = ...`.
    pub(crate) context_defaults: HashMap<String, Value>,
}

impl Interpreter {
    pub fn new(options: InterpreterOptions) -> Self {
        let prelude = Environment::new();
        register_builtins(&prelude);
        let globals = Environment::child(&prelude);

        Interpreter {
            strict: options.strict,
            options,
            prelude,
            env: Rc::clone(&globals),
            globals,
            call_depth: 0,
            now: 0,
            output: vec![],
            module_loader: None,
            loading: vec![],
            modules: HashMap::new(),
            provided: vec![],
            context_defaults: HashMap::new(),
        }
    }

    pub fn with_module_loader(mut self, loader: impl ModuleLoader + 'static) -> Self {
        self.module_loader = Some(Rc::new(loader));
        self
    }

    /// Lines written by `print` so far.
    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// Runs `program` in the global scope and returns the value of its last
    /// statement. A top-level `return` ends the program with its value.
    pub fn interpret(&mut self, program: &Program) -> Result<Value, RuntimeError> {
        debug!(statements = program.body.len(), "interpret");
        if program.has_pragma("strict") {
            self.strict = true;
        }

        let globals = Rc::clone(&self.globals);
        let result = self
            .with_env(globals, |interpreter| exec_block(interpreter, &program.body))
            .or_else(Unwind::into_result);

        debug!(ok = result.is_ok(), now = self.now, "interpret finished");
        result
    }

    /// Like [`Interpreter::interpret`], but a promise left as the program's
    /// value is awaited.
    pub fn interpret_async(&mut self, program: &Program) -> Result<Value, RuntimeError> {
        let value = self.interpret(program)?;
        self.await_value(value)
    }

    /// Evaluates `f` with `env` as the current frame.
    pub fn with_env<T>(&mut self, env: Rc<Environment>, f: impl FnOnce(&mut Self) -> T) -> T {
        let previous = std::mem::replace(&mut self.env, env);
        let result = f(self);
        self.env = previous;
        result
    }

    /// Evaluates `f` in a child of the current frame where `input` is bound.
    pub fn with_input<T>(&mut self, input: Value, f: impl FnOnce(&mut Self) -> T) -> T {
        let env = Environment::child(&self.env);
        env.declare_variable("input", input, false);
        self.with_env(env, f)
    }

    pub fn lookup(&self, name: &str) -> Result<Value, RuntimeError> {
        self.env.get_variable(name).ok_or_else(|| {
            RuntimeErrorKind::UndefinedBinding {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// Nearest `provide`, then the `context` default.
    pub fn lookup_context(&self, name: &str) -> Result<Value, RuntimeError> {
        if let Some((_, value)) = self.provided.iter().rev().find(|(n, _)| n == name) {
            return Ok(value.clone());
        }
        self.context_defaults.get(name).cloned().ok_or_else(|| {
            RuntimeErrorKind::UndefinedContext {
                name: name.to_string(),
            }
            .into()
        })
    }

    pub(crate) fn emit(&mut self, line: String) {
        println!("{}", line);
        self.output.push(line);
    }
}
