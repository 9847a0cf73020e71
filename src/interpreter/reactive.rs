use std::{cell::RefCell, rc::Rc};

use tracing::debug;

use crate::errors::errors::{RuntimeError, RuntimeErrorKind};

use super::{
    interpreter::{Interpreter, Unwind},
    pipes::run_stages,
    value::{ReactiveValue, Value},
};

impl Interpreter {
    /// Reads a reactive value, re-running its stages only when the source
    /// was written since the last read.
    pub fn reactive_value(&mut self, reactive: &Rc<RefCell<ReactiveValue>>) -> Result<Value, RuntimeError> {
        let (source, stages, closure) = {
            let state = reactive.borrow();
            if let (false, Some(cached)) = (state.dirty, &state.cached) {
                return Ok(cached.clone());
            }
            (state.source.clone(), state.stages.clone(), Rc::clone(&state.closure))
        };

        let input = closure
            .get_variable(&source)
            .ok_or_else(|| RuntimeErrorKind::UndefinedBinding { name: source.clone() })?;
        debug!(source = %source, "recomputing reactive value");

        let values = self
            .with_env(closure, |interpreter| run_stages(interpreter, &stages, vec![input]))
            .map_err(|unwind| match unwind {
                Unwind::Error(error) => error,
                Unwind::Return(_) => RuntimeErrorKind::TypeError {
                    message: format!("`return` in reactive pipe over `{}`", source),
                }
                .into(),
            })?;
        let value = match values.len() {
            1 => values.into_iter().next().unwrap_or(Value::Null),
            _ => Value::List(values),
        };

        let mut state = reactive.borrow_mut();
        state.cached = Some(value.clone());
        state.dirty = false;
        state.computations += 1;
        Ok(value)
    }
}
