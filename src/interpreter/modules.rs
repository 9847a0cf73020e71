//! `use "path"` and the module-loader boundary.

use std::{collections::BTreeMap, collections::HashMap, rc::Rc};

use tracing::debug;

use crate::{
    errors::errors::{RuntimeError, RuntimeErrorKind},
    lexer::lexer::tokenize,
    parser::parser::parse,
};

use super::{
    environment::Environment,
    interpreter::{Interpreter, Unwind},
    stmt::exec_block,
    value::Value,
};

/// Supplies module source text by path.
pub trait ModuleLoader {
    fn resolve(&self, path: &str) -> Option<String>;
}

/// In-memory loader: a fixed map from path to source.
#[derive(Debug, Clone, Default)]
pub struct StaticModuleLoader {
    modules: HashMap<String, String>,
}

impl StaticModuleLoader {
    pub fn new() -> Self {
        StaticModuleLoader::default()
    }

    pub fn with_module(mut self, path: &str, source: &str) -> Self {
        self.modules.insert(path.to_string(), source.to_string());
        self
    }
}

impl ModuleLoader for StaticModuleLoader {
    fn resolve(&self, path: &str) -> Option<String> {
        self.modules.get(path).cloned()
    }
}

impl Interpreter {
    /// Evaluates the module at `path` in a fresh scope, once, and returns a
    /// record of its `#export` bindings.
    pub fn load_module(&mut self, path: &str) -> Result<Value, RuntimeError> {
        if let Some(module) = self.modules.get(path) {
            return Ok(module.clone());
        }
        if self.loading.iter().any(|loading| loading == path) {
            return Err(RuntimeErrorKind::CircularImport {
                path: path.to_string(),
            }
            .into());
        }

        let not_found = || RuntimeError::from(RuntimeErrorKind::ModuleNotFound {
            path: path.to_string(),
        });
        let loader = self.module_loader.clone().ok_or_else(not_found)?;
        let source = loader.resolve(path).ok_or_else(not_found)?;

        let syntax_error = |error: crate::errors::errors::Error| {
            RuntimeError::from(RuntimeErrorKind::Custom {
                message: format!("in module `{}`: {}", path, error),
            })
        };
        let tokens = tokenize(source, Some(path.to_string())).map_err(syntax_error)?;
        let (_, program) = parse(tokens, Rc::new(path.to_string()));
        let program = program.map_err(syntax_error)?;

        debug!(path, "loading module");
        self.loading.push(path.to_string());
        let provided = std::mem::take(&mut self.provided);
        let scope = Environment::child(&self.prelude);
        let result = self
            .with_env(Rc::clone(&scope), |interpreter| exec_block(interpreter, &program.body))
            .or_else(Unwind::into_result);
        self.provided = provided;
        self.loading.pop();
        result?;

        let mut exports = BTreeMap::new();
        for name in program.exports() {
            if let Some(value) = scope.get_variable(&name) {
                exports.insert(name, value);
            }
        }
        let module = Value::Record(exports);
        self.modules.insert(path.to_string(), module.clone());
        Ok(module)
    }
}
