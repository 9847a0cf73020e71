use std::{
    cell::RefCell,
    collections::HashMap,
    rc::{Rc, Weak},
};

use crate::errors::errors::RuntimeErrorKind;

use super::value::{ReactiveValue, Value};

/// A reactive value listening for writes to a binding.
pub type Watcher = Weak<RefCell<ReactiveValue>>;

#[derive(Debug)]
pub struct Binding {
    pub value: Value,
    pub mutable: bool,
    watchers: Vec<Watcher>,
}

/// One frame of the scope chain. Function values hold an `Rc` to the frame
/// they were created in; reading walks outward through `parent`.
#[derive(Debug, Default)]
pub struct Environment {
    variable_lookup: RefCell<HashMap<String, Binding>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    pub fn new() -> Rc<Self> {
        Rc::new(Environment::default())
    }

    pub fn child(parent: &Rc<Environment>) -> Rc<Self> {
        Rc::new(Environment {
            variable_lookup: RefCell::new(HashMap::new()),
            parent: Some(Rc::clone(parent)),
        })
    }

    /// Binds `name` in this frame, shadowing any outer binding. Redeclaring in
    /// the same frame replaces the old binding but keeps its watchers, which
    /// are returned so the caller can mark them dirty.
    pub fn declare_variable(&self, name: &str, value: Value, mutable: bool) -> Vec<Watcher> {
        let mut lookup = self.variable_lookup.borrow_mut();
        let mut watchers = lookup
            .remove(name)
            .map(|binding| binding.watchers)
            .unwrap_or_default();
        watchers.retain(|watcher| watcher.strong_count() > 0);
        lookup.insert(
            name.to_string(),
            Binding {
                value,
                mutable,
                watchers: watchers.clone(),
            },
        );
        watchers
    }

    pub fn get_variable(&self, name: &str) -> Option<Value> {
        if let Some(binding) = self.variable_lookup.borrow().get(name) {
            return Some(binding.value.clone());
        }
        self.parent.as_ref().and_then(|parent| parent.get_variable(name))
    }

    /// Writes to an existing mutable binding and returns the reactive values
    /// that must be marked dirty.
    pub fn assign_variable(&self, name: &str, value: Value) -> Result<Vec<Watcher>, RuntimeErrorKind> {
        if let Some(binding) = self.variable_lookup.borrow_mut().get_mut(name) {
            if !binding.mutable {
                return Err(RuntimeErrorKind::ImmutableAssignment {
                    name: name.to_string(),
                });
            }
            binding.value = value;
            binding.watchers.retain(|watcher| watcher.strong_count() > 0);
            return Ok(binding.watchers.clone());
        }

        match &self.parent {
            Some(parent) => parent.assign_variable(name, value),
            None => Err(RuntimeErrorKind::UndefinedBinding {
                name: name.to_string(),
            }),
        }
    }

    /// Replaces the value of an existing binding regardless of mutability.
    /// Used when `and` extends a function into an overload set or a reversible pair.
    pub fn extend_variable(&self, name: &str, value: Value) -> Result<(), RuntimeErrorKind> {
        if let Some(binding) = self.variable_lookup.borrow_mut().get_mut(name) {
            binding.value = value;
            return Ok(());
        }

        match &self.parent {
            Some(parent) => parent.extend_variable(name, value),
            None => Err(RuntimeErrorKind::UndefinedBinding {
                name: name.to_string(),
            }),
        }
    }

    /// Registers `watcher` on the nearest binding called `name`.
    pub fn watch_variable(&self, name: &str, watcher: Watcher) -> Result<(), RuntimeErrorKind> {
        if let Some(binding) = self.variable_lookup.borrow_mut().get_mut(name) {
            binding.watchers.push(watcher);
            return Ok(());
        }

        match &self.parent {
            Some(parent) => parent.watch_variable(name, watcher),
            None => Err(RuntimeErrorKind::UndefinedBinding {
                name: name.to_string(),
            }),
        }
    }
}
