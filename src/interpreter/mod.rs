//! Tree-walking evaluator.
//!
//! Submodules:
//! - interpreter: The `Interpreter` state and entry points
//! - environment: Scope chain of bindings
//! - value: Runtime values
//! - expr / stmt: Expression and statement evaluation
//! - pipes: The pipe family, pipeline values and reactive pipes
//! - calls: Function calls, overload resolution and member access
//! - decorators: Built-in and user decorators
//! - reactive: Lazy recomputation of reactive values
//! - asynchronous: The virtual clock and async combinators
//! - builtins: Native functions
//! - types: Runtime type checks and conversions
//! - format: Display of values
//! - modules: Module loading
//! - options: Interpreter configuration
pub mod asynchronous;
pub mod builtins;
pub mod calls;
pub mod decorators;
pub mod environment;
pub mod expr;
pub mod format;
pub mod interpreter;
pub mod modules;
pub mod options;
pub mod pipes;
pub mod reactive;
pub mod stmt;
pub mod types;
pub mod value;

#[cfg(test)]
mod tests;
