//! Parser module for building an Abstract Syntax Tree (AST).
//!
//! This module contains the parser that transforms a stream of tokens
//! into a `Program`. It uses a Pratt parser for expressions and handles:
//!
//! - Statements (bindings, overload extensions, contexts, labeled blocks, pragmas)
//! - Expressions, including the pipe family and pipeline literals
//! - Function literals with indentation-delimited bodies
//! - Type annotations and signatures
//!
//! The parser uses NUD (null denotation) and LED (left denotation) functions
//! for expression parsing with binding power for precedence handling.

pub mod expr;
pub mod functions;
pub mod lookups;
pub mod parser;
pub mod pipes;
pub mod stmt;
pub mod types;

#[cfg(test)]
mod tests;
