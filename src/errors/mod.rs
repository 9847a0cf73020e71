//! Error types and error handling for the interpreter.
//!
//! This module defines the error types used throughout the pipeline:
//!
//! - Lex and parse errors with source position information
//! - Runtime errors raised while evaluating a program
//! - Error formatting and display functionality
//! - Helpful error messages and suggestions

pub mod errors;

#[cfg(test)]
mod tests;
