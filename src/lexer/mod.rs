//! Lexical analysis module.
//!
//! This module contains the lexer (tokenizer) that converts source code
//! into a stream of tokens for parsing. It handles:
//!
//! - Tokenization of source code using anchored regex patterns
//! - Recognition of keywords, identifiers, literals and the pipe operators
//! - Line/column tracking for error reporting and indentation rules
//! - Comments, newlines and labeled block markers

pub mod lexer;
pub mod tokens;

#[cfg(test)]
mod tests;
