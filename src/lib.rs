#![allow(clippy::module_inception)]

use std::{fmt::Display, panic, rc::Rc, thread};

use crate::{
    errors::errors::{ErrorTip, LangError},
    interpreter::{interpreter::Interpreter, options::InterpreterOptions, value::Value},
    lexer::lexer::tokenize,
    parser::parser::parse,
};

pub mod ast;
pub mod errors;
pub mod interpreter;
pub mod lexer;
pub mod macros;
pub mod parser;

extern crate regex;

/// A 1-based line/column location inside a named source.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub file: Rc<String>,
}

impl Position {
    pub fn new(line: u32, column: u32, file: Rc<String>) -> Self {
        Position { line, column, file }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Span { start, end }
    }

    /// Span covering `self` up to the end of `other`.
    pub fn to(&self, other: &Span) -> Span {
        Span {
            start: self.start.clone(),
            end: other.end.clone(),
        }
    }
}

/// Tokenizes, parses and interprets `source` in one go.
pub fn run_source(source: &str, file: &str, options: InterpreterOptions) -> Result<Value, LangError> {
    let tokens = tokenize(source.to_string(), Some(file.to_string()))?;
    let (_, program) = parse(tokens, Rc::new(file.to_string()));
    let program = program?;

    let mut interpreter = Interpreter::new(options);
    Ok(interpreter.interpret(&program)?)
}

/// Runs `f` on a thread whose stack can hold `options.max_call_depth` nested
/// calls, so runaway recursion ends in `StackOverflow` instead of a crash.
/// `run_source` and `Interpreter::interpret` use the caller's stack.
pub fn on_evaluation_stack<T: Send>(
    options: &InterpreterOptions,
    f: impl FnOnce() -> T + Send,
) -> std::io::Result<T> {
    thread::scope(|scope| {
        let handle = thread::Builder::new()
            .name(String::from("pipelang-eval"))
            .stack_size(options.stack_size())
            .spawn_scoped(scope, f)?;
        match handle.join() {
            Ok(value) => Ok(value),
            Err(payload) => panic::resume_unwind(payload),
        }
    })
}

/// Returns the 1-based line text for `line`, or an empty string when out of range.
pub fn get_line(source: &str, line: u32) -> String {
    source
        .lines()
        .nth(line.saturating_sub(1) as usize)
        .unwrap_or("")
        .to_string()
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_get_line() {
        let source = "Hello, world!\nsecond\n\nTesting { }\n";
        assert_eq!(super::get_line(source, 1), "Hello, world!");
        assert_eq!(super::get_line(source, 4), "Testing { }");
        assert_eq!(super::get_line(source, 9), "");
    }
}

pub fn display_error(error: &LangError, source: &str) {
    /*
        Error: message
        -> final.pipe
           |
        20 | let a = $
           |         ^
    */

    let Some(position) = error.get_position() else {
        println!("Error: {}", error);
        return;
    };

    let line_text = get_line(source, position.line);
    let line_string = position.line.to_string();
    let padding = line_string.len() + 2;

    match error.get_tip() {
        ErrorTip::None => println!("Error: {}", error.get_error_name()),
        tip => println!("Error: {} ({})", error.get_error_name(), tip),
    }
    println!("-> {}", position.file);
    println!("{:>padding$}", "|");

    let (line_text_removed, removed_whitespace) = remove_starting_whitespace(&line_text);
    println!("{} | {}", line_string, line_text_removed.trim_end());

    let arrows = (position.column as usize).saturating_sub(removed_whitespace).max(1);

    println!("{:>padding$} {:->arrows$}", "|", "^");
}

fn remove_starting_whitespace(string: &str) -> (String, usize) {
    let mut start = 0;
    for c in string.chars() {
        if c == ' ' {
            start += 1;
        } else {
            break;
        }
    }

    (String::from(&string[start..]), start)
}
