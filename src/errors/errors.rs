use std::fmt::Display;

use thiserror::Error;

use crate::{lexer::tokens::TokenKind, Position};

/// Lexing or parsing failure, carrying where it happened.
#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_internal_error(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::UnterminatedString { .. } => "UnterminatedString",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::InvalidInterpolation { .. } => "InvalidInterpolation",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => ErrorTip::None,
            ErrorImpl::UnterminatedString { .. } => {
                ErrorTip::Suggestion(String::from("Missing closing quote"))
            }
            ErrorImpl::UnexpectedToken { token, kind } => ErrorTip::Suggestion(format!(
                "Unexpected token: `{}` ({})",
                token, kind
            )),
            ErrorImpl::UnexpectedTokenDetailed { token, message, .. } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`, {}", token, message))
            }
            ErrorImpl::NumberParseError { token } => {
                ErrorTip::Suggestion(format!("Invalid number: `{}`", token))
            }
            ErrorImpl::InvalidInterpolation { source_text, .. } => ErrorTip::Suggestion(format!(
                "Could not parse `${{{}}}` inside template string",
                source_text
            )),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.position, self.internal_error)
    }
}

impl std::error::Error for Error {}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("unterminated string starting with {token:?}")]
    UnterminatedString { token: String },
    #[error("unexpected token {kind}: {token:?}")]
    UnexpectedToken { token: String, kind: TokenKind },
    #[error("unexpected token {kind} ({message}): {token:?}")]
    UnexpectedTokenDetailed {
        token: String,
        kind: TokenKind,
        message: String,
    },
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },
    #[error("invalid template expression {source_text:?}: {message}")]
    InvalidInterpolation { source_text: String, message: String },
}

/// Evaluation failure. The position is filled in by the innermost node that knows it.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub position: Option<Position>,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind) -> Self {
        RuntimeError {
            kind,
            position: None,
        }
    }

    /// Attaches `position` unless a more precise one is already present.
    pub fn at(mut self, position: &Position) -> Self {
        if self.position.is_none() {
            self.position = Some(position.clone());
        }
        self
    }

    pub fn get_error_name(&self) -> &str {
        self.kind.name()
    }
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.position {
            Some(position) => write!(f, "{}: {}", position, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for RuntimeError {}

impl From<RuntimeErrorKind> for RuntimeError {
    fn from(kind: RuntimeErrorKind) -> Self {
        RuntimeError::new(kind)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeErrorKind {
    #[error("undefined binding `{name}`")]
    UndefinedBinding { name: String },
    #[error("cannot assign to immutable binding `{name}`")]
    ImmutableAssignment { name: String },
    #[error("value of type {type_name} is not callable")]
    NotCallable { type_name: String },
    #[error("field `{field}` not found on {type_name}")]
    FieldNotFound { field: String, type_name: String },
    #[error("index {index} out of bounds for length {length}")]
    IndexOutOfBounds { index: i64, length: usize },
    #[error("no matching case for {value}")]
    NoMatchingCase { value: String },
    #[error("no overload of `{name}` matches arguments ({arguments})")]
    NoMatchingOverload { name: String, arguments: String },
    #[error("call to `{name}` is ambiguous between {candidates} overloads for ({arguments})")]
    AmbiguousOverload {
        name: String,
        candidates: usize,
        arguments: String,
    },
    #[error("overload of `{name}` requires a type signature")]
    MissingSignature { name: String },
    #[error("type mismatch in {context}: expected {expected}, got {actual}")]
    TypeMismatch {
        context: String,
        expected: String,
        actual: String,
    },
    #[error("type error: {message}")]
    TypeError { message: String },
    #[error("`{name}` expects {expected} arguments, received {received}")]
    ArityMismatch {
        name: String,
        expected: usize,
        received: usize,
    },
    #[error("{type_name} has no reverse direction")]
    NotReversible { type_name: String },
    #[error("undefined context `@{name}`")]
    UndefinedContext { name: String },
    #[error("undefined decorator `#{name}`")]
    UndefinedDecorator { name: String },
    #[error("division by zero")]
    DivisionByZero,
    #[error("`{name}` did not settle within {limit_ms}ms")]
    Timeout { name: String, limit_ms: u64 },
    #[error("`{name}` failed after {attempts} attempts: {last_error}")]
    RetryExhausted {
        name: String,
        attempts: usize,
        last_error: String,
    },
    #[error("module `{path}` not found")]
    ModuleNotFound { path: String },
    #[error("circular import of `{path}`")]
    CircularImport { path: String },
    #[error("maximum call depth of {limit} exceeded")]
    StackOverflow { limit: usize },
    #[error("{message}")]
    Custom { message: String },
}

impl RuntimeErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            RuntimeErrorKind::UndefinedBinding { .. } => "UndefinedBinding",
            RuntimeErrorKind::ImmutableAssignment { .. } => "ImmutableAssignment",
            RuntimeErrorKind::NotCallable { .. } => "NotCallable",
            RuntimeErrorKind::FieldNotFound { .. } => "FieldNotFound",
            RuntimeErrorKind::IndexOutOfBounds { .. } => "IndexOutOfBounds",
            RuntimeErrorKind::NoMatchingCase { .. } => "NoMatchingCase",
            RuntimeErrorKind::NoMatchingOverload { .. } => "NoMatchingOverload",
            RuntimeErrorKind::AmbiguousOverload { .. } => "AmbiguousOverload",
            RuntimeErrorKind::MissingSignature { .. } => "MissingSignature",
            RuntimeErrorKind::TypeMismatch { .. } => "TypeMismatch",
            RuntimeErrorKind::TypeError { .. } => "TypeError",
            RuntimeErrorKind::ArityMismatch { .. } => "ArityMismatch",
            RuntimeErrorKind::NotReversible { .. } => "NotReversible",
            RuntimeErrorKind::UndefinedContext { .. } => "UndefinedContext",
            RuntimeErrorKind::UndefinedDecorator { .. } => "UndefinedDecorator",
            RuntimeErrorKind::DivisionByZero => "DivisionByZero",
            RuntimeErrorKind::Timeout { .. } => "Timeout",
            RuntimeErrorKind::RetryExhausted { .. } => "RetryExhausted",
            RuntimeErrorKind::ModuleNotFound { .. } => "ModuleNotFound",
            RuntimeErrorKind::CircularImport { .. } => "CircularImport",
            RuntimeErrorKind::StackOverflow { .. } => "StackOverflow",
            RuntimeErrorKind::Custom { .. } => "Custom",
        }
    }
}

/// Anything `run_source` can fail with.
#[derive(Error, Debug, Clone)]
pub enum LangError {
    #[error(transparent)]
    Syntax(#[from] Error),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl LangError {
    pub fn get_position(&self) -> Option<&Position> {
        match self {
            LangError::Syntax(error) => Some(error.get_position()),
            LangError::Runtime(error) => error.position.as_ref(),
        }
    }

    pub fn get_error_name(&self) -> &str {
        match self {
            LangError::Syntax(error) => error.get_error_name(),
            LangError::Runtime(error) => error.get_error_name(),
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match self {
            LangError::Syntax(error) => error.get_tip(),
            LangError::Runtime(error) => ErrorTip::Suggestion(error.kind.to_string()),
        }
    }
}
