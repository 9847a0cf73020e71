//! Unit tests for error handling.
//!
//! This module contains tests for error types and error reporting.

use crate::errors::errors::{Error, ErrorImpl, ErrorTip, LangError, RuntimeError, RuntimeErrorKind};
use crate::lexer::tokens::TokenKind;
use crate::Position;
use std::rc::Rc;

fn position(line: u32, column: u32) -> Position {
    Position::new(line, column, Rc::new("test.pipe".to_string()))
}

#[test]
fn test_error_creation() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "$".to_string(),
        },
        position(1, 10),
    );

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(error.get_position().column, 10);
}

#[test]
fn test_unexpected_token_carries_kind_and_text() {
    let error = Error::new(
        ErrorImpl::UnexpectedToken {
            token: ")".to_string(),
            kind: TokenKind::CloseParen,
        },
        position(3, 7),
    );

    assert_eq!(error.get_error_name(), "UnexpectedToken");
    assert_eq!(error.to_string(), "test.pipe:3:7: unexpected token CloseParen: \")\"");
}

#[test]
fn test_error_tip_none() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "$".to_string(),
        },
        position(1, 1),
    );

    assert!(matches!(error.get_tip(), ErrorTip::None));
}

#[test]
fn test_error_tip_suggestion() {
    let error = Error::new(
        ErrorImpl::UnterminatedString {
            token: "\"abc".to_string(),
        },
        position(1, 1),
    );

    match error.get_tip() {
        ErrorTip::Suggestion(_) => (),
        _ => panic!("Expected suggestion tip"),
    }
}

#[test]
fn test_error_tip_display() {
    let tip = ErrorTip::Suggestion("Try this instead".to_string());
    assert_eq!(tip.to_string(), "Try this instead");

    let tip = ErrorTip::None;
    assert_eq!(tip.to_string(), "");
}

#[test]
fn test_runtime_error_without_position() {
    let error = RuntimeError::new(RuntimeErrorKind::UndefinedBinding {
        name: "x".to_string(),
    });

    assert_eq!(error.get_error_name(), "UndefinedBinding");
    assert_eq!(error.to_string(), "undefined binding `x`");
}

#[test]
fn test_runtime_error_location_prefix() {
    let error = RuntimeError::new(RuntimeErrorKind::DivisionByZero).at(&position(2, 5));
    assert_eq!(error.to_string(), "test.pipe:2:5: division by zero");
}

#[test]
fn test_runtime_error_keeps_innermost_position() {
    let error = RuntimeError::new(RuntimeErrorKind::DivisionByZero)
        .at(&position(2, 5))
        .at(&position(1, 1));

    assert_eq!(error.position.unwrap().line, 2);
}

#[test]
fn test_type_mismatch_names_both_types() {
    let error = RuntimeError::new(RuntimeErrorKind::TypeMismatch {
        context: "argument 1 of `inc`".to_string(),
        expected: "Int".to_string(),
        actual: "String".to_string(),
    });

    let message = error.to_string();
    assert!(message.contains("expected Int"));
    assert!(message.contains("got String"));
}

#[test]
fn test_lang_error_wraps_both_kinds() {
    let syntax: LangError = Error::new(
        ErrorImpl::NumberParseError {
            token: "1.2.3".to_string(),
        },
        position(4, 2),
    )
    .into();
    assert_eq!(syntax.get_error_name(), "NumberParseError");
    assert_eq!(syntax.get_position().unwrap().line, 4);

    let runtime: LangError = RuntimeError::new(RuntimeErrorKind::Custom {
        message: "boom".to_string(),
    })
    .into();
    assert_eq!(runtime.get_error_name(), "Custom");
    assert!(runtime.get_position().is_none());
    assert_eq!(runtime.to_string(), "boom");
}
