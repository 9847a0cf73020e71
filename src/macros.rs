//! Utility macros for the lexer and the interpreter.
//!
//! - `MK_TOKEN!` - Creates a Token instance
//! - `MK_DEFAULT_HANDLER!` - Creates a default lexer handler for fixed tokens
//! - `MK_BUILTIN!` - Binds a native function in an environment
//!
//! These macros reduce boilerplate in the lexer and builtin tables.

/// Creates a Token instance without a decoded literal.
///
/// # Arguments
///
/// * `$kind` - The TokenKind
/// * `$value` - The token's raw text
/// * `$span` - The source span
///
/// # Example
///
/// ```ignore
/// let token = MK_TOKEN!(TokenKind::Identifier, "total".to_string(), span);
/// ```
#[macro_export]
macro_rules! MK_TOKEN {
    ($kind:expr, $value:expr, $span:expr) => {
        Token {
            kind: $kind,
            value: $value,
            literal: None,
            span: $span,
        }
    };
    ($kind:expr, $value:expr, $literal:expr, $span:expr) => {
        Token {
            kind: $kind,
            value: $value,
            literal: Some($literal),
            span: $span,
        }
    };
}

/// Creates a default lexer handler for fixed-text tokens.
///
/// Generates a handler function that pushes a token with the given kind
/// and advances the lexer past the token's text.
///
/// # Example
///
/// ```ignore
/// RegexPattern {
///     regex: Regex::new("^/>").unwrap(),
///     handler: MK_DEFAULT_HANDLER!(TokenKind::Pipe, "/>"),
/// }
/// ```
#[macro_export]
macro_rules! MK_DEFAULT_HANDLER {
    ($kind:expr, $value:literal) => {
        |lexer: &mut Lexer, _regex: &Regex| -> Result<(), Error> {
            let span = lexer.span_for($value.len());
            lexer.push(MK_TOKEN!($kind, String::from($value), span));
            lexer.advance_n($value.len());
            Ok(())
        }
    };
}

/// Binds a native function under its language name.
///
/// # Example
///
/// ```ignore
/// MK_BUILTIN!(env, "print", print);
/// ```
#[macro_export]
macro_rules! MK_BUILTIN {
    ($env:expr, $name:literal, $function:expr) => {
        $env.declare_variable(
            $name,
            Value::Builtin(Rc::new(Builtin {
                name: $name,
                function: $function,
            })),
            false,
        )
    };
}
