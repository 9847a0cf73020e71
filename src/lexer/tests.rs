//! Unit tests for the lexer module.
//!
//! This module contains tests for tokenization including:
//! - Keywords and identifiers
//! - Numeric, string and template literals
//! - The pipe operator family
//! - Newlines, comments and positions
//! - Error cases

use super::{
    lexer::tokenize,
    tokens::{InterpolationFragment, Literal, TokenKind},
};

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source.to_string(), Some("test.pipe".to_string()))
        .unwrap()
        .iter()
        .map(|token| token.kind)
        .collect()
}

#[test]
fn test_tokenize_keywords() {
    let source = "let maybe and match if await return context provide decorator use true false null input";

    assert_eq!(
        kinds(source),
        vec![
            TokenKind::Let,
            TokenKind::Maybe,
            TokenKind::And,
            TokenKind::Match,
            TokenKind::If,
            TokenKind::Await,
            TokenKind::Return,
            TokenKind::Context,
            TokenKind::Provide,
            TokenKind::Decorator,
            TokenKind::Use,
            TokenKind::True,
            TokenKind::False,
            TokenKind::Null,
            TokenKind::Input,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_identifiers() {
    let source = "foo bar baz_123 _underscore CamelCase".to_string();
    let tokens = tokenize(source, Some("test.pipe".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[0].value, "foo");
    assert_eq!(tokens[2].value, "baz_123");
    assert_eq!(tokens[3].value, "_underscore");
    assert_eq!(tokens[4].value, "CamelCase");
    assert_eq!(tokens[5].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_numbers() {
    let source = "42 3.14 0".to_string();
    let tokens = tokenize(source, Some("test.pipe".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Number);
    assert_eq!(tokens[0].literal, Some(Literal::Number(42.0)));
    assert_eq!(tokens[1].value, "3.14");
    assert_eq!(tokens[1].literal, Some(Literal::Number(3.14)));
    assert_eq!(tokens[2].literal, Some(Literal::Number(0.0)));
}

#[test]
fn test_tokenize_string_escapes() {
    let source = r#""hello\nworld" "quote\"test" "hex\x41""#.to_string();
    let tokens = tokenize(source, Some("test.pipe".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].value, r#""hello\nworld""#);
    assert_eq!(tokens[0].literal, Some(Literal::String("hello\nworld".to_string())));
    assert_eq!(tokens[1].literal, Some(Literal::String("quote\"test".to_string())));
    assert_eq!(tokens[2].literal, Some(Literal::String("hexA".to_string())));
}

#[test]
fn test_tokenize_template_string() {
    let source = "`Hello ${name}, you are ${age + 1}!`".to_string();
    let tokens = tokenize(source, Some("test.pipe".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Template);
    assert_eq!(
        tokens[0].literal,
        Some(Literal::Interpolated(vec![
            InterpolationFragment::Text("Hello ".to_string()),
            InterpolationFragment::Source("name".to_string()),
            InterpolationFragment::Text(", you are ".to_string()),
            InterpolationFragment::Source("age + 1".to_string()),
            InterpolationFragment::Text("!".to_string()),
        ]))
    );
}

#[test]
fn test_tokenize_pipe_family() {
    assert_eq!(
        kinds("/> />>> </ </> \\> @> -> <-"),
        vec![
            TokenKind::Pipe,
            TokenKind::SpreadPipe,
            TokenKind::ReversePipe,
            TokenKind::Bidirectional,
            TokenKind::ParallelPipe,
            TokenKind::ReactivePipe,
            TokenKind::Arrow,
            TokenKind::ReverseArrow,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_operators() {
    assert_eq!(
        kinds("+ - * / % == != < > <= >= = && || ++ := :: ! ?"),
        vec![
            TokenKind::Plus,
            TokenKind::Dash,
            TokenKind::Star,
            TokenKind::Slash,
            TokenKind::Percent,
            TokenKind::Equals,
            TokenKind::NotEquals,
            TokenKind::Less,
            TokenKind::Greater,
            TokenKind::LessEquals,
            TokenKind::GreaterEquals,
            TokenKind::Assignment,
            TokenKind::AndAnd,
            TokenKind::Or,
            TokenKind::PlusPlus,
            TokenKind::Walrus,
            TokenKind::DoubleColon,
            TokenKind::Not,
            TokenKind::Question,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_punctuation() {
    assert_eq!(
        kinds("( ) { } [ ] . , ; : ... | # @"),
        vec![
            TokenKind::OpenParen,
            TokenKind::CloseParen,
            TokenKind::OpenCurly,
            TokenKind::CloseCurly,
            TokenKind::OpenBracket,
            TokenKind::CloseBracket,
            TokenKind::Dot,
            TokenKind::Comma,
            TokenKind::Semicolon,
            TokenKind::Colon,
            TokenKind::Ellipsis,
            TokenKind::Bar,
            TokenKind::Hash,
            TokenKind::At,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_comments_and_newlines() {
    let source = "let x = 5 -- this is a comment\nlet y = 10".to_string();
    let tokens = tokenize(source, Some("test.pipe".to_string())).unwrap();

    assert_eq!(tokens[3].kind, TokenKind::Number);
    assert_eq!(tokens[4].kind, TokenKind::Newline);
    assert_eq!(tokens[5].kind, TokenKind::Let);
    assert_eq!(tokens[6].value, "y");
}

#[test]
fn test_tokenize_labeled_block_markers() {
    let source = "{-- Setup --}\nlet x = 1\n{/--}".to_string();
    let tokens = tokenize(source, Some("test.pipe".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::BlockOpen);
    assert_eq!(tokens[0].value, "Setup");
    assert_eq!(tokens[tokens.len() - 2].kind, TokenKind::BlockClose);
}

#[test]
fn test_tokenize_positions() {
    let source = "let x = 1\n  x /> double".to_string();
    let tokens = tokenize(source, Some("test.pipe".to_string())).unwrap();

    assert_eq!((tokens[0].line(), tokens[0].column()), (1, 1));
    assert_eq!((tokens[1].line(), tokens[1].column()), (1, 5));
    // x on the second line, after two spaces
    assert_eq!((tokens[5].line(), tokens[5].column()), (2, 3));
    assert_eq!(tokens[6].kind, TokenKind::Pipe);
    assert_eq!(tokens[6].column(), 5);
}

#[test]
fn test_tokenize_unrecognised_character() {
    let result = tokenize("let x = $".to_string(), Some("test.pipe".to_string()));
    let error = result.unwrap_err();

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(error.get_position().column, 9);
}

#[test]
fn test_tokenize_unterminated_string() {
    let result = tokenize("\"abc".to_string(), Some("test.pipe".to_string()));
    assert_eq!(result.unwrap_err().get_error_name(), "UnterminatedString");
}
