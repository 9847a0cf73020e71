//! Type annotation parsing.
//!
//! Annotations are small enough that each form is a single NUD handler:
//! `Name`, `[T]`, `(T, U)` and `?T`.

use std::collections::HashMap;

use crate::{
    ast::types::{TypeAnnotation, TypeSignature},
    errors::errors::Error,
    lexer::tokens::TokenKind,
};

use super::parser::Parser;

pub type TypeNUDHandler = fn(&mut Parser) -> Result<TypeAnnotation, Error>;

pub type TypeNUDLookup = HashMap<TokenKind, TypeNUDHandler>;

pub fn create_token_type_lookups(parser: &mut Parser) {
    parser.type_nud(TokenKind::Identifier, parse_symbol_type);
    // `Null` is a keyword but also names a type.
    parser.type_nud(TokenKind::Null, parse_symbol_type);
    parser.type_nud(TokenKind::OpenBracket, parse_list_type);
    parser.type_nud(TokenKind::OpenParen, parse_tuple_type);
    parser.type_nud(TokenKind::Question, parse_optional_type);
}

pub fn parse_type(parser: &mut Parser) -> Result<TypeAnnotation, Error> {
    let token_kind = parser.current_token_kind();
    let Some(nud_fn) = parser.get_type_nud_lookup().get(&token_kind).copied() else {
        return Err(parser.unexpected_detailed("expected a type"));
    };
    nud_fn(parser)
}

pub fn parse_symbol_type(parser: &mut Parser) -> Result<TypeAnnotation, Error> {
    let token = parser.advance();
    let name = match token.kind {
        TokenKind::Null => String::from("Null"),
        _ => token.value,
    };
    Ok(TypeAnnotation::Named(name))
}

pub fn parse_list_type(parser: &mut Parser) -> Result<TypeAnnotation, Error> {
    parser.expect(TokenKind::OpenBracket)?;
    let inner = parse_type(parser)?;
    parser.expect(TokenKind::CloseBracket)?;
    Ok(TypeAnnotation::List(Box::new(inner)))
}

pub fn parse_tuple_type(parser: &mut Parser) -> Result<TypeAnnotation, Error> {
    Ok(TypeAnnotation::Tuple(parse_type_list(parser)?))
}

pub fn parse_optional_type(parser: &mut Parser) -> Result<TypeAnnotation, Error> {
    parser.expect(TokenKind::Question)?;
    Ok(TypeAnnotation::Optional(Box::new(parse_type(parser)?)))
}

/// `(A, B, ...)`
fn parse_type_list(parser: &mut Parser) -> Result<Vec<TypeAnnotation>, Error> {
    parser.expect(TokenKind::OpenParen)?;
    let mut items = vec![];

    while parser.current_token_kind() != TokenKind::CloseParen {
        items.push(parse_type(parser)?);
        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else {
            break;
        }
    }

    parser.expect(TokenKind::CloseParen)?;
    Ok(items)
}

/// The part after `::`. A parenthesized list names the parameters; a bare
/// type is a single parameter.
pub fn parse_signature(parser: &mut Parser) -> Result<TypeSignature, Error> {
    let parameters = if parser.current_token_kind() == TokenKind::OpenParen {
        parse_type_list(parser)?
    } else {
        vec![parse_type(parser)?]
    };

    let returns = if parser.current_token_kind() == TokenKind::Arrow {
        parser.advance();
        Some(parse_type(parser)?)
    } else {
        None
    };

    Ok(TypeSignature {
        parameters,
        returns,
    })
}
