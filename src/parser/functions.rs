//! Function literals and the constructs that trail them.
//!
//! `(` starts a grouping, a tuple or a parameter list. The parser scans to
//! the matching `)` and only commits to a function literal when an arrow
//! follows it.

use crate::{
    ast::{
        ast::Expr,
        expressions::{Decorator, FunctionBody, FunctionExpr, Parameter, TupleExpr},
        statements::Stmt,
        types::TypeSignature,
    },
    errors::errors::Error,
    lexer::tokens::TokenKind,
};

use super::{
    expr::{parse_elements, parse_expr},
    lookups::BindingPower,
    parser::Parser,
    stmt::{expect_statement_end, parse_stmt, PRAGMAS},
    types::{parse_signature, parse_type},
};

pub fn parse_paren_expr(parser: &mut Parser) -> Result<Expr, Error> {
    if is_function_ahead(parser) {
        parse_function_expr(parser)
    } else {
        parse_grouping_or_tuple(parser)
    }
}

/// Whether the `(` under the cursor opens a parameter list.
fn is_function_ahead(parser: &Parser) -> bool {
    let mut depth = 0;
    let mut offset = 0;

    loop {
        match parser.peek(offset).kind {
            TokenKind::OpenParen | TokenKind::OpenBracket | TokenKind::OpenCurly => depth += 1,
            TokenKind::CloseParen | TokenKind::CloseBracket | TokenKind::CloseCurly => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            TokenKind::EOF => return false,
            _ => {}
        }
        offset += 1;
    }

    matches!(
        parser.peek(offset + 1).kind,
        TokenKind::Arrow | TokenKind::ReverseArrow
    )
}

/// `(expr)`, `()` or `(a, b, ...)`. A single element with a trailing comma is a 1-tuple.
pub fn parse_grouping_or_tuple(parser: &mut Parser) -> Result<Expr, Error> {
    let start = parser.expect(TokenKind::OpenParen)?.span;

    let checkpoint = parser.checkpoint();
    parser.skip_newlines();
    if parser.current_token_kind() == TokenKind::CloseParen {
        parser.advance();
        return Ok(Expr::Tuple(TupleExpr {
            elements: vec![],
            span: parser.span_from(&start),
        }));
    }
    parser.restore(checkpoint);

    // A grouping never contains a comma or a spread; scan ahead to decide.
    let grouped = parser.delimited(|parser| {
        parser.skip_newlines();
        if parser.current_token_kind() == TokenKind::Ellipsis {
            return Ok(None);
        }
        let expr = parse_expr(parser, BindingPower::Default)?;
        parser.skip_newlines();
        if parser.current_token_kind() == TokenKind::CloseParen {
            parser.advance();
            Ok(Some(expr))
        } else {
            Ok(None)
        }
    })?;

    if let Some(expr) = grouped {
        return Ok(expr);
    }

    parser.restore(checkpoint);
    let elements = parse_elements(parser, TokenKind::CloseParen)?;
    Ok(Expr::Tuple(TupleExpr {
        elements,
        span: parser.span_from(&start),
    }))
}

pub fn parse_function_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let start = parser.expect(TokenKind::OpenParen)?.span;
    let parameters = parser.delimited(parse_parameters)?;

    let is_reverse = match parser.current_token_kind() {
        TokenKind::Arrow => false,
        TokenKind::ReverseArrow => true,
        _ => return Err(parser.unexpected_detailed("expected `->` or `<-`")),
    };
    parser.advance();

    let (body, indented) = parse_function_body(parser)?;
    let signature = parse_optional_signature(parser, indented)?;
    let decorators = parse_trailing_decorators(parser, true)?;

    Ok(Expr::Function(FunctionExpr {
        parameters,
        body,
        decorators,
        signature,
        is_reverse,
        span: parser.span_from(&start),
    }))
}

fn parse_parameters(parser: &mut Parser) -> Result<Vec<Parameter>, Error> {
    let mut parameters = vec![];
    parser.skip_newlines();

    while parser.current_token_kind() != TokenKind::CloseParen {
        let name = parser.expect(TokenKind::Identifier)?.value;

        let annotation = if parser.current_token_kind() == TokenKind::Colon {
            parser.advance();
            Some(parse_type(parser)?)
        } else {
            None
        };

        let default = if parser.current_token_kind() == TokenKind::Assignment {
            parser.advance();
            Some(parse_expr(parser, BindingPower::Default)?)
        } else {
            None
        };

        parameters.push(Parameter {
            name,
            default,
            annotation,
        });

        parser.skip_newlines();
        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
            parser.skip_newlines();
        } else {
            break;
        }
    }

    parser.expect(TokenKind::CloseParen)?;
    Ok(parameters)
}

/// Returns the body and whether it was an indented block.
fn parse_function_body(parser: &mut Parser) -> Result<(FunctionBody, bool), Error> {
    match parser.current_token_kind() {
        TokenKind::Newline => Ok((FunctionBody::Block(parse_indented_body(parser)?), true)),
        TokenKind::OpenCurly if looks_like_block(parser) => {
            Ok((FunctionBody::Block(parse_braced_body(parser)?), false))
        }
        _ => {
            let expr = parse_expr(parser, BindingPower::Default)?;
            Ok((FunctionBody::Expression(Box::new(expr)), false))
        }
    }
}

/// `{` opens a statement block unless it reads as a record literal:
/// `{}`, `{ key: ...`, `{ key, ...`, `{ "key": ...` or `{ ...spread`.
fn looks_like_block(parser: &mut Parser) -> bool {
    let checkpoint = parser.checkpoint();
    parser.advance();
    parser.skip_newlines();

    let first = parser.current_token_kind();
    let second = parser.peek(1).kind;
    parser.restore(checkpoint);

    match first {
        TokenKind::CloseCurly | TokenKind::Ellipsis => false,
        TokenKind::Identifier => !matches!(
            second,
            TokenKind::Colon | TokenKind::Comma | TokenKind::CloseCurly
        ),
        TokenKind::String => second != TokenKind::Colon,
        _ => true,
    }
}

fn parse_braced_body(parser: &mut Parser) -> Result<Vec<Stmt>, Error> {
    parser.expect(TokenKind::OpenCurly)?;

    parser.delimited(|parser| {
        let mut body = vec![];
        loop {
            parser.skip_separators();
            if parser.current_token_kind() == TokenKind::CloseCurly {
                break;
            }
            body.push(parse_stmt(parser)?);
            expect_statement_end(parser, &[TokenKind::CloseCurly])?;
        }
        parser.expect(TokenKind::CloseCurly)?;
        Ok(body)
    })
}

/// A body starting on the next line. Its first token fixes the block column;
/// the body ends at the first later line that starts left of it, at a
/// decorator, or at end of input. The newline that ends it is left in place
/// so the enclosing statement still sees its terminator.
fn parse_indented_body(parser: &mut Parser) -> Result<Vec<Stmt>, Error> {
    parser.skip_newlines();
    let first = parser.current_token().clone();
    let enclosing = parser.min_column().unwrap_or(1);
    if first.kind == TokenKind::EOF || first.column() <= enclosing {
        return Err(parser.unexpected_detailed("expected an indented function body"));
    }
    let column = first.column();

    parser.indented(column, |parser| {
        let mut body = vec![];

        loop {
            body.push(parse_stmt(parser)?);

            if parser.current_token_kind() == TokenKind::Semicolon {
                parser.advance();
                if !matches!(
                    parser.current_token_kind(),
                    TokenKind::Newline | TokenKind::EOF
                ) {
                    continue;
                }
            }
            if parser.current_token_kind() != TokenKind::Newline {
                break;
            }

            let next = parser.peek_past_newlines();
            let ends_body = next.kind == TokenKind::EOF
                || next.kind == TokenKind::Hash
                || next.column() < column
                || matches!(
                    next.kind,
                    TokenKind::CloseParen
                        | TokenKind::CloseBracket
                        | TokenKind::CloseCurly
                        | TokenKind::Comma
                        | TokenKind::BlockClose
                );
            if ends_body {
                break;
            }
            parser.skip_newlines();
        }

        Ok(body)
    })
}

/// `:: (A, B) -> R`, kept only if it parses; otherwise the cursor is rewound.
pub fn parse_optional_signature(
    parser: &mut Parser,
    allow_next_line: bool,
) -> Result<Option<TypeSignature>, Error> {
    let checkpoint = parser.checkpoint();
    if allow_next_line && parser.peek_past_newlines().kind == TokenKind::DoubleColon {
        parser.skip_newlines();
    }
    if parser.current_token_kind() != TokenKind::DoubleColon {
        parser.restore(checkpoint);
        return Ok(None);
    }
    parser.advance();

    match parse_signature(parser) {
        Ok(signature) => Ok(Some(signature)),
        Err(_) => {
            parser.restore(checkpoint);
            Ok(None)
        }
    }
}

/// `#name` and `#name(args)` after a function, pipeline or binding. When
/// `allow_next_line` is set they may start on the following line, as long as
/// the first one is not a pragma.
pub fn parse_trailing_decorators(
    parser: &mut Parser,
    allow_next_line: bool,
) -> Result<Vec<Decorator>, Error> {
    let checkpoint = parser.checkpoint();
    if allow_next_line && parser.current_token_kind() == TokenKind::Newline {
        parser.skip_newlines();
        let is_decorator = parser.current_token_kind() == TokenKind::Hash
            && parser.within_block(parser.current_token())
            && !PRAGMAS.contains(&parser.peek(1).value.as_str());
        if !is_decorator {
            parser.restore(checkpoint);
            return Ok(vec![]);
        }
    }

    let mut decorators = vec![];
    while parser.current_token_kind() == TokenKind::Hash {
        let start = parser.advance().span;
        let name = parser.expect(TokenKind::Identifier)?.value;

        let arguments = if parser.current_token_kind() == TokenKind::OpenParen {
            parser.advance();
            parse_elements(parser, TokenKind::CloseParen)?
                .into_iter()
                .map(|element| element.value)
                .collect()
        } else {
            vec![]
        };

        decorators.push(Decorator {
            name,
            arguments,
            span: parser.span_from(&start),
        });
    }

    Ok(decorators)
}
