//! Expression parsing.
//!
//! `parse_expr` is the Pratt loop; every other function here is a NUD or
//! LED handler registered in `lookups`.

use crate::{
    ast::{
        ast::Expr,
        expressions::{
            Argument, AwaitExpr, BinaryExpr, BinaryOperator, BooleanExpr, CallExpr, ContextExpr,
            Element, IndexExpr, ListExpr, MatchCase, MatchCaseKind, MatchExpr, MemberExpr,
            NullExpr, NumberExpr, PlaceholderExpr, RecordEntry, RecordExpr, ReturnExpr,
            StringExpr, SymbolExpr, TemplateExpr, TemplatePart, TernaryExpr, UnaryExpr,
            UnaryOperator, UseExpr,
        },
    },
    errors::errors::{Error, ErrorImpl},
    lexer::{
        lexer::tokenize,
        tokens::{InterpolationFragment, Literal, Token, TokenKind},
    },
};

use super::{functions::parse_grouping_or_tuple, lookups::BindingPower, parser::Parser};

pub fn parse_expr(parser: &mut Parser, bp: BindingPower) -> Result<Expr, Error> {
    let token_kind = parser.current_token_kind();
    let Some(nud_fn) = parser.get_nud_lookup().get(&token_kind).copied() else {
        return Err(parser.unexpected_detailed("expected an expression"));
    };

    let mut left = nud_fn(parser)?;

    while let Some(kind) = next_operator(parser, &left) {
        let Some(next_bp) = parser.get_bp_lookup().get(&kind).copied() else {
            break;
        };
        if next_bp <= bp {
            break;
        }
        let Some(led_fn) = parser.get_led_lookup().get(&kind).copied() else {
            break;
        };

        // The operator may sit at the start of a following line.
        parser.skip_newlines();
        left = led_fn(parser, left, next_bp)?;
    }

    Ok(left)
}

/// Kind of the operator that would extend `left`, if it is allowed to.
///
/// Pipe-family operators at the start of a later line continue the
/// expression, as long as they stay inside the current indented block.
fn next_operator(parser: &Parser, left: &Expr) -> Option<TokenKind> {
    let token = parser.current_token();
    let kind = if token.kind == TokenKind::Newline {
        let next = parser.peek_past_newlines();
        if !next.kind.is_pipe_operator() || !parser.within_block(next) {
            return None;
        }
        next.kind
    } else {
        token.kind
    };

    let allowed = match kind {
        TokenKind::Pipe | TokenKind::ReversePipe | TokenKind::SpreadPipe => parser.pipes_allowed(),
        TokenKind::ParallelPipe => parser.parallel_allowed(),
        TokenKind::ReactivePipe => parser.pipes_allowed() && matches!(left, Expr::Symbol(_)),
        _ => true,
    };

    allowed.then_some(kind)
}

pub fn parse_primary_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let token = parser.advance();
    let span = token.span.clone();

    match token.kind {
        TokenKind::Number => {
            let value = match token.literal {
                Some(Literal::Number(value)) => value,
                _ => token.value.parse::<f64>().map_err(|_| {
                    Error::new(
                        ErrorImpl::NumberParseError {
                            token: token.value.clone(),
                        },
                        span.start.clone(),
                    )
                })?,
            };
            Ok(Expr::Number(NumberExpr { value, span }))
        }
        TokenKind::String => {
            let value = match token.literal {
                Some(Literal::String(value)) => value,
                _ => token.value.clone(),
            };
            Ok(Expr::String(StringExpr { value, span }))
        }
        TokenKind::True => Ok(Expr::Boolean(BooleanExpr { value: true, span })),
        TokenKind::False => Ok(Expr::Boolean(BooleanExpr { value: false, span })),
        TokenKind::Null => Ok(Expr::Null(NullExpr { span })),
        TokenKind::Input => Ok(Expr::Placeholder(PlaceholderExpr { span })),
        TokenKind::Identifier => Ok(Expr::Symbol(SymbolExpr {
            value: token.value,
            span,
        })),
        kind => Err(Error::new(
            ErrorImpl::UnexpectedToken {
                token: token.value,
                kind,
            },
            span.start,
        )),
    }
}

/// Template strings hold the raw source of each `${...}` hole; each one is
/// tokenized and parsed as a standalone expression.
pub fn parse_template_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let token = parser.advance();
    let fragments = match &token.literal {
        Some(Literal::Interpolated(fragments)) => fragments.clone(),
        _ => vec![InterpolationFragment::Text(token.value.clone())],
    };

    let mut parts = vec![];
    for fragment in fragments {
        match fragment {
            InterpolationFragment::Text(text) => parts.push(TemplatePart::Text(text)),
            InterpolationFragment::Source(source) => {
                let expr = parse_interpolation(&source, &token, parser)?;
                parts.push(TemplatePart::Expr(expr));
            }
        }
    }

    Ok(Expr::Template(TemplateExpr {
        parts,
        span: token.span,
    }))
}

fn parse_interpolation(source: &str, token: &Token, parser: &Parser) -> Result<Expr, Error> {
    let invalid = |error: Error| {
        Error::new(
            ErrorImpl::InvalidInterpolation {
                source_text: source.to_string(),
                message: error.get_internal_error().to_string(),
            },
            token.span.start.clone(),
        )
    };

    let tokens =
        tokenize(source.to_string(), Some(parser.get_file().to_string())).map_err(invalid)?;
    let mut inner = Parser::with_lookups(tokens, parser.get_file());
    inner.skip_newlines();
    let expr = parse_expr(&mut inner, BindingPower::Default).map_err(invalid)?;
    inner.skip_newlines();
    if inner.has_tokens() {
        return Err(invalid(inner.unexpected()));
    }
    Ok(expr)
}

pub fn parse_context_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let start = parser.expect(TokenKind::At)?.span;
    let name = parser.expect(TokenKind::Identifier)?.value;
    Ok(Expr::Context(ContextExpr {
        name,
        span: parser.span_from(&start),
    }))
}

pub fn parse_prefix_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let operator_token = parser.advance();
    let operator = match operator_token.kind {
        TokenKind::Dash => UnaryOperator::Negate,
        _ => UnaryOperator::Not,
    };
    let operand = parse_expr(parser, BindingPower::Unary)?;
    let span = operator_token.span.to(operand.get_span());

    Ok(Expr::Unary(UnaryExpr {
        operator,
        operand: Box::new(operand),
        span,
    }))
}

pub fn parse_await_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let start = parser.expect(TokenKind::Await)?.span;
    let operand = parse_expr(parser, BindingPower::Unary)?;
    let span = start.to(operand.get_span());
    Ok(Expr::Await(AwaitExpr {
        operand: Box::new(operand),
        span,
    }))
}

pub fn parse_return_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let start = parser.expect(TokenKind::Return)?.span;
    let bare = matches!(
        parser.current_token_kind(),
        TokenKind::Newline
            | TokenKind::Semicolon
            | TokenKind::EOF
            | TokenKind::CloseCurly
            | TokenKind::CloseParen
            | TokenKind::BlockClose
    );

    let value = if bare {
        None
    } else {
        Some(Box::new(parse_expr(parser, BindingPower::Default)?))
    };

    Ok(Expr::Return(ReturnExpr {
        value,
        span: parser.span_from(&start),
    }))
}

pub fn parse_binary_expr(
    parser: &mut Parser,
    left: Expr,
    bp: BindingPower,
) -> Result<Expr, Error> {
    let operator_token = parser.advance();
    let operator = match operator_token.kind {
        TokenKind::Plus => BinaryOperator::Add,
        TokenKind::Dash => BinaryOperator::Subtract,
        TokenKind::Star => BinaryOperator::Multiply,
        TokenKind::Slash => BinaryOperator::Divide,
        TokenKind::Percent => BinaryOperator::Modulo,
        TokenKind::PlusPlus => BinaryOperator::Concat,
        TokenKind::Equals => BinaryOperator::Equal,
        TokenKind::NotEquals => BinaryOperator::NotEqual,
        TokenKind::Less => BinaryOperator::Less,
        TokenKind::LessEquals => BinaryOperator::LessEqual,
        TokenKind::Greater => BinaryOperator::Greater,
        TokenKind::GreaterEquals => BinaryOperator::GreaterEqual,
        TokenKind::AndAnd => BinaryOperator::And,
        TokenKind::Or => BinaryOperator::Or,
        kind => {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken {
                    token: operator_token.value,
                    kind,
                },
                operator_token.span.start,
            ))
        }
    };

    let right = parse_expr(parser, bp)?;
    let span = left.get_span().to(right.get_span());

    Ok(Expr::Binary(BinaryExpr {
        left: Box::new(left),
        operator,
        right: Box::new(right),
        span,
    }))
}

pub fn parse_ternary_expr(
    parser: &mut Parser,
    condition: Expr,
    _bp: BindingPower,
) -> Result<Expr, Error> {
    parser.expect(TokenKind::Question)?;
    let then_branch = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::Colon)?;
    let else_branch = parse_expr(parser, BindingPower::Default)?;
    let span = condition.get_span().to(else_branch.get_span());

    Ok(Expr::Ternary(TernaryExpr {
        condition: Box::new(condition),
        then_branch: Box::new(then_branch),
        else_branch: Box::new(else_branch),
        span,
    }))
}

/// Comma separated `...`-able expressions up to `closing`, which is consumed.
pub fn parse_elements(parser: &mut Parser, closing: TokenKind) -> Result<Vec<Element>, Error> {
    parser.delimited(|parser| {
        let mut elements = vec![];
        parser.skip_newlines();

        while parser.current_token_kind() != closing {
            let spread = parser.current_token_kind() == TokenKind::Ellipsis;
            if spread {
                parser.advance();
            }
            let value = parse_expr(parser, BindingPower::Default)?;
            elements.push(Element { value, spread });

            parser.skip_newlines();
            if parser.current_token_kind() == TokenKind::Comma {
                parser.advance();
                parser.skip_newlines();
            } else {
                break;
            }
        }

        parser.expect(closing)?;
        Ok(elements)
    })
}

pub fn parse_call_expr(
    parser: &mut Parser,
    callee: Expr,
    _bp: BindingPower,
) -> Result<Expr, Error> {
    parser.expect(TokenKind::OpenParen)?;
    let arguments = parse_elements(parser, TokenKind::CloseParen)?
        .into_iter()
        .map(|element| Argument {
            value: element.value,
            spread: element.spread,
        })
        .collect();

    let span = parser.span_from(callee.get_span());
    Ok(Expr::Call(CallExpr {
        callee: Box::new(callee),
        arguments,
        span,
    }))
}

pub fn parse_index_expr(
    parser: &mut Parser,
    object: Expr,
    _bp: BindingPower,
) -> Result<Expr, Error> {
    parser.expect(TokenKind::OpenBracket)?;
    let index = parser.delimited(|parser| {
        parser.skip_newlines();
        let index = parse_expr(parser, BindingPower::Default)?;
        parser.skip_newlines();
        parser.expect(TokenKind::CloseBracket)?;
        Ok(index)
    })?;

    let span = parser.span_from(object.get_span());
    Ok(Expr::Index(IndexExpr {
        object: Box::new(object),
        index: Box::new(index),
        span,
    }))
}

pub fn parse_member_expr(
    parser: &mut Parser,
    object: Expr,
    _bp: BindingPower,
) -> Result<Expr, Error> {
    parser.expect(TokenKind::Dot)?;
    let property = parser.expect(TokenKind::Identifier)?.value;

    let span = parser.span_from(object.get_span());
    Ok(Expr::Member(MemberExpr {
        object: Box::new(object),
        property,
        span,
    }))
}

pub fn parse_list_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let start = parser.expect(TokenKind::OpenBracket)?.span;
    let elements = parse_elements(parser, TokenKind::CloseBracket)?;

    Ok(Expr::List(ListExpr {
        elements,
        span: parser.span_from(&start),
    }))
}

pub fn parse_record_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let start = parser.expect(TokenKind::OpenCurly)?.span;

    let entries = parser.delimited(|parser| {
        let mut entries = vec![];
        parser.skip_newlines();

        while parser.current_token_kind() != TokenKind::CloseCurly {
            if parser.current_token_kind() == TokenKind::Ellipsis {
                parser.advance();
                entries.push(RecordEntry::Spread(parse_expr(
                    parser,
                    BindingPower::Default,
                )?));
            } else {
                let key_token = parser.current_token().clone();
                let key = match (&key_token.kind, &key_token.literal) {
                    (TokenKind::Identifier, _) => key_token.value.clone(),
                    (TokenKind::String, Some(Literal::String(value))) => value.clone(),
                    _ => return Err(parser.unexpected_detailed("expected a record key")),
                };
                parser.advance();

                let value = if parser.current_token_kind() == TokenKind::Colon {
                    parser.advance();
                    parser.skip_newlines();
                    parse_expr(parser, BindingPower::Default)?
                } else {
                    // `{ name }` is shorthand for `{ name: name }`
                    Expr::Symbol(SymbolExpr {
                        value: key.clone(),
                        span: key_token.span.clone(),
                    })
                };
                entries.push(RecordEntry::Field { key, value });
            }

            parser.skip_newlines();
            if parser.current_token_kind() == TokenKind::Comma {
                parser.advance();
                parser.skip_newlines();
            }
        }

        parser.expect(TokenKind::CloseCurly)?;
        Ok(entries)
    })?;

    Ok(Expr::Record(RecordExpr {
        entries,
        span: parser.span_from(&start),
    }))
}

pub fn parse_match_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let start = parser.expect(TokenKind::Match)?.span;
    let scrutinee = parse_expr(parser, BindingPower::Default)?;
    let mut cases = vec![];

    loop {
        let checkpoint = parser.checkpoint();
        parser.skip_newlines();
        let token = parser.current_token();
        if token.kind != TokenKind::Bar || !parser.within_block(token) {
            parser.restore(checkpoint);
            break;
        }
        cases.push(parse_match_case(parser)?);
    }

    Ok(Expr::Match(MatchExpr {
        scrutinee: Box::new(scrutinee),
        cases,
        span: parser.span_from(&start),
    }))
}

fn parse_match_case(parser: &mut Parser) -> Result<MatchCase, Error> {
    let start = parser.expect(TokenKind::Bar)?.span;

    if parser.current_token_kind() == TokenKind::If {
        parser.advance();
        let guard = parse_expr(parser, BindingPower::Default)?;
        parser.expect(TokenKind::Arrow)?;
        let body = parse_expr(parser, BindingPower::Default)?;
        return Ok(MatchCase {
            kind: MatchCaseKind::Guard(guard),
            body,
            span: parser.span_from(&start),
        });
    }

    // `(1, 2) -> ...` is a tuple pattern, never a function literal.
    let expr = if parser.current_token_kind() == TokenKind::OpenParen {
        parse_grouping_or_tuple(parser)?
    } else {
        parse_expr(parser, BindingPower::Default)?
    };
    if parser.current_token_kind() == TokenKind::Arrow {
        parser.advance();
        let body = parse_expr(parser, BindingPower::Default)?;
        Ok(MatchCase {
            kind: MatchCaseKind::Pattern(expr),
            body,
            span: parser.span_from(&start),
        })
    } else {
        Ok(MatchCase {
            kind: MatchCaseKind::Default,
            body: expr,
            span: parser.span_from(&start),
        })
    }
}

pub fn parse_use_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let start = parser.expect(TokenKind::Use)?.span;
    let path_token = parser.expect(TokenKind::String)?;
    let path = match path_token.literal {
        Some(Literal::String(path)) => path,
        _ => path_token.value,
    };

    Ok(Expr::Use(UseExpr {
        path,
        span: parser.span_from(&start),
    }))
}
