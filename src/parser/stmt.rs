use crate::{
    ast::{
        ast::Expr,
        statements::{
            AndStmt, AssignStmt, BindingTarget, ContextDefStmt, DecoratorDefStmt, ExpressionStmt,
            LabeledBlockStmt, LetStmt, PragmaStmt, ProvideStmt, Stmt,
        },
    },
    errors::errors::Error,
    lexer::tokens::{Literal, TokenKind},
    parser::{expr::parse_expr, lookups::BindingPower},
};

use super::{functions::parse_trailing_decorators, parser::Parser};

/// `#name` at statement position is a pragma for these names, a decorator otherwise.
pub const PRAGMAS: &[&str] = &["strict"];

pub fn parse_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    if let Some(stmt_fn) = parser
        .get_stmt_lookup()
        .get(&parser.current_token_kind())
        .copied()
    {
        return stmt_fn(parser);
    }

    if parser.current_token_kind() == TokenKind::Identifier
        && parser.peek(1).kind == TokenKind::Walrus
    {
        return parse_assign_stmt(parser);
    }

    let expression = parse_expr(parser, BindingPower::Default)?;
    Ok(Stmt::Expression(ExpressionStmt {
        span: expression.get_span().clone(),
        expression,
    }))
}

/// A statement ends at a newline, `;`, end of input or one of `closers`.
pub fn expect_statement_end(parser: &mut Parser, closers: &[TokenKind]) -> Result<(), Error> {
    let kind = parser.current_token_kind();
    match kind {
        TokenKind::Newline | TokenKind::Semicolon | TokenKind::EOF => Ok(()),
        _ if closers.contains(&kind) => Ok(()),
        _ => Err(parser.unexpected()),
    }
}

/// The value after `=`, which may start on the next line.
fn parse_value(parser: &mut Parser) -> Result<Expr, Error> {
    parser.expect(TokenKind::Assignment)?;
    parser.skip_newlines();
    parse_expr(parser, BindingPower::Default)
}

pub fn parse_binding_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start_token = parser.advance();
    let mutable = start_token.kind == TokenKind::Maybe;

    let target = parse_binding_target(parser)?;
    let value = parse_value(parser)?;
    let decorators = parse_trailing_decorators(parser, false)?;

    Ok(Stmt::Let(LetStmt {
        target,
        mutable,
        value,
        decorators,
        span: parser.span_from(&start_token.span),
    }))
}

fn parse_binding_target(parser: &mut Parser) -> Result<BindingTarget, Error> {
    let closing = match parser.current_token_kind() {
        TokenKind::Identifier => {
            return Ok(BindingTarget::Name(parser.advance().value));
        }
        TokenKind::OpenCurly => TokenKind::CloseCurly,
        TokenKind::OpenBracket => TokenKind::CloseBracket,
        TokenKind::OpenParen => TokenKind::CloseParen,
        _ => return Err(parser.unexpected_detailed("expected a binding name or pattern")),
    };
    let opening = parser.advance().kind;

    let mut names = vec![];
    while parser.current_token_kind() != closing {
        names.push(parser.expect(TokenKind::Identifier)?.value);
        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else {
            break;
        }
    }
    parser.expect(closing)?;

    Ok(match opening {
        TokenKind::OpenCurly => BindingTarget::Record(names),
        TokenKind::OpenBracket => BindingTarget::List(names),
        _ => BindingTarget::Tuple(names),
    })
}

pub fn parse_and_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.expect(TokenKind::And)?.span;
    let name = parser.expect(TokenKind::Identifier)?.value;
    let value = parse_value(parser)?;

    Ok(Stmt::And(AndStmt {
        name,
        value,
        span: parser.span_from(&start),
    }))
}

pub fn parse_assign_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let name_token = parser.expect(TokenKind::Identifier)?;
    parser.expect(TokenKind::Walrus)?;
    parser.skip_newlines();
    let value = parse_expr(parser, BindingPower::Default)?;

    Ok(Stmt::Assign(AssignStmt {
        name: name_token.value,
        value,
        span: parser.span_from(&name_token.span),
    }))
}

pub fn parse_context_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.expect(TokenKind::Context)?.span;
    let name = parser.expect(TokenKind::Identifier)?.value;
    let value = parse_value(parser)?;

    Ok(Stmt::Context(ContextDefStmt {
        name,
        value,
        span: parser.span_from(&start),
    }))
}

pub fn parse_provide_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.expect(TokenKind::Provide)?.span;
    let name = parser.expect(TokenKind::Identifier)?.value;
    let value = parse_expr(parser, BindingPower::Default)?;

    Ok(Stmt::Provide(ProvideStmt {
        name,
        value,
        span: parser.span_from(&start),
    }))
}

pub fn parse_decorator_def_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.expect(TokenKind::Decorator)?.span;
    let name = parser.expect(TokenKind::Identifier)?.value;
    let value = parse_value(parser)?;

    Ok(Stmt::Decorator(DecoratorDefStmt {
        name,
        value,
        span: parser.span_from(&start),
    }))
}

pub fn parse_labeled_block_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let open = parser.expect(TokenKind::BlockOpen)?;
    let label = match open.literal {
        Some(Literal::String(label)) => label,
        _ => open.value,
    };

    let mut body = vec![];
    loop {
        parser.skip_separators();
        match parser.current_token_kind() {
            TokenKind::BlockClose => break,
            TokenKind::EOF => {
                return Err(parser.unexpected_detailed("unterminated labeled block"))
            }
            _ => {}
        }
        body.push(parse_stmt(parser)?);
        expect_statement_end(parser, &[TokenKind::BlockClose])?;
    }
    parser.expect(TokenKind::BlockClose)?;

    Ok(Stmt::Block(LabeledBlockStmt {
        label,
        body,
        span: parser.span_from(&open.span),
    }))
}

pub fn parse_pragma_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.expect(TokenKind::Hash)?.span;
    if !PRAGMAS.contains(&parser.current_token().value.as_str()) {
        return Err(parser.unexpected_detailed("unknown pragma"));
    }
    let name = parser.expect(TokenKind::Identifier)?.value;

    Ok(Stmt::Pragma(PragmaStmt {
        name,
        span: parser.span_from(&start),
    }))
}
