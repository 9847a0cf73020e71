//! The pipe family: infix pipes, parallel fan-out, reactive pipes and
//! pipeline literals.

use crate::{
    ast::{
        ast::Expr,
        expressions::{
            BidirectionalPipelineExpr, ParallelPipeExpr, PipeExpr, PipeKind, PipelineExpr,
            PipelineStage, ReactivePipeExpr,
        },
    },
    errors::errors::Error,
    lexer::tokens::TokenKind,
};

use super::{
    expr::parse_expr,
    functions::{parse_optional_signature, parse_trailing_decorators},
    lookups::BindingPower,
    parser::Parser,
};

/// A single stage: a tight unary expression that may not absorb any pipe,
/// not even from inside a function body.
fn parse_stage_expr(parser: &mut Parser) -> Result<Expr, Error> {
    parser.with_pipes(false, false, |parser| parse_expr(parser, BindingPower::Pipe))
}

pub fn parse_pipe_expr(parser: &mut Parser, left: Expr, bp: BindingPower) -> Result<Expr, Error> {
    let operator = parser.advance();
    let kind = match operator.kind {
        TokenKind::ReversePipe => PipeKind::Reverse,
        TokenKind::SpreadPipe => PipeKind::Spread,
        _ => PipeKind::Sequential,
    };

    let right = parse_expr(parser, bp)?;
    let span = left.get_span().to(right.get_span());

    Ok(Expr::Pipe(PipeExpr {
        left: Box::new(left),
        right: Box::new(right),
        kind,
        span,
    }))
}

pub fn parse_parallel_pipe_expr(
    parser: &mut Parser,
    input: Expr,
    _bp: BindingPower,
) -> Result<Expr, Error> {
    let branches = parse_parallel_branches(parser)?;
    let span = parser.span_from(input.get_span());

    Ok(Expr::Parallel(ParallelPipeExpr {
        input: Box::new(input),
        branches,
        span,
    }))
}

/// Collects `\> branch` groups starting at the cursor.
///
/// A branch may continue with nested `/>` or `/>>>` stages only on later
/// lines indented past its own `\>`. Further branches follow on the same
/// line or on a later line at exactly the column of the previous `\>`.
pub fn parse_parallel_branches(parser: &mut Parser) -> Result<Vec<Vec<PipelineStage>>, Error> {
    let mut branches = vec![];

    loop {
        let operator = parser.expect(TokenKind::ParallelPipe)?;
        let column = operator.column();

        let mut stages = vec![PipelineStage::Pipe(parse_stage_expr(parser)?)];

        while parser.current_token_kind() == TokenKind::Newline {
            let next = parser.peek_past_newlines();
            let nested = matches!(next.kind, TokenKind::Pipe | TokenKind::SpreadPipe)
                && next.column() > column;
            if !nested {
                break;
            }
            parser.skip_newlines();
            let kind = parser.advance().kind;
            let expr = parse_stage_expr(parser)?;
            stages.push(match kind {
                TokenKind::SpreadPipe => PipelineStage::Spread(expr),
                _ => PipelineStage::Pipe(expr),
            });
        }
        branches.push(stages);

        match parser.current_token_kind() {
            TokenKind::ParallelPipe => continue,
            TokenKind::Newline => {
                let next = parser.peek_past_newlines();
                if next.kind == TokenKind::ParallelPipe && next.column() == column {
                    parser.skip_newlines();
                    continue;
                }
                break;
            }
            _ => break,
        }
    }

    Ok(branches)
}

pub fn parse_reactive_pipe_expr(
    parser: &mut Parser,
    source: Expr,
    _bp: BindingPower,
) -> Result<Expr, Error> {
    let Some(name) = source.as_symbol().map(String::from) else {
        return Err(parser.unexpected());
    };
    parser.expect(TokenKind::ReactivePipe)?;

    let mut stages = vec![PipelineStage::Pipe(parse_stage_expr(parser)?)];
    while let Some(kind) = next_stage_operator(parser, &[TokenKind::Pipe, TokenKind::SpreadPipe]) {
        parser.skip_newlines();
        parser.advance();
        let expr = parse_stage_expr(parser)?;
        stages.push(match kind {
            TokenKind::SpreadPipe => PipelineStage::Spread(expr),
            _ => PipelineStage::Pipe(expr),
        });
    }

    Ok(Expr::Reactive(ReactivePipeExpr {
        source: name,
        span: parser.span_from(source.get_span()),
        stages,
    }))
}

/// The next stage operator among `kinds`, on this line or starting a later
/// line inside the current block.
fn next_stage_operator(parser: &Parser, kinds: &[TokenKind]) -> Option<TokenKind> {
    let token = parser.current_token();
    if kinds.contains(&token.kind) {
        return Some(token.kind);
    }
    if token.kind == TokenKind::Newline {
        let next = parser.peek_past_newlines();
        if kinds.contains(&next.kind) && parser.within_block(next) {
            return Some(next.kind);
        }
    }
    None
}

/// `/> f /> g />>> h \> a \> b :: (T) -> R #decorators`
pub fn parse_pipeline_literal(parser: &mut Parser) -> Result<Expr, Error> {
    let start = parser.current_token().span.clone();
    let mut stages = vec![];

    while let Some(kind) = next_stage_operator(
        parser,
        &[TokenKind::Pipe, TokenKind::SpreadPipe, TokenKind::ParallelPipe],
    ) {
        parser.skip_newlines();
        match kind {
            TokenKind::ParallelPipe => {
                stages.push(PipelineStage::Parallel(parse_parallel_branches(parser)?))
            }
            TokenKind::SpreadPipe => {
                parser.advance();
                stages.push(PipelineStage::Spread(parse_stage_expr(parser)?));
            }
            _ => {
                parser.advance();
                stages.push(PipelineStage::Pipe(parse_stage_expr(parser)?));
            }
        }
    }

    let signature = parse_optional_signature(parser, false)?;
    let decorators = parse_trailing_decorators(parser, true)?;

    Ok(Expr::Pipeline(PipelineExpr {
        stages,
        signature,
        decorators,
        span: parser.span_from(&start),
    }))
}

/// `</> f </> g`: every stage must be reversible when the pipeline runs backwards.
pub fn parse_bidirectional_literal(parser: &mut Parser) -> Result<Expr, Error> {
    let start = parser.current_token().span.clone();
    let mut stages = vec![];

    while next_stage_operator(parser, &[TokenKind::Bidirectional]).is_some() {
        parser.skip_newlines();
        parser.advance();
        stages.push(parse_stage_expr(parser)?);
    }

    let decorators = parse_trailing_decorators(parser, true)?;

    Ok(Expr::Bidirectional(BidirectionalPipelineExpr {
        stages,
        decorators,
        span: parser.span_from(&start),
    }))
}
