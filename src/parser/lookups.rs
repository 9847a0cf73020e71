use std::collections::HashMap;

use crate::{
    ast::{ast::Expr, statements::Stmt},
    errors::errors::Error,
    lexer::tokens::TokenKind,
};

use super::{expr::*, functions::parse_paren_expr, parser::Parser, pipes::*, stmt::*};

/// Precedence ladder, lowest first.
///
/// The pipe family sits above multiplicative operators, so `a /> b + c`
/// groups as `(a /> b) + c`.
#[derive(PartialEq, PartialOrd, Clone, Copy, Debug)]
pub enum BindingPower {
    Default,
    Ternary,
    LogicalOr,
    LogicalAnd,
    Equality,
    Relational,
    Additive,
    Multiplicative,
    Pipe,
    Unary,
    Call,
    Member,
    Primary,
}

pub type StmtHandler = fn(&mut Parser) -> Result<Stmt, Error>;
pub type NUDHandler = fn(&mut Parser) -> Result<Expr, Error>;
pub type LEDHandler = fn(&mut Parser, Expr, BindingPower) -> Result<Expr, Error>;

pub fn create_token_lookups(parser: &mut Parser) {
    parser.led(TokenKind::Question, BindingPower::Ternary, parse_ternary_expr);

    // Logical
    parser.led(TokenKind::Or, BindingPower::LogicalOr, parse_binary_expr);
    parser.led(TokenKind::AndAnd, BindingPower::LogicalAnd, parse_binary_expr);

    // Equality and relational
    parser.led(TokenKind::Equals, BindingPower::Equality, parse_binary_expr);
    parser.led(TokenKind::NotEquals, BindingPower::Equality, parse_binary_expr);
    parser.led(TokenKind::Less, BindingPower::Relational, parse_binary_expr);
    parser.led(TokenKind::LessEquals, BindingPower::Relational, parse_binary_expr);
    parser.led(TokenKind::Greater, BindingPower::Relational, parse_binary_expr);
    parser.led(TokenKind::GreaterEquals, BindingPower::Relational, parse_binary_expr);

    // Additive and multiplicative
    parser.led(TokenKind::Plus, BindingPower::Additive, parse_binary_expr);
    parser.led(TokenKind::Dash, BindingPower::Additive, parse_binary_expr);
    parser.led(TokenKind::PlusPlus, BindingPower::Additive, parse_binary_expr);
    parser.led(TokenKind::Star, BindingPower::Multiplicative, parse_binary_expr);
    parser.led(TokenKind::Slash, BindingPower::Multiplicative, parse_binary_expr);
    parser.led(TokenKind::Percent, BindingPower::Multiplicative, parse_binary_expr);

    // Pipe family
    parser.led(TokenKind::Pipe, BindingPower::Pipe, parse_pipe_expr);
    parser.led(TokenKind::ReversePipe, BindingPower::Pipe, parse_pipe_expr);
    parser.led(TokenKind::SpreadPipe, BindingPower::Pipe, parse_pipe_expr);
    parser.led(TokenKind::ParallelPipe, BindingPower::Pipe, parse_parallel_pipe_expr);
    parser.led(TokenKind::ReactivePipe, BindingPower::Pipe, parse_reactive_pipe_expr);

    // Postfix
    parser.led(TokenKind::OpenParen, BindingPower::Call, parse_call_expr);
    parser.led(TokenKind::OpenBracket, BindingPower::Member, parse_index_expr);
    parser.led(TokenKind::Dot, BindingPower::Member, parse_member_expr);

    // Literals and symbols
    parser.nud(TokenKind::Number, parse_primary_expr);
    parser.nud(TokenKind::String, parse_primary_expr);
    parser.nud(TokenKind::True, parse_primary_expr);
    parser.nud(TokenKind::False, parse_primary_expr);
    parser.nud(TokenKind::Null, parse_primary_expr);
    parser.nud(TokenKind::Identifier, parse_primary_expr);
    parser.nud(TokenKind::Input, parse_primary_expr);
    parser.nud(TokenKind::Template, parse_template_expr);
    parser.nud(TokenKind::At, parse_context_expr);
    parser.nud(TokenKind::OpenParen, parse_paren_expr);
    parser.nud(TokenKind::OpenBracket, parse_list_expr);
    parser.nud(TokenKind::OpenCurly, parse_record_expr);

    // Prefix
    parser.nud(TokenKind::Dash, parse_prefix_expr);
    parser.nud(TokenKind::Not, parse_prefix_expr);
    parser.nud(TokenKind::Await, parse_await_expr);
    parser.nud(TokenKind::Return, parse_return_expr);
    parser.nud(TokenKind::Match, parse_match_expr);
    parser.nud(TokenKind::Use, parse_use_expr);

    // Pipeline literals
    parser.nud(TokenKind::Pipe, parse_pipeline_literal);
    parser.nud(TokenKind::SpreadPipe, parse_pipeline_literal);
    parser.nud(TokenKind::ParallelPipe, parse_pipeline_literal);
    parser.nud(TokenKind::Bidirectional, parse_bidirectional_literal);

    // Statements
    parser.stmt(TokenKind::Let, parse_binding_stmt);
    parser.stmt(TokenKind::Maybe, parse_binding_stmt);
    parser.stmt(TokenKind::And, parse_and_stmt);
    parser.stmt(TokenKind::Context, parse_context_stmt);
    parser.stmt(TokenKind::Provide, parse_provide_stmt);
    parser.stmt(TokenKind::Decorator, parse_decorator_def_stmt);
    parser.stmt(TokenKind::BlockOpen, parse_labeled_block_stmt);
    parser.stmt(TokenKind::Hash, parse_pragma_stmt);
}

// Lookup tables inside parser struct, so it's easier
pub type StmtLookup = HashMap<TokenKind, StmtHandler>;
pub type NUDLookup = HashMap<TokenKind, NUDHandler>;
pub type LEDLookup = HashMap<TokenKind, LEDHandler>;
pub type BPLookup = HashMap<TokenKind, BindingPower>;
