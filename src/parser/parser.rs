//! Parser implementation for building the Abstract Syntax Tree.
//!
//! The parser is a Pratt parser driven by lookup tables of NUD/LED
//! handlers. Besides the token stream it carries a little layout state:
//! whether the expression being parsed may absorb pipe operators, and the
//! minimum column of the indented block currently open. Both are saved and
//! restored around nested constructs.

use std::{collections::HashMap, rc::Rc};

use crate::{
    ast::statements::Program,
    errors::errors::{Error, ErrorImpl},
    lexer::{
        lexer::tokenize,
        tokens::{Token, TokenKind},
    },
    Position, Span,
};

use super::{
    lookups::{
        create_token_lookups, BPLookup, BindingPower, LEDHandler, LEDLookup, NUDHandler, NUDLookup,
        StmtHandler, StmtLookup,
    },
    stmt::{expect_statement_end, parse_stmt},
    types::{create_token_type_lookups, TypeNUDHandler, TypeNUDLookup},
};

/// Snapshot of everything a speculative parse may change.
#[derive(Debug, Clone, Copy)]
pub struct Checkpoint {
    pos: usize,
    allow_pipes: bool,
    allow_parallel: bool,
    min_column: Option<u32>,
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    file: Rc<String>,
    stmt_lookup: StmtLookup,
    nud_lookup: NUDLookup,
    led_lookup: LEDLookup,
    binding_power_lookup: BPLookup,
    type_nud_lookup: TypeNUDLookup,
    /// `/>`, `</`, `/>>>` and `@>` may extend the current expression.
    allow_pipes: bool,
    /// `\>` may extend the current expression.
    allow_parallel: bool,
    /// Column of the innermost indented block, if any.
    min_column: Option<u32>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>, file: Rc<String>) -> Self {
        Parser {
            tokens,
            pos: 0,
            file,
            stmt_lookup: HashMap::new(),
            nud_lookup: HashMap::new(),
            led_lookup: HashMap::new(),
            binding_power_lookup: HashMap::new(),
            type_nud_lookup: HashMap::new(),
            allow_pipes: true,
            allow_parallel: true,
            min_column: None,
        }
    }

    /// A parser with every lookup table registered.
    pub fn with_lookups(tokens: Vec<Token>, file: Rc<String>) -> Self {
        let mut parser = Parser::new(tokens, file);
        create_token_lookups(&mut parser);
        create_token_type_lookups(&mut parser);
        parser
    }

    pub fn current_token(&self) -> &Token {
        // The stream always ends with EOF and `advance` never moves past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub fn current_token_kind(&self) -> TokenKind {
        self.current_token().kind
    }

    /// The token `offset` places ahead, clamped to EOF.
    pub fn peek(&self, offset: usize) -> &Token {
        &self.tokens[(self.pos + offset).min(self.tokens.len() - 1)]
    }

    /// The first token at or after the current one that is not a newline.
    pub fn peek_past_newlines(&self) -> &Token {
        let mut pos = self.pos;
        while pos < self.tokens.len() - 1 && self.tokens[pos].kind == TokenKind::Newline {
            pos += 1;
        }
        &self.tokens[pos]
    }

    /// Advances to the next token and returns the previous token.
    pub fn advance(&mut self) -> Token {
        let token = self.current_token().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    /// Consumes newlines, returning whether any were skipped.
    pub fn skip_newlines(&mut self) -> bool {
        let mut skipped = false;
        while self.current_token_kind() == TokenKind::Newline {
            self.advance();
            skipped = true;
        }
        skipped
    }

    pub fn skip_separators(&mut self) {
        while matches!(
            self.current_token_kind(),
            TokenKind::Newline | TokenKind::Semicolon
        ) {
            self.advance();
        }
    }

    pub fn expect_error(
        &mut self,
        expected_kind: TokenKind,
        error: Option<Error>,
    ) -> Result<Token, Error> {
        if self.current_token_kind() != expected_kind {
            match error {
                Some(error) => Err(error),
                None => Err(self.unexpected_detailed(&format!("expected {}", expected_kind))),
            }
        } else {
            Ok(self.advance())
        }
    }

    pub fn expect(&mut self, expected_kind: TokenKind) -> Result<Token, Error> {
        self.expect_error(expected_kind, None)
    }

    /// Error for the current token.
    pub fn unexpected(&self) -> Error {
        let token = self.current_token();
        Error::new(
            ErrorImpl::UnexpectedToken {
                token: token.value.clone(),
                kind: token.kind,
            },
            token.span.start.clone(),
        )
    }

    pub fn unexpected_detailed(&self, message: &str) -> Error {
        let token = self.current_token();
        Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: token.value.clone(),
                kind: token.kind,
                message: message.to_string(),
            },
            token.span.start.clone(),
        )
    }

    pub fn has_tokens(&self) -> bool {
        self.current_token_kind() != TokenKind::EOF
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            pos: self.pos,
            allow_pipes: self.allow_pipes,
            allow_parallel: self.allow_parallel,
            min_column: self.min_column,
        }
    }

    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.pos;
        self.allow_pipes = checkpoint.allow_pipes;
        self.allow_parallel = checkpoint.allow_parallel;
        self.min_column = checkpoint.min_column;
    }

    /// Runs `parse` with the given pipe permissions, restoring the previous ones afterwards.
    pub fn with_pipes<T>(
        &mut self,
        allow_pipes: bool,
        allow_parallel: bool,
        parse: impl FnOnce(&mut Parser) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let saved = (self.allow_pipes, self.allow_parallel);
        self.allow_pipes = allow_pipes;
        self.allow_parallel = allow_parallel;
        let result = parse(self);
        (self.allow_pipes, self.allow_parallel) = saved;
        result
    }

    /// Inside `()`, `[]` and `{}` everything is allowed again and indentation no longer applies.
    pub fn delimited<T>(
        &mut self,
        parse: impl FnOnce(&mut Parser) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let saved = self.min_column.take();
        let result = self.with_pipes(true, true, parse);
        self.min_column = saved;
        result
    }

    /// Parses an indented block whose statements start at `column`.
    pub fn indented<T>(
        &mut self,
        column: u32,
        parse: impl FnOnce(&mut Parser) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let saved = self.min_column.replace(column);
        let result = self.with_pipes(true, true, parse);
        self.min_column = saved;
        result
    }

    pub fn pipes_allowed(&self) -> bool {
        self.allow_pipes
    }

    pub fn parallel_allowed(&self) -> bool {
        self.allow_parallel
    }

    pub fn min_column(&self) -> Option<u32> {
        self.min_column
    }

    /// Whether `token` may continue an expression from an earlier line.
    pub fn within_block(&self, token: &Token) -> bool {
        self.min_column.map_or(true, |column| token.column() >= column)
    }

    pub fn get_stmt_lookup(&self) -> &StmtLookup {
        &self.stmt_lookup
    }

    pub fn get_nud_lookup(&self) -> &NUDLookup {
        &self.nud_lookup
    }

    pub fn get_led_lookup(&self) -> &LEDLookup {
        &self.led_lookup
    }

    pub fn get_bp_lookup(&self) -> &BPLookup {
        &self.binding_power_lookup
    }

    pub fn get_type_nud_lookup(&self) -> &TypeNUDLookup {
        &self.type_nud_lookup
    }

    pub fn led(&mut self, kind: TokenKind, binding_power: BindingPower, led_fn: LEDHandler) {
        self.binding_power_lookup.insert(kind, binding_power);
        self.led_lookup.insert(kind, led_fn);
    }

    // Unlike `led`, prefix handlers leave the binding power table alone:
    // `-`, `(` and `/>` are both prefix and infix.
    pub fn nud(&mut self, kind: TokenKind, nud_fn: NUDHandler) {
        self.nud_lookup.insert(kind, nud_fn);
    }

    pub fn stmt(&mut self, kind: TokenKind, stmt_fn: StmtHandler) {
        self.stmt_lookup.insert(kind, stmt_fn);
    }

    pub fn type_nud(&mut self, kind: TokenKind, nud_fn: TypeNUDHandler) {
        self.type_nud_lookup.insert(kind, nud_fn);
    }

    pub fn get_file(&self) -> Rc<String> {
        Rc::clone(&self.file)
    }

    /// Start of the current token.
    pub fn get_position(&self) -> Position {
        self.current_token().span.start.clone()
    }

    /// End of the most recently consumed token.
    pub fn previous_end(&self) -> Position {
        let index = self.pos.saturating_sub(1);
        self.tokens[index.min(self.tokens.len() - 1)].span.end.clone()
    }

    /// Span from `start` to the end of the last consumed token.
    pub fn span_from(&self, start: &Span) -> Span {
        Span::new(start.start.clone(), self.previous_end())
    }
}

/// Parses a stream of tokens into a program.
///
/// The parser is returned alongside the result so callers can inspect
/// where parsing stopped.
pub fn parse(tokens: Vec<Token>, file: Rc<String>) -> (Parser, Result<Program, Error>) {
    let mut parser = Parser::with_lookups(tokens, Rc::clone(&file));
    let result = parse_program(&mut parser);
    (parser, result)
}

fn parse_program(parser: &mut Parser) -> Result<Program, Error> {
    let start = parser.get_position();
    let mut body = vec![];

    loop {
        parser.skip_separators();
        if !parser.has_tokens() {
            break;
        }
        body.push(parse_stmt(parser)?);
        expect_statement_end(parser, &[])?;
    }

    Ok(Program {
        body,
        span: Span::new(start, parser.get_position()),
    })
}

/// Tokenizes and parses `source` in one step.
pub fn parse_source(source: &str, file: &str) -> Result<Program, Error> {
    let tokens = tokenize(source.to_string(), Some(file.to_string()))?;
    let (_, program) = parse(tokens, Rc::new(file.to_string()));
    program
}
